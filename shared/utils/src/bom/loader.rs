//! Project Loader
//!
//! Finds the spreadsheets of a project directory, decides which one is the
//! master parts list and links every sub-assembly under the row that
//! references it.

use multibom_models::{
    BomError, BomResult, BomTree, BomWarning, ColumnNames, FlattenedBom, NodeId, SupplierBoms,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::flatten::Flattener;
use super::parser::BomParser;
use super::render::render_tree;
use crate::config::AppConfig;

/// File name without its final extension.
pub fn file_stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[..idx],
        _ => filename,
    }
}

/// Result of splitting the discovered files into master and sub-assemblies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub master: String,
    pub subassemblies: Vec<String>,
}

/// A fully linked project.
#[derive(Debug, Clone)]
pub struct Project {
    directory: PathBuf,
    master_file: String,
    subassembly_files: Vec<String>,
    tree: BomTree,
    root: NodeId,
    warnings: Vec<BomWarning>,
}

impl Project {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn master_file(&self) -> &str {
        &self.master_file
    }

    pub fn subassembly_files(&self) -> &[String] {
        &self.subassembly_files
    }

    pub fn tree(&self) -> &BomTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Non-fatal findings from loading, in discovery order.
    pub fn warnings(&self) -> &[BomWarning] {
        &self.warnings
    }

    pub fn flatten(&self) -> BomResult<FlattenedBom> {
        Flattener::new(&self.tree).flatten(self.root)
    }

    pub fn by_supplier(&self) -> BomResult<SupplierBoms> {
        Flattener::new(&self.tree).by_supplier(self.root)
    }

    pub fn render_tree(&self) -> String {
        render_tree(&self.tree, self.root)
    }
}

/// Lower-cased file name or stem to the files claiming it.
type Identities = HashMap<String, Vec<(NodeId, String)>>;

/// Builds [`Project`]s from directories of spreadsheets.
#[derive(Debug, Clone)]
pub struct ProjectLoader {
    master_names: Vec<String>,
    extensions: Vec<String>,
    parser: BomParser,
}

impl Default for ProjectLoader {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ProjectLoader {
    pub fn new(master_names: Vec<String>, extensions: Vec<String>, columns: ColumnNames) -> Self {
        Self {
            master_names: master_names.into_iter().map(|n| n.to_lowercase()).collect(),
            extensions: extensions.into_iter().map(|e| e.to_lowercase()).collect(),
            parser: BomParser::new(columns),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.project.master_names.clone(),
            config.project.extensions.clone(),
            config.columns.clone(),
        )
    }

    pub fn master_names(&self) -> &[String] {
        &self.master_names
    }

    fn is_master(&self, filename: &str) -> bool {
        let stem = file_stem(filename).to_lowercase();
        self.master_names.iter().any(|name| *name == stem)
    }

    fn has_spreadsheet_extension(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Spreadsheet files directly inside `directory`, sorted by name.
    ///
    /// Office lock files (`~$...`) and hidden files are ignored.
    pub fn discover(&self, directory: &Path) -> BomResult<Vec<String>> {
        if !directory.is_dir() {
            return Err(BomError::configuration(format!(
                "{} is not a directory",
                directory.display()
            )));
        }

        let entries = std::fs::read_dir(directory)
            .map_err(|e| BomError::io(directory.display().to_string(), &e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BomError::io(directory.display().to_string(), &e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with("~$") || name.starts_with('.') {
                continue;
            }
            if entry.path().is_file() && self.has_spreadsheet_extension(&name) {
                files.push(name);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(BomError::configuration(format!(
                "no spreadsheet files found in {}",
                directory.display()
            )));
        }

        tracing::info!(directory = %directory.display(), count = files.len(), "Discovered spreadsheet files");
        Ok(files)
    }

    /// Picks the single file whose lower-cased stem is a recognized master name.
    pub fn classify(&self, filenames: &[String]) -> BomResult<Classification> {
        let (masters, subassemblies): (Vec<String>, Vec<String>) =
            filenames.iter().cloned().partition(|f| self.is_master(f));

        match masters.as_slice() {
            [master] => Ok(Classification {
                master: master.clone(),
                subassemblies,
            }),
            [] => Err(BomError::configuration(format!(
                "no master file found (expected a file named one of: {})",
                self.master_names.join(", ")
            ))),
            many => Err(BomError::configuration(format!(
                "ambiguous master file: {}",
                many.join(", ")
            ))),
        }
    }

    /// Uses `master` as the top level and every other file as a sub-assembly.
    pub fn classify_with_master(&self, filenames: &[String], master: &str) -> BomResult<Classification> {
        if !filenames.iter().any(|f| f == master) {
            return Err(BomError::configuration(format!(
                "{} is not a spreadsheet in the project directory",
                master
            )));
        }
        Ok(Classification {
            master: master.to_string(),
            subassemblies: filenames.iter().filter(|f| *f != master).cloned().collect(),
        })
    }

    /// Discover, classify, load and link the project in `directory`.
    pub fn build(&self, directory: &Path) -> BomResult<Project> {
        let files = self.discover(directory)?;
        let classification = self.classify(&files)?;
        self.assemble(directory, classification)
    }

    /// Accepts either a project directory or the top-level file inside one.
    pub fn build_from_path(&self, path: &Path) -> BomResult<Project> {
        if !path.is_file() {
            return self.build(path);
        }

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let master = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BomError::configuration(format!("{} has no file name", path.display())))?;

        let files = self.discover(&directory)?;
        let classification = self.classify_with_master(&files, &master)?;
        self.assemble(&directory, classification)
    }

    fn assemble(&self, directory: &Path, classification: Classification) -> BomResult<Project> {
        let Classification {
            master,
            subassemblies,
        } = classification;
        tracing::info!(master = %master, subassemblies = subassemblies.len(), "Classified project files");

        let mut tree = BomTree::new();
        let root = tree.add_node(
            self.parser.load_table(&directory.join(&master))?,
            Some(master.clone()),
        );

        let mut identities = Identities::new();
        register_identity(&mut identities, &master, root);

        let mut sub_ids = Vec::with_capacity(subassemblies.len());
        for file in &subassemblies {
            let table = self.parser.load_table(&directory.join(file))?;
            let id = tree.add_node(table, Some(file.clone()));
            register_identity(&mut identities, file, id);
            sub_ids.push(id);
        }

        for parent in std::iter::once(root).chain(sub_ids.iter().copied()) {
            link_references(&mut tree, &identities, root, parent)?;
        }

        let mut warnings = Vec::new();
        for &id in &sub_ids {
            if tree.root_of(id) != root {
                let file = tree.label(id);
                tracing::warn!(file = %file, "Sub-assembly is not referenced from the master and is excluded");
                warnings.push(BomWarning::UnattachedFile { file });
            }
        }

        tracing::info!(nodes = tree.len(), warnings = warnings.len(), "Project assembled");
        Ok(Project {
            directory: directory.to_path_buf(),
            master_file: master,
            subassembly_files: subassemblies,
            tree,
            root,
            warnings,
        })
    }
}

fn register_identity(identities: &mut Identities, filename: &str, id: NodeId) {
    let full = filename.trim().to_lowercase();
    let stem = file_stem(filename).trim().to_lowercase();
    identities
        .entry(full.clone())
        .or_default()
        .push((id, filename.to_string()));
    if stem != full {
        identities
            .entry(stem)
            .or_default()
            .push((id, filename.to_string()));
    }
}

/// Attaches every sub-assembly referenced by a row of `parent`.
fn link_references(
    tree: &mut BomTree,
    identities: &Identities,
    root: NodeId,
    parent: NodeId,
) -> BomResult<()> {
    let table = tree.node(parent).table();
    let mut links = Vec::new();
    for (row_idx, row) in table.rows().iter().enumerate() {
        let Some(key) = table.link_key(row) else {
            continue;
        };
        match identities.get(&key.to_lowercase()).map(Vec::as_slice) {
            None | Some([]) => {}
            Some([(child, _)]) if *child == root => {
                return Err(BomError::structural(
                    row.part_number.clone(),
                    vec![tree.label(parent), tree.label(root)],
                    "the master parts list cannot be used as a sub-assembly",
                ));
            }
            Some([(child, _)]) => links.push((row_idx, *child)),
            Some(claimants) => {
                let mut implicated = vec![tree.label(parent)];
                implicated.extend(claimants.iter().map(|(_, file)| file.clone()));
                return Err(BomError::structural(
                    row.part_number.clone(),
                    implicated,
                    format!("reference '{}' matches more than one sub-assembly file", key),
                ));
            }
        }
    }

    for (row, child) in links {
        tree.attach(parent, row, child)?;
        tracing::debug!(
            parent = %tree.label(parent),
            child = %tree.label(child),
            "Linked sub-assembly"
        );
    }
    Ok(())
}
