//! Output writers
//!
//! Every requested output is rendered in memory first; files are only written
//! once all of them rendered, so a failing run leaves no partial `publish/`.

use multibom_models::{BomError, BomResult, FlattenedBom};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::loader::Project;

pub const FLATTENED_FILE: &str = "flattened.csv";
pub const TREE_FILE: &str = "tree.txt";

/// Which outputs to produce and where.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub publish_dir: String,
    pub supplier: bool,
    pub tree: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            publish_dir: "publish".to_string(),
            supplier: false,
            tree: false,
        }
    }
}

/// A rendered output not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub contents: String,
}

/// Outputs of one run, ready to be written.
#[derive(Debug, Clone)]
pub struct PublishPlan {
    directory: PathBuf,
    files: Vec<OutputFile>,
}

impl PublishPlan {
    /// Renders the flattened BOM plus the optional supplier lists and tree.
    pub fn prepare(project: &Project, options: &PublishOptions) -> BomResult<Self> {
        let mut files = vec![OutputFile {
            name: FLATTENED_FILE.to_string(),
            contents: render_csv(&project.flatten()?, FLATTENED_FILE)?,
        }];

        if options.supplier {
            let groups = project.by_supplier()?;
            let mut taken = HashSet::new();
            for (supplier, bom) in groups.iter() {
                let name = supplier_file_name(supplier, &mut taken);
                let contents = render_csv(bom, &name)?;
                files.push(OutputFile { name, contents });
            }
        }

        if options.tree {
            files.push(OutputFile {
                name: TREE_FILE.to_string(),
                contents: project.render_tree(),
            });
        }

        Ok(Self {
            directory: project.directory().join(&options.publish_dir),
            files,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn files(&self) -> &[OutputFile] {
        &self.files
    }

    /// Creates the output directory and writes every file, returning their paths.
    pub fn write(&self) -> BomResult<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.directory)
            .map_err(|e| BomError::io(self.directory.display().to_string(), &e))?;

        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = self.directory.join(&file.name);
            std::fs::write(&path, &file.contents)
                .map_err(|e| BomError::io(path.display().to_string(), &e))?;
            tracing::info!(path = %path.display(), "Wrote output");
            written.push(path);
        }
        Ok(written)
    }
}

/// CSV rendering of a flattened BOM: header row, then one row per part.
pub fn render_csv(bom: &FlattenedBom, name: &str) -> BomResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_io = |e: csv::Error| BomError::io(name, &std::io::Error::from(e));

    writer.write_record(bom.fields()).map_err(to_io)?;
    for row in bom.to_rows() {
        writer.write_record(&row).map_err(to_io)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| BomError::io(name, e.error()))?;
    String::from_utf8(bytes).map_err(|e| BomError::Io {
        path: name.to_string(),
        message: e.to_string(),
    })
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

/// `supplier_<name>.csv`, suffixed with `_2`, `_3`, ... when two suppliers
/// sanitize to the same name (compared case-insensitively).
fn supplier_file_name(supplier: &str, taken: &mut HashSet<String>) -> String {
    let base = format!("supplier_{}", sanitize_name(supplier));
    let mut candidate = base.clone();
    let mut n = 2;
    while !taken.insert(candidate.to_lowercase()) {
        candidate = format!("{}_{}", base, n);
        n += 1;
    }
    format!("{}.csv", candidate)
}
