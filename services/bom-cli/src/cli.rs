//! Command line surface of `multibom`.
//!
//! Argument parsing and the wiring from configuration to the loader and the
//! output writers. Everything that reads or derives BOMs lives in
//! `multibom-utils`.

use anyhow::Result;
use clap::Parser;
use multibom_models::{BomError, BomWarning};
use multibom_utils::{AppConfig, ProjectLoader, PublishOptions, PublishPlan};
use std::path::PathBuf;

/// Build flattened and per-supplier part lists from a directory of
/// multi-level BOM spreadsheets.
#[derive(Parser, Debug)]
#[clap(
    name = "multibom",
    version,
    about = "Flatten a multi-level bill of materials spread over several spreadsheets",
    after_help = "Outputs are written to the publish/ directory next to the master parts list."
)]
pub struct Cli {
    /// Project directory, or the top-level parts list inside it
    #[clap(value_name = "TOPLEVELDIR_OR_FILE")]
    pub path: PathBuf,

    /// Also write one part list per supplier
    #[clap(long)]
    pub supplier: bool,

    /// Also write an ASCII rendering of the assembly tree
    #[clap(long)]
    pub tree: bool,

    /// Configuration file (TOML, YAML or JSON)
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// File stem recognized as the master parts list; repeat for several
    #[clap(long = "master-name", value_name = "NAME")]
    pub master_names: Vec<String>,

    /// Column whose value names the referenced sub-assembly (default: the part number)
    #[clap(long, value_name = "COLUMN")]
    pub link_column: Option<String>,

    /// Name of the output directory inside the project directory
    #[clap(long, value_name = "NAME")]
    pub publish_dir: Option<String>,

    /// Debug logging on stderr
    #[clap(short, long)]
    pub verbose: bool,
}

/// What a successful run produced.
#[derive(Debug, Default)]
pub struct Report {
    pub written: Vec<PathBuf>,
    pub warnings: Vec<BomWarning>,
}

impl Cli {
    /// Layered configuration with the command line applied on top.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())
            .map_err(|e| BomError::configuration(format!("failed to load configuration: {}", e)))?;
        self.apply_overrides(&mut config);
        Ok(config.finalize()?)
    }

    fn apply_overrides(&self, config: &mut AppConfig) {
        if !self.master_names.is_empty() {
            config.project.master_names = self.master_names.clone();
        }
        if let Some(column) = &self.link_column {
            config.columns.link_column = Some(column.clone());
        }
        if let Some(dir) = &self.publish_dir {
            config.project.publish_dir = dir.clone();
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }

    fn publish_options(&self, config: &AppConfig) -> PublishOptions {
        PublishOptions {
            publish_dir: config.project.publish_dir.clone(),
            supplier: self.supplier,
            tree: self.tree,
        }
    }
}

/// Loads the project, renders every requested output, then writes them.
pub fn run(cli: &Cli, config: &AppConfig) -> Result<Report> {
    let loader = ProjectLoader::from_config(config);
    let project = loader.build_from_path(&cli.path)?;
    tracing::info!(
        master = project.master_file(),
        subassemblies = project.subassembly_files().len(),
        "Project loaded"
    );

    let plan = PublishPlan::prepare(&project, &cli.publish_options(config))?;
    let written = plan.write()?;

    Ok(Report {
        written,
        warnings: project.warnings().to_vec(),
    })
}
