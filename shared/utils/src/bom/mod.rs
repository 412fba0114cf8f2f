//! BOM (Bill of Materials) Processing Module
//!
//! Loading spreadsheet part lists, linking them into an assembly tree and
//! deriving the flattened, per-supplier and tree outputs.

pub mod flatten;
pub mod loader;
pub mod parser;
pub mod publish;
pub mod render;

pub use flatten::Flattener;
pub use loader::{file_stem, Classification, Project, ProjectLoader};
pub use parser::{BomFormat, BomParser};
pub use publish::{render_csv, sanitize_name, OutputFile, PublishOptions, PublishPlan};
pub use render::render_tree;
