//! # multibom Core Domain Models
//!
//! This crate contains the domain models for assembling multi-level bills of
//! materials out of spreadsheet part lists.
//!
//! ## Key Models
//!
//! - **PartTable**: one spreadsheet's rows, schema-checked at construction so
//!   every row carries a part number and a positive quantity
//! - **BomTree / BomNode**: arena-backed assembly tree; a node owns its child
//!   links and keeps a parent index as back-reference
//! - **FlattenedBom**: part number to total quantity across a tree
//! - **SupplierBoms**: flattened part lists partitioned by supplier
//! - **BomError / BomWarning**: configuration, format and structural failures,
//!   plus non-fatal findings such as unattached sub-assemblies
//!
//! ## Quantities
//!
//! Quantities are accumulated as `f64` and rounded up to the next whole unit
//! only when a total is read, see [`round_up_quantity`].

pub mod bom_node;
pub mod error;
pub mod flattened;
pub mod part_table;


pub use bom_node::{Ancestors, BomNode, BomTree, ChildLink, NodeId};
pub use error::{BomError, BomResult, BomWarning};
pub use flattened::{
    round_up_quantity, FlatPart, FlattenedBom, SupplierBoms, ROUNDING_TOLERANCE,
    UNSPECIFIED_SUPPLIER,
};
pub use part_table::{CellValue, ColumnNames, PartRow, PartTable};
