//! Derived part lists.
//!
//! These views are computed from a [`crate::BomTree`] on demand and never
//! written back into it.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::part_table::CellValue;

/// Supplier key for rows with no supplier value.
pub const UNSPECIFIED_SUPPLIER: &str = "unspecified";

/// Absolute slack allowed before rounding a total up to the next unit.
///
/// Totals are products of spreadsheet quantities, so a whole number such as
/// `0.1 * 3 * 10` may come out as `3.0000000000000004`; that still orders 3.
pub const ROUNDING_TOLERANCE: f64 = 1e-9;

/// Rounds an accumulated quantity up to a whole orderable count.
pub fn round_up_quantity(raw: f64) -> u64 {
    let rounded = (raw - ROUNDING_TOLERANCE).ceil();
    if rounded <= 0.0 {
        0
    } else {
        rounded as u64
    }
}

/// One aggregated part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatPart {
    pub part_number: String,
    /// Sum of `multiplier * QTY` over every occurrence, before rounding.
    pub raw_quantity: f64,
    /// Pass-through values taken from the first row seen for this part,
    /// keyed by lower-cased column name.
    pub attributes: HashMap<String, CellValue>,
}

impl FlatPart {
    pub fn quantity(&self) -> u64 {
        round_up_quantity(self.raw_quantity)
    }
}

/// Part number to total quantity over a whole assembly tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlattenedBom {
    fields: Vec<String>,
    quantity_field: String,
    parts: Vec<FlatPart>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl FlattenedBom {
    pub fn new(quantity_field: impl Into<String>) -> Self {
        Self {
            quantity_field: quantity_field.into(),
            ..Self::default()
        }
    }

    /// Registers an output column, keeping first-seen order.
    pub fn add_field(&mut self, field: &str) {
        if !self.fields.iter().any(|f| f.eq_ignore_ascii_case(field)) {
            self.fields.push(field.to_string());
        }
    }

    /// Adds `quantity` to `part_number`, creating the entry on first sight.
    pub fn add<I>(&mut self, part_number: &str, quantity: f64, attributes: I)
    where
        I: IntoIterator<Item = (String, CellValue)>,
    {
        match self.index.get(part_number) {
            Some(&idx) => self.parts[idx].raw_quantity += quantity,
            None => {
                self.index.insert(part_number.to_string(), self.parts.len());
                self.parts.push(FlatPart {
                    part_number: part_number.to_string(),
                    raw_quantity: quantity,
                    attributes: attributes
                        .into_iter()
                        .map(|(field, value)| (field.to_lowercase(), value))
                        .collect(),
                });
            }
        }
    }

    /// Output columns, quantity column included.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn quantity_field(&self) -> &str {
        &self.quantity_field
    }

    /// Parts in order of first appearance during the walk.
    pub fn parts(&self) -> &[FlatPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, part_number: &str) -> Option<&FlatPart> {
        self.index.get(part_number).map(|&idx| &self.parts[idx])
    }

    /// Rounded total for one part.
    pub fn quantity(&self, part_number: &str) -> Option<u64> {
        self.get(part_number).map(FlatPart::quantity)
    }

    /// Rounded totals keyed by part number.
    pub fn quantities(&self) -> BTreeMap<String, u64> {
        self.parts
            .iter()
            .map(|p| (p.part_number.clone(), p.quantity()))
            .collect()
    }

    /// Table rows in `fields()` order, with the aggregated quantity substituted.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.parts
            .iter()
            .map(|part| {
                self.fields
                    .iter()
                    .map(|field| {
                        if field.eq_ignore_ascii_case(&self.quantity_field) {
                            part.quantity().to_string()
                        } else {
                            part.attributes
                                .get(&field.to_lowercase())
                                .map(|c| c.to_string())
                                .unwrap_or_default()
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Flattened part lists partitioned by supplier, ordered by supplier name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupplierBoms {
    groups: BTreeMap<String, FlattenedBom>,
}

impl SupplierBoms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&mut self, supplier: &str, quantity_field: &str) -> &mut FlattenedBom {
        self.groups
            .entry(supplier.to_string())
            .or_insert_with(|| FlattenedBom::new(quantity_field))
    }

    pub fn get(&self, supplier: &str) -> Option<&FlattenedBom> {
        self.groups.get(supplier)
    }

    pub fn suppliers(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlattenedBom)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sets the same column list on every group.
    pub fn set_fields(&mut self, fields: &[String]) {
        for bom in self.groups.values_mut() {
            for field in fields {
                bom.add_field(field);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_quantity() {
        assert_eq!(round_up_quantity(5.0), 5);
        assert_eq!(round_up_quantity(4.2), 5);
        assert_eq!(round_up_quantity(0.1 * 3.0 * 10.0), 3);
        assert_eq!(round_up_quantity(0.25), 1);
    }

    #[test]
    fn test_add_sums_and_keeps_first_attributes() {
        let mut bom = FlattenedBom::new("QTY");
        bom.add_field("PN");
        bom.add_field("QTY");
        bom.add_field("Description");
        bom.add(
            "X",
            2.0,
            [
                ("PN".to_string(), CellValue::Text("X".into())),
                ("Description".to_string(), CellValue::Text("first".into())),
            ],
        );
        bom.add("Y", 1.0, []);
        bom.add(
            "X",
            3.0,
            [("Description".to_string(), CellValue::Text("second".into()))],
        );

        assert_eq!(bom.quantity("X"), Some(5));
        assert_eq!(bom.len(), 2);
        assert_eq!(
            bom.to_rows()[0],
            vec!["X".to_string(), "5".to_string(), "first".to_string()]
        );
    }

    #[test]
    fn test_add_field_ignores_case_duplicates() {
        let mut bom = FlattenedBom::new("QTY");
        bom.add_field("Supplier");
        bom.add_field("supplier");
        assert_eq!(bom.fields(), &["Supplier"]);
    }
}
