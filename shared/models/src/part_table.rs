//! Part table domain model.
//!
//! A `PartTable` is one spreadsheet's worth of BOM rows. The required
//! columns are resolved once when the table is built, so every row handed
//! out afterwards carries a typed part number and quantity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BomError, BomResult};

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Builds a cell from raw text, treating whitespace-only input as empty.
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed, non-empty textual form of the cell.
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(self.to_string().trim().to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Header names used to locate the BOM columns in a sheet.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub part_number: String,
    pub quantity: String,
    pub supplier: String,
    pub description: String,
    /// Column holding the sub-assembly reference. When unset, the part
    /// number itself is matched against sub-assembly file names.
    pub link_column: Option<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            part_number: "PN".to_string(),
            quantity: "QTY".to_string(),
            supplier: "Supplier".to_string(),
            description: "Description".to_string(),
            link_column: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LinkKey {
    PartNumber,
    Column(Option<usize>),
}

#[derive(Debug, Clone, PartialEq)]
struct ResolvedColumns {
    part_number: usize,
    quantity: usize,
    supplier: Option<usize>,
    description: Option<usize>,
    link: LinkKey,
}

/// One validated BOM row.
#[derive(Debug, Clone, PartialEq)]
pub struct PartRow {
    /// 1-based row number in the source sheet, header included.
    pub row_number: usize,
    pub part_number: String,
    pub quantity: f64,
    pub cells: Vec<CellValue>,
}

/// Immutable, schema-checked rows of one BOM source.
#[derive(Debug, Clone, PartialEq)]
pub struct PartTable {
    source: String,
    fields: Vec<String>,
    columns: ResolvedColumns,
    rows: Vec<PartRow>,
}

fn find_column(fields: &[String], name: &str) -> Option<usize> {
    let name = name.trim();
    fields.iter().position(|f| f.trim().eq_ignore_ascii_case(name))
}

impl PartTable {
    /// Validates a raw sheet and builds the table.
    ///
    /// `header` is the first sheet row; `rows` are the remaining rows in
    /// sheet order. Rows whose cells are all empty are skipped.
    pub fn from_sheet(
        source: impl Into<String>,
        header: Vec<String>,
        rows: Vec<Vec<CellValue>>,
        names: &ColumnNames,
    ) -> BomResult<Self> {
        let source = source.into();
        let fields: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();

        let part_number = find_column(&fields, &names.part_number);
        let quantity = find_column(&fields, &names.quantity);
        let (part_number, quantity) = match (part_number, quantity) {
            (Some(pn), Some(qty)) => (pn, qty),
            (pn, qty) => {
                let missing: Vec<&str> = [(pn, &names.part_number), (qty, &names.quantity)]
                    .into_iter()
                    .filter(|(idx, _)| idx.is_none())
                    .map(|(_, name)| name.as_str())
                    .collect();
                return Err(BomError::format(
                    source,
                    format!("missing required column(s): {}", missing.join(", ")),
                ));
            }
        };

        let columns = ResolvedColumns {
            part_number,
            quantity,
            supplier: find_column(&fields, &names.supplier),
            description: find_column(&fields, &names.description),
            link: match &names.link_column {
                None => LinkKey::PartNumber,
                Some(column) => match find_column(&fields, column) {
                    Some(idx) if idx == part_number => LinkKey::PartNumber,
                    Some(idx) if idx == quantity => {
                        return Err(BomError::format(
                            source,
                            format!("reference column '{}' is the quantity column", column),
                        ));
                    }
                    idx => LinkKey::Column(idx),
                },
            },
        };

        let mut parsed = Vec::with_capacity(rows.len());
        for (idx, mut cells) in rows.into_iter().enumerate() {
            let row_number = idx + 2;
            if cells.iter().all(CellValue::is_empty) {
                continue;
            }
            cells.resize(fields.len().max(cells.len()), CellValue::Empty);

            let part_number = cells[columns.part_number].as_text().ok_or_else(|| {
                BomError::format(&source, format!("row {}: empty part number", row_number))
            })?;

            let raw_qty = &cells[columns.quantity];
            let quantity = raw_qty.as_f64().ok_or_else(|| {
                BomError::format(
                    &source,
                    format!(
                        "row {}: quantity '{}' for part {} is not a number",
                        row_number, raw_qty, part_number
                    ),
                )
            })?;
            if !quantity.is_finite() || quantity <= 0.0 {
                return Err(BomError::format(
                    &source,
                    format!(
                        "row {}: quantity for part {} must be positive, got {}",
                        row_number, part_number, quantity
                    ),
                ));
            }

            parsed.push(PartRow {
                row_number,
                part_number,
                quantity,
                cells,
            });
        }

        Ok(Self {
            source,
            fields,
            columns,
            rows: parsed,
        })
    }

    /// Name of the file (or other source) the table was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[PartRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Part numbers in row order, duplicates included.
    pub fn part_numbers(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.part_number.as_str()).collect()
    }

    pub fn supplier(&self, row: &PartRow) -> Option<String> {
        self.columns
            .supplier
            .and_then(|idx| row.cells.get(idx))
            .and_then(CellValue::as_text)
    }

    pub fn description(&self, row: &PartRow) -> Option<String> {
        self.columns
            .description
            .and_then(|idx| row.cells.get(idx))
            .and_then(CellValue::as_text)
    }

    /// Value compared against sub-assembly names when linking.
    pub fn link_key(&self, row: &PartRow) -> Option<String> {
        match self.columns.link {
            LinkKey::PartNumber => Some(row.part_number.clone()),
            LinkKey::Column(idx) => idx.and_then(|i| row.cells.get(i)).and_then(CellValue::as_text),
        }
    }

    /// Header of the reference column, when linking uses one and the table has it.
    pub fn link_field(&self) -> Option<&str> {
        match self.columns.link {
            LinkKey::Column(Some(idx)) => Some(self.fields[idx].as_str()),
            _ => None,
        }
    }

    pub fn quantity_field(&self) -> &str {
        &self.fields[self.columns.quantity]
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, widths: &[usize], cells: &[String]) -> fmt::Result {
    let mut line = String::new();
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(&format!("{:<width$}", cell, width = *w));
    }
    writeln!(f, "{}", line.trim_end())
}

impl fmt::Display for PartTable {
    /// Aligned plain-text rendering of the whole table.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.to_string()).collect())
            .collect();

        let width = self.fields.len();
        let mut widths: Vec<usize> = self.fields.iter().map(|h| h.chars().count()).collect();
        for row in &rendered {
            for (i, cell) in row.iter().take(width).enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        write_row(f, &widths, &self.fields)?;
        for row in &rendered {
            write_row(f, &widths, row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::from_text(s)
    }

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_required_columns_are_resolved_case_insensitively() {
        let table = PartTable::from_sheet(
            "wheels.xlsx",
            header(&[" pn ", "Description", "qty"]),
            vec![
                vec![text("17954-1"), text("Wheel"), CellValue::Number(2.0)],
                vec![text("17954-2"), text("Axle"), text("1")],
            ],
            &ColumnNames::default(),
        )
        .unwrap();

        assert_eq!(table.fields(), &["pn", "Description", "qty"]);
        assert_eq!(table.part_numbers(), vec!["17954-1", "17954-2"]);
        assert_eq!(table.rows()[1].quantity, 1.0);
        assert_eq!(table.description(&table.rows()[0]), Some("Wheel".to_string()));
        assert_eq!(table.supplier(&table.rows()[0]), None);
    }

    #[test]
    fn test_missing_quantity_column_is_format_error() {
        let err = PartTable::from_sheet(
            "broken.xlsx",
            header(&["PN", "Description"]),
            vec![vec![text("A"), text("Thing")]],
            &ColumnNames::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            BomError::format("broken.xlsx", "missing required column(s): QTY")
        );
    }

    #[test]
    fn test_bad_rows_are_rejected_with_row_numbers() {
        let names = ColumnNames::default();
        let empty_pn = PartTable::from_sheet(
            "a.csv",
            header(&["PN", "QTY"]),
            vec![vec![text("X"), text("1")], vec![text(" "), text("2")]],
            &names,
        )
        .unwrap_err();
        assert!(empty_pn.to_string().contains("row 3: empty part number"));

        let zero_qty = PartTable::from_sheet(
            "a.csv",
            header(&["PN", "QTY"]),
            vec![vec![text("X"), text("0")]],
            &names,
        )
        .unwrap_err();
        assert!(zero_qty.to_string().contains("must be positive"));

        let word_qty = PartTable::from_sheet(
            "a.csv",
            header(&["PN", "QTY"]),
            vec![vec![text("X"), text("two")]],
            &names,
        )
        .unwrap_err();
        assert!(word_qty.to_string().contains("'two'"));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let table = PartTable::from_sheet(
            "a.csv",
            header(&["PN", "QTY"]),
            vec![
                vec![text("X"), text("1")],
                vec![CellValue::Empty, text("  ")],
                vec![],
                vec![text("Y"), text("4")],
            ],
            &ColumnNames::default(),
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].row_number, 5);
    }

    #[test]
    fn test_link_key_uses_reference_column_when_configured() {
        let names = ColumnNames {
            link_column: Some("Assembly".to_string()),
            ..ColumnNames::default()
        };
        let table = PartTable::from_sheet(
            "master.xlsx",
            header(&["PN", "QTY", "Assembly"]),
            vec![
                vec![text("100"), text("2"), text("frame")],
                vec![text("101"), text("1"), CellValue::Empty],
            ],
            &names,
        )
        .unwrap();

        assert_eq!(table.link_key(&table.rows()[0]), Some("frame".to_string()));
        assert_eq!(table.link_key(&table.rows()[1]), None);
        assert_eq!(table.link_field(), Some("Assembly"));
    }

    #[test]
    fn test_part_number_as_reference_column_keeps_it_in_the_output() {
        let names = ColumnNames {
            link_column: Some("pn".to_string()),
            ..ColumnNames::default()
        };
        let table = PartTable::from_sheet(
            "master.xlsx",
            header(&["PN", "QTY"]),
            vec![vec![text("frame"), text("2")]],
            &names,
        )
        .unwrap();

        assert_eq!(table.link_field(), None);
        assert_eq!(table.link_key(&table.rows()[0]), Some("frame".to_string()));
    }

    #[test]
    fn test_quantity_as_reference_column_is_format_error() {
        let names = ColumnNames {
            link_column: Some("QTY".to_string()),
            ..ColumnNames::default()
        };
        let err = PartTable::from_sheet(
            "master.xlsx",
            header(&["PN", "QTY"]),
            vec![vec![text("frame"), text("2")]],
            &names,
        )
        .unwrap_err();

        assert!(matches!(err, BomError::Format { .. }));
        assert!(err.to_string().contains("quantity column"));
    }

    #[test]
    fn test_numeric_cells_render_without_trailing_zeroes() {
        assert_eq!(CellValue::Number(17954.0).to_string(), "17954");
        assert_eq!(CellValue::Number(0.25).to_string(), "0.25");
        assert_eq!(CellValue::Number(17954.0).as_text(), Some("17954".to_string()));
    }

    #[test]
    fn test_display_aligns_columns() {
        let table = PartTable::from_sheet(
            "wheels.xlsx",
            header(&["PN", "Description", "QTY"]),
            vec![
                vec![text("17954-1"), text("Wheel"), text("2")],
                vec![text("17954-2"), text("Axle"), text("1")],
            ],
            &ColumnNames::default(),
        )
        .unwrap();

        let expected = "\
PN       Description  QTY
17954-1  Wheel        2
17954-2  Axle         1
";
        assert_eq!(table.to_string(), expected);
    }
}
