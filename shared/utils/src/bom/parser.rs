//! BOM File Parser
//!
//! Loads one spreadsheet (Excel workbook or CSV file) into a [`PartTable`].

use calamine::{open_workbook_from_rs, DataType, Reader, Xls, Xlsx};
use multibom_models::{BomError, BomResult, CellValue, ColumnNames, PartTable};
use std::io::Cursor;
use std::path::Path;

/// Supported BOM file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomFormat {
    Csv,
    Xlsx, // XLSX/XLSM
    Xls,
}

impl BomFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            _ => None,
        }
    }
}

/// Reads BOM sources using a fixed set of column names.
#[derive(Debug, Clone, Default)]
pub struct BomParser {
    columns: ColumnNames,
}

impl BomParser {
    pub fn new(columns: ColumnNames) -> Self {
        Self { columns }
    }

    /// Load a table from disk. The table is named after the file name.
    pub fn load_table(&self, path: &Path) -> BomResult<PartTable> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let data = std::fs::read(path)
            .map_err(|e| BomError::format(&filename, format!("cannot read file: {}", e)))?;

        tracing::debug!(file = %filename, bytes = data.len(), "Loading part table");
        self.parse_bytes(&filename, data, None)
    }

    /// Parse a BOM from bytes, detecting the format from `filename` when not given.
    pub fn parse_bytes(
        &self,
        filename: &str,
        data: Vec<u8>,
        format: Option<BomFormat>,
    ) -> BomResult<PartTable> {
        let format = format
            .or_else(|| BomFormat::from_extension(Path::new(filename)))
            .ok_or_else(|| BomError::format(filename, "unsupported file type"))?;

        match format {
            BomFormat::Csv => self.parse_csv(filename, &data),
            BomFormat::Xlsx => self.parse_workbook::<Xlsx<_>>(filename, data),
            BomFormat::Xls => self.parse_workbook::<Xls<_>>(filename, data),
        }
    }

    fn parse_csv(&self, filename: &str, data: &[u8]) -> BomResult<PartTable> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| BomError::format(filename, format!("failed to read CSV header: {}", e)))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows: Vec<Vec<CellValue>> = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                BomError::format(filename, format!("row {}: {}", idx + 2, e))
            })?;
            rows.push(record.iter().map(CellValue::from_text).collect());
        }

        PartTable::from_sheet(filename, headers, rows, &self.columns)
    }

    /// Reads the first worksheet; its first row is the header.
    fn parse_workbook<R>(&self, filename: &str, data: Vec<u8>) -> BomResult<PartTable>
    where
        R: Reader<Cursor<Vec<u8>>>,
        R::Error: std::fmt::Display,
    {
        let mut workbook: R = open_workbook_from_rs(Cursor::new(data))
            .map_err(|e| BomError::format(filename, format!("failed to open workbook: {}", e)))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| BomError::format(filename, "no sheets found in workbook"))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .ok_or_else(|| BomError::format(filename, format!("worksheet '{}' is missing", sheet_name)))?
            .map_err(|e| BomError::format(filename, format!("failed to read worksheet: {}", e)))?;

        let mut rows_iter = range.rows();
        let headers: Vec<String> = rows_iter
            .next()
            .ok_or_else(|| BomError::format(filename, "empty worksheet"))?
            .iter()
            .map(|cell| cell.to_string())
            .collect();

        let rows: Vec<Vec<CellValue>> = rows_iter
            .map(|row| row.iter().map(cell_value).collect())
            .collect();

        PartTable::from_sheet(filename, headers, rows, &self.columns)
    }
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Empty,
        DataType::String(s) => CellValue::from_text(s),
        DataType::Float(f) => CellValue::Number(*f),
        DataType::Int(i) => CellValue::Number(*i as f64),
        DataType::Bool(b) => CellValue::Bool(*b),
        other => CellValue::from_text(&other.to_string()),
    }
}
