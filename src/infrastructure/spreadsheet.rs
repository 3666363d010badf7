//! Spreadsheet codec: calamine for reading, rust_xlsxwriter for writing
//!
//! Rows are field maps keyed by the header row; every cell is carried as
//! text so that passthrough columns survive unchanged.

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;
use std::path::Path;

use crate::domain::job::SpreadsheetRow;
use crate::domain::services::SpreadsheetCodec;

pub const RESULT_SHEET_NAME: &str = "Processed Results";

#[derive(Debug, Clone, Default)]
pub struct XlsxSpreadsheetCodec;

impl XlsxSpreadsheetCodec {
    pub fn new() -> Self {
        Self
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Header = union of field names in first-seen order
fn collect_headers(rows: &[SpreadsheetRow]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.to_string());
            }
        }
    }
    headers
}

impl SpreadsheetCodec for XlsxSpreadsheetCodec {
    fn parse_rows(&self, path: &Path) -> Result<Vec<SpreadsheetRow>> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open spreadsheet {}", path.display()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("Spreadsheet {} has no worksheets", path.display()))?
            .with_context(|| format!("Failed to read first worksheet of {}", path.display()))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(Vec::new());
        };
        let headers: Vec<String> = header_row.iter().map(cell_text).collect();

        let parsed = rows
            .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
            .map(|cells| {
                SpreadsheetRow::from_pairs(
                    headers
                        .iter()
                        .enumerate()
                        .filter(|(_, header)| !header.is_empty())
                        .map(|(idx, header)| {
                            let value = cells.get(idx).map(cell_text).unwrap_or_default();
                            (header.clone(), value)
                        }),
                )
            })
            .collect();

        Ok(parsed)
    }

    fn write_rows(&self, path: &Path, rows: &[SpreadsheetRow]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let headers = collect_headers(rows);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(RESULT_SHEET_NAME)?;

        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, header)?;
        }
        for (row_idx, row) in rows.iter().enumerate() {
            for (col, header) in headers.iter().enumerate() {
                if let Some(value) = row.get(header) {
                    worksheet.write_string(row_idx as u32 + 1, col as u16, value)?;
                }
            }
        }

        workbook
            .save(path)
            .with_context(|| format!("Failed to write spreadsheet {}", path.display()))?;
        Ok(())
    }
}
