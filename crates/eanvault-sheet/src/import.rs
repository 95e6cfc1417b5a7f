use crate::error::{Result, SheetError};
use calamine::{open_workbook, Data, Reader, Xlsx};
use eanvault_core::{Ean13, CODE_LEN};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, warn};

/// Codes read from a spreadsheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Valid codes in row order. May contain duplicates; merging dedups.
    pub codes: Vec<Ean13>,
    /// Rows whose first cell is not a valid code.
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// Zero-based sheet row.
    pub row: u32,
    pub value: String,
    pub reason: String,
}

/// Reads the first column of the first sheet of the `.xlsx` file at `path`.
pub fn read_codes(path: impl AsRef<Path>) -> Result<ImportReport> {
    let workbook: Xlsx<_> = open_workbook(path.as_ref())?;
    read_first_column(workbook)
}

/// Same as [`read_codes`], from in-memory file content.
pub fn read_codes_from_bytes(bytes: Vec<u8>) -> Result<ImportReport> {
    let workbook = Xlsx::new(Cursor::new(bytes))?;
    read_first_column(workbook)
}

fn read_first_column<RS: Read + Seek>(mut workbook: Xlsx<RS>) -> Result<ImportReport> {
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut report = ImportReport::default();
    let (Some((first_row, _)), Some((last_row, _))) = (range.start(), range.end()) else {
        return Ok(report);
    };

    for row in first_row..=last_row {
        let Some(text) = range.get_value((row, 0)).and_then(cell_text) else {
            continue;
        };

        let value: String = text.chars().take(CODE_LEN).collect();
        match Ean13::new(value.as_str()) {
            Ok(code) => report.codes.push(code),
            Err(err) => {
                warn!(sheet = %sheet_name, row, value = %text, error = %err, "skipping row");
                report.rejected.push(RejectedRow {
                    row,
                    value: text,
                    reason: err.to_string(),
                });
            }
        }
    }

    debug!(
        sheet = %sheet_name,
        codes = report.codes.len(),
        rejected = report.rejected.len(),
        "imported codes"
    );
    Ok(report)
}

/// Coerces a cell to the text read as a code. Empty cells yield `None`.
///
/// Whole numbers are printed without decimals and left-padded with zeros to
/// 13 digits, since spreadsheets drop the leading zeros of numeric cells.
pub fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) if *i >= 0 => format!("{:0width$}", i, width = CODE_LEN),
        Data::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f < 1e13 => {
            format!("{:0width$}", *f as u64, width = CODE_LEN)
        }
        other => other.to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{to_xlsx, write_codes};
    use rust_xlsxwriter::Workbook;

    fn code(s: &str) -> Ean13 {
        Ean13::new(s).unwrap()
    }

    #[test]
    fn cell_text_coercion() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("  ".into())), None);
        assert_eq!(
            cell_text(&Data::String(" 1234567890128 ".into())).as_deref(),
            Some("1234567890128")
        );
        assert_eq!(
            cell_text(&Data::Float(1234567890128.0)).as_deref(),
            Some("1234567890128")
        );
        assert_eq!(
            cell_text(&Data::Int(42)).as_deref(),
            Some("0000000000042")
        );
        assert_eq!(cell_text(&Data::Float(1.5)).as_deref(), Some("1.5"));
    }

    #[test]
    fn exported_file_reads_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.xlsx");
        let codes = vec![
            code("1234567890128"),
            code("0000000000000"),
            code("4006381333931"),
        ];

        write_codes(&path, &codes).unwrap();
        let report = read_codes(&path).unwrap();

        assert_eq!(report.codes, codes);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn empty_export_reads_back_empty() {
        let bytes = to_xlsx(&[]).unwrap();
        let report = read_codes_from_bytes(bytes).unwrap();
        assert_eq!(report, ImportReport::default());
    }

    #[test]
    fn mixed_cells_are_coerced_and_invalid_rows_reported() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "EAN").unwrap();
        sheet.write_number(1, 0, 4006381333931.0).unwrap();
        // row 2 left empty
        sheet.write_string(3, 0, "12345678901280000").unwrap();
        sheet.write_string(4, 0, "1234567890123").unwrap();
        sheet.write_string(5, 1, "4006381333931").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let report = read_codes_from_bytes(bytes).unwrap();

        // long values are truncated to 13 characters; column B is ignored
        assert_eq!(
            report.codes,
            vec![code("4006381333931"), code("1234567890128")]
        );
        let rejected: Vec<u32> = report.rejected.iter().map(|r| r.row).collect();
        assert_eq!(rejected, vec![0, 4]);
        assert_eq!(report.rejected[0].value, "EAN");
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_codes(dir.path().join("missing.xlsx")).unwrap_err();
        assert!(matches!(err, SheetError::Read(_)));
    }
}
