use crate::error::{Result, SheetError};
use eanvault_core::Ean13;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::debug;

/// Name of the single exported sheet.
pub const SHEET_NAME: &str = "Codes";

const MAX_ROWS: usize = 1_048_576;

/// Writes `codes` to an `.xlsx` file at `path`.
pub fn write_codes(path: impl AsRef<Path>, codes: &[Ean13]) -> Result<()> {
    let mut workbook = build_workbook(codes)?;
    workbook.save(path.as_ref())?;
    debug!(path = %path.as_ref().display(), rows = codes.len(), "exported codes");
    Ok(())
}

/// Renders `codes` as `.xlsx` file content.
pub fn to_xlsx(codes: &[Ean13]) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(codes)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(codes: &[Ean13]) -> Result<Workbook> {
    if codes.len() > MAX_ROWS {
        return Err(SheetError::TooManyRows(codes.len(), MAX_ROWS));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    // String cells keep leading zeros.
    for (row, code) in (0u32..).zip(codes) {
        worksheet.write_string(row, 0, code.as_str())?;
    }

    Ok(workbook)
}
