//! Spreadsheet import and export of issued codes.
//!
//! Both directions use a single column: column A of the first sheet, one code
//! per row, no header row.

pub mod error;
pub mod export;
pub mod import;

pub use error::{Result, SheetError};
pub use export::{to_xlsx, write_codes, SHEET_NAME};
pub use import::{read_codes, read_codes_from_bytes, ImportReport, RejectedRow};
