use thiserror::Error;

/// Result type for spreadsheet operations.
pub type Result<T> = std::result::Result<T, SheetError>;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to read spreadsheet: {0}")]
    Read(#[from] calamine::XlsxError),
    #[error("failed to write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("spreadsheet has no sheets")]
    NoSheets,
    #[error("{0} codes exceed the sheet row limit of {1}")]
    TooManyRows(usize, usize),
}
