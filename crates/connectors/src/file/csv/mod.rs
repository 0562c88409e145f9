pub mod error;
pub mod workbook;
