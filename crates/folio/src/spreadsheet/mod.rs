//! Workbook reading (`calamine`) and writing (`rust_xlsxwriter`).
pub mod reader;
pub mod writer;

pub use reader::{CellValue, Sheet, read_workbook};
pub use writer::{rows_to_xlsx, write_rows};
