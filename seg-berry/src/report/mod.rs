//! 结果的表格化输出. 字段的引号与转义由 `csv` 负责.

pub mod header;
mod table;

pub use header::{write_header_records, write_header_table, HeaderRecord, HEADER_COLUMNS};
pub use table::{fmt_f64, TableWriter};
