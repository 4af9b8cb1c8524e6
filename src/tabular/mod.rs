//! Tabular input and output

pub mod csv_source;
pub mod export;
pub mod file_source;
pub mod table;
pub mod workbook_source;

pub use csv_source::*;
pub use export::*;
pub use file_source::*;
pub use table::*;
pub use workbook_source::*;
