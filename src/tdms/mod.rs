//! Minimal reader for the TDMS container format: little-endian segments,
//! non-interleaved raw data, standard raw data indexes.

pub mod reader;
pub mod table;
pub mod types;

pub use reader::TdmsFile;
pub use table::{Column, GroupTable};
pub use types::{ObjectPath, TdsType, Value};
