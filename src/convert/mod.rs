pub mod converter;
pub mod csv_writer;
pub mod report;

pub use converter::{output_path, sanitize_group_name, ConversionResult, FileConverter};
pub use csv_writer::{split_segments, write_table_chunked};
pub use report::{BatchSummary, Verdict};
