//! Tabular and document artifacts written by the pipelines

pub mod writer;

pub use writer::{read_csv_records, write_json_document, CsvSink};
