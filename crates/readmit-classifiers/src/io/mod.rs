//! IO utilities for loading patient tables from delimited text files.

pub mod table;

pub use table::{read_table, validate_tsv_or_csv_file, Table};
