//! Nodes that persist results to storage

pub mod csv_writer;
