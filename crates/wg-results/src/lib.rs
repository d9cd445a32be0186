//! wg-results: device output tables and their relational store.

pub mod hash;
pub mod memory;
pub mod naming;
pub mod sqlite;
pub mod store;
pub mod types;

pub use hash::compute_params_fingerprint;
pub use memory::MemoryStore;
pub use naming::{OUTPUT_TABLE_PREFIX, output_table_name, parse_output_table_name};
pub use sqlite::SqliteStore;
pub use store::OutputStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Output table not found: {table}")]
    TableNotFound { table: String },

    #[error("Output table {table} lacks required columns: {columns}")]
    MissingColumns { table: String, columns: String },

    #[error("Column {column} has {actual} values for {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate output column: {0}")]
    DuplicateColumn(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Corrupt run manifest: {message}")]
    CorruptManifest { message: String },

    #[error("Invalid store path: {message}")]
    InvalidPath { message: String },
}
