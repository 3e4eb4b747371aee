use thiserror::Error;

/// Errors surfaced by sessions, tables and schema bootstrap
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Could not open database at {location}: {source}")]
    Connection {
        location: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Malformed SQL, an engine rejection, or a result row of the wrong shape.
    #[error("Statement failed: {0}")]
    Statement(#[from] rusqlite::Error),

    #[error("Invalid table name {0:?}: expected a plain SQL identifier")]
    InvalidTableName(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TableError>;
