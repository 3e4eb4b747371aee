//! Row and table types over a SQLite `trucks` table.
//!
//! # Intention
//!
//! - Represent table tuples as [`row::Row`] values and tables as [`table::Table`] handles.
//! - Open one SQLite session per operation and release it on every exit path.
//! - Return every engine error to the caller; an absent row is `Ok(None)`.
//!
//! # Architectural Boundaries
//!
//! - [`sqlite`] owns connections, configuration and schema bootstrap.
//! - [`row`] and [`table`] define the capabilities; [`trucks`] implements them.
//! - No caching, pooling, migrations or transactions beyond autocommit.

pub mod error;
pub mod row;
pub mod sqlite;
pub mod table;
pub mod trucks;

pub use error::{Result, TableError};
pub use row::{AnyRow, Row, UNPERSISTED_ID};
pub use sqlite::{create_schema, ConnectionProvider, Schema, Session, SqliteConfig, Value};
pub use table::Table;
pub use trucks::{TruckRow, TruckTable};
