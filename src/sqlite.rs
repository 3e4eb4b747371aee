use crate::error::{Result, TableError};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::{
    ops::Deref,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing::{debug, info};

/// Core value types for SQLite operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Environment variable holding the database location.
pub const DB_PATH_ENV: &str = "TRUCKS_DB_PATH";
/// Environment variable holding the busy timeout in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "TRUCKS_BUSY_TIMEOUT_MS";
/// Location used when nothing is configured.
pub const DEFAULT_DB_PATH: &str = "demo.db";

/// SQLite connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Location of the SQLite database: a file path, `sqlite:<path>` or a `file:` URI
    pub db_path: String,
    /// How long a session waits on a locked database before failing
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
}

impl SqliteConfig {
    /// Create a new SQLite config for the given location
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout_ms: None,
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Read the config from `TRUCKS_DB_PATH` and `TRUCKS_BUSY_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup(DB_PATH_ENV).unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let busy_timeout_ms = match lookup(BUSY_TIMEOUT_ENV) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|err| {
                TableError::Config(format!("{BUSY_TIMEOUT_ENV}={raw:?}: {err}"))
            })?),
            None => None,
        };
        Ok(Self {
            db_path,
            busy_timeout_ms,
        })
    }

    /// The location handed to SQLite, with any `sqlite:` scheme removed.
    pub fn location(&self) -> &str {
        self.db_path
            .strip_prefix("sqlite:")
            .unwrap_or(&self.db_path)
    }
}

/// Opens one SQLite session per call.
///
/// Clones share the live-session counter, so a table and the code that built
/// it observe the same count.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    config: SqliteConfig,
    live: Arc<AtomicUsize>,
}

impl ConnectionProvider {
    pub fn new(config: SqliteConfig) -> Self {
        Self {
            config,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Sessions opened by this provider that have not been dropped yet.
    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Open a new session. The session closes when dropped.
    pub fn connect(&self) -> Result<Session> {
        let location = self.config.location();
        let connection_error = |source: rusqlite::Error| TableError::Connection {
            location: location.to_string(),
            source,
        };

        let conn = Connection::open(location).map_err(connection_error)?;
        if let Some(ms) = self.config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))
                .map_err(connection_error)?;
        }

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(location, live, "opened sqlite session");
        Ok(Session {
            conn,
            live: Arc::clone(&self.live),
        })
    }
}

/// A short-lived connection owned by a single operation.
#[derive(Debug)]
pub struct Session {
    conn: Connection,
    live: Arc<AtomicUsize>,
}

impl Deref for Session {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let live = self.live.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(live, "closed sqlite session");
    }
}

/// Schema definition for the SQLite database
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    /// Render the idempotent `CREATE TABLE` statement for this table.
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ColumnDefinition::to_sql)
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.name, columns)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: ColumnConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.data_type.as_sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.as_sql());
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Text,
    Real,
    Blob,
}

impl DataType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Real => "REAL",
            DataType::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
    Unique,
}

impl ColumnConstraint {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::NotNull => "NOT NULL",
            ColumnConstraint::Unique => "UNIQUE",
        }
    }
}

/// Create every table of `schema` that does not exist yet.
///
/// Runs in autocommit mode; there is nothing to commit afterwards.
pub fn create_schema(provider: &ConnectionProvider, schema: &Schema) -> Result<()> {
    let conn = provider.connect()?;
    for table in &schema.tables {
        let sql = table.create_sql();
        info!(table = %table.name, "initializing schema");
        debug!(%sql, "executing statement");
        conn.execute(&sql, [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn renders_create_table_statement() {
        let table = TableDefinition::new("users")
            .with_column(
                ColumnDefinition::new("id", DataType::Integer)
                    .with_constraint(ColumnConstraint::PrimaryKey),
            )
            .with_column(
                ColumnDefinition::new("email", DataType::Text)
                    .with_constraint(ColumnConstraint::NotNull)
                    .with_constraint(ColumnConstraint::Unique),
            )
            .with_column(ColumnDefinition::new("score", DataType::Real));

        assert_eq!(
            table.create_sql(),
            "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, email TEXT NOT NULL UNIQUE, score REAL)"
        );
    }

    #[test]
    fn location_strips_sqlite_scheme() {
        assert_eq!(SqliteConfig::new("sqlite:demo.db").location(), "demo.db");
        assert_eq!(SqliteConfig::new("demo.db").location(), "demo.db");
        assert_eq!(
            SqliteConfig::new("file:demo.db?mode=rwc").location(),
            "file:demo.db?mode=rwc"
        );
    }

    #[test]
    fn config_from_lookup_defaults_and_overrides() {
        let empty: HashMap<&str, &str> = HashMap::new();
        let config = SqliteConfig::from_lookup(|k| empty.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config, SqliteConfig::new(DEFAULT_DB_PATH));

        let vars = HashMap::from([(DB_PATH_ENV, "/tmp/fleet.db"), (BUSY_TIMEOUT_ENV, " 250 ")]);
        let config = SqliteConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.db_path, "/tmp/fleet.db");
        assert_eq!(config.busy_timeout_ms, Some(250));
    }

    #[test]
    fn config_rejects_bad_timeout() {
        let vars = HashMap::from([(BUSY_TIMEOUT_ENV, "soon")]);
        let err = SqliteConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, TableError::Config(_)));
    }

    #[test]
    fn session_count_follows_drop() {
        let provider = ConnectionProvider::new(SqliteConfig::new(":memory:"));
        let first = provider.connect().unwrap();
        let second = provider.clone().connect().unwrap();
        assert_eq!(provider.live_sessions(), 2);
        drop(first);
        assert_eq!(provider.live_sessions(), 1);
        drop(second);
        assert_eq!(provider.live_sessions(), 0);
    }

    #[test]
    fn connect_reports_location_on_failure() {
        let provider = ConnectionProvider::new(SqliteConfig::new(
            "/nonexistent-directory/for/sure/trucks.db",
        ));
        match provider.connect() {
            Err(TableError::Connection { location, .. }) => {
                assert_eq!(location, "/nonexistent-directory/for/sure/trucks.db")
            }
            other => panic!("expected connection error, got {other:?}"),
        }
        assert_eq!(provider.live_sessions(), 0);
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from(7_i64), Value::Integer(7));
        assert_eq!(Value::from("Ford"), Value::Text("Ford".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Integer(3));
    }
}
