//! The `trucks` table: three columns keyed by an auto-assigned `truck_id`.

use crate::error::{Result, TableError};
use crate::row::{now_millis, Row, UNPERSISTED_ID};
use crate::sqlite::{
    ColumnConstraint, ColumnDefinition, ConnectionProvider, DataType, SqliteConfig,
    TableDefinition, Value,
};
use crate::table::{check_table_name, Table};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

pub const TRUCK_ID: &str = "truck_id";
pub const WEEKS_SINCE_LAST_SERVICE: &str = "weeks_since_last_service";
pub const ENGINE_MAKE: &str = "engine_make";

/// One truck, either read from the table or waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruckRow {
    queried_on: i64,
    truck_id: Option<i64>,
    weeks_since_last_service: i64,
    engine_make: String,
}

impl TruckRow {
    /// A truck that is not in the table yet. Its id stays unknown until it is read back.
    pub fn new(weeks_since_last_service: i64, engine_make: impl Into<String>) -> Self {
        Self {
            queried_on: now_millis(),
            truck_id: None,
            weeks_since_last_service,
            engine_make: engine_make.into(),
        }
    }

    /// A truck that already exists in the table under `truck_id`.
    pub fn hydrated(
        truck_id: i64,
        weeks_since_last_service: i64,
        engine_make: impl Into<String>,
    ) -> Self {
        Self {
            queried_on: now_millis(),
            truck_id: Some(truck_id),
            weeks_since_last_service,
            engine_make: engine_make.into(),
        }
    }

    /// Build a hydrated row from a result tuple, looking columns up by name.
    pub fn from_sql_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self::hydrated(
            row.get(TRUCK_ID)?,
            row.get(WEEKS_SINCE_LAST_SERVICE)?,
            row.get::<_, String>(ENGINE_MAKE)?,
        ))
    }

    pub fn truck_id(&self) -> Option<i64> {
        self.truck_id
    }

    pub fn weeks_since_last_service(&self) -> i64 {
        self.weeks_since_last_service
    }

    pub fn set_weeks_since_last_service(&mut self, weeks: i64) {
        self.weeks_since_last_service = weeks;
    }

    pub fn engine_make(&self) -> &str {
        &self.engine_make
    }

    pub fn set_engine_make(&mut self, engine_make: impl Into<String>) {
        self.engine_make = engine_make.into();
    }
}

impl Row for TruckRow {
    fn queried_on(&self) -> i64 {
        self.queried_on
    }

    fn project(&self) -> Vec<Value> {
        vec![
            Value::from(self.truck_id),
            Value::Integer(self.weeks_since_last_service),
            Value::Text(self.engine_make.clone()),
        ]
    }

    fn get_id(&self) -> i64 {
        self.truck_id.unwrap_or(UNPERSISTED_ID)
    }
}

/// Handle on a trucks table in a SQLite database.
///
/// The table name is inlined into every statement. It is checked to be a plain
/// identifier on construction and must come from configuration, not user input.
#[derive(Debug, Clone)]
pub struct TruckTable {
    tbl_name: String,
    provider: ConnectionProvider,
}

impl TruckTable {
    pub fn new(tbl_name: impl Into<String>, config: SqliteConfig) -> Result<Self> {
        Self::with_provider(tbl_name, ConnectionProvider::new(config))
    }

    /// Build the table on an existing provider, sharing its session count.
    pub fn with_provider(tbl_name: impl Into<String>, provider: ConnectionProvider) -> Result<Self> {
        let tbl_name = tbl_name.into();
        check_table_name(&tbl_name)?;
        Ok(Self { tbl_name, provider })
    }

    /// Schema of this table, for bootstrapping an empty database.
    pub fn definition(&self) -> TableDefinition {
        TableDefinition::new(&self.tbl_name)
            .with_column(
                ColumnDefinition::new(TRUCK_ID, DataType::Integer)
                    .with_constraint(ColumnConstraint::PrimaryKey),
            )
            .with_column(ColumnDefinition::new(WEEKS_SINCE_LAST_SERVICE, DataType::Integer))
            .with_column(ColumnDefinition::new(ENGINE_MAKE, DataType::Text))
    }

    /// Insert `row`, letting SQLite assign `truck_id`.
    ///
    /// `row` itself is left untouched: a fresh row keeps reporting
    /// [`UNPERSISTED_ID`] and has to be read back to learn its id.
    pub fn insert_row(&self, row: &TruckRow) -> Result<()> {
        let sql = format!(
            "INSERT INTO {}({WEEKS_SINCE_LAST_SERVICE}, {ENGINE_MAKE}) VALUES (?, ?)",
            self.tbl_name
        );
        let truck_id = self.run(&sql, |conn, sql| {
            conn.execute(
                sql,
                params![row.weeks_since_last_service(), row.engine_make()],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        info!(table = %self.tbl_name, truck_id, "inserted truck");
        Ok(())
    }

    /// Open a session, run one statement through `op`, and close the session.
    fn run<T>(
        &self,
        sql: &str,
        op: impl FnOnce(&Connection, &str) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let session = self.provider.connect()?;
        let conn: &Connection = &session;
        debug!(table = %self.tbl_name, %sql, "executing statement");
        op(conn, sql).map_err(|err| {
            warn!(table = %self.tbl_name, %sql, error = %err, "statement failed");
            TableError::from(err)
        })
    }
}

impl Table for TruckTable {
    type Row = TruckRow;

    fn tbl_name(&self) -> &str {
        &self.tbl_name
    }

    fn provider(&self) -> &ConnectionProvider {
        &self.provider
    }

    fn select_all(&self) -> Result<Vec<TruckRow>> {
        let sql = format!("SELECT * FROM {}", self.tbl_name);
        self.run(&sql, |conn, sql| {
            let mut statement = conn.prepare(sql)?;
            let rows = statement
                .query_map([], TruckRow::from_sql_row)?
                .collect::<rusqlite::Result<Vec<_>>>();
            rows
        })
    }

    fn select_by_id(&self, id: i64) -> Result<Option<TruckRow>> {
        let sql = format!("SELECT * FROM {} WHERE {TRUCK_ID} = {id}", self.tbl_name);
        self.run(&sql, |conn, sql| {
            conn.query_row(sql, [], TruckRow::from_sql_row).optional()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_row_reports_sentinel_id() {
        let row = TruckRow::new(5, "Mack");
        assert_eq!(row.get_id(), UNPERSISTED_ID);
        assert_eq!(row.truck_id(), None);
        assert_eq!(
            row.project(),
            vec![Value::Null, Value::Integer(5), Value::Text("Mack".to_string())]
        );
    }

    #[test]
    fn hydrated_row_projects_in_schema_order() {
        let row = TruckRow::hydrated(12, 9, "Caterpillar");
        assert_eq!(row.get_id(), 12);
        assert_eq!(
            row.project(),
            vec![
                Value::Integer(12),
                Value::Integer(9),
                Value::Text("Caterpillar".to_string())
            ]
        );
    }

    #[test]
    fn setters_leave_id_and_timestamp_alone() {
        let mut row = TruckRow::hydrated(3, 1, "Ford");
        let stamp = row.queried_on();
        row.set_weeks_since_last_service(20);
        row.set_engine_make("Cummins");
        assert_eq!(row.weeks_since_last_service(), 20);
        assert_eq!(row.engine_make(), "Cummins");
        assert_eq!(row.get_id(), 3);
        assert_eq!(row.queried_on(), stamp);
    }

    #[test]
    fn definition_matches_trucks_schema() {
        let table = TruckTable::new("trucks", SqliteConfig::new("unused.db")).unwrap();
        assert_eq!(
            table.definition().create_sql(),
            "CREATE TABLE IF NOT EXISTS trucks (truck_id INTEGER PRIMARY KEY, weeks_since_last_service INTEGER, engine_make TEXT)"
        );
    }

    #[test]
    fn rejects_unsafe_table_name() {
        let err = TruckTable::new("trucks--", SqliteConfig::new("unused.db")).unwrap_err();
        assert!(matches!(err, TableError::InvalidTableName(name) if name == "trucks--"));
    }

    #[test]
    fn table_exposes_name_and_path() {
        let table = TruckTable::new("fleet", SqliteConfig::new("sqlite:fleet.db")).unwrap();
        assert_eq!(table.tbl_name(), "fleet");
        assert_eq!(table.db_path(), "sqlite:fleet.db");
    }

    #[test]
    fn serializes_with_public_field_names() {
        let json = serde_json::to_value(TruckRow::hydrated(1, 3, "International")).unwrap();
        assert_eq!(json["truck_id"], 1);
        assert_eq!(json["weeks_since_last_service"], 3);
        assert_eq!(json["engine_make"], "International");
    }
}
