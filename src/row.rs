//! In-memory projections of table tuples.

use crate::sqlite::Value;
use crate::trucks::TruckRow;
use chrono::Utc;
use serde::Serialize;

/// Primary key reported by a row that has never been persisted.
pub const UNPERSISTED_ID: i64 = -1;

/// One tuple of a table, stamped with the time it was built.
pub trait Row {
    /// Milliseconds since the Unix epoch at construction. Never changes.
    fn queried_on(&self) -> i64;

    /// Column values in schema order.
    fn project(&self) -> Vec<Value>;

    /// Integer primary key, or [`UNPERSISTED_ID`] before the row is persisted.
    fn get_id(&self) -> i64;

    fn is_persisted(&self) -> bool {
        self.get_id() != UNPERSISTED_ID
    }
}

/// Current wall-clock time in milliseconds, used for `queried_on`.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Any row type produced by a table in this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum AnyRow {
    Truck(TruckRow),
}

impl Row for AnyRow {
    fn queried_on(&self) -> i64 {
        match self {
            AnyRow::Truck(row) => row.queried_on(),
        }
    }

    fn project(&self) -> Vec<Value> {
        match self {
            AnyRow::Truck(row) => row.project(),
        }
    }

    fn get_id(&self) -> i64 {
        match self {
            AnyRow::Truck(row) => row.get_id(),
        }
    }
}

impl From<TruckRow> for AnyRow {
    fn from(row: TruckRow) -> Self {
        AnyRow::Truck(row)
    }
}
