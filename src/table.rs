use crate::error::{Result, TableError};
use crate::row::Row;
use crate::sqlite::ConnectionProvider;

/// Read access to one SQL table, producing rows of a single type.
///
/// Every call opens its own session and releases it before returning, on
/// success and on error alike. Implementations hold no session in between.
pub trait Table {
    type Row: Row;

    /// Name of the table in the SQL catalog.
    fn tbl_name(&self) -> &str;

    /// Provider used to open a session per call.
    fn provider(&self) -> &ConnectionProvider;

    /// Location of the database, as configured.
    fn db_path(&self) -> &str {
        &self.provider().config().db_path
    }

    /// Every row of the table, in the engine's scan order.
    fn select_all(&self) -> Result<Vec<Self::Row>>;

    /// The row with primary key `id`, or `None` when there is none.
    fn select_by_id(&self, id: i64) -> Result<Option<Self::Row>>;
}

/// Table names are spliced into SQL text, so only plain identifiers are accepted.
pub(crate) fn check_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(TableError::InvalidTableName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["trucks", "_staging", "fleet_2024", "T"] {
            assert!(check_table_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for name in ["", "2trucks", "trucks; DROP TABLE trucks", "my trucks", "\"trucks\"", "trücks"] {
            assert!(
                matches!(check_table_name(name), Err(TableError::InvalidTableName(_))),
                "{name}"
            );
        }
    }
}
