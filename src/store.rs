use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::flight::{AirlineDelayStats, Flight, FlightDate};
use crate::query::SqlQuery;
use crate::schema::{self, Schema};

/// Read handle on the flight dataset.
///
/// Created once and passed to every query function. Each call prepares its
/// own statement, and the statement is finalized before the call returns on
/// every path. The connection itself is closed when the store is dropped or
/// [`FlightStore::close`]d.
#[derive(Debug)]
pub struct FlightStore {
    conn: Connection,
}

impl FlightStore {
    /// Open the database named by `config` and check it has the dataset's
    /// tables and columns.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(config.path(), flags).map_err(|e| {
            Error::StoreUnavailable {
                message: format!("cannot open {}: {e}", config.path().display()),
                source: Some(e),
            }
        })?;
        let store = Self::from_connection(conn)?;
        info!(path = %config.path().display(), "opened flight store");
        Ok(store)
    }

    /// Wrap an already open connection, e.g. an in-memory fixture.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        verify_schema(&conn, &schema::flight_dataset())?;
        Ok(Self { conn })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    pub fn query_flights(&self, query: &SqlQuery) -> Result<Vec<Flight>> {
        self.query_map(query, flight_from_row)
    }

    pub fn query_optional_flight(&self, query: &SqlQuery) -> Result<Option<Flight>> {
        log_query(query);
        let mut stmt = self.conn.prepare(&query.statement)?;
        let named = query.params.as_named();
        let flight = stmt
            .query_row(named.as_slice(), flight_from_row)
            .optional()?;
        Ok(flight)
    }

    /// Rows whose first column is read as text.
    pub fn query_strings(&self, query: &SqlQuery) -> Result<Vec<String>> {
        self.query_map(query, |row| Ok(text_of(row.get_ref(0)?)))
    }

    /// Rows of `(airline, total, delayed)`.
    pub fn query_delay_stats(&self, query: &SqlQuery) -> Result<Vec<AirlineDelayStats>> {
        self.query_map(query, |row| {
            let airline = text_of(row.get_ref(0)?);
            let total: i64 = row.get(1)?;
            let delayed: Option<i64> = row.get(2)?;
            Ok(AirlineDelayStats::new(
                airline,
                total.max(0) as u64,
                delayed.unwrap_or(0).max(0) as u64,
            ))
        })
    }

    fn query_map<T, F>(&self, query: &SqlQuery, f: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        log_query(query);
        let mut stmt = self.conn.prepare(&query.statement)?;
        let named = query.params.as_named();
        let rows = stmt.query_map(named.as_slice(), f)?;
        let result = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(result)
    }
}

fn log_query(query: &SqlQuery) {
    debug!(
        statement = %query.statement,
        params = ?query.params.names().collect::<Vec<_>>(),
        "executing query"
    );
}

/// Fail unless every table and column in `schema` exists with a declared
/// type the column's data type accepts. Column names are compared
/// case-insensitively, as SQLite resolves them.
fn verify_schema(conn: &Connection, schema: &Schema) -> Result<()> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
    for table in &schema.tables {
        let present = stmt
            .query_map([&table.name], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if present.is_empty() {
            return Err(Error::store_unavailable(format!(
                "missing table '{}'",
                table.name
            )));
        }
        for column in &table.columns {
            let declared = present
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&column.name))
                .map(|(_, declared)| declared.as_str())
                .ok_or_else(|| {
                    Error::store_unavailable(format!(
                        "table '{}' has no column '{}'",
                        table.name, column.name
                    ))
                })?;
            if !column.data_type.accepts(declared) {
                return Err(Error::store_unavailable(format!(
                    "column '{}.{}' is declared '{}', expected {}",
                    table.name,
                    column.name,
                    declared,
                    column.data_type.sql()
                )));
            }
        }
    }
    Ok(())
}

/// Column order follows [`crate::query::FLIGHT_SELECT`].
fn flight_from_row(row: &Row<'_>) -> rusqlite::Result<Flight> {
    Ok(Flight {
        id: row.get(0)?,
        date: FlightDate {
            year: row.get(1)?,
            month: row.get(2)?,
            day: row.get(3)?,
        },
        airline: text_of(row.get_ref(4)?),
        origin_airport: text_of(row.get_ref(5)?),
        destination_airport: text_of(row.get_ref(6)?),
        delay: row.get(7)?,
    })
}

/// Some airports in the raw export are numeric ids rather than IATA codes,
/// so text columns are read leniently.
fn text_of(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Null | ValueRef::Blob(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_airports_read_as_text() {
        assert_eq!(text_of(ValueRef::Integer(10397)), "10397");
        assert_eq!(text_of(ValueRef::Text(b"ATL")), "ATL");
    }

    #[test]
    fn missing_tables_are_reported() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE airlines (ID TEXT PRIMARY KEY, AIRLINE TEXT NOT NULL);",
        )
        .unwrap();
        let err = FlightStore::from_connection(conn).unwrap_err();
        assert_eq!(err.to_string(), "store unavailable: missing table 'flights'");
    }

    #[test]
    fn missing_columns_are_reported() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE airlines (ID TEXT PRIMARY KEY, AIRLINE TEXT NOT NULL);
             CREATE TABLE flights (ID INTEGER PRIMARY KEY, YEAR INTEGER);",
        )
        .unwrap();
        let err = FlightStore::from_connection(conn).unwrap_err();
        assert_eq!(
            err.to_string(),
            "store unavailable: table 'flights' has no column 'MONTH'"
        );
    }

    #[test]
    fn text_date_columns_are_rejected_at_open() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE airlines (ID TEXT PRIMARY KEY, AIRLINE TEXT NOT NULL);
             CREATE TABLE flights (ID INTEGER PRIMARY KEY, YEAR TEXT, MONTH TEXT, DAY TEXT,
                 AIRLINE TEXT, FLIGHT_NUMBER TEXT, ORIGIN_AIRPORT TEXT,
                 DESTINATION_AIRPORT TEXT, DEPARTURE_DELAY TEXT);",
        )
        .unwrap();
        let err = FlightStore::from_connection(conn).unwrap_err();
        assert_eq!(
            err.to_string(),
            "store unavailable: column 'flights.YEAR' is declared 'TEXT', expected INTEGER"
        );
    }

    #[test]
    fn text_delay_and_flight_number_columns_are_accepted() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE airlines (ID TEXT PRIMARY KEY, AIRLINE TEXT NOT NULL);
             CREATE TABLE flights (ID INTEGER PRIMARY KEY, YEAR INTEGER, MONTH INTEGER,
                 DAY BIGINT, AIRLINE TEXT, FLIGHT_NUMBER TEXT, ORIGIN_AIRPORT TEXT,
                 DESTINATION_AIRPORT TEXT, DEPARTURE_DELAY TEXT);",
        )
        .unwrap();
        assert!(FlightStore::from_connection(conn).is_ok());
    }
}
