//! Query construction.
//!
//! Filters are expressed as `(Column, QueryOperator)` pairs and rendered into
//! statement text that only ever contains column expressions from [`Column`],
//! operators and named placeholders. Every value travels separately in
//! [`Params`].

use std::collections::HashMap;

use crate::value::{Params, Value};

/// Departure delay, in minutes, at or above which a flight counts as delayed.
pub const DELAY_THRESHOLD_MINUTES: i64 = 20;

// Departure delay as whole minutes, or NULL when unknown. Integer and real
// cells are rounded. Text cells count only when they hold a plain decimal
// number (optional sign, digits, at most one dot); blanks, "NA" and the like
// become NULL. Filters and the projection share this expression, so a row
// that passes a delay filter always decodes to the delay it was filtered on.
macro_rules! delay_minutes_sql {
    () => {
        "(CASE \
         WHEN typeof(flights.DEPARTURE_DELAY) IN ('integer', 'real') \
         THEN CAST(round(flights.DEPARTURE_DELAY) AS INTEGER) \
         WHEN typeof(flights.DEPARTURE_DELAY) = 'text' \
         AND ltrim(trim(flights.DEPARTURE_DELAY), '+-') GLOB '[0-9]*' \
         AND ltrim(trim(flights.DEPARTURE_DELAY), '+-') NOT GLOB '*[^0-9.]*' \
         AND length(trim(flights.DEPARTURE_DELAY)) \
         - length(ltrim(trim(flights.DEPARTURE_DELAY), '+-')) <= 1 \
         AND length(trim(flights.DEPARTURE_DELAY)) \
         - length(replace(trim(flights.DEPARTURE_DELAY), '.', '')) <= 1 \
         THEN CAST(round(CAST(trim(flights.DEPARTURE_DELAY) AS REAL)) AS INTEGER) \
         END)"
    };
}

/// Normalized departure delay, see [`Column::DepartureDelay`].
pub const DELAY_MINUTES: &str = delay_minutes_sql!();

/// Projection shared by every flight-returning statement. Column order is
/// what `store::flight_from_row` reads.
pub const FLIGHT_SELECT: &str = concat!(
    "SELECT flights.ID, flights.YEAR, flights.MONTH, flights.DAY, ",
    "airlines.AIRLINE, flights.ORIGIN_AIRPORT, flights.DESTINATION_AIRPORT, ",
    delay_minutes_sql!(),
    " FROM flights JOIN airlines ON flights.AIRLINE = airlines.ID"
);

/// SQL Query with typed parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Params,
}

impl SqlQuery {
    pub fn new(statement: &str) -> Self {
        Self {
            statement: statement.to_string(),
            params: Params::new(),
        }
    }
}

/// Columns a flight query may filter or order on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Year,
    Month,
    Day,
    /// Airline name, from the joined `airlines` table.
    Airline,
    OriginAirport,
    /// Whole minutes, NULL when the cell holds no number.
    DepartureDelay,
}

impl Column {
    pub fn sql(self) -> &'static str {
        match self {
            Column::Id => "flights.ID",
            Column::Year => "flights.YEAR",
            Column::Month => "flights.MONTH",
            Column::Day => "flights.DAY",
            Column::Airline => "airlines.AIRLINE",
            Column::OriginAirport => "flights.ORIGIN_AIRPORT",
            Column::DepartureDelay => DELAY_MINUTES,
        }
    }

    fn param_stem(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Year => "year",
            Column::Month => "month",
            Column::Day => "day",
            Column::Airline => "airline",
            Column::OriginAirport => "origin",
            Column::DepartureDelay => "delay",
        }
    }
}

/// Query operators for building flight filters
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Equal(Value),
    /// NULL never satisfies this, so unknown values drop out.
    GreaterThanOrEqual(Value),
}

/// Conjunction of column conditions, rendered in insertion order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    pub conditions: Vec<(Column, QueryOperator)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, column: Column, op: QueryOperator) -> Self {
        self.conditions.push((column, op));
        self
    }

    pub fn with_equal(self, column: Column, value: impl Into<Value>) -> Self {
        self.with_condition(column, QueryOperator::Equal(value.into()))
    }

    /// Restrict to flights whose departure delay is known and at least
    /// `threshold` minutes.
    pub fn delayed_at_least(self, threshold: i64) -> Self {
        self.with_condition(
            Column::DepartureDelay,
            QueryOperator::GreaterThanOrEqual(Value::Integer(threshold)),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render the conditions joined with `AND`, binding each value into
    /// `params` under a fresh placeholder.
    pub fn render(&self, params: &mut Params) -> String {
        let mut placeholders = Placeholders::default();
        let clauses: Vec<String> = self
            .conditions
            .iter()
            .map(|(column, op)| render_condition(*column, op, params, &mut placeholders))
            .collect();
        clauses.join(" AND ")
    }
}

fn render_condition(
    column: Column,
    op: &QueryOperator,
    params: &mut Params,
    placeholders: &mut Placeholders,
) -> String {
    let col = column.sql();
    let (symbol, value) = match op {
        QueryOperator::Equal(v) => ("=", v),
        QueryOperator::GreaterThanOrEqual(v) => (">=", v),
    };
    let name = placeholders.next(column.param_stem());
    params.insert(&name, value.clone());
    format!("{col} {symbol} {name}")
}

/// Hands out `:stem`, `:stem_2`, `:stem_3`, ... so repeated columns never
/// collide.
#[derive(Default)]
struct Placeholders {
    used: HashMap<&'static str, usize>,
}

impl Placeholders {
    fn next(&mut self, stem: &'static str) -> String {
        let count = self.used.entry(stem).or_insert(0);
        *count += 1;
        if *count == 1 {
            format!(":{stem}")
        } else {
            format!(":{stem}_{count}")
        }
    }
}

/// A flight read: the joined flight projection narrowed by a [`Query`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReadOperation {
    pub query: Query,
    pub order_by: Vec<(Column, bool)>, // (column, is_ascending)
    pub limit: Option<u32>,
}

impl ReadOperation {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, column: Column, ascending: bool) -> Self {
        self.order_by.push((column, ascending));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_sql(&self) -> SqlQuery {
        let mut params = Params::new();
        let mut statement = FLIGHT_SELECT.to_string();
        if !self.query.is_empty() {
            statement.push_str(" WHERE ");
            statement.push_str(&self.query.render(&mut params));
        }
        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, asc)| {
                    format!("{} {}", column.sql(), if *asc { "ASC" } else { "DESC" })
                })
                .collect();
            statement.push_str(" ORDER BY ");
            statement.push_str(&order.join(", "));
        }
        if let Some(limit) = self.limit {
            statement.push_str(" LIMIT :limit");
            params.insert("limit", limit);
        }
        SqlQuery { statement, params }
    }
}

/// Distinct airline names, ascending.
pub fn all_airlines() -> SqlQuery {
    SqlQuery::new("SELECT DISTINCT AIRLINE FROM airlines ORDER BY AIRLINE")
}

/// Per-airline flight totals and the number of those delayed by at least
/// `threshold` minutes. Airlines without flights drop out of the join.
pub fn delay_report(threshold: i64) -> SqlQuery {
    let mut params = Params::new();
    let delayed = Query::new().delayed_at_least(threshold).render(&mut params);
    let statement = format!(
        "SELECT airlines.AIRLINE, COUNT(*), \
         SUM(CASE WHEN {delayed} THEN 1 ELSE 0 END) \
         FROM flights JOIN airlines ON flights.AIRLINE = airlines.ID \
         GROUP BY airlines.AIRLINE ORDER BY airlines.AIRLINE"
    );
    SqlQuery { statement, params }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_conditions_use_placeholders() {
        let sql = ReadOperation::new(
            Query::new()
                .with_equal(Column::Day, 15)
                .with_equal(Column::Month, 6)
                .with_equal(Column::Year, 2015),
        )
        .order_by(Column::Id, true)
        .to_sql();

        assert_eq!(
            sql.statement,
            format!(
                "{FLIGHT_SELECT} WHERE flights.DAY = :day AND flights.MONTH = :month \
                 AND flights.YEAR = :year ORDER BY flights.ID ASC"
            )
        );
        assert_eq!(sql.params.get("day"), Some(&Value::Integer(15)));
        assert_eq!(sql.params.get("year"), Some(&Value::Integer(2015)));
    }

    #[test]
    fn bound_values_never_reach_statement_text() {
        let payload = "O'Hare\"; DROP TABLE flights; --";
        let sql = ReadOperation::new(
            Query::new()
                .with_equal(Column::Airline, payload)
                .with_equal(Column::OriginAirport, payload),
        )
        .to_sql();

        assert!(!sql.statement.contains("DROP"));
        assert!(!sql.statement.contains("O'Hare"));
        assert_eq!(sql.params.get("airline"), Some(&Value::from(payload)));
        assert_eq!(sql.params.get("origin"), Some(&Value::from(payload)));
    }

    #[test]
    fn repeated_columns_get_distinct_placeholders() {
        let mut params = Params::new();
        let clause = Query::new()
            .with_equal(Column::OriginAirport, "JFK")
            .with_equal(Column::OriginAirport, "LGA")
            .render(&mut params);
        assert_eq!(
            clause,
            "flights.ORIGIN_AIRPORT = :origin AND flights.ORIGIN_AIRPORT = :origin_2"
        );
        assert_eq!(params.get("origin"), Some(&Value::from("JFK")));
        assert_eq!(params.get("origin_2"), Some(&Value::from("LGA")));
    }

    #[test]
    fn delay_filter_compares_normalized_minutes() {
        let mut params = Params::new();
        let clause = Query::new().delayed_at_least(20).render(&mut params);
        assert_eq!(clause, format!("{DELAY_MINUTES} >= :delay"));
        assert_eq!(params.get("delay"), Some(&Value::Integer(20)));
    }

    #[test]
    fn limit_is_bound() {
        let sql = ReadOperation::new(Query::new().with_equal(Column::Id, 7))
            .limit(1)
            .to_sql();
        assert!(sql.statement.ends_with("WHERE flights.ID = :id LIMIT :limit"));
        assert_eq!(sql.params.get("limit"), Some(&Value::Integer(1)));
    }

    #[test]
    fn delay_report_binds_threshold() {
        let sql = delay_report(DELAY_THRESHOLD_MINUTES);
        assert!(sql.statement.contains("GROUP BY airlines.AIRLINE"));
        assert!(sql.statement.contains(">= :delay THEN 1"));
        assert_eq!(
            sql.params.get("delay"),
            Some(&Value::Integer(DELAY_THRESHOLD_MINUTES))
        );
    }

    #[test]
    fn delay_expression_normalizes_cells() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE flights (DEPARTURE_DELAY TEXT);")
            .unwrap();
        let cases: &[(rusqlite::types::Value, Option<i64>)] = &[
            (rusqlite::types::Value::Integer(-3), Some(-3)),
            (rusqlite::types::Value::Real(44.6), Some(45)),
            (rusqlite::types::Value::Text("100".into()), Some(100)),
            (rusqlite::types::Value::Text(" 5 ".into()), Some(5)),
            (rusqlite::types::Value::Text("-12.5".into()), Some(-13)),
            (rusqlite::types::Value::Text("+7".into()), Some(7)),
            (rusqlite::types::Value::Text("".into()), None),
            (rusqlite::types::Value::Text(" ".into()), None),
            (rusqlite::types::Value::Text("NA".into()), None),
            (rusqlite::types::Value::Text("25abc".into()), None),
            (rusqlite::types::Value::Text("1.2.3".into()), None),
            (rusqlite::types::Value::Text("+-5".into()), None),
            (rusqlite::types::Value::Null, None),
        ];
        let sql = format!("SELECT {DELAY_MINUTES} FROM flights");
        for (cell, expected) in cases {
            conn.execute("DELETE FROM flights", []).unwrap();
            conn.execute("INSERT INTO flights (DEPARTURE_DELAY) VALUES (?1)", [cell])
                .unwrap();
            let minutes: Option<i64> = conn.query_row(&sql, [], |row| row.get(0)).unwrap();
            assert_eq!(minutes, *expected, "cell {cell:?}");
        }
    }
}
