//! Flight lookups.
//!
//! Every function validates its input first, so a malformed argument is
//! reported as [`Error::InvalidArgument`] without touching the store. Filter
//! values are always bound parameters. An empty result, or `None` from
//! [`get_flight_by_id`], means nothing matched and is not an error.

use crate::error::{Error, Result};
use crate::flight::{AirlineDelayStats, AirportCode, Flight, FlightDate};
use crate::query::{self, Column, Query, ReadOperation, DELAY_THRESHOLD_MINUTES};
use crate::store::FlightStore;

/// Distinct airline names, ascending.
pub fn get_all_airlines(store: &FlightStore) -> Result<Vec<String>> {
    store.query_strings(&query::all_airlines())
}

/// The flight with identifier `id`, if there is one.
pub fn get_flight_by_id(store: &FlightStore, id: i64) -> Result<Option<Flight>> {
    let read = ReadOperation::new(Query::new().with_equal(Column::Id, id)).limit(1);
    store.query_optional_flight(&read.to_sql())
}

/// All flights scheduled on the given day, by identifier.
pub fn get_flights_by_date(
    store: &FlightStore,
    day: u32,
    month: u32,
    year: i32,
) -> Result<Vec<Flight>> {
    let date = FlightDate::new(day, month, year)?;
    let query = Query::new()
        .with_equal(Column::Day, date.day)
        .with_equal(Column::Month, date.month)
        .with_equal(Column::Year, date.year);
    store.query_flights(&by_id(query).to_sql())
}

/// Every flight of the named airline, delayed or not.
pub fn get_all_flights_by_airline(store: &FlightStore, airline: &str) -> Result<Vec<Flight>> {
    let query = Query::new().with_equal(Column::Airline, airline_name(airline)?);
    store.query_flights(&by_id(query).to_sql())
}

/// Flights of the named airline that left at least
/// [`DELAY_THRESHOLD_MINUTES`] late.
pub fn get_delayed_flights_by_airline(store: &FlightStore, airline: &str) -> Result<Vec<Flight>> {
    let query = Query::new()
        .with_equal(Column::Airline, airline_name(airline)?)
        .delayed_at_least(DELAY_THRESHOLD_MINUTES);
    store.query_flights(&by_id(query).to_sql())
}

/// Flights departing `airport` at least [`DELAY_THRESHOLD_MINUTES`] late.
/// The code is matched upper-cased.
pub fn get_delayed_flights_by_airport(store: &FlightStore, airport: &str) -> Result<Vec<Flight>> {
    let airport = AirportCode::parse(airport)?;
    let query = Query::new()
        .with_equal(Column::OriginAirport, airport.as_str())
        .delayed_at_least(DELAY_THRESHOLD_MINUTES);
    store.query_flights(&by_id(query).to_sql())
}

/// Share of delayed flights per airline, for airlines with at least one
/// flight.
pub fn delay_percentage_by_airline(store: &FlightStore) -> Result<Vec<AirlineDelayStats>> {
    store.query_delay_stats(&query::delay_report(DELAY_THRESHOLD_MINUTES))
}

fn by_id(query: Query) -> ReadOperation {
    ReadOperation::new(query).order_by(Column::Id, true)
}

fn airline_name(airline: &str) -> Result<&str> {
    if airline.trim().is_empty() {
        return Err(Error::invalid_argument("airline name must not be empty"));
    }
    Ok(airline)
}
