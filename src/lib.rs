//! Read-only queries over a SQLite flight-delay dataset.
//!
//! # Intention
//!
//! - Provide a small set of named lookups: by id, by date, by airline, by
//!   airport, delayed flights, and a per-airline delay report.
//! - Build every statement from typed criteria with bound parameters; no
//!   filter value is ever formatted into SQL text.
//!
//! # Architectural Boundaries
//!
//! - Only reads. Nothing here creates, updates or deletes rows.
//! - The store handle is passed explicitly; there is no global connection.

pub mod config;
pub mod error;
pub mod flight;
pub mod flights;
pub mod query;
pub mod schema;
pub mod store;
pub mod value;

pub use config::StoreConfig;
pub use error::{Error, ErrorKind, Result};
pub use flight::{parse_flight_id, AirlineDelayStats, AirportCode, Flight, FlightDate};
pub use flights::{
    delay_percentage_by_airline, get_all_airlines, get_all_flights_by_airline,
    get_delayed_flights_by_airline, get_delayed_flights_by_airport, get_flight_by_id,
    get_flights_by_date,
};
pub use query::DELAY_THRESHOLD_MINUTES;
pub use store::FlightStore;
