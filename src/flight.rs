use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::query::DELAY_THRESHOLD_MINUTES;

/// Length of an IATA airport code.
pub const IATA_LENGTH: usize = 3;

/// One scheduled flight and its departure delay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flight {
    pub id: i64,
    pub date: FlightDate,
    /// Airline name, not the two-letter carrier code stored on the flight row.
    pub airline: String,
    pub origin_airport: String,
    pub destination_airport: String,
    /// Departure delay in minutes; negative means the flight left early.
    pub delay: Option<i64>,
}

impl Flight {
    pub fn is_delayed(&self) -> bool {
        self.delay.is_some_and(|d| d >= DELAY_THRESHOLD_MINUTES)
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. {} -> {} by {}",
            self.id, self.origin_airport, self.destination_airport, self.airline
        )?;
        match self.delay {
            Some(delay) if delay > 0 => write!(f, ", Delay: {delay} Minutes"),
            _ => Ok(()),
        }
    }
}

/// Scheduled day of a flight, stored by the dataset as separate
/// day/month/year columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FlightDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl FlightDate {
    /// Build a date from its components, rejecting anything that is not a
    /// real calendar day.
    pub fn new(day: u32, month: u32, year: i32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self::from)
            .ok_or_else(|| {
                Error::invalid_argument(format!(
                    "{day:02}/{month:02}/{year:04} is not a calendar date"
                ))
            })
    }

    /// Parse `DD/MM/YYYY`.
    pub fn parse(input: &str) -> Result<Self> {
        NaiveDate::parse_from_str(input.trim(), "%d/%m/%Y")
            .map(Self::from)
            .map_err(|e| Error::invalid_argument(format!("date '{input}' is not DD/MM/YYYY: {e}")))
    }
}

impl From<NaiveDate> for FlightDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for FlightDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{:04}", self.day, self.month, self.year)
    }
}

/// A validated, upper-cased IATA airport code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AirportCode(String);

impl AirportCode {
    pub fn parse(input: &str) -> Result<Self> {
        let code = input.trim();
        if code.len() != IATA_LENGTH || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::invalid_argument(format!(
                "airport code '{input}' must be {IATA_LENGTH} letters"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parse a flight identifier typed by a user.
pub fn parse_flight_id(input: &str) -> Result<i64> {
    input
        .trim()
        .parse()
        .map_err(|e| Error::invalid_argument(format!("flight id '{input}' is not an integer: {e}")))
}

/// How often one airline's flights leave late.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirlineDelayStats {
    pub airline: String,
    pub total_flights: u64,
    pub delayed_flights: u64,
    pub delayed_percentage: f64,
}

impl AirlineDelayStats {
    pub fn new(airline: String, total_flights: u64, delayed_flights: u64) -> Self {
        let delayed_percentage = if total_flights == 0 {
            0.0
        } else {
            delayed_flights as f64 / total_flights as f64 * 100.0
        };
        Self {
            airline,
            total_flights,
            delayed_flights,
            delayed_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn rejects_impossible_dates() {
        assert_eq!(FlightDate::new(31, 2, 2015).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(FlightDate::new(0, 1, 2015).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(FlightDate::new(1, 13, 2015).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            FlightDate::new(29, 2, 2016).unwrap(),
            FlightDate { year: 2016, month: 2, day: 29 }
        );
    }

    #[test]
    fn parses_day_month_year() {
        let date = FlightDate::parse(" 15/06/2015 ").unwrap();
        assert_eq!(date, FlightDate { year: 2015, month: 6, day: 15 });
        assert_eq!(date.to_string(), "15/06/2015");
        assert!(FlightDate::parse("2015-06-15").is_err());
    }

    #[test]
    fn airport_codes_are_three_letters() {
        assert_eq!(AirportCode::parse("jfk").unwrap().as_str(), "JFK");
        for bad in ["", "JF", "JFKX", "J1K", "'; "] {
            assert_eq!(AirportCode::parse(bad).unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn flight_ids_must_be_numeric() {
        assert_eq!(parse_flight_id("1289").unwrap(), 1289);
        assert_eq!(parse_flight_id("12a").unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn display_mentions_delay_only_when_late() {
        let mut flight = Flight {
            id: 1289,
            date: FlightDate { year: 2015, month: 6, day: 15 },
            airline: "American Airlines Inc.".into(),
            origin_airport: "DFW".into(),
            destination_airport: "ORD".into(),
            delay: Some(35),
        };
        assert_eq!(
            flight.to_string(),
            "1289. DFW -> ORD by American Airlines Inc., Delay: 35 Minutes"
        );
        assert!(flight.is_delayed());

        flight.delay = Some(-4);
        assert_eq!(flight.to_string(), "1289. DFW -> ORD by American Airlines Inc.");
        assert!(!flight.is_delayed());
    }

    #[test]
    fn percentage_of_zero_flights_is_zero() {
        assert_eq!(AirlineDelayStats::new("X".into(), 0, 0).delayed_percentage, 0.0);
        assert_eq!(AirlineDelayStats::new("X".into(), 4, 1).delayed_percentage, 25.0);
    }
}
