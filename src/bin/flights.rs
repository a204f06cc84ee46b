use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flight_delays::{
    config::DEFAULT_DB_PATH, flights, parse_flight_id, Flight, FlightDate, FlightStore,
    StoreConfig,
};
use tracing_subscriber::EnvFilter;

/// Explore the flight-delay dataset.
#[derive(Parser, Debug)]
#[command(name = "flights", version, about)]
struct Cli {
    /// SQLite database holding the `flights` and `airlines` tables
    #[arg(long, env = "FLIGHTS_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Print results as JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one flight by its id
    ById { id: String },
    /// Show flights scheduled on a date (DD/MM/YYYY)
    ByDate { date: String },
    /// List every airline name
    Airlines,
    /// Show all flights of an airline
    ByAirline { airline: String },
    /// Show delayed flights of an airline
    DelayedByAirline { airline: String },
    /// Show delayed flights departing an airport (IATA code)
    DelayedByAirport { airport: String },
    /// Percentage of delayed flights per airline
    DelayReport,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = FlightStore::open(&StoreConfig::new(&cli.db))
        .with_context(|| format!("opening {}", cli.db.display()))?;

    match &cli.command {
        Command::ById { id } => {
            let id = parse_flight_id(id)?;
            let found: Vec<Flight> = flights::get_flight_by_id(&store, id)?.into_iter().collect();
            print_flights(&found, cli.json)?;
        }
        Command::ByDate { date } => {
            let date = FlightDate::parse(date)?;
            let found = flights::get_flights_by_date(&store, date.day, date.month, date.year)?;
            print_flights(&found, cli.json)?;
        }
        Command::Airlines => {
            let airlines = flights::get_all_airlines(&store)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&airlines)?);
            } else {
                airlines.iter().for_each(|airline| println!("{airline}"));
            }
        }
        Command::ByAirline { airline } => {
            let found = flights::get_all_flights_by_airline(&store, airline)?;
            print_flights(&found, cli.json)?;
        }
        Command::DelayedByAirline { airline } => {
            let found = flights::get_delayed_flights_by_airline(&store, airline)?;
            print_flights(&found, cli.json)?;
        }
        Command::DelayedByAirport { airport } => {
            let found = flights::get_delayed_flights_by_airport(&store, airport)?;
            print_flights(&found, cli.json)?;
        }
        Command::DelayReport => {
            let report = flights::delay_percentage_by_airline(&store)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for stats in &report {
                    println!(
                        "{}: {:.1}% ({} of {} flights)",
                        stats.airline,
                        stats.delayed_percentage,
                        stats.delayed_flights,
                        stats.total_flights
                    );
                }
            }
        }
    }

    store.close()?;
    Ok(())
}

fn print_flights(found: &[Flight], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(found)?);
        return Ok(());
    }
    println!("Got {} results.", found.len());
    for flight in found {
        println!("{flight}");
    }
    Ok(())
}
