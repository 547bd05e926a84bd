//! Carpool CLI - Relational analytics for a car-pooling community

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;
use carpool::config::{self, CarpoolConfig};
use carpool::ui::{self, Icons, Spinner};
use carpool::{CarId, Dataset, Pin, QueryEngine, SqliteStore, TripId};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "carpool")]
#[command(version)]
#[command(about = "Relational analytics for a car-pooling community")]
#[command(long_about = r#"
Carpool keeps a car-pooling community (participants, drivers, passengers,
cars, trips and bookings) in SQLite and answers questions about it:
  • Who drives without a car, which cars never travel
  • Who booked every trip to a city
  • Driver scores, ratings per destination, bookings per membership

Example usage:
  carpool init
  carpool load --file community.json
  carpool loyal-passengers --city Izmir
  carpool --format json driver-scores
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the schema
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Drop every table (the next other command recreates an empty schema)
    Drop,

    /// Bulk-load a JSON dataset in one transaction
    Load {
        /// Dataset file
        #[arg(long)]
        file: PathBuf,
    },

    /// Show row counts per collection
    Stats,

    /// List every driver with their rating
    Drivers,

    /// Participants who are both driver and passenger
    DualRole,

    /// Drivers owning no car
    DriversWithoutCars,

    /// Delete every driver owning no car
    PruneDrivers,

    /// Cars that never made a trip
    IdleCars,

    /// Passengers without a booking
    IdlePassengers,

    /// Trips on a route and date
    Trips {
        /// Departure city
        #[arg(long = "from")]
        departure: String,

        /// Destination city
        #[arg(long = "to")]
        destination: String,

        /// Trip date
        #[arg(long = "on")]
        date: String,
    },

    /// Passengers booked on every trip to a city
    LoyalPassengers {
        #[arg(long)]
        city: String,
    },

    /// A driver's cars with at most two booked trips
    LightlyBookedCars {
        /// Driver PIN
        #[arg(long)]
        driver: Pin,
    },

    /// Average age of confirmed passengers leaving a city within a date range
    AverageAge {
        #[arg(long)]
        city: String,

        /// First date (inclusive)
        #[arg(long)]
        start: String,

        /// Last date (inclusive)
        #[arg(long)]
        end: String,
    },

    /// Passengers booked on a trip
    TripPassengers {
        /// Trip ID
        #[arg(long)]
        trip: TripId,
    },

    /// Driver scores (rating x bookings)
    DriverScores,

    /// Average driver rating per destination city
    CityRatings,

    /// Total bookings per membership status
    MembershipBookings,

    /// Raise every rating at or below 2.0 by 0.5
    BumpRatings,

    /// Trips departing a city
    Departures {
        #[arg(long)]
        city: String,
    },

    /// Trips nobody booked
    UnbookedTrips,

    /// Each driver's most booked trip
    TopTrips,

    /// Trips whose bookings reached their seats
    FullCars,
}

#[derive(Serialize, Tabled)]
struct CarRow {
    #[tabled(rename = "CarID")]
    car_id: CarId,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = run(cli) {
        ui::error(&format!("{:#}", err));
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let loaded = config::load_config(cli.config.as_deref())?;
    let database = config::resolve_database_path(cli.database.as_deref(), loaded.as_ref());
    let format = cli.format;

    match cli.command {
        Commands::Init { force } => {
            let config_path = cli.config.unwrap_or_else(config::default_config_path);
            let config = CarpoolConfig {
                database: Some(database.to_string_lossy().to_string()),
            };
            config::write_config(&config_path, &config, force)?;
            let store = open_store(&database)?;

            ui::header("Initialized carpool");
            ui::info("Config", &config_path.display().to_string());
            ui::info("Database", &database.display().to_string());
            ui::summary_row("tables:", &store.create_tables()?.to_string());
        }

        Commands::Drop => {
            config::ensure_db_dir(&database)?;
            let store = SqliteStore::open_without_schema(&database)?;
            let dropped = store.drop_tables()?;
            ui::success(&format!("{} Dropped {} tables", Icons::DEL, dropped));
        }

        Commands::Load { file } => {
            let dataset = Dataset::from_path(&file)?;
            if dataset.is_empty() {
                ui::warn(&format!("{} contains no rows", file.display()));
                return Ok(());
            }

            let store = open_store(&database)?;
            let spinner = Spinner::new(&format!("Loading {}", file.display()));
            let loaded = store.load_dataset(&dataset);
            spinner.finish_and_clear();
            let loaded = loaded?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&loaded)?),
                OutputFormat::Human => {
                    ui::success(&format!("{} Loaded {} rows", Icons::PACKAGE, loaded.total()));
                    println!("{}", ui::stats_table(&loaded.rows()));
                }
            }
        }

        Commands::Stats => {
            let store = open_store(&database)?;
            let stats = store.stats()?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                OutputFormat::Human => {
                    ui::header(&format!("Carpool Statistics ({})", database.display()));
                    println!("{}", ui::stats_table(&stats.rows()));
                    ui::summary_row("total:", &stats.total().to_string());
                }
            }
        }

        Commands::Drivers => {
            let store = open_store(&database)?;
            emit(format, "drivers", &QueryEngine::new(&store).all_drivers()?)?;
        }

        Commands::DualRole => {
            let store = open_store(&database)?;
            emit(format, "dual-role participants", &QueryEngine::new(&store).dual_role_participants()?)?;
        }

        Commands::DriversWithoutCars => {
            let store = open_store(&database)?;
            emit(format, "drivers without cars", &QueryEngine::new(&store).drivers_without_cars()?)?;
        }

        Commands::PruneDrivers => {
            let store = open_store(&database)?;
            let deleted = QueryEngine::new(&store).delete_drivers_without_cars()?;
            report_mutation(format, "deleted", deleted, &format!("{} Deleted {} drivers without cars", Icons::DEL, deleted))?;
        }

        Commands::IdleCars => {
            let store = open_store(&database)?;
            emit(format, "cars without trips", &QueryEngine::new(&store).cars_without_trips()?)?;
        }

        Commands::IdlePassengers => {
            let store = open_store(&database)?;
            emit(format, "passengers without bookings", &QueryEngine::new(&store).passengers_without_bookings()?)?;
        }

        Commands::Trips { departure, destination, date } => {
            let store = open_store(&database)?;
            let trips = QueryEngine::new(&store).trips_on_route(&departure, &destination, &date)?;
            emit(format, "trips", &trips)?;
        }

        Commands::LoyalPassengers { city } => {
            let store = open_store(&database)?;
            let passengers = QueryEngine::new(&store).passengers_on_every_trip_to(&city)?;
            emit(format, &format!("passengers booked on every trip to {}", city), &passengers)?;
        }

        Commands::LightlyBookedCars { driver } => {
            let store = open_store(&database)?;
            let cars = QueryEngine::new(&store).lightly_booked_cars(driver)?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cars)?),
                OutputFormat::Human => {
                    let rows: Vec<CarRow> = cars.into_iter().map(|car_id| CarRow { car_id }).collect();
                    emit(format, "lightly booked cars", &rows)?;
                }
            }
        }

        Commands::AverageAge { city, start, end } => {
            let store = open_store(&database)?;
            let average = QueryEngine::new(&store).average_age_of_confirmed_passengers(&city, &start, &end)?;

            match (format, average) {
                (OutputFormat::Json, _) => println!("{}", serde_json::to_string_pretty(&average)?),
                (OutputFormat::Human, Some(age)) => {
                    println!("{} Average age: {:.2}", Icons::PERSON, age);
                }
                (OutputFormat::Human, None) => ui::empty("confirmed bookings in range"),
            }
        }

        Commands::TripPassengers { trip } => {
            let store = open_store(&database)?;
            emit(format, "passengers on this trip", &QueryEngine::new(&store).passengers_on_trip(trip)?)?;
        }

        Commands::DriverScores => {
            let store = open_store(&database)?;
            emit(format, "scored drivers", &QueryEngine::new(&store).driver_scores()?)?;
        }

        Commands::CityRatings => {
            let store = open_store(&database)?;
            emit(format, "destinations", &QueryEngine::new(&store).average_rating_per_destination()?)?;
        }

        Commands::MembershipBookings => {
            let store = open_store(&database)?;
            emit(format, "membership statuses", &QueryEngine::new(&store).bookings_per_membership_status()?)?;
        }

        Commands::BumpRatings => {
            let store = open_store(&database)?;
            let updated = QueryEngine::new(&store).bump_low_ratings()?;
            report_mutation(format, "updated", updated, &format!("{} Raised {} driver ratings", Icons::UP, updated))?;
        }

        Commands::Departures { city } => {
            let store = open_store(&database)?;
            emit(format, &format!("trips departing {}", city), &QueryEngine::new(&store).trips_departing(&city)?)?;
        }

        Commands::UnbookedTrips => {
            let store = open_store(&database)?;
            emit(format, "trips without bookings", &QueryEngine::new(&store).trips_without_bookings()?)?;
        }

        Commands::TopTrips => {
            let store = open_store(&database)?;
            emit(format, "drivers with trips", &QueryEngine::new(&store).most_booked_trip_per_driver()?)?;
        }

        Commands::FullCars => {
            let store = open_store(&database)?;
            emit(format, "full trips", &QueryEngine::new(&store).full_trips()?)?;
        }
    }

    Ok(())
}

fn open_store(database: &Path) -> anyhow::Result<SqliteStore> {
    config::ensure_db_dir(database)?;
    tracing::debug!("Opening {}", database.display());
    Ok(SqliteStore::open(database)?)
}

/// Print query rows as a table or as a JSON array
fn emit<T: Serialize + Tabled>(format: OutputFormat, what: &str, rows: &[T]) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Human => {
            if rows.is_empty() {
                ui::empty(what);
            } else {
                println!("{}", ui::render(rows));
                ui::summary_row("rows:", &rows.len().to_string());
            }
        }
    }
    Ok(())
}

fn report_mutation(format: OutputFormat, key: &str, count: usize, message: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let body = std::collections::BTreeMap::from([(key, count)]);
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Human if count == 0 => ui::warn("Nothing to change"),
        OutputFormat::Human => ui::success(message),
    }
    Ok(())
}
