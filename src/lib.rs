//! # Carpool - Ride-sharing community analytics
//!
//! Relational queries over a car-pooling community stored in SQLite.
//!
//! Carpool provides:
//! - Typed entities for participants, passengers, drivers, cars, trips and bookings
//! - A SQLite-backed store with consistent snapshots and atomic bulk mutations
//! - Relational building blocks (anti-join, division, grouped aggregates)
//! - A query engine answering the community's analytical questions

pub mod model;
pub mod storage;
pub mod query;
pub mod dataset;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use model::{Booking, Car, CarId, Driver, Participant, Passenger, Pin, Trip, TripId};
pub use storage::{SqliteStore, Snapshot};
pub use query::QueryEngine;
pub use dataset::Dataset;

/// Result type alias for Carpool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Carpool operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid dataset: {0}")]
    Dataset(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::ConstraintViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            _ => Error::StoreUnavailable(err),
        }
    }
}
