//! Storage Layer - SQLite-backed relational store
//!
//! System of record is SQLite with tables:
//! - participants(pin, name, age)
//! - passengers(pin, membership_status)
//! - drivers(pin, rating)
//! - cars(car_id, pin, color, brand)
//! - trips(trip_id, car_id, date, departure, destination, seats_available)
//! - bookings(trip_id, pin, booking_status)

pub mod schema;
pub mod snapshot;
pub mod sqlite;

pub use snapshot::Snapshot;
pub use sqlite::{SqliteStore, DbStats};
