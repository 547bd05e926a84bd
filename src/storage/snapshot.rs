//! Consistent in-memory view of all six collections
//!
//! A snapshot is read inside a single SQLite transaction, so every query
//! composed over it observes one state of the store. Each collection is
//! ordered by its key.

use std::collections::HashMap;
use rusqlite::Connection;
use crate::Result;
use crate::model::{Booking, Car, CarId, Driver, Participant, Passenger, Pin, Trip, TripId};
use super::sqlite;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub participants: Vec<Participant>,
    pub passengers: Vec<Passenger>,
    pub drivers: Vec<Driver>,
    pub cars: Vec<Car>,
    pub trips: Vec<Trip>,
    pub bookings: Vec<Booking>,
}

impl Snapshot {
    /// Read every collection through `conn`.
    ///
    /// The caller is responsible for holding a transaction open so the six
    /// reads see the same state.
    pub(crate) fn read(conn: &Connection) -> Result<Self> {
        Ok(Self {
            participants: sqlite::select_all(conn, sqlite::SELECT_PARTICIPANTS, sqlite::row_to_participant)?,
            passengers: sqlite::select_all(conn, sqlite::SELECT_PASSENGERS, sqlite::row_to_passenger)?,
            drivers: sqlite::select_all(conn, sqlite::SELECT_DRIVERS, sqlite::row_to_driver)?,
            cars: sqlite::select_all(conn, sqlite::SELECT_CARS, sqlite::row_to_car)?,
            trips: sqlite::select_all(conn, sqlite::SELECT_TRIPS, sqlite::row_to_trip)?,
            bookings: sqlite::select_all(conn, sqlite::SELECT_BOOKINGS, sqlite::row_to_booking)?,
        })
    }

    /// Look up a participant by PIN
    pub fn participant(&self, pin: Pin) -> Option<&Participant> {
        self.participants
            .binary_search_by_key(&pin, |p| p.pin)
            .ok()
            .map(|idx| &self.participants[idx])
    }

    /// Look up a passenger by PIN
    pub fn passenger(&self, pin: Pin) -> Option<&Passenger> {
        self.passengers
            .binary_search_by_key(&pin, |p| p.pin)
            .ok()
            .map(|idx| &self.passengers[idx])
    }

    /// Look up a driver by PIN
    pub fn driver(&self, pin: Pin) -> Option<&Driver> {
        self.drivers
            .binary_search_by_key(&pin, |d| d.pin)
            .ok()
            .map(|idx| &self.drivers[idx])
    }

    pub fn car(&self, car_id: CarId) -> Option<&Car> {
        self.cars
            .binary_search_by_key(&car_id, |c| c.car_id)
            .ok()
            .map(|idx| &self.cars[idx])
    }

    pub fn trip(&self, trip_id: TripId) -> Option<&Trip> {
        self.trips
            .binary_search_by_key(&trip_id, |t| t.trip_id)
            .ok()
            .map(|idx| &self.trips[idx])
    }

    /// Owning driver PIN of the car that made a trip
    pub fn trip_owner(&self, trip_id: TripId) -> Option<Pin> {
        self.trip(trip_id)
            .and_then(|trip| self.car(trip.car_id))
            .map(|car| car.pin)
    }

    /// Number of bookings on each trip; trips without bookings are absent
    pub fn bookings_per_trip(&self) -> HashMap<TripId, usize> {
        let mut counts = HashMap::new();
        for booking in &self.bookings {
            *counts.entry(booking.trip_id).or_insert(0) += 1;
        }
        counts
    }
}
