//! Dataset documents for bulk-loading a store
//!
//! A dataset is a JSON object with one array per collection. Missing arrays
//! are treated as empty:
//!
//! ```json
//! {
//!   "participants": [{"pin": 1, "name": "Mehmet", "age": 40}],
//!   "drivers": [{"pin": 1, "rating": 4.5}]
//! }
//! ```

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::Result;
use crate::model::{Booking, Car, Driver, Participant, Passenger, Trip};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub passengers: Vec<Passenger>,
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub cars: Vec<Car>,
    #[serde(default)]
    pub trips: Vec<Trip>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

impl Dataset {
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
            && self.passengers.is_empty()
            && self.drivers.is_empty()
            && self.cars.is_empty()
            && self.trips.is_empty()
            && self.bookings.is_empty()
    }
}
