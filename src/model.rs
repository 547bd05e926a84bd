//! Entity model - the six collections of a car-pooling community
//!
//! People share a single key space, the PIN:
//! - `Participant`: every person known to the community
//! - `Passenger`: a participant who books seats
//! - `Driver`: a participant who owns cars and offers trips
//!
//! Vehicles and journeys use surrogate integer keys:
//! - `Car`: owned by exactly one driver
//! - `Trip`: a dated journey made with one car
//! - `Booking`: one passenger's seat on one trip

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Personal Identification Number shared by participants, passengers and drivers
pub type Pin = i64;

/// Surrogate key of a car
pub type CarId = i64;

/// Surrogate key of a trip
pub type TripId = i64;

/// Booking status label counted by the average-age query
pub const CONFIRMED: &str = "Confirmed";

/// Render a real number with two decimals in tables
pub(crate) fn display_real(value: &f64) -> String {
    format!("{:.2}", value)
}

/// A person registered in the community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Participant {
    #[tabled(rename = "PIN")]
    pub pin: Pin,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Age")]
    pub age: i32,
}

impl Participant {
    pub fn new(pin: Pin, name: impl Into<String>, age: i32) -> Self {
        Self {
            pin,
            name: name.into(),
            age,
        }
    }
}

/// A participant who books seats on trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Passenger {
    #[tabled(rename = "PIN")]
    pub pin: Pin,
    /// Membership category label (e.g. "Gold")
    #[tabled(rename = "Membership")]
    pub membership_status: String,
}

impl Passenger {
    pub fn new(pin: Pin, membership_status: impl Into<String>) -> Self {
        Self {
            pin,
            membership_status: membership_status.into(),
        }
    }
}

/// A participant who owns cars and drives trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Driver {
    #[tabled(rename = "PIN")]
    pub pin: Pin,
    #[tabled(rename = "Rating", display_with = "display_real")]
    pub rating: f64,
}

impl Driver {
    pub fn new(pin: Pin, rating: f64) -> Self {
        Self { pin, rating }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Car {
    #[tabled(rename = "CarID")]
    pub car_id: CarId,
    /// Owning driver
    #[tabled(rename = "Owner PIN")]
    pub pin: Pin,
    #[tabled(rename = "Color")]
    pub color: String,
    #[tabled(rename = "Brand")]
    pub brand: String,
}

impl Car {
    pub fn new(car_id: CarId, pin: Pin, color: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            car_id,
            pin,
            color: color.into(),
            brand: brand.into(),
        }
    }
}

/// A dated journey between two cities.
///
/// Dates are stored as text and compared lexicographically, so they are
/// expected in a sortable form such as `2024-06-01`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Trip {
    #[tabled(rename = "TripID")]
    pub trip_id: TripId,
    #[tabled(rename = "CarID")]
    pub car_id: CarId,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Departure")]
    pub departure: String,
    #[tabled(rename = "Destination")]
    pub destination: String,
    #[tabled(rename = "Seats")]
    pub seats_available: i32,
}

impl Trip {
    pub fn new(
        trip_id: TripId,
        car_id: CarId,
        date: impl Into<String>,
        departure: impl Into<String>,
        destination: impl Into<String>,
        seats_available: i32,
    ) -> Self {
        Self {
            trip_id,
            car_id,
            date: date.into(),
            departure: departure.into(),
            destination: destination.into(),
            seats_available,
        }
    }

    /// Whether the trip date falls within `[start, end]`, compared as text
    pub fn is_within(&self, start: &str, end: &str) -> bool {
        self.date.as_str() >= start && self.date.as_str() <= end
    }
}

/// A passenger's seat on a trip. At most one per (trip, passenger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Booking {
    #[tabled(rename = "TripID")]
    pub trip_id: TripId,
    #[tabled(rename = "PIN")]
    pub pin: Pin,
    #[tabled(rename = "Status")]
    pub booking_status: String,
}

impl Booking {
    pub fn new(trip_id: TripId, pin: Pin, booking_status: impl Into<String>) -> Self {
        Self {
            trip_id,
            pin,
            booking_status: booking_status.into(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.booking_status == CONFIRMED
    }
}
