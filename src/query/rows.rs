//! Derived result shapes returned by the query engine

use serde::{Deserialize, Serialize};
use tabled::Tabled;
use crate::model::{display_real, CarId, Pin, TripId};

/// A driver joined with their participant record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct DriverProfile {
    #[tabled(rename = "PIN")]
    pub pin: Pin,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Age")]
    pub age: i32,
    #[tabled(rename = "Rating", display_with = "display_real")]
    pub rating: f64,
}

/// A passenger joined with their participant record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct PassengerProfile {
    #[tabled(rename = "PIN")]
    pub pin: Pin,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Age")]
    pub age: i32,
    #[tabled(rename = "Membership")]
    pub membership_status: String,
}

/// Composite driver score: rating x bookings across all owned cars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct DriverScore {
    #[tabled(rename = "PIN")]
    pub pin: Pin,
    #[tabled(rename = "Rating", display_with = "display_real")]
    pub rating: f64,
    #[tabled(rename = "Bookings")]
    pub number_of_bookings: usize,
    #[tabled(rename = "Score", display_with = "display_real")]
    pub driver_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct CityRating {
    #[tabled(rename = "City")]
    pub city: String,
    #[tabled(rename = "Average Rating", display_with = "display_real")]
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct MembershipBookings {
    #[tabled(rename = "Membership")]
    pub membership_status: String,
    #[tabled(rename = "Total Bookings")]
    pub total_bookings: usize,
}

/// The most-booked trip among a driver's cars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct TopTrip {
    #[tabled(rename = "Driver PIN")]
    pub driver_pin: Pin,
    #[tabled(rename = "TripID")]
    pub trip_id: TripId,
    #[tabled(rename = "Bookings")]
    pub number_of_bookings: usize,
}

/// A trip whose bookings have used up its seats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct FullTrip {
    #[tabled(rename = "CarID")]
    pub car_id: CarId,
    #[tabled(rename = "TripID")]
    pub trip_id: TripId,
    #[tabled(rename = "Seats")]
    pub seats_available: i32,
    #[tabled(rename = "Bookings")]
    pub number_of_bookings: usize,
}
