pub mod algebra;
pub mod engine;
pub mod rows;

pub use engine::QueryEngine;
pub use rows::{CityRating, DriverProfile, DriverScore, FullTrip, MembershipBookings, PassengerProfile, TopTrip};
