//! Query engine implementation
//!
//! Answers the community's questions:
//! - Role queries (dual-role participants, drivers without cars)
//! - Unused resources (cars without trips, passengers or trips without bookings)
//! - Route and date lookups
//! - Relational division (passengers booked on every trip to a city)
//! - Aggregates (average age, driver scores, ratings per city, bookings per membership)
//! - Two atomic maintenance operations (pruning carless drivers, bumping low ratings)
//!
//! Single-table filters are pushed down to the store. Join-shaped queries are
//! composed from [`algebra`] over one [`Snapshot`], so each call observes a
//! single state of the store.

use std::collections::{BTreeSet, HashSet};
use crate::Result;
use crate::model::{Car, CarId, Driver, Participant, Passenger, Pin, Trip, TripId};
use crate::storage::{SqliteStore, Snapshot};
use super::algebra;
use super::rows::{CityRating, DriverProfile, DriverScore, FullTrip, MembershipBookings, PassengerProfile, TopTrip};

/// Drivers rated at or below this get a bump
pub const RATING_BUMP_THRESHOLD: f64 = 2.0;

/// Amount added to a low rating
pub const RATING_BUMP: f64 = 0.5;

/// Upper bound (inclusive) on booked trips for a lightly booked car
pub const LIGHT_BOOKING_LIMIT: usize = 2;

/// Query engine for car-pooling analytics
pub struct QueryEngine<'a> {
    store: &'a SqliteStore,
}

impl<'a> QueryEngine<'a> {
    /// Create a new query engine
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Every driver with their rating, ordered by PIN
    pub fn all_drivers(&self) -> Result<Vec<Driver>> {
        let drivers = self.store.all_drivers()?;
        tracing::debug!(rows = drivers.len(), "all drivers");
        Ok(drivers)
    }

    /// Participants who are both a driver and a passenger, ordered by PIN
    pub fn dual_role_participants(&self) -> Result<Vec<Participant>> {
        let snapshot = self.store.snapshot()?;

        let drivers = algebra::semi_join(&snapshot.participants, &snapshot.drivers, |p| p.pin, |d| d.pin);
        let both = algebra::semi_join(&drivers, &snapshot.passengers, |p| p.pin, |ps| ps.pin);

        let participants: Vec<Participant> = both.into_iter().map(|p| (*p).clone()).collect();
        tracing::debug!(rows = participants.len(), "dual-role participants");
        Ok(participants)
    }

    /// Drivers owning no car, with their participant details, ordered by PIN
    pub fn drivers_without_cars(&self) -> Result<Vec<DriverProfile>> {
        let snapshot = self.store.snapshot()?;

        let profiles: Vec<DriverProfile> = carless_drivers(&snapshot)
            .into_iter()
            .filter_map(|driver| driver_profile(&snapshot, driver))
            .collect();

        tracing::debug!(rows = profiles.len(), "drivers without cars");
        Ok(profiles)
    }

    /// Delete every driver owning no car; returns the number removed.
    ///
    /// The selection is made against the pre-deletion state and the whole
    /// operation is atomic.
    pub fn delete_drivers_without_cars(&self) -> Result<usize> {
        let removed = self.store.delete_drivers_where(|snapshot| {
            carless_drivers(snapshot).into_iter().map(|d| d.pin).collect()
        })?;

        if removed == 0 {
            tracing::warn!("No carless drivers to delete");
        } else {
            tracing::info!(removed, "Deleted drivers owning no car");
        }
        Ok(removed)
    }

    /// Cars that have never made a trip, ordered by CarID
    pub fn cars_without_trips(&self) -> Result<Vec<Car>> {
        let snapshot = self.store.snapshot()?;

        let cars: Vec<Car> = algebra::anti_join(&snapshot.cars, &snapshot.trips, |c| c.car_id, |t| t.car_id)
            .into_iter()
            .cloned()
            .collect();

        tracing::debug!(rows = cars.len(), "cars without trips");
        Ok(cars)
    }

    /// Passengers without a single booking, ordered by PIN
    pub fn passengers_without_bookings(&self) -> Result<Vec<Passenger>> {
        let snapshot = self.store.snapshot()?;

        let passengers: Vec<Passenger> =
            algebra::anti_join(&snapshot.passengers, &snapshot.bookings, |p| p.pin, |b| b.pin)
                .into_iter()
                .cloned()
                .collect();

        tracing::debug!(rows = passengers.len(), "passengers without bookings");
        Ok(passengers)
    }

    /// Trips matching departure, destination and date exactly, ordered by TripID
    pub fn trips_on_route(&self, departure: &str, destination: &str, date: &str) -> Result<Vec<Trip>> {
        let trips = self.store.find_trips_on_route(departure, destination, date)?;
        tracing::debug!(departure, destination, date, rows = trips.len(), "trips on route");
        Ok(trips)
    }

    /// Passengers holding a booking on every trip destined for `city`.
    ///
    /// A city no trip goes to yields nothing, not every passenger.
    pub fn passengers_on_every_trip_to(&self, city: &str) -> Result<Vec<PassengerProfile>> {
        let snapshot = self.store.snapshot()?;

        let divisor: Vec<&Trip> = snapshot.trips.iter().filter(|t| t.destination == city).collect();
        let booked: HashSet<(TripId, Pin)> = snapshot.bookings.iter().map(|b| (b.trip_id, b.pin)).collect();
        let candidates = passenger_profiles(&snapshot);

        let loyal: Vec<PassengerProfile> =
            algebra::divide(&candidates, &divisor, |p, trip| booked.contains(&(trip.trip_id, p.pin)))
                .into_iter()
                .cloned()
                .collect();

        tracing::debug!(city, trips = divisor.len(), rows = loyal.len(), "passengers on every trip");
        Ok(loyal)
    }

    /// Cars of a driver with at most two distinct booked trips, ordered by CarID.
    ///
    /// Cars without trips or bookings count as zero and are included.
    pub fn lightly_booked_cars(&self, driver_pin: Pin) -> Result<Vec<CarId>> {
        let snapshot = self.store.snapshot()?;

        let owned = snapshot.cars.iter().filter(|c| c.pin == driver_pin).map(|c| c.car_id);
        let booked_trips: BTreeSet<TripId> = snapshot.bookings.iter().map(|b| b.trip_id).collect();
        let booked_trip_cars = booked_trips
            .iter()
            .filter_map(|trip_id| snapshot.trip(*trip_id))
            .map(|trip| trip.car_id);

        let cars: Vec<CarId> = algebra::count_per_key(owned, booked_trip_cars)
            .into_iter()
            .filter(|(_, booked)| *booked <= LIGHT_BOOKING_LIMIT)
            .map(|(car_id, _)| car_id)
            .collect();

        tracing::debug!(driver_pin, rows = cars.len(), "lightly booked cars");
        Ok(cars)
    }

    /// Average age of passengers with a confirmed booking on a trip leaving
    /// `city` between `start` and `end` inclusive.
    ///
    /// `None` when no booking qualifies.
    pub fn average_age_of_confirmed_passengers(&self, city: &str, start: &str, end: &str) -> Result<Option<f64>> {
        let snapshot = self.store.snapshot()?;

        let ages: Vec<f64> = snapshot
            .bookings
            .iter()
            .filter(|b| b.is_confirmed())
            .filter(|b| {
                snapshot
                    .trip(b.trip_id)
                    .is_some_and(|trip| trip.departure == city && trip.is_within(start, end))
            })
            .filter_map(|b| snapshot.participant(b.pin))
            .map(|p| f64::from(p.age))
            .collect();

        let average = algebra::mean(&ages);
        tracing::debug!(city, start, end, matched = ages.len(), ?average, "average confirmed age");
        Ok(average)
    }

    /// Passengers booked on a trip, ordered by PIN
    pub fn passengers_on_trip(&self, trip_id: TripId) -> Result<Vec<PassengerProfile>> {
        let snapshot = self.store.snapshot()?;

        let mut profiles: Vec<PassengerProfile> = snapshot
            .bookings
            .iter()
            .filter(|b| b.trip_id == trip_id)
            .filter_map(|b| snapshot.passenger(b.pin))
            .filter_map(|passenger| passenger_profile(&snapshot, passenger))
            .collect();
        profiles.sort_by_key(|p| p.pin);

        tracing::debug!(trip_id, rows = profiles.len(), "passengers on trip");
        Ok(profiles)
    }

    /// Score every driver with at least one booking across their cars.
    ///
    /// Ordered by score descending, ties by PIN ascending. Drivers without
    /// bookings are left out rather than scored zero.
    pub fn driver_scores(&self) -> Result<Vec<DriverScore>> {
        let snapshot = self.store.snapshot()?;

        let owners = snapshot.bookings.iter().filter_map(|b| snapshot.trip_owner(b.trip_id));
        let bookings = algebra::count_per_key(snapshot.drivers.iter().map(|d| d.pin), owners);

        let mut scores: Vec<DriverScore> = snapshot
            .drivers
            .iter()
            .filter_map(|driver| {
                let count = bookings.get(&driver.pin).copied().unwrap_or(0);
                (count > 0).then(|| DriverScore {
                    pin: driver.pin,
                    rating: driver.rating,
                    number_of_bookings: count,
                    driver_score: algebra::driver_score(driver.rating, count),
                })
            })
            .collect();

        scores.sort_by(|a, b| {
            b.driver_score
                .total_cmp(&a.driver_score)
                .then(a.pin.cmp(&b.pin))
        });

        tracing::debug!(rows = scores.len(), "driver scores");
        Ok(scores)
    }

    /// Mean driver rating per destination city, ordered by city.
    ///
    /// Averaged over trips: a driver with several trips to a city weighs in
    /// once per trip.
    pub fn average_rating_per_destination(&self) -> Result<Vec<CityRating>> {
        let snapshot = self.store.snapshot()?;

        let trip_ratings = snapshot.trips.iter().filter_map(|trip| {
            let owner = snapshot.car(trip.car_id)?.pin;
            let rating = snapshot.driver(owner)?.rating;
            Some((trip.destination.clone(), rating))
        });

        let ratings: Vec<CityRating> = algebra::group_by(trip_ratings, |pair| pair)
            .into_iter()
            .filter_map(|(city, ratings)| {
                algebra::mean(&ratings).map(|average_rating| CityRating { city, average_rating })
            })
            .collect();

        tracing::debug!(rows = ratings.len(), "average rating per destination");
        Ok(ratings)
    }

    /// Total bookings per membership status, ordered by status.
    ///
    /// Every status held by some passenger is reported, with 0 when its
    /// holders have no bookings.
    pub fn bookings_per_membership_status(&self) -> Result<Vec<MembershipBookings>> {
        let snapshot = self.store.snapshot()?;

        let statuses = snapshot.passengers.iter().map(|p| p.membership_status.as_str());
        let booked_statuses = snapshot
            .bookings
            .iter()
            .filter_map(|b| snapshot.passenger(b.pin))
            .map(|p| p.membership_status.as_str());

        let totals: Vec<MembershipBookings> = algebra::count_per_key(statuses, booked_statuses)
            .into_iter()
            .map(|(status, total_bookings)| MembershipBookings {
                membership_status: status.to_string(),
                total_bookings,
            })
            .collect();

        tracing::debug!(rows = totals.len(), "bookings per membership status");
        Ok(totals)
    }

    /// Add 0.5 to every rating at or below 2.0; returns the number updated.
    ///
    /// Not idempotent: a rating still at or below the threshold afterwards is
    /// raised again on the next run.
    pub fn bump_low_ratings(&self) -> Result<usize> {
        let updated = self.store.update_drivers_where(|snapshot| {
            snapshot
                .drivers
                .iter()
                .filter(|d| d.rating <= RATING_BUMP_THRESHOLD)
                .map(|d| Driver::new(d.pin, d.rating + RATING_BUMP))
                .collect()
        })?;

        if updated == 0 {
            tracing::warn!("No driver ratings at or below {}", RATING_BUMP_THRESHOLD);
        } else {
            tracing::info!(updated, "Bumped low driver ratings");
        }
        Ok(updated)
    }

    /// Trips departing `city` (exact, case-sensitive match), ordered by TripID
    pub fn trips_departing(&self, city: &str) -> Result<Vec<Trip>> {
        let trips = self.store.find_trips_departing(city)?;
        tracing::debug!(city, rows = trips.len(), "trips departing");
        Ok(trips)
    }

    /// Trips nobody booked, ordered by TripID
    pub fn trips_without_bookings(&self) -> Result<Vec<Trip>> {
        let snapshot = self.store.snapshot()?;

        let trips: Vec<Trip> = algebra::anti_join(&snapshot.trips, &snapshot.bookings, |t| t.trip_id, |b| b.trip_id)
            .into_iter()
            .cloned()
            .collect();

        tracing::debug!(rows = trips.len(), "trips without bookings");
        Ok(trips)
    }

    /// Each driver's most-booked trip, ordered by driver PIN.
    ///
    /// Ties go to the lowest TripID. Drivers without trips are left out; a
    /// driver whose trips are all unbooked reports their first trip with 0.
    pub fn most_booked_trip_per_driver(&self) -> Result<Vec<TopTrip>> {
        let snapshot = self.store.snapshot()?;
        let per_trip = snapshot.bookings_per_trip();

        let trip_counts = snapshot.trips.iter().filter_map(|trip| {
            let owner = snapshot.car(trip.car_id)?.pin;
            let count = per_trip.get(&trip.trip_id).copied().unwrap_or(0);
            Some((owner, (trip.trip_id, count)))
        });

        let top: Vec<TopTrip> = algebra::group_by(trip_counts, |pair| pair)
            .into_iter()
            .filter_map(|(driver_pin, trips)| {
                trips
                    .into_iter()
                    .min_by(|(a_id, a_count), (b_id, b_count)| b_count.cmp(a_count).then(a_id.cmp(b_id)))
                    .map(|(trip_id, number_of_bookings)| TopTrip {
                        driver_pin,
                        trip_id,
                        number_of_bookings,
                    })
            })
            .collect();

        tracing::debug!(rows = top.len(), "most booked trip per driver");
        Ok(top)
    }

    /// Trips whose bookings reach their seats available, ordered by CarID then TripID.
    ///
    /// Reported per (car, trip); bookings of every status count.
    pub fn full_trips(&self) -> Result<Vec<FullTrip>> {
        let snapshot = self.store.snapshot()?;
        let per_trip = snapshot.bookings_per_trip();

        let mut full: Vec<FullTrip> = snapshot
            .trips
            .iter()
            .filter_map(|trip| {
                let count = per_trip.get(&trip.trip_id).copied().unwrap_or(0);
                let seats = usize::try_from(trip.seats_available).unwrap_or(0);
                (count >= seats).then(|| FullTrip {
                    car_id: trip.car_id,
                    trip_id: trip.trip_id,
                    seats_available: trip.seats_available,
                    number_of_bookings: count,
                })
            })
            .collect();
        full.sort_by_key(|f| (f.car_id, f.trip_id));

        tracing::debug!(rows = full.len(), "full trips");
        Ok(full)
    }
}

/// Drivers with no matching car, in PIN order
fn carless_drivers(snapshot: &Snapshot) -> Vec<&Driver> {
    algebra::anti_join(&snapshot.drivers, &snapshot.cars, |d| d.pin, |c| c.pin)
}

fn driver_profile(snapshot: &Snapshot, driver: &Driver) -> Option<DriverProfile> {
    let participant = snapshot.participant(driver.pin)?;
    Some(DriverProfile {
        pin: driver.pin,
        name: participant.name.clone(),
        age: participant.age,
        rating: driver.rating,
    })
}

fn passenger_profile(snapshot: &Snapshot, passenger: &Passenger) -> Option<PassengerProfile> {
    let participant = snapshot.participant(passenger.pin)?;
    Some(PassengerProfile {
        pin: passenger.pin,
        name: participant.name.clone(),
        age: participant.age,
        membership_status: passenger.membership_status.clone(),
    })
}

/// Every passenger joined with their participant record, in PIN order
fn passenger_profiles(snapshot: &Snapshot) -> Vec<PassengerProfile> {
    snapshot
        .passengers
        .iter()
        .filter_map(|passenger| passenger_profile(snapshot, passenger))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::Error;
    use crate::model::Booking;

    fn pins<T>(rows: &[T], pin: impl Fn(&T) -> Pin) -> Vec<Pin> {
        rows.iter().map(pin).collect()
    }

    /// Drivers 1, 3, 5, 6; passengers 2, 3, 4, 6; driver 1 owns cars 10 and 11,
    /// driver 3 owns car 12; drivers 5 and 6 own nothing.
    fn community() -> SqliteStore {
        let dataset = Dataset {
            participants: vec![
                Participant::new(1, "Ali", 40),
                Participant::new(2, "Ayse", 31),
                Participant::new(3, "Can", 25),
                Participant::new(4, "Deniz", 30),
                Participant::new(5, "Ece", 50),
                Participant::new(6, "Fatma", 22),
            ],
            passengers: vec![
                Passenger::new(2, "Gold"),
                Passenger::new(3, "Silver"),
                Passenger::new(4, "Gold"),
                Passenger::new(6, "Bronze"),
            ],
            drivers: vec![
                Driver::new(1, 4.0),
                Driver::new(3, 2.0),
                Driver::new(5, 1.6),
                Driver::new(6, 2.1),
            ],
            cars: vec![
                Car::new(10, 1, "Red", "Fiat"),
                Car::new(11, 1, "Blue", "Renault"),
                Car::new(12, 3, "White", "Toyota"),
            ],
            trips: vec![
                Trip::new(100, 10, "2024-06-01", "Ankara", "Izmir", 2),
                Trip::new(101, 10, "2024-06-05", "Ankara", "Izmir", 3),
                Trip::new(102, 12, "2024-06-01", "Istanbul", "Izmir", 1),
                Trip::new(103, 12, "2024-07-01", "Ankara", "Bursa", 4),
                Trip::new(104, 12, "2024-07-02", "Bursa", "Ankara", 1),
                Trip::new(105, 10, "2024-08-01", "Izmir", "Ankara", 2),
            ],
            bookings: vec![
                Booking::new(100, 2, "Confirmed"),
                Booking::new(100, 4, "Confirmed"),
                Booking::new(101, 2, "Confirmed"),
                Booking::new(102, 2, "Pending"),
                Booking::new(103, 4, "Confirmed"),
                Booking::new(104, 4, "Confirmed"),
            ],
        };

        let store = SqliteStore::open_in_memory().unwrap();
        store.load_dataset(&dataset).unwrap();
        store
    }

    #[test]
    fn test_all_drivers_ordered_by_pin() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let drivers = engine.all_drivers().unwrap();
        assert_eq!(pins(&drivers, |d| d.pin), vec![1, 3, 5, 6]);
        assert_eq!(drivers[0].rating, 4.0);
    }

    #[test]
    fn test_dual_role_participants() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let both = engine.dual_role_participants().unwrap();
        assert_eq!(pins(&both, |p| p.pin), vec![3, 6]);
        assert_eq!(both[0].name, "Can");
    }

    #[test]
    fn test_drivers_without_cars() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let carless = engine.drivers_without_cars().unwrap();
        assert_eq!(carless.len(), 2);
        assert_eq!(carless[0].pin, 5);
        assert_eq!(carless[0].name, "Ece");
        assert_eq!(carless[0].age, 50);
        assert_eq!(carless[0].rating, 1.6);
        assert_eq!(carless[1].pin, 6);
    }

    #[test]
    fn test_carless_and_car_owning_drivers_partition_all_drivers() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let carless: BTreeSet<Pin> = engine.drivers_without_cars().unwrap().iter().map(|d| d.pin).collect();
        let owners: BTreeSet<Pin> = store.snapshot().unwrap().cars.iter().map(|c| c.pin).collect();
        let all: BTreeSet<Pin> = engine.all_drivers().unwrap().iter().map(|d| d.pin).collect();

        assert!(carless.is_disjoint(&owners));
        assert_eq!(carless.union(&owners).copied().collect::<BTreeSet<_>>(), all);
    }

    #[test]
    fn test_delete_drivers_without_cars() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let expected = engine.drivers_without_cars().unwrap();
        let removed = engine.delete_drivers_without_cars().unwrap();

        assert_eq!(removed, expected.len());
        assert_eq!(pins(&engine.all_drivers().unwrap(), |d| d.pin), vec![1, 3]);
        assert_eq!(engine.delete_drivers_without_cars().unwrap(), 0);
    }

    #[test]
    fn test_delete_without_any_cars_keeps_participants_and_passengers() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_participants(&[
                Participant::new(1, "Ali", 40),
                Participant::new(2, "Ayse", 31),
                Participant::new(3, "Can", 25),
            ])
            .unwrap();
        store.insert_drivers(&[Driver::new(1, 3.0), Driver::new(2, 4.0)]).unwrap();
        store.insert_passengers(&[Passenger::new(2, "Gold"), Passenger::new(3, "Silver")]).unwrap();
        let engine = QueryEngine::new(&store);

        assert_eq!(engine.delete_drivers_without_cars().unwrap(), 2);

        let stats = store.stats().unwrap();
        assert_eq!(stats.drivers, 0);
        assert_eq!(stats.participants, 3);
        assert_eq!(stats.passengers, 2);
    }

    #[test]
    fn test_cars_without_trips() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let idle = engine.cars_without_trips().unwrap();
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].car_id, 11);
        assert_eq!(idle[0].brand, "Renault");
    }

    #[test]
    fn test_passengers_without_bookings() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let idle = engine.passengers_without_bookings().unwrap();
        assert_eq!(pins(&idle, |p| p.pin), vec![3, 6]);
        assert_eq!(idle[1].membership_status, "Bronze");
    }

    #[test]
    fn test_trips_on_route() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let trips = engine.trips_on_route("Ankara", "Izmir", "2024-06-01").unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].trip_id, 100);

        assert!(engine.trips_on_route("ankara", "Izmir", "2024-06-01").unwrap().is_empty());
    }

    #[test]
    fn test_passengers_on_every_trip_to_city() {
        let store = community();
        let engine = QueryEngine::new(&store);

        // Izmir trips are 100, 101, 102; only Ayse booked all three
        let izmir = engine.passengers_on_every_trip_to("Izmir").unwrap();
        assert_eq!(izmir.len(), 1);
        assert_eq!(izmir[0].pin, 2);
        assert_eq!(izmir[0].membership_status, "Gold");

        let bursa = engine.passengers_on_every_trip_to("Bursa").unwrap();
        assert_eq!(pins(&bursa, |p| p.pin), vec![4]);
    }

    #[test]
    fn test_passengers_on_every_trip_to_unserved_city_is_empty() {
        let store = community();
        let engine = QueryEngine::new(&store);

        assert!(engine.passengers_on_every_trip_to("Paris").unwrap().is_empty());
    }

    #[test]
    fn test_lightly_booked_cars() {
        let store = community();
        let engine = QueryEngine::new(&store);

        // Car 10 has two booked trips, car 11 none at all
        assert_eq!(engine.lightly_booked_cars(1).unwrap(), vec![10, 11]);
        // Car 12 has three booked trips
        assert!(engine.lightly_booked_cars(3).unwrap().is_empty());
        assert!(engine.lightly_booked_cars(42).unwrap().is_empty());
    }

    #[test]
    fn test_average_age_of_confirmed_passengers() {
        let store = community();
        let engine = QueryEngine::new(&store);

        // Ayse (31) on 100 and 101, Deniz (30) on 100
        let june = engine
            .average_age_of_confirmed_passengers("Ankara", "2024-06-01", "2024-06-30")
            .unwrap()
            .unwrap();
        assert!((june - 92.0 / 3.0).abs() < 1e-9);

        let single_day = engine
            .average_age_of_confirmed_passengers("Ankara", "2024-06-05", "2024-06-05")
            .unwrap();
        assert_eq!(single_day, Some(31.0));
    }

    #[test]
    fn test_average_age_is_absent_without_matches() {
        let store = community();
        let engine = QueryEngine::new(&store);

        // Only a pending booking departs Istanbul
        let pending_only = engine
            .average_age_of_confirmed_passengers("Istanbul", "2024-01-01", "2024-12-31")
            .unwrap();
        assert_eq!(pending_only, None);

        let out_of_range = engine
            .average_age_of_confirmed_passengers("Ankara", "2025-01-01", "2025-12-31")
            .unwrap();
        assert_eq!(out_of_range, None);
    }

    #[test]
    fn test_average_age_single_booking_is_exact() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_participants(&[Participant::new(1, "Ali", 45), Participant::new(2, "Ayse", 30)]).unwrap();
        store.insert_drivers(&[Driver::new(1, 4.0)]).unwrap();
        store.insert_passengers(&[Passenger::new(2, "Gold")]).unwrap();
        store.insert_cars(&[Car::new(10, 1, "Red", "Fiat")]).unwrap();
        store.insert_trips(&[Trip::new(100, 10, "2024-06-01", "Ankara", "Izmir", 2)]).unwrap();
        store.insert_bookings(&[Booking::new(100, 2, "Confirmed")]).unwrap();
        let engine = QueryEngine::new(&store);

        let average = engine
            .average_age_of_confirmed_passengers("Ankara", "2024-06-01", "2024-06-01")
            .unwrap();
        assert_eq!(average, Some(30.0));
    }

    #[test]
    fn test_passengers_on_trip() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let on_board = engine.passengers_on_trip(100).unwrap();
        assert_eq!(pins(&on_board, |p| p.pin), vec![2, 4]);
        assert_eq!(on_board[1].name, "Deniz");

        assert!(engine.passengers_on_trip(999).unwrap().is_empty());
    }

    #[test]
    fn test_driver_scores() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let scores = engine.driver_scores().unwrap();
        assert_eq!(scores.len(), 2);

        assert_eq!(scores[0].pin, 1);
        assert_eq!(scores[0].number_of_bookings, 3);
        assert_eq!(scores[0].driver_score, 12.0);

        assert_eq!(scores[1].pin, 3);
        assert_eq!(scores[1].number_of_bookings, 3);
        assert_eq!(scores[1].driver_score, 6.0);
    }

    #[test]
    fn test_driver_score_ties_break_by_pin() {
        let store = SqliteStore::open_in_memory().unwrap();
        let participants: Vec<Participant> = (1..=7).map(|pin| Participant::new(pin, format!("P{}", pin), 30)).collect();
        store.insert_participants(&participants).unwrap();
        store.insert_drivers(&[Driver::new(7, 3.0), Driver::new(4, 2.0)]).unwrap();
        store
            .insert_passengers(&[Passenger::new(1, "Gold"), Passenger::new(2, "Gold"), Passenger::new(3, "Gold")])
            .unwrap();
        store.insert_cars(&[Car::new(70, 7, "Red", "Fiat"), Car::new(40, 4, "Blue", "Kia")]).unwrap();
        store
            .insert_trips(&[
                Trip::new(700, 70, "2024-06-01", "Ankara", "Izmir", 4),
                Trip::new(400, 40, "2024-06-01", "Ankara", "Bursa", 4),
            ])
            .unwrap();
        store
            .insert_bookings(&[
                Booking::new(700, 1, "Confirmed"),
                Booking::new(700, 2, "Confirmed"),
                Booking::new(400, 1, "Confirmed"),
                Booking::new(400, 2, "Pending"),
                Booking::new(400, 3, "Cancelled"),
            ])
            .unwrap();
        let engine = QueryEngine::new(&store);

        // 3.0 x 2 and 2.0 x 3 both score 6.0
        let scores = engine.driver_scores().unwrap();
        assert_eq!(pins(&scores, |s| s.pin), vec![4, 7]);
        assert_eq!(scores[0].driver_score, scores[1].driver_score);
    }

    #[test]
    fn test_average_rating_per_destination() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let ratings = engine.average_rating_per_destination().unwrap();
        let cities: Vec<&str> = ratings.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Ankara", "Bursa", "Izmir"]);

        // Ankara: driver 3 (2.0) and driver 1 (4.0)
        assert!((ratings[0].average_rating - 3.0).abs() < 1e-9);
        assert!((ratings[1].average_rating - 2.0).abs() < 1e-9);
        // Izmir: two trips by driver 1 and one by driver 3
        assert!((ratings[2].average_rating - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bookings_per_membership_status() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let totals = engine.bookings_per_membership_status().unwrap();
        let summary: Vec<(&str, usize)> = totals
            .iter()
            .map(|t| (t.membership_status.as_str(), t.total_bookings))
            .collect();

        assert_eq!(summary, vec![("Bronze", 0), ("Gold", 6), ("Silver", 0)]);
    }

    #[test]
    fn test_bump_low_ratings() {
        let store = community();
        let engine = QueryEngine::new(&store);

        // Driver 3 sits exactly on the threshold, driver 5 below, driver 6 above
        assert_eq!(engine.bump_low_ratings().unwrap(), 2);

        let drivers = engine.all_drivers().unwrap();
        assert_eq!(drivers[0].rating, 4.0);
        assert!((drivers[1].rating - 2.5).abs() < 1e-9);
        assert!((drivers[2].rating - 2.1).abs() < 1e-9);
        assert_eq!(drivers[3].rating, 2.1);

        // Everyone is now above the threshold
        assert_eq!(engine.bump_low_ratings().unwrap(), 0);
    }

    #[test]
    fn test_bump_low_ratings_repeats_while_below_threshold() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_participants(&[Participant::new(1, "Ali", 40)]).unwrap();
        store.insert_drivers(&[Driver::new(1, 1.0)]).unwrap();
        let engine = QueryEngine::new(&store);

        assert_eq!(engine.bump_low_ratings().unwrap(), 1);
        assert_eq!(engine.bump_low_ratings().unwrap(), 1);
        assert_eq!(engine.all_drivers().unwrap()[0].rating, 2.0);
        assert_eq!(engine.bump_low_ratings().unwrap(), 1);
        assert_eq!(engine.all_drivers().unwrap()[0].rating, 2.5);
        assert_eq!(engine.bump_low_ratings().unwrap(), 0);
    }

    #[test]
    fn test_trips_departing() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let trips = engine.trips_departing("Ankara").unwrap();
        assert_eq!(trips.iter().map(|t| t.trip_id).collect::<Vec<_>>(), vec![100, 101, 103]);
        assert!(engine.trips_departing("ANKARA").unwrap().is_empty());
    }

    #[test]
    fn test_trips_without_bookings() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let trips = engine.trips_without_bookings().unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].trip_id, 105);
    }

    #[test]
    fn test_most_booked_trip_per_driver() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let top = engine.most_booked_trip_per_driver().unwrap();
        assert_eq!(
            top,
            vec![
                TopTrip { driver_pin: 1, trip_id: 100, number_of_bookings: 2 },
                // 102, 103 and 104 each have one booking; lowest TripID wins
                TopTrip { driver_pin: 3, trip_id: 102, number_of_bookings: 1 },
            ]
        );
    }

    #[test]
    fn test_most_booked_trip_for_unbooked_driver_is_first_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_participants(&[Participant::new(1, "Ali", 40)]).unwrap();
        store.insert_drivers(&[Driver::new(1, 3.0)]).unwrap();
        store.insert_cars(&[Car::new(10, 1, "Red", "Fiat")]).unwrap();
        store
            .insert_trips(&[
                Trip::new(202, 10, "2024-06-02", "Ankara", "Izmir", 3),
                Trip::new(201, 10, "2024-06-01", "Ankara", "Izmir", 3),
            ])
            .unwrap();
        let engine = QueryEngine::new(&store);

        let top = engine.most_booked_trip_per_driver().unwrap();
        assert_eq!(top, vec![TopTrip { driver_pin: 1, trip_id: 201, number_of_bookings: 0 }]);
    }

    #[test]
    fn test_full_trips() {
        let store = community();
        let engine = QueryEngine::new(&store);

        let full = engine.full_trips().unwrap();
        let keys: Vec<(CarId, TripId)> = full.iter().map(|f| (f.car_id, f.trip_id)).collect();
        assert_eq!(keys, vec![(10, 100), (12, 102), (12, 104)]);
        assert_eq!(full[0].number_of_bookings, 2);
        assert_eq!(full[0].seats_available, 2);
    }

    #[test]
    fn test_trip_offering_no_seats_is_full() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_participants(&[Participant::new(1, "Ali", 40)]).unwrap();
        store.insert_drivers(&[Driver::new(1, 3.0)]).unwrap();
        store.insert_cars(&[Car::new(10, 1, "Red", "Fiat")]).unwrap();
        store
            .insert_trips(&[
                Trip::new(100, 10, "2024-06-01", "Ankara", "Izmir", 0),
                Trip::new(101, 10, "2024-06-02", "Ankara", "Izmir", 1),
            ])
            .unwrap();
        let engine = QueryEngine::new(&store);

        let full = engine.full_trips().unwrap();
        assert_eq!(
            full,
            vec![FullTrip { car_id: 10, trip_id: 100, seats_available: 0, number_of_bookings: 0 }]
        );
    }

    #[test]
    fn test_store_failures_reach_the_caller() {
        let store = community();
        store.drop_tables().unwrap();
        let engine = QueryEngine::new(&store);

        assert!(matches!(engine.driver_scores(), Err(Error::StoreUnavailable(_))));
        assert!(matches!(engine.all_drivers(), Err(Error::StoreUnavailable(_))));
        assert!(matches!(engine.trips_departing("Ankara"), Err(Error::StoreUnavailable(_))));
        assert!(matches!(engine.bump_low_ratings(), Err(Error::StoreUnavailable(_))));
    }

    #[test]
    fn test_empty_store_yields_empty_results() {
        let store = SqliteStore::open_in_memory().unwrap();
        let engine = QueryEngine::new(&store);

        assert!(engine.all_drivers().unwrap().is_empty());
        assert!(engine.dual_role_participants().unwrap().is_empty());
        assert!(engine.driver_scores().unwrap().is_empty());
        assert!(engine.average_rating_per_destination().unwrap().is_empty());
        assert!(engine.bookings_per_membership_status().unwrap().is_empty());
        assert!(engine.most_booked_trip_per_driver().unwrap().is_empty());
        assert!(engine.full_trips().unwrap().is_empty());
        assert_eq!(engine.average_age_of_confirmed_passengers("Ankara", "0", "9").unwrap(), None);
        assert_eq!(engine.delete_drivers_without_cars().unwrap(), 0);
        assert_eq!(engine.bump_low_ratings().unwrap(), 0);
    }
}
