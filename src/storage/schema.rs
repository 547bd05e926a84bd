//! Database schema definitions

/// SQL to create the participants table
pub const CREATE_PARTICIPANTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS participants (
    pin INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL
)
"#;

/// SQL to create the passengers table (1:1 specialization of participants)
pub const CREATE_PASSENGERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS passengers (
    pin INTEGER PRIMARY KEY REFERENCES participants(pin),
    membership_status TEXT NOT NULL
)
"#;

/// SQL to create the drivers table (1:1 specialization of participants)
pub const CREATE_DRIVERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS drivers (
    pin INTEGER PRIMARY KEY REFERENCES participants(pin),
    rating REAL NOT NULL
)
"#;

/// SQL to create the cars table
pub const CREATE_CARS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cars (
    car_id INTEGER PRIMARY KEY,
    pin INTEGER NOT NULL REFERENCES drivers(pin),
    color TEXT NOT NULL,
    brand TEXT NOT NULL
)
"#;

/// SQL to create the trips table
pub const CREATE_TRIPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS trips (
    trip_id INTEGER PRIMARY KEY,
    car_id INTEGER NOT NULL REFERENCES cars(car_id),
    date TEXT NOT NULL,
    departure TEXT NOT NULL,
    destination TEXT NOT NULL,
    seats_available INTEGER NOT NULL
)
"#;

/// SQL to create the bookings table
/// At most one booking per (trip, passenger) pair
pub const CREATE_BOOKINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS bookings (
    trip_id INTEGER NOT NULL REFERENCES trips(trip_id),
    pin INTEGER NOT NULL REFERENCES passengers(pin),
    booking_status TEXT NOT NULL,
    PRIMARY KEY (trip_id, pin)
)
"#;

/// SQL to create indexes on the foreign keys and filtered columns
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_cars_pin ON cars(pin)",
    "CREATE INDEX IF NOT EXISTS idx_trips_car ON trips(car_id)",
    "CREATE INDEX IF NOT EXISTS idx_trips_departure ON trips(departure)",
    "CREATE INDEX IF NOT EXISTS idx_trips_destination ON trips(destination)",
    "CREATE INDEX IF NOT EXISTS idx_bookings_pin ON bookings(pin)",
];

/// Table creation statements, parents before children
pub fn table_statements() -> [&'static str; 6] {
    [
        CREATE_PARTICIPANTS_TABLE,
        CREATE_PASSENGERS_TABLE,
        CREATE_DRIVERS_TABLE,
        CREATE_CARS_TABLE,
        CREATE_TRIPS_TABLE,
        CREATE_BOOKINGS_TABLE,
    ]
}

/// Table names in drop order, children before parents
pub const DROP_ORDER: [&str; 6] = [
    "bookings",
    "trips",
    "cars",
    "drivers",
    "passengers",
    "participants",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = table_statements().to_vec();
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
