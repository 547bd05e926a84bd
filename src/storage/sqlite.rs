//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, Params, Row, Statement, params};
use crate::Result;
use crate::dataset::Dataset;
use crate::model::{Booking, Car, Driver, Participant, Passenger, Pin, Trip};
use super::schema;
use super::snapshot::Snapshot;

pub(crate) const SELECT_PARTICIPANTS: &str =
    "SELECT pin, name, age FROM participants ORDER BY pin";
pub(crate) const SELECT_PASSENGERS: &str =
    "SELECT pin, membership_status FROM passengers ORDER BY pin";
pub(crate) const SELECT_DRIVERS: &str =
    "SELECT pin, rating FROM drivers ORDER BY pin";
pub(crate) const SELECT_CARS: &str =
    "SELECT car_id, pin, color, brand FROM cars ORDER BY car_id";
pub(crate) const SELECT_TRIPS: &str =
    "SELECT trip_id, car_id, date, departure, destination, seats_available FROM trips ORDER BY trip_id";
pub(crate) const SELECT_BOOKINGS: &str =
    "SELECT trip_id, pin, booking_status FROM bookings ORDER BY trip_id, pin";

/// SQLite-backed relational store for the car-pooling community
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    /// Open a database file without creating any missing tables
    pub fn open_without_schema(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::connect(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self::connect(conn)?;
        store.create_tables()?;
        Ok(store)
    }

    fn connect(conn: Connection) -> Result<Self> {
        // Passenger/driver/car/trip/booking references are enforced by SQLite
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    // ========== Schema Lifecycle ==========

    /// Create any missing tables and indexes, returning the number of tables ensured
    pub fn create_tables(&self) -> Result<usize> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(schema::table_statements().len())
    }

    /// Drop all tables, children first, returning the number dropped
    pub fn drop_tables(&self) -> Result<usize> {
        let mut dropped = 0;
        for table in schema::DROP_ORDER {
            self.conn.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
            dropped += 1;
        }
        tracing::info!(tables = dropped, "Dropped car-pooling tables");
        Ok(dropped)
    }

    // ========== Bulk Inserts ==========

    pub fn insert_participants(&self, participants: &[Participant]) -> Result<usize> {
        self.in_transaction(|tx| insert_rows(tx, participants))
    }

    pub fn insert_passengers(&self, passengers: &[Passenger]) -> Result<usize> {
        self.in_transaction(|tx| insert_rows(tx, passengers))
    }

    pub fn insert_drivers(&self, drivers: &[Driver]) -> Result<usize> {
        self.in_transaction(|tx| insert_rows(tx, drivers))
    }

    pub fn insert_cars(&self, cars: &[Car]) -> Result<usize> {
        self.in_transaction(|tx| insert_rows(tx, cars))
    }

    pub fn insert_trips(&self, trips: &[Trip]) -> Result<usize> {
        self.in_transaction(|tx| insert_rows(tx, trips))
    }

    pub fn insert_bookings(&self, bookings: &[Booking]) -> Result<usize> {
        self.in_transaction(|tx| insert_rows(tx, bookings))
    }

    /// Insert a whole dataset in dependency order.
    ///
    /// Either every row lands or none does.
    pub fn load_dataset(&self, dataset: &Dataset) -> Result<DbStats> {
        let stats = self.in_transaction(|tx| {
            Ok(DbStats {
                participants: insert_rows(tx, &dataset.participants)?,
                passengers: insert_rows(tx, &dataset.passengers)?,
                drivers: insert_rows(tx, &dataset.drivers)?,
                cars: insert_rows(tx, &dataset.cars)?,
                trips: insert_rows(tx, &dataset.trips)?,
                bookings: insert_rows(tx, &dataset.bookings)?,
            })
        })?;
        tracing::info!(rows = stats.total(), "Loaded dataset");
        Ok(stats)
    }

    // ========== Scans & Filters ==========

    /// All drivers ordered by PIN
    pub fn all_drivers(&self) -> Result<Vec<Driver>> {
        select_all(&self.conn, SELECT_DRIVERS, row_to_driver)
    }

    /// Trips matching departure, destination and date exactly
    pub fn find_trips_on_route(&self, departure: &str, destination: &str, date: &str) -> Result<Vec<Trip>> {
        select_with(
            &self.conn,
            "SELECT trip_id, car_id, date, departure, destination, seats_available
             FROM trips
             WHERE departure = ?1 AND destination = ?2 AND date = ?3
             ORDER BY trip_id",
            params![departure, destination, date],
            row_to_trip,
        )
    }

    /// Trips whose departure city equals `city` (case-sensitive)
    pub fn find_trips_departing(&self, city: &str) -> Result<Vec<Trip>> {
        select_with(
            &self.conn,
            "SELECT trip_id, car_id, date, departure, destination, seats_available
             FROM trips
             WHERE departure = ?1
             ORDER BY trip_id",
            params![city],
            row_to_trip,
        )
    }

    /// Read all six collections as one consistent view
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.in_transaction(Snapshot::read)
    }

    // ========== Atomic Mutations ==========

    /// Delete the drivers selected from a snapshot, atomically.
    ///
    /// `select` sees the pre-deletion state; the read and the deletes share
    /// one transaction, so a failure leaves the store untouched.
    pub fn delete_drivers_where<F>(&self, select: F) -> Result<usize>
    where
        F: FnOnce(&Snapshot) -> Vec<Pin>,
    {
        self.in_transaction(|tx| {
            let snapshot = Snapshot::read(tx)?;
            let pins = select(&snapshot);

            let mut stmt = tx.prepare("DELETE FROM drivers WHERE pin = ?1")?;
            let mut removed = 0;
            for pin in pins {
                removed += stmt.execute([pin])?;
            }
            Ok(removed)
        })
    }

    /// Write back the driver rows produced from a snapshot, atomically.
    ///
    /// Returns the number of drivers whose row was updated.
    pub fn update_drivers_where<F>(&self, update: F) -> Result<usize>
    where
        F: FnOnce(&Snapshot) -> Vec<Driver>,
    {
        self.in_transaction(|tx| {
            let snapshot = Snapshot::read(tx)?;
            let updated_rows = update(&snapshot);

            let mut stmt = tx.prepare("UPDATE drivers SET rating = ?2 WHERE pin = ?1")?;
            let mut updated = 0;
            for driver in &updated_rows {
                updated += stmt.execute(params![driver.pin, driver.rating])?;
            }
            Ok(updated)
        })
    }

    // ========== Statistics ==========

    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            participants: self.count_rows("participants")?,
            passengers: self.count_rows("passengers")?,
            drivers: self.count_rows("drivers")?,
            cars: self.count_rows("cars")?,
            trips: self.count_rows("trips")?,
            bookings: self.count_rows("bookings")?,
        })
    }

    /// Run `work` inside a transaction; an error rolls it back on drop
    fn in_transaction<T>(&self, work: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = work(&*tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// A row type with a fixed INSERT statement
trait Record {
    const INSERT: &'static str;

    fn bind(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

impl Record for Participant {
    const INSERT: &'static str = "INSERT INTO participants (pin, name, age) VALUES (?1, ?2, ?3)";

    fn bind(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.pin, self.name, self.age])
    }
}

impl Record for Passenger {
    const INSERT: &'static str = "INSERT INTO passengers (pin, membership_status) VALUES (?1, ?2)";

    fn bind(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.pin, self.membership_status])
    }
}

impl Record for Driver {
    const INSERT: &'static str = "INSERT INTO drivers (pin, rating) VALUES (?1, ?2)";

    fn bind(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.pin, self.rating])
    }
}

impl Record for Car {
    const INSERT: &'static str = "INSERT INTO cars (car_id, pin, color, brand) VALUES (?1, ?2, ?3, ?4)";

    fn bind(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.car_id, self.pin, self.color, self.brand])
    }
}

impl Record for Trip {
    const INSERT: &'static str = r#"
        INSERT INTO trips (trip_id, car_id, date, departure, destination, seats_available)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#;

    fn bind(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.trip_id,
            self.car_id,
            self.date,
            self.departure,
            self.destination,
            self.seats_available,
        ])
    }
}

impl Record for Booking {
    const INSERT: &'static str = "INSERT INTO bookings (trip_id, pin, booking_status) VALUES (?1, ?2, ?3)";

    fn bind(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.trip_id, self.pin, self.booking_status])
    }
}

fn insert_rows<R: Record>(conn: &Connection, rows: &[R]) -> Result<usize> {
    let mut stmt = conn.prepare(R::INSERT)?;
    let mut inserted = 0;
    for row in rows {
        inserted += row.bind(&mut stmt)?;
    }
    Ok(inserted)
}

pub(crate) fn select_all<T>(
    conn: &Connection,
    sql: &str,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    select_with(conn, sql, params![], map)
}

fn select_with<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// ========== Row Mapping ==========

pub(crate) fn row_to_participant(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        pin: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
    })
}

pub(crate) fn row_to_passenger(row: &Row<'_>) -> rusqlite::Result<Passenger> {
    Ok(Passenger {
        pin: row.get(0)?,
        membership_status: row.get(1)?,
    })
}

pub(crate) fn row_to_driver(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        pin: row.get(0)?,
        rating: row.get(1)?,
    })
}

pub(crate) fn row_to_car(row: &Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        car_id: row.get(0)?,
        pin: row.get(1)?,
        color: row.get(2)?,
        brand: row.get(3)?,
    })
}

pub(crate) fn row_to_trip(row: &Row<'_>) -> rusqlite::Result<Trip> {
    Ok(Trip {
        trip_id: row.get(0)?,
        car_id: row.get(1)?,
        date: row.get(2)?,
        departure: row.get(3)?,
        destination: row.get(4)?,
        seats_available: row.get(5)?,
    })
}

pub(crate) fn row_to_booking(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        trip_id: row.get(0)?,
        pin: row.get(1)?,
        booking_status: row.get(2)?,
    })
}

/// Row counts per table
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DbStats {
    pub participants: usize,
    pub passengers: usize,
    pub drivers: usize,
    pub cars: usize,
    pub trips: usize,
    pub bookings: usize,
}

impl DbStats {
    /// (table, count) pairs in dependency order
    pub fn rows(&self) -> [(&'static str, usize); 6] {
        [
            ("Participants", self.participants),
            ("Passengers", self.passengers),
            ("Drivers", self.drivers),
            ("Cars", self.cars),
            ("Trips", self.trips),
            ("Bookings", self.bookings),
        ]
    }

    pub fn total(&self) -> usize {
        self.rows().iter().map(|(_, count)| count).sum()
    }
}
