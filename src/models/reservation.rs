use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A committed appointment. Immutable once persisted; deleted on
/// cancellation. No two live rows share the same `(date, time, barber)`
/// triple: a unique index backs that invariant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub service: String,
    pub barber: String,
    /// Canonical `DD/MM/YYYY`.
    pub date: String,
    /// One of the allowed start times, `HH:MM`.
    pub time: String,
    pub price: f64,
}

/// A reservation about to be persisted, before the store assigns its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub name: String,
    pub phone: String,
    pub service: String,
    pub barber: String,
    pub date: String,
    pub time: String,
    pub price: f64,
}
