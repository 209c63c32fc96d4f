//! Reservation persistence. Both entry points (the conversational flows and
//! the HTTP surface) go through this contract, so the `(date, time, barber)`
//! uniqueness invariant has a single enforcement point.

use async_trait::async_trait;
use thiserror::Error;

use crate::database::Database;
use crate::models::{NewReservation, Reservation};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The slot was taken between the availability check and the commit.
    /// Surfaced separately so the flow can offer another slot instead of
    /// apologizing.
    #[error("slot already reserved")]
    Conflict,
    #[error("database error: {0}")]
    Backend(#[from] sqlx::Error),
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// All reservations on a canonical `DD/MM/YYYY` date, any barber.
    async fn find_by_date(&self, date: &str) -> Result<Vec<Reservation>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<Reservation>, RepositoryError>;

    /// Persists a reservation, rejecting with [`RepositoryError::Conflict`]
    /// when the `(date, time, barber)` slot is already taken.
    async fn create(&self, reservation: NewReservation) -> Result<Reservation, RepositoryError>;

    /// Atomically deletes at most one reservation matching
    /// `(name, date, time)` and returns it.
    async fn find_one_and_delete(
        &self,
        name: &str,
        date: &str,
        time: &str,
    ) -> Result<Option<Reservation>, RepositoryError>;
}

const RESERVATION_COLUMNS: &str = "id, name, phone, service, barber, date, time, price";

pub struct PgReservationRepository {
    db: Database,
}

impl PgReservationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn find_by_date(&self, date: &str) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE date = $1 ORDER BY id"
        ))
        .bind(date)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(rows)
    }

    async fn list_all(&self) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations ORDER BY id"
        ))
        .fetch_all(&self.db.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, reservation: NewReservation) -> Result<Reservation, RepositoryError> {
        let created = sqlx::query_as::<_, Reservation>(&format!(
            "INSERT INTO reservations (name, phone, service, barber, date, time, price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(&reservation.name)
        .bind(&reservation.phone)
        .bind(&reservation.service)
        .bind(&reservation.barber)
        .bind(&reservation.date)
        .bind(&reservation.time)
        .bind(reservation.price)
        .fetch_one(&self.db.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict
            }
            _ => RepositoryError::Backend(err),
        })?;
        Ok(created)
    }

    async fn find_one_and_delete(
        &self,
        name: &str,
        date: &str,
        time: &str,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let deleted = sqlx::query_as::<_, Reservation>(&format!(
            "DELETE FROM reservations \
             WHERE id = ( \
                 SELECT id FROM reservations \
                 WHERE name = $1 AND date = $2 AND time = $3 \
                 ORDER BY id LIMIT 1 \
             ) \
             RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(name)
        .bind(date)
        .bind(time)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(deleted)
    }
}

/// In-memory repository with the same uniqueness semantics as the Postgres
/// one. Backs the engine and HTTP tests.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryReservationRepository {
    rows: std::sync::Mutex<InMemoryRows>,
}

#[cfg(test)]
#[derive(Default)]
struct InMemoryRows {
    next_id: i64,
    rows: Vec<Reservation>,
}

#[cfg(test)]
#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn find_by_date(&self, date: &str) -> Result<Vec<Reservation>, RepositoryError> {
        let guard = self.rows.lock().expect("repository lock");
        Ok(guard.rows.iter().filter(|r| r.date == date).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<Reservation>, RepositoryError> {
        let guard = self.rows.lock().expect("repository lock");
        Ok(guard.rows.clone())
    }

    async fn create(&self, reservation: NewReservation) -> Result<Reservation, RepositoryError> {
        let mut guard = self.rows.lock().expect("repository lock");
        let taken = guard.rows.iter().any(|r| {
            r.date == reservation.date
                && r.time == reservation.time
                && r.barber == reservation.barber
        });
        if taken {
            return Err(RepositoryError::Conflict);
        }
        guard.next_id += 1;
        let created = Reservation {
            id: guard.next_id,
            name: reservation.name,
            phone: reservation.phone,
            service: reservation.service,
            barber: reservation.barber,
            date: reservation.date,
            time: reservation.time,
            price: reservation.price,
        };
        guard.rows.push(created.clone());
        Ok(created)
    }

    async fn find_one_and_delete(
        &self,
        name: &str,
        date: &str,
        time: &str,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let mut guard = self.rows.lock().expect("repository lock");
        let position = guard
            .rows
            .iter()
            .position(|r| r.name == name && r.date == date && r.time == time);
        Ok(position.map(|idx| guard.rows.remove(idx)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn new_reservation(time: &str, barber: &str) -> NewReservation {
        NewReservation {
            name: "Ana".to_string(),
            phone: "11999999999".to_string(),
            service: "Corte".to_string(),
            barber: barber.to_string(),
            date: "01/09/2025".to_string(),
            time: time.to_string(),
            price: 30.0,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_slot() {
        let repo = InMemoryReservationRepository::default();
        repo.create(new_reservation("09:00", "joao")).await.unwrap();
        let second = repo.create(new_reservation("09:00", "joao")).await;
        assert!(matches!(second, Err(RepositoryError::Conflict)));
        // Same slot with another barber is a different triple.
        assert!(repo.create(new_reservation("09:00", "pedro")).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_commits_yield_one_row_and_one_conflict() {
        let repo = Arc::new(InMemoryReservationRepository::default());
        let a = {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.create(new_reservation("10:00", "joao")).await })
        };
        let b = {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.create(new_reservation("10:00", "joao")).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];
        let committed = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(RepositoryError::Conflict)))
            .count();
        assert_eq!((committed, conflicts), (1, 1));
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_one_and_delete_removes_exactly_one_match() {
        let repo = InMemoryReservationRepository::default();
        repo.create(new_reservation("09:00", "joao")).await.unwrap();
        repo.create(new_reservation("10:00", "joao")).await.unwrap();

        let deleted = repo
            .find_one_and_delete("Ana", "01/09/2025", "09:00")
            .await
            .unwrap();
        assert_eq!(deleted.map(|r| r.time), Some("09:00".to_string()));
        assert_eq!(repo.list_all().await.unwrap().len(), 1);

        let again = repo
            .find_one_and_delete("Ana", "01/09/2025", "09:00")
            .await
            .unwrap();
        assert!(again.is_none());
    }
}
