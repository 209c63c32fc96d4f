//! REST surface over the same reservation store the bot uses. These routes
//! bypass the conversational engine entirely; the shared repository (and its
//! unique slot index) is what keeps both writers honest.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::bot_state::AppState;
use crate::catalog::BARBERS;
use crate::models::{NewReservation, Reservation};
use crate::normalize::{normalize_date, normalize_time, parse_canonical_date};
use crate::repository::{RepositoryError, ReservationRepository as _};
use crate::scheduler::ReminderKey;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route(
            "/reservations",
            get(list_reservations).post(create_reservation).delete(cancel_reservation),
        )
        .with_state(state)
}

/// GET / - liveness probe.
async fn health() -> &'static str {
    "Servidor rodando junto com o bot 🚀"
}

/// GET /reservations - all reservations, sorted by date then time.
async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Reservation>>, (StatusCode, String)> {
    let mut rows = state.repo.list_all().await.map_err(internal)?;
    rows.sort_by(|a, b| {
        (parse_canonical_date(&a.date), &a.time, a.id)
            .cmp(&(parse_canonical_date(&b.date), &b.time, b.id))
    });
    Ok(Json(rows))
}

/// POST /reservations - direct create, same canonical forms and uniqueness
/// rules as the bot. No reminder: there is no conversation to notify.
async fn create_reservation(
    State(state): State<AppState>,
    Json(body): Json<NewReservation>,
) -> Result<(StatusCode, Json<Reservation>), (StatusCode, String)> {
    let Some(date) = normalize_date(&body.date) else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "invalid date, expected DD/MM/YYYY".into()));
    };
    if parse_canonical_date(&date).is_none() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "not a calendar date".into()));
    }
    let Some(time) = normalize_time(&body.time) else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "time outside the allowed slots".into()));
    };
    if !BARBERS.iter().any(|b| b.id == body.barber) {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "unknown barber".into()));
    }

    let created = state
        .repo
        .create(NewReservation { date, time: time.to_string(), ..body })
        .await
        .map_err(|err| match err {
            RepositoryError::Conflict => {
                (StatusCode::CONFLICT, "slot already reserved".to_string())
            }
            other => internal(other),
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
struct CancelParams {
    name: String,
    date: String,
    time: String,
}

/// DELETE /reservations - cancel by `(name, date, time)`. Also drops the
/// pending reminder, which the scheduler keys by the deleted slot.
async fn cancel_reservation(
    State(state): State<AppState>,
    Json(params): Json<CancelParams>,
) -> Result<Json<Reservation>, (StatusCode, String)> {
    let Some(date) = normalize_date(&params.date) else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "invalid date, expected DD/MM/YYYY".into()));
    };
    let Some(time) = normalize_time(&params.time) else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "time outside the allowed slots".into()));
    };

    match state.repo.find_one_and_delete(&params.name, &date, time).await.map_err(internal)? {
        Some(deleted) => {
            state.reminders.cancel(&ReminderKey {
                date: deleted.date.clone(),
                time: deleted.time.clone(),
                barber: deleted.barber.clone(),
            });
            Ok(Json(deleted))
        }
        None => Err((StatusCode::NOT_FOUND, "reservation not found".to_string())),
    }
}

fn internal(err: RepositoryError) -> (StatusCode, String) {
    log::error!("❌ HTTP request failed: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::repository::InMemoryReservationRepository;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(InMemoryReservationRepository::default()),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn body(name: &str, date: &str, time: &str, barber: &str) -> NewReservation {
        NewReservation {
            name: name.to_string(),
            phone: "11999999999".to_string(),
            service: "Corte".to_string(),
            barber: barber.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            price: 30.0,
        }
    }

    #[tokio::test]
    async fn create_normalizes_and_conflicts_on_duplicate() {
        let state = test_state();

        let (status, Json(created)) =
            create_reservation(State(state.clone()), Json(body("Ana", "1/9/25", "9:00", "joao")))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.date, "01/09/2025");
        assert_eq!(created.time, "09:00");

        let duplicate =
            create_reservation(State(state.clone()), Json(body("Bia", "01/09/2025", "09:00", "joao")))
                .await;
        assert_eq!(duplicate.unwrap_err().0, StatusCode::CONFLICT);

        let bad_barber =
            create_reservation(State(state.clone()), Json(body("Ana", "01/09/2025", "10:00", "zeca")))
                .await;
        assert_eq!(bad_barber.unwrap_err().0, StatusCode::UNPROCESSABLE_ENTITY);

        let bad_time =
            create_reservation(State(state), Json(body("Ana", "01/09/2025", "12:00", "joao")))
                .await;
        assert_eq!(bad_time.unwrap_err().0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn list_sorts_by_date_then_time() {
        let state = test_state();
        for (date, time) in
            [("10/10/2025", "09:00"), ("02/09/2025", "16:00"), ("02/09/2025", "09:00")]
        {
            create_reservation(State(state.clone()), Json(body("Ana", date, time, "joao")))
                .await
                .unwrap();
        }

        let Json(rows) = list_reservations(State(state)).await.unwrap();
        let order: Vec<_> = rows.iter().map(|r| (r.date.as_str(), r.time.as_str())).collect();
        assert_eq!(
            order,
            vec![("02/09/2025", "09:00"), ("02/09/2025", "16:00"), ("10/10/2025", "09:00")]
        );
    }

    #[tokio::test]
    async fn cancel_deletes_once_then_404s() {
        let state = test_state();
        create_reservation(State(state.clone()), Json(body("Ana", "01/09/2025", "09:00", "joao")))
            .await
            .unwrap();

        let params = || CancelParams {
            name: "Ana".to_string(),
            date: "01/09/2025".to_string(),
            time: "09:00".to_string(),
        };
        let Json(deleted) =
            cancel_reservation(State(state.clone()), Json(params())).await.unwrap();
        assert_eq!(deleted.name, "Ana");

        let missing = cancel_reservation(State(state), Json(params())).await;
        assert_eq!(missing.unwrap_err().0, StatusCode::NOT_FOUND);
    }
}
