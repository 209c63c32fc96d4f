//! The cancellation flow: `cancel_name → cancel_date → cancel_time → done`.
//! Collects the identifying triple, then atomically finds-and-deletes the
//! matching reservation. Dates and times only need their syntactic form
//! here; there is nothing to gain from calendar checks when looking up an
//! existing booking. A successful deletion also cancels the reservation's
//! pending reminder.

use crate::models::{CancelStep, Flow, Session};
use crate::normalize::{normalize_date, normalize_time};
use crate::repository::{RepositoryError, ReservationRepository as _};
use crate::scheduler::ReminderKey;

use super::{StepContext, StepReply};

const RESTART: &str = "😕 Perdi os dados desta conversa. Use /cancelar para recomeçar.";

/// Feeds one inbound message to the cancellation flow at `step`.
pub async fn advance(
    session: &mut Session,
    step: CancelStep,
    text: &str,
    ctx: &StepContext<'_>,
) -> Result<StepReply, RepositoryError> {
    match step {
        CancelStep::AskName => {
            let name = text.trim();
            if name.is_empty() {
                return Ok(StepReply::prompt("Por favor, informe seu nome:"));
            }
            session.name = Some(name.to_string());
            session.flow = Flow::Cancellation(CancelStep::AskDate);
            Ok(StepReply::prompt(
                "📅 Informe a data do agendamento que deseja cancelar (DD/MM/AAAA):",
            ))
        }

        CancelStep::AskDate => {
            let Some(date) = normalize_date(text) else {
                return Ok(StepReply::prompt(
                    "❌ Data inválida. Use um formato válido (DD/MM/AAAA). Ex: 01/09/2025",
                ));
            };
            session.date = Some(date);
            session.flow = Flow::Cancellation(CancelStep::AskTime);
            Ok(StepReply::prompt(
                "⏰ Informe o horário do agendamento que deseja cancelar (HH:MM):",
            ))
        }

        CancelStep::AskTime => {
            let Some(time) = normalize_time(text) else {
                return Ok(StepReply::prompt("❌ Horário inválido. Use o formato HH:MM."));
            };
            let (Some(name), Some(date)) = (session.name.clone(), session.date.clone()) else {
                *session = Session::cancellation();
                return Ok(StepReply::prompt(RESTART));
            };
            session.time = Some(time.to_string());

            match ctx.repo.find_one_and_delete(&name, &date, time).await? {
                Some(deleted) => {
                    log::info!(
                        "🗑️ Reservation {} cancelled: {} at {} {}",
                        deleted.id,
                        deleted.name,
                        deleted.date,
                        deleted.time
                    );
                    let mut reply = StepReply::finished(format!(
                        "✅ Agendamento de *{}* para *{} às {}* cancelado com sucesso!",
                        name, date, time
                    ));
                    reply.cancel = Some(ReminderKey {
                        date: deleted.date,
                        time: deleted.time,
                        barber: deleted.barber,
                    });
                    Ok(reply)
                }
                None => Ok(StepReply::finished(
                    "❌ Agendamento não encontrado no sistema. Verifique as informações.",
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::NewReservation;
    use crate::notify::RecordingNotifier;
    use crate::repository::{InMemoryReservationRepository, ReservationRepository};

    async fn feed(
        repo: &InMemoryReservationRepository,
        session: &mut Session,
        text: &str,
    ) -> StepReply {
        let notifier = RecordingNotifier::default();
        let ctx = StepContext {
            repo,
            notifier: &notifier,
            now: NaiveDate::from_ymd_opt(2025, 8, 15).unwrap().and_hms_opt(10, 0, 0).unwrap(),
        };
        let Flow::Cancellation(step) = session.flow else {
            panic!("session left the cancellation flow");
        };
        advance(session, step, text, &ctx).await.unwrap()
    }

    fn booked() -> NewReservation {
        NewReservation {
            name: "Ana".to_string(),
            phone: "11999999999".to_string(),
            service: "Corte".to_string(),
            barber: "joao".to_string(),
            date: "01/09/2025".to_string(),
            time: "09:00".to_string(),
            price: 30.0,
        }
    }

    #[tokio::test]
    async fn cancels_then_reports_not_found_on_repeat() {
        let repo = InMemoryReservationRepository::default();
        repo.create(booked()).await.unwrap();

        let mut session = Session::cancellation();
        feed(&repo, &mut session, "Ana").await;
        feed(&repo, &mut session, "1/9/25").await; // short form normalizes
        let done = feed(&repo, &mut session, "9:00").await;

        assert!(done.completed);
        assert!(done.text.contains("cancelado com sucesso"));
        let key = done.cancel.unwrap();
        assert_eq!((key.date.as_str(), key.time.as_str(), key.barber.as_str()),
            ("01/09/2025", "09:00", "joao"));
        assert!(repo.list_all().await.unwrap().is_empty());

        // Same cancellation again: explicit not-found, still terminal.
        let mut session = Session::cancellation();
        feed(&repo, &mut session, "Ana").await;
        feed(&repo, &mut session, "01/09/2025").await;
        let missing = feed(&repo, &mut session, "09:00").await;
        assert!(missing.completed);
        assert!(missing.text.contains("não encontrado"));
        assert!(missing.cancel.is_none());
    }

    #[tokio::test]
    async fn invalid_date_and_time_reprompt_without_advancing() {
        let repo = InMemoryReservationRepository::default();
        let mut session = Session::cancellation();

        feed(&repo, &mut session, "Ana").await;
        let bad_date = feed(&repo, &mut session, "setembro").await;
        assert_eq!(session.flow, Flow::Cancellation(CancelStep::AskDate));
        assert!(bad_date.text.contains("Data inválida"));

        feed(&repo, &mut session, "01/09/2025").await;
        let bad_time = feed(&repo, &mut session, "meio-dia").await;
        assert_eq!(session.flow, Flow::Cancellation(CancelStep::AskTime));
        assert!(bad_time.text.contains("Horário inválido"));
    }

    #[tokio::test]
    async fn wrong_name_does_not_delete_someone_elses_booking() {
        let repo = InMemoryReservationRepository::default();
        repo.create(booked()).await.unwrap();

        let mut session = Session::cancellation();
        feed(&repo, &mut session, "Beatriz").await;
        feed(&repo, &mut session, "01/09/2025").await;
        let missing = feed(&repo, &mut session, "09:00").await;

        assert!(missing.completed);
        assert!(missing.text.contains("não encontrado"));
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }
}
