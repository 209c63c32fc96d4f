//! The booking flow: `ask_name → ask_phone → ask_service → ask_date →
//! ask_barber → ask_time → done`. Strictly linear; invalid input re-prompts
//! the current step and nothing else moves. The terminal step commits the
//! reservation through the repository's uniqueness-enforcing create, fires
//! the WhatsApp confirmation and hands a reminder request back to the
//! transport layer.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::availability::available_slots;
use crate::catalog::{self, ALLOWED_SLOTS, BARBERS, SERVICES};
use crate::models::{BookingStep, Flow, NewReservation, Session};
use crate::normalize::{
    normalize_date, normalize_service, normalize_time, parse_canonical_date,
    validate_booking_date, DateRejection,
};
use crate::notify::Notifier as _;
use crate::repository::{RepositoryError, ReservationRepository as _};
use crate::scheduler::ReminderKey;

use super::{ReminderRequest, StepContext, StepReply};

const REMINDER_LEAD_HOURS: i64 = 1;

const DATE_PROMPT: &str = "📅 Informe a data do agendamento (DD/MM/AAAA):";
const INVALID_DATE: &str = "❌ Data inválida. Use um formato válido (DD/MM/AAAA). Ex: 01/09/2025";
const RESTART: &str =
    "😕 Perdi os dados desta conversa. Vamos recomeçar: qual é o seu nome?";

fn services_prompt() -> String {
    let mut text = String::from("Qual serviço você deseja?");
    for service in &SERVICES {
        text.push_str(&format!("\n💈 {} — R$ {:.2}", service.name, service.price));
    }
    text
}

fn barbers_prompt() -> String {
    let names: Vec<_> = BARBERS.iter().map(|b| format!("- {}", b.display_name)).collect();
    format!(
        "💈 Escolha um barbeiro disponível:\n{}\n\nDigite o nome do barbeiro desejado:",
        names.join("\n")
    )
}

fn appointment_start(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = parse_canonical_date(date)?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Some(date.and_time(time))
}

/// Feeds one inbound message to the booking flow at `step`.
pub async fn advance(
    session: &mut Session,
    step: BookingStep,
    text: &str,
    ctx: &StepContext<'_>,
) -> Result<StepReply, RepositoryError> {
    match step {
        BookingStep::AskName => {
            let name = text.trim();
            if name.is_empty() {
                return Ok(StepReply::prompt("Por favor, informe seu nome:"));
            }
            session.name = Some(name.to_string());
            session.flow = Flow::Booking(BookingStep::AskPhone);
            Ok(StepReply::prompt(
                "📞 Qual seu número de WhatsApp (com DDD)? Ex: 11987654321",
            ))
        }

        BookingStep::AskPhone => {
            let phone = text.trim();
            if phone.is_empty() {
                return Ok(StepReply::prompt("📞 Por favor, informe seu número de WhatsApp:"));
            }
            // Accepted verbatim: no format validation (known gap).
            session.phone = Some(phone.to_string());
            session.flow = Flow::Booking(BookingStep::AskService);
            Ok(StepReply::prompt(services_prompt()))
        }

        BookingStep::AskService => match normalize_service(text) {
            None => Ok(StepReply::prompt(
                "❌ Serviço inválido. Escolha entre: Corte, Barba ou Corte + Barba.",
            )),
            Some(service) => {
                session.service = Some(service);
                session.price = Some(service.price);
                session.flow = Flow::Booking(BookingStep::AskDate);
                Ok(StepReply::prompt(DATE_PROMPT))
            }
        },

        BookingStep::AskDate => {
            let Some(date) = normalize_date(text) else {
                return Ok(StepReply::prompt(INVALID_DATE));
            };
            match validate_booking_date(&date, ctx.now.date()) {
                Err(DateRejection::NotACalendarDate) => Ok(StepReply::prompt(INVALID_DATE)),
                Err(DateRejection::Sunday) => Ok(StepReply::prompt(
                    "⛔ Não realizamos atendimentos aos domingos.",
                )),
                Err(DateRejection::Past) => {
                    Ok(StepReply::prompt("⛔ A data informada já passou."))
                }
                Err(DateRejection::TooFarAhead) => Ok(StepReply::prompt(
                    "📅 Só é possível agendar até 1 ano a partir de hoje.",
                )),
                Ok(_) => {
                    session.date = Some(date);
                    session.flow = Flow::Booking(BookingStep::AskBarber);
                    Ok(StepReply::prompt(barbers_prompt()))
                }
            }
        }

        BookingStep::AskBarber => {
            let Some(barber) = catalog::find_barber(text) else {
                let names: Vec<_> = BARBERS.iter().map(|b| b.display_name).collect();
                return Ok(StepReply::prompt(format!(
                    "❌ Barbeiro inválido. Escolha entre:\n{}",
                    names.join(", ")
                )));
            };
            let Some(date) = session.date.clone() else {
                *session = Session::booking();
                return Ok(StepReply::prompt(RESTART));
            };

            let reservations = ctx.repo.find_by_date(&date).await?;
            let open = available_slots(&date, barber.id, &reservations);
            if open.is_empty() {
                // Fully booked: return to date selection instead of
                // dead-ending here with no way to change the date.
                session.barber = None;
                session.flow = Flow::Booking(BookingStep::AskDate);
                return Ok(StepReply::prompt(format!(
                    "😓 Não há horários disponíveis para {} com {}. Informe outra data (DD/MM/AAAA):",
                    date, barber.display_name
                )));
            }

            session.barber = Some(barber);
            session.flow = Flow::Booking(BookingStep::AskTime);
            Ok(StepReply::prompt(format!(
                "⏰ Horários disponíveis para {} com {}:\n{}\n\nDigite o horário desejado (HH:MM):",
                date,
                barber.display_name,
                open.join("\n")
            )))
        }

        BookingStep::AskTime => {
            let Some(time) = normalize_time(text) else {
                return Ok(StepReply::prompt(format!(
                    "⏰ Horário inválido ou indisponível. Escolha entre: {}",
                    ALLOWED_SLOTS.join(", ")
                )));
            };
            let (Some(name), Some(phone), Some(service), Some(price), Some(date), Some(barber)) = (
                session.name.clone(),
                session.phone.clone(),
                session.service,
                session.price,
                session.date.clone(),
                session.barber,
            ) else {
                *session = Session::booking();
                return Ok(StepReply::prompt(RESTART));
            };

            // The slot list shown at ask_barber may be stale by now.
            let reservations = ctx.repo.find_by_date(&date).await?;
            let open = available_slots(&date, barber.id, &reservations);
            if open.is_empty() {
                session.barber = None;
                session.flow = Flow::Booking(BookingStep::AskDate);
                return Ok(StepReply::prompt(format!(
                    "😓 Não há mais horários disponíveis para {} com {}. Informe outra data (DD/MM/AAAA):",
                    date, barber.display_name
                )));
            }
            if !open.contains(&time) {
                return Ok(StepReply::prompt(format!(
                    "⏰ Esse horário não está disponível. Horários livres: {}",
                    open.join(", ")
                )));
            }

            let Some(start) = appointment_start(&date, time) else {
                *session = Session::booking();
                return Ok(StepReply::prompt(RESTART));
            };
            if start < ctx.now {
                return Ok(StepReply::prompt("⛔ Esse horário já passou. Escolha outro."));
            }

            let created = match ctx
                .repo
                .create(NewReservation {
                    name: name.clone(),
                    phone: phone.clone(),
                    service: service.name.to_string(),
                    barber: barber.id.to_string(),
                    date: date.clone(),
                    time: time.to_string(),
                    price,
                })
                .await
            {
                Ok(created) => created,
                Err(RepositoryError::Conflict) => {
                    // Lost the race between the availability check and the
                    // commit; the unique index caught it.
                    return Ok(StepReply::prompt(
                        "😓 Esse horário acabou de ser reservado por outra pessoa. Escolha outro horário (HH:MM).",
                    ));
                }
                Err(err) => return Err(err),
            };
            session.time = Some(created.time.clone());
            log::info!(
                "✅ Reservation {} committed: {} ({}) at {} {} with {}",
                created.id,
                created.name,
                created.service,
                created.date,
                created.time,
                created.barber
            );

            // Best-effort: a committed booking is never rolled back because
            // the confirmation could not be delivered.
            let confirmation = format!(
                "Olá {}, seu agendamento para {} com {} (R$ {:.2}) está confirmado para {} às {} 💈",
                created.name, service.name, barber.display_name, created.price, created.date, created.time
            );
            if let Err(err) = ctx.notifier.send(&created.phone, &confirmation).await {
                log::warn!("⚠️ WhatsApp confirmation failed for {}: {}", created.phone, err);
            }

            let reminder = ReminderRequest {
                key: ReminderKey {
                    date: created.date.clone(),
                    time: created.time.clone(),
                    barber: created.barber.clone(),
                },
                trigger_at: start - Duration::hours(REMINDER_LEAD_HOURS),
                text: format!(
                    "🔔 Olá {}! Lembrete: seu horário na Barbearia X é às {} do dia {}. Até logo! 💈",
                    created.name, created.time, created.date
                ),
            };

            let mut reply = StepReply::finished(format!(
                "✅ *Agendamento confirmado!*\n\n📛 Nome: {}\n📱 WhatsApp: {}\n🛠️ Serviço: {}\n💈 Barbeiro: {}\n💰 Valor: R$ {:.2}\n📅 Data: {}\n⏰ Horário: {}",
                created.name, created.phone, service.name, barber.display_name, created.price, created.date, created.time
            ));
            reply.schedule = Some(reminder);
            Ok(reply)
        }
    }
}
