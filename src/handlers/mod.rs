pub mod booking;
pub mod cancellation;
pub mod commands;
pub mod messages;

pub use commands::command_handler;
pub use messages::message_handler;

use chrono::NaiveDateTime;

use crate::notify::Notifier;
use crate::repository::ReservationRepository;
use crate::scheduler::ReminderKey;

/// Everything a step handler needs besides the session itself. `now` is
/// injected so the calendar and past-instant checks are testable.
pub struct StepContext<'a> {
    pub repo: &'a dyn ReservationRepository,
    pub notifier: &'a dyn Notifier,
    pub now: NaiveDateTime,
}

/// A reminder the transport layer should register once the reply went out.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRequest {
    pub key: ReminderKey,
    pub trigger_at: NaiveDateTime,
    pub text: String,
}

/// Outcome of feeding one inbound message to a flow. Validation failures are
/// ordinary replies that leave the step unchanged; only infrastructure
/// failures surface as errors.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReply {
    pub text: String,
    pub completed: bool,
    pub schedule: Option<ReminderRequest>,
    pub cancel: Option<ReminderKey>,
}

impl StepReply {
    fn prompt(text: impl Into<String>) -> Self {
        StepReply { text: text.into(), completed: false, schedule: None, cancel: None }
    }

    fn finished(text: impl Into<String>) -> Self {
        StepReply { text: text.into(), completed: true, schedule: None, cancel: None }
    }
}
