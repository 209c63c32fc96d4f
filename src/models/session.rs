use crate::catalog::{Barber, Service};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    AskName,
    AskPhone,
    AskService,
    AskDate,
    AskBarber,
    AskTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelStep {
    AskName,
    AskDate,
    AskTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Booking(BookingStep),
    Cancellation(CancelStep),
}

/// The in-progress record of one conversation: which flow it is in, which
/// step comes next and the fields collected so far. Lives only in the
/// SessionStore; never persisted, so a restart drops it.
#[derive(Debug, Clone)]
pub struct Session {
    pub flow: Flow,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub service: Option<&'static Service>,
    pub price: Option<f64>,
    pub date: Option<String>,
    pub barber: Option<&'static Barber>,
    pub time: Option<String>,
}

impl Session {
    pub fn booking() -> Self {
        Self::with_flow(Flow::Booking(BookingStep::AskName))
    }

    pub fn cancellation() -> Self {
        Self::with_flow(Flow::Cancellation(CancelStep::AskName))
    }

    fn with_flow(flow: Flow) -> Self {
        Session {
            flow,
            name: None,
            phone: None,
            service: None,
            price: None,
            date: None,
            barber: None,
            time: None,
        }
    }
}
