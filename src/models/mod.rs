pub mod reservation;
pub mod session;

pub use reservation::{NewReservation, Reservation};
pub use session::{BookingStep, CancelStep, Flow, Session};
