//! Slot availability for one `(date, barber)` pair.

use crate::catalog::ALLOWED_SLOTS;
use crate::models::Reservation;

/// Returns the allowed start times not yet reserved for `date` with
/// `barber_id`, in catalog order. Reservations for other dates or barbers
/// are ignored. An empty result means "fully booked, pick another date",
/// not an error.
pub fn available_slots(date: &str, barber_id: &str, existing: &[Reservation]) -> Vec<&'static str> {
    ALLOWED_SLOTS
        .iter()
        .copied()
        .filter(|slot| {
            !existing
                .iter()
                .any(|r| r.date == date && r.barber == barber_id && r.time == *slot)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(date: &str, time: &str, barber: &str) -> Reservation {
        Reservation {
            id: 0,
            name: "Ana".to_string(),
            phone: "11999999999".to_string(),
            service: "Corte".to_string(),
            barber: barber.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            price: 30.0,
        }
    }

    #[test]
    fn excludes_exactly_the_reserved_slots_in_order() {
        let existing = vec![
            reservation("01/09/2025", "10:00", "joao"),
            reservation("01/09/2025", "14:00", "joao"),
        ];
        assert_eq!(
            available_slots("01/09/2025", "joao", &existing),
            vec!["09:00", "11:00", "13:00", "15:00", "16:00"]
        );
    }

    #[test]
    fn other_dates_and_barbers_do_not_count() {
        let existing = vec![
            reservation("02/09/2025", "09:00", "joao"),
            reservation("01/09/2025", "09:00", "pedro"),
        ];
        assert_eq!(available_slots("01/09/2025", "joao", &existing).len(), 7);
    }

    #[test]
    fn fully_booked_day_yields_empty() {
        let existing: Vec<_> = crate::catalog::ALLOWED_SLOTS
            .iter()
            .map(|slot| reservation("01/09/2025", slot, "joao"))
            .collect();
        assert!(available_slots("01/09/2025", "joao", &existing).is_empty());
    }
}
