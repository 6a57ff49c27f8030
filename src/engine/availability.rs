use crate::model::{Reservation, Slot};

use super::conflict::has_conflict;

/// Catalog slots that overlap none of `booked`. `booked` must be scoped
/// to a single room and date.
pub fn free_slots(slots: &[Slot], booked: &[Reservation]) -> Vec<Slot> {
    slots
        .iter()
        .filter(|slot| !has_conflict(slot, booked))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, end: &str) -> Slot {
        Slot::parse(start, end).unwrap()
    }

    fn booked(start: &str, end: &str) -> Reservation {
        Reservation {
            id: Some(1),
            date: "2024-03-04".into(),
            room: "R1".into(),
            start: start.into(),
            end: end.into(),
            reserved_by: "Kim".into(),
            note: String::new(),
        }
    }

    #[test]
    fn nothing_booked_everything_free() {
        let slots = [slot("09:00", "10:00"), slot("10:00", "11:00")];
        assert_eq!(free_slots(&slots, &[]), slots);
    }

    #[test]
    fn booking_spanning_two_slots_removes_both() {
        let slots = [slot("09:00", "10:00"), slot("10:00", "11:00"), slot("11:00", "12:00")];
        let taken = [booked("09:30", "10:30")];
        assert_eq!(free_slots(&slots, &taken), [slot("11:00", "12:00")]);
    }

    #[test]
    fn adjacent_booking_leaves_slot_free() {
        let slots = [slot("09:00", "10:00"), slot("10:00", "11:00")];
        let taken = [booked("10:00", "11:00")];
        assert_eq!(free_slots(&slots, &taken), [slot("09:00", "10:00")]);
    }

    #[test]
    fn empty_catalog() {
        assert!(free_slots(&[], &[booked("09:00", "10:00")]).is_empty());
    }
}
