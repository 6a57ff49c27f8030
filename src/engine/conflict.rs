use tracing::warn;

use crate::model::{Reservation, TimeRange};

/// First reservation in `existing` whose range overlaps `candidate`.
///
/// `existing` must already be scoped to one room and date; nothing is
/// filtered here. Rows with malformed times never conflict but are
/// reported, since they mean the sheet was edited by hand.
pub fn find_conflict<'a>(
    candidate: &TimeRange,
    existing: impl IntoIterator<Item = &'a Reservation>,
) -> Option<&'a Reservation> {
    for reservation in existing {
        match reservation.time_range() {
            Some(range) if range.overlaps(candidate) => return Some(reservation),
            Some(_) => {}
            None => {
                warn!(
                    "reservation {:?} on {} in {} has malformed times {:?}-{:?}; ignored for overlap",
                    reservation.id, reservation.date, reservation.room, reservation.start, reservation.end
                );
                metrics::counter!(crate::observability::INTEGRITY_WARNINGS_TOTAL).increment(1);
            }
        }
    }
    None
}

pub fn has_conflict<'a>(
    candidate: &TimeRange,
    existing: impl IntoIterator<Item = &'a Reservation>,
) -> bool {
    find_conflict(candidate, existing).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(id: u64, start: &str, end: &str) -> Reservation {
        Reservation {
            id: Some(id),
            date: "2024-03-04".into(),
            room: "R1".into(),
            start: start.into(),
            end: end.into(),
            reserved_by: "Kim".into(),
            note: String::new(),
        }
    }

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::parse(start, end).unwrap()
    }

    #[test]
    fn empty_scope_never_conflicts() {
        assert!(!has_conflict(&range("09:00", "10:00"), &[]));
    }

    #[test]
    fn partial_overlap_reports_the_existing_entry() {
        let existing = [res(1, "08:00", "09:00"), res(2, "09:00", "10:00")];
        let hit = find_conflict(&range("09:30", "10:30"), &existing).unwrap();
        assert_eq!(hit.id, Some(2));
    }

    #[test]
    fn adjacent_ranges_do_not_conflict() {
        let existing = [res(1, "09:00", "10:00")];
        assert!(!has_conflict(&range("10:00", "11:00"), &existing));
        assert!(!has_conflict(&range("08:00", "09:00"), &existing));
    }

    #[test]
    fn containment_conflicts_both_ways() {
        let existing = [res(1, "09:00", "12:00")];
        assert!(has_conflict(&range("10:00", "11:00"), &existing));
        let existing = [res(1, "10:00", "11:00")];
        assert!(has_conflict(&range("09:00", "12:00"), &existing));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let existing = [res(1, "9:5", "10:00"), res(2, "11:00", "10:00")];
        assert!(!has_conflict(&range("09:00", "12:00"), &existing));
    }

    #[test]
    fn deterministic() {
        let existing = [res(1, "09:00", "10:00"), res(2, "13:00", "14:00")];
        let candidate = range("13:30", "15:00");
        let first = find_conflict(&candidate, &existing).map(|r| r.id);
        for _ in 0..10 {
            assert_eq!(find_conflict(&candidate, &existing).map(|r| r.id), first);
        }
    }
}
