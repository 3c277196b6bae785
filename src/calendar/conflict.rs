//! Double-booking detection.
//!
//! Two events conflict when they start on the same calendar day and their
//! half-open intervals overlap. An event running past midnight is only
//! compared against events of its start day.

use super::calendar_types::{EventInstance, TimeSlot};

fn collides(candidate: &TimeSlot, existing: &EventInstance, exclude_id: Option<&str>) -> bool {
    if exclude_id == Some(existing.id.as_str()) {
        return false;
    }
    let slot = existing.slot();
    slot.date() == candidate.date() && slot.overlaps(candidate)
}

/// True if `candidate` overlaps any event in `existing` other than `exclude_id`.
pub fn has_conflict(candidate: &TimeSlot, existing: &[EventInstance], exclude_id: Option<&str>) -> bool {
    existing.iter().any(|event| collides(candidate, event, exclude_id))
}

/// Every event in `existing` that `candidate` overlaps, in collection order.
pub fn conflicts_for<'a>(
    candidate: &TimeSlot,
    existing: &'a [EventInstance],
    exclude_id: Option<&str>,
) -> Vec<&'a EventInstance> {
    existing.iter().filter(|event| collides(candidate, event, exclude_id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventTemplate;
    use chrono::{NaiveDate, NaiveDateTime};
    use test_case::test_case;

    fn at(d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    fn event(id: &str, start: NaiveDateTime, minutes: u32) -> EventInstance {
        let mut template = EventTemplate::new(id, start);
        template.duration_minutes = minutes;
        template.instantiate(id.to_string(), start, None)
    }

    #[test_case(at(4, 9, 30), 60, true ; "partial overlap")]
    #[test_case(at(4, 10, 0), 60, false ; "touching end boundary")]
    #[test_case(at(4, 8, 0), 60, false ; "touching start boundary")]
    #[test_case(at(4, 9, 15), 15, true ; "contained")]
    #[test_case(at(4, 8, 0), 180, true ; "enclosing")]
    #[test_case(at(5, 9, 30), 60, false ; "different day")]
    fn test_has_conflict(start: NaiveDateTime, minutes: u32, expected: bool) {
        let existing = vec![event("standup", at(4, 9, 0), 60)];
        assert_eq!(has_conflict(&TimeSlot::new(start, minutes), &existing, None), expected);
    }

    #[test]
    fn test_excluded_event_is_ignored() {
        let existing = vec![event("standup", at(4, 9, 0), 60)];
        let moved = TimeSlot::new(at(4, 9, 30), 60);
        assert!(!has_conflict(&moved, &existing, Some("standup")));
        assert!(has_conflict(&moved, &existing, Some("other")));
    }

    #[test]
    fn test_midnight_spanning_event_is_not_compared_with_next_day() {
        let existing = vec![event("late", at(4, 23, 0), 120)];
        assert!(!has_conflict(&TimeSlot::new(at(5, 0, 30), 30), &existing, None));
    }

    #[test]
    fn test_conflicts_for_lists_every_overlap() {
        let existing = vec![
            event("a", at(4, 9, 0), 60),
            event("b", at(4, 11, 0), 60),
            event("c", at(4, 9, 45), 30),
        ];
        let found = conflicts_for(&TimeSlot::new(at(4, 9, 30), 60), &existing, None);
        let ids: Vec<&str> = found.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
