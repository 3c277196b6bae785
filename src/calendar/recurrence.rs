//! Recurrence expansion.
//!
//! Turns a template carrying a [`RecurrenceRule`] into the concrete
//! [`EventInstance`]s of its series. A series is bounded twice: by an
//! exclusive end date (twelve months after the start when the rule has none)
//! and by an occurrence count (100 when the rule has none). Whichever bound
//! is hit first ends the series, so expansion always terminates.
//!
//! Monthly steps are anchored on the series start and clamp to the last day
//! of shorter months: a series starting on January 31st continues on
//! February 29th (or 28th), March 31st, April 30th and so on.

use chrono::{Datelike, Duration, Months, NaiveDateTime, NaiveTime};
use log::debug;
use uuid::Uuid;

use super::calendar_types::{
    EventInstance, EventTemplate, RecurrenceKind, RecurrenceRule, DEFAULT_SERIES_COUNT,
    DEFAULT_SERIES_MONTHS, MAX_SERIES_COUNT,
};

/// Fresh identifier for a one-off event or a new series.
pub fn new_event_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Expands `template` under a freshly generated id.
pub fn expand(template: &EventTemplate) -> Vec<EventInstance> {
    expand_with_id(template, &new_event_id())
}

/// Expands `template` using `id` as the event id (one-off) or series id (recurring).
///
/// Series members are named `{id}-{ordinal}` with ordinals counting from zero.
pub fn expand_with_id(template: &EventTemplate, id: &str) -> Vec<EventInstance> {
    let rule = match &template.recurrence {
        Some(rule) if rule.is_recurring() => rule,
        _ => return vec![template.instantiate(id.to_string(), template.start, None)],
    };

    let end = series_end(template.start, rule);
    let cap = series_cap(rule);

    let instances: Vec<EventInstance> = Occurrences::new(template.start, rule)
        .take_while(|occurrence| *occurrence < end)
        .take(cap)
        .enumerate()
        .map(|(ordinal, occurrence)| {
            template.instantiate(format!("{}-{}", id, ordinal), occurrence, Some(id.to_string()))
        })
        .collect();

    debug!(
        "Expanded {:?} series '{}' into {} occurrences (end {}, cap {})",
        rule.kind,
        id,
        instances.len(),
        end,
        cap
    );
    instances
}

/// Exclusive upper bound of a series starting at `start`.
pub fn series_end(start: NaiveDateTime, rule: &RecurrenceRule) -> NaiveDateTime {
    match rule.end_date {
        Some(end_date) => end_date.and_time(NaiveTime::MIN),
        None => start
            .checked_add_months(Months::new(DEFAULT_SERIES_MONTHS))
            .unwrap_or(NaiveDateTime::MAX),
    }
}

/// Maximum number of occurrences a series may produce.
pub fn series_cap(rule: &RecurrenceRule) -> usize {
    rule.count.unwrap_or(DEFAULT_SERIES_COUNT).min(MAX_SERIES_COUNT) as usize
}

/// Unbounded, strictly increasing occurrence dates of a rule, starting at the
/// series start. Callers apply the end date and count bounds.
#[derive(Debug, Clone)]
pub struct Occurrences {
    anchor: NaiveDateTime,
    next: Option<NaiveDateTime>,
    step: Step,
    emitted: u32,
}

#[derive(Debug, Clone)]
enum Step {
    Days(i64),
    Months(u32),
    Weekdays([bool; 7]),
    Stop,
}

impl Occurrences {
    pub fn new(start: NaiveDateTime, rule: &RecurrenceRule) -> Self {
        let interval = rule.interval.max(1);
        let step = match rule.kind {
            RecurrenceKind::None => Step::Stop,
            RecurrenceKind::Daily => Step::Days(i64::from(interval)),
            RecurrenceKind::Weekly => match weekday_mask(&rule.days_of_week) {
                Some(mask) => Step::Weekdays(mask),
                None => Step::Days(7 * i64::from(interval)),
            },
            RecurrenceKind::Monthly => Step::Months(interval),
            // No richer rule exists for custom recurrences yet.
            RecurrenceKind::Custom => Step::Days(7 * i64::from(interval)),
        };
        Self { anchor: start, next: Some(start), step, emitted: 0 }
    }

    fn advance(&self, current: NaiveDateTime) -> Option<NaiveDateTime> {
        match &self.step {
            Step::Stop => None,
            Step::Days(days) => current.checked_add_signed(Duration::days(*days)),
            Step::Months(interval) => {
                let offset = interval.checked_mul(self.emitted)?;
                self.anchor.checked_add_months(Months::new(offset))
            }
            Step::Weekdays(mask) => {
                let mut candidate = current;
                for _ in 0..7 {
                    candidate = candidate.checked_add_signed(Duration::days(1))?;
                    if mask[candidate.weekday().num_days_from_sunday() as usize] {
                        return Some(candidate);
                    }
                }
                None
            }
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.emitted += 1;
        self.next = self.advance(current);
        Some(current)
    }
}

/// Sunday-first membership table for the valid weekday indices, if any.
fn weekday_mask(days: &[u8]) -> Option<[bool; 7]> {
    let mut mask = [false; 7];
    for day in days.iter().filter(|d| **d <= 6) {
        mask[*day as usize] = true;
    }
    mask.iter().any(|set| *set).then_some(mask)
}
