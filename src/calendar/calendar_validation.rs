//! Validation functions for calendar event data.
//
// Everything here runs before a mutation touches the store, so a failure
// leaves the collection unchanged.

use super::calendar_types::{
    EventColor, EventInstance, EventTemplate, RecurrenceRule, DEFAULT_DURATION_MINUTES,
    MAX_SERIES_COUNT,
};
use super::{CalendarError, CalendarResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}$").unwrap());

/// Validate date string has format YYYY-MM-DD
pub fn validate_date_format(date: &str) -> bool {
    if !DATE_RE.is_match(date) {
        return false;
    }
    if let Ok(naive_date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        let year = naive_date.year();
        return (2000..=2100).contains(&year);
    }
    false
}

/// Validate time string has format HH:MM
pub fn validate_time_format(time: &str) -> bool {
    if !TIME_RE.is_match(time) {
        return false;
    }
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() != 2 {
        return false;
    }
    if let (Ok(hours), Ok(minutes)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
        return hours < 24 && minutes < 60;
    }
    false
}

pub fn parse_date(date: &str) -> CalendarResult<NaiveDate> {
    let date = date.trim();
    if date.is_empty() {
        return Err(CalendarError::Validation("Date is required".to_string()));
    }
    if !validate_date_format(date) {
        return Err(CalendarError::Validation(format!(
            "Invalid date '{}'. Expected YYYY-MM-DD between 2000 and 2100",
            date
        )));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| CalendarError::Validation(format!("Invalid date '{}': {}", date, e)))
}

pub fn parse_time(time: &str) -> CalendarResult<NaiveTime> {
    let time = time.trim();
    if time.is_empty() {
        return Err(CalendarError::Validation("Time is required".to_string()));
    }
    if !validate_time_format(time) {
        return Err(CalendarError::Validation(format!("Invalid time '{}'. Expected HH:MM", time)));
    }
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|e| CalendarError::Validation(format!("Invalid time '{}': {}", time, e)))
}

pub fn parse_color(color: &str) -> CalendarResult<EventColor> {
    color.parse().map_err(CalendarError::Validation)
}

pub fn validate_title(title: &str) -> CalendarResult<()> {
    if title.trim().is_empty() {
        return Err(CalendarError::Validation("Event title cannot be empty".to_string()));
    }
    if title.len() > 250 {
        warn!("Event title is very long: {} characters", title.len());
    }
    Ok(())
}

pub fn validate_duration(duration_minutes: u32) -> CalendarResult<()> {
    if duration_minutes == 0 {
        return Err(CalendarError::Validation("Duration must be a positive number of minutes".to_string()));
    }
    Ok(())
}

pub fn validate_recurrence(rule: &RecurrenceRule, start: NaiveDateTime) -> CalendarResult<()> {
    if !rule.is_recurring() {
        return Ok(());
    }
    if rule.interval == 0 {
        return Err(CalendarError::Validation("Recurrence interval must be at least 1".to_string()));
    }
    if let Some(day) = rule.days_of_week.iter().find(|d| **d > 6) {
        return Err(CalendarError::Validation(format!(
            "Invalid weekday index {} (expected 0 for Sunday through 6 for Saturday)",
            day
        )));
    }
    if let Some(count) = rule.count {
        if count == 0 || count > MAX_SERIES_COUNT {
            return Err(CalendarError::Validation(format!(
                "Occurrence count must be between 1 and {}",
                MAX_SERIES_COUNT
            )));
        }
    }
    if let Some(end_date) = rule.end_date {
        if end_date <= start.date() {
            return Err(CalendarError::Validation(format!(
                "Recurrence end date {} must be after the start date {}",
                end_date,
                start.date()
            )));
        }
    }
    Ok(())
}

/// Validate a template before it is expanded and stored
pub fn validate_template(template: &EventTemplate) -> CalendarResult<()> {
    validate_title(&template.title)?;
    validate_duration(template.duration_minutes)?;
    if let Some(rule) = &template.recurrence {
        validate_recurrence(rule, template.start)?;
    }
    Ok(())
}

pub fn validate_instance(event: &EventInstance) -> CalendarResult<()> {
    if event.id.trim().is_empty() {
        return Err(CalendarError::Validation("Event id cannot be empty".to_string()));
    }
    validate_title(&event.title)?;
    validate_duration(event.duration)
}

impl EventTemplate {
    /// Builds a template from the raw date and time fields of an entry form.
    pub fn from_form(
        title: &str,
        date: &str,
        time: &str,
        duration_minutes: Option<u32>,
    ) -> CalendarResult<Self> {
        validate_title(title)?;
        let start = parse_date(date)?.and_time(parse_time(time)?);
        let mut template = EventTemplate::new(title.trim(), start);
        template.duration_minutes = duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        validate_duration(template.duration_minutes)?;
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::RecurrenceKind;
    use test_case::test_case;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    #[test_case("2024-02-29", true ; "leap day")]
    #[test_case("2023-02-29", false ; "not a leap year")]
    #[test_case("1999-12-31", false ; "before range")]
    #[test_case("2024/01/01", false ; "wrong separator")]
    fn test_validate_date_format(input: &str, expected: bool) {
        assert_eq!(validate_date_format(input), expected);
    }

    #[test_case("9:05", true ; "single digit hour")]
    #[test_case("23:59", true ; "end of day")]
    #[test_case("24:00", false ; "hour out of range")]
    #[test_case("12:60", false ; "minute out of range")]
    #[test_case("noon", false ; "words")]
    fn test_validate_time_format(input: &str, expected: bool) {
        assert_eq!(validate_time_format(input), expected);
    }

    #[test]
    fn test_template_requires_title_and_duration() {
        let mut template = EventTemplate::new("   ", start());
        assert!(matches!(validate_template(&template), Err(CalendarError::Validation(_))));

        template.title = "Planning".to_string();
        template.duration_minutes = 0;
        assert!(matches!(validate_template(&template), Err(CalendarError::Validation(_))));

        template.duration_minutes = 30;
        assert!(validate_template(&template).is_ok());
    }

    #[test]
    fn test_recurrence_rules_are_checked() {
        let bad_day = RecurrenceRule::new(RecurrenceKind::Weekly).on_days(&[1, 7]);
        assert!(validate_recurrence(&bad_day, start()).is_err());

        let zero_interval = RecurrenceRule::new(RecurrenceKind::Daily).every(0);
        assert!(validate_recurrence(&zero_interval, start()).is_err());

        let too_many = RecurrenceRule::new(RecurrenceKind::Daily).times(MAX_SERIES_COUNT + 1);
        assert!(validate_recurrence(&too_many, start()).is_err());

        let ends_before = RecurrenceRule::new(RecurrenceKind::Daily)
            .until(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(validate_recurrence(&ends_before, start()).is_err());

        // Rules of kind None are never inspected.
        let ignored = RecurrenceRule::new(RecurrenceKind::None).every(0);
        assert!(validate_recurrence(&ignored, start()).is_ok());
    }

    #[test]
    fn test_from_form() {
        let template = EventTemplate::from_form("Dentist", "2024-05-10", "14:30", None).unwrap();
        assert_eq!(template.start, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap().and_hms_opt(14, 30, 0).unwrap());
        assert_eq!(template.duration_minutes, DEFAULT_DURATION_MINUTES);

        assert!(EventTemplate::from_form("Dentist", "", "14:30", None).is_err());
        assert!(EventTemplate::from_form("Dentist", "2024-05-10", "", None).is_err());
        assert!(EventTemplate::from_form("", "2024-05-10", "14:30", None).is_err());
        assert!(EventTemplate::from_form("Dentist", "2024-05-10", "14:30", Some(0)).is_err());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("purple").unwrap(), EventColor::Purple);
        assert!(parse_color("#123456").is_err());
    }
}
