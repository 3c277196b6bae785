//! Event, recurrence and palette types shared by the calendar modules.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category assigned to events the user did not categorise.
pub const NO_CATEGORY: &str = "No Category";

/// Number of occurrences generated when a rule gives no explicit count.
pub const DEFAULT_SERIES_COUNT: u32 = 100;

/// Upper bound for an explicit occurrence count.
pub const MAX_SERIES_COUNT: u32 = 1000;

pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Months covered by a series that has no explicit end date.
pub const DEFAULT_SERIES_MONTHS: u32 = 12;

/// The fixed event palette, persisted as hex values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventColor {
    #[default]
    #[serde(rename = "#3B82F6")]
    Blue,
    #[serde(rename = "#EF4444")]
    Red,
    #[serde(rename = "#10B981")]
    Green,
    #[serde(rename = "#8B5CF6")]
    Purple,
    #[serde(rename = "#F59E0B")]
    Orange,
    #[serde(rename = "#EC4899")]
    Pink,
    #[serde(rename = "#6366F1")]
    Indigo,
    #[serde(rename = "#14B8A6")]
    Teal,
}

impl EventColor {
    pub const ALL: [EventColor; 8] = [
        EventColor::Blue,
        EventColor::Red,
        EventColor::Green,
        EventColor::Purple,
        EventColor::Orange,
        EventColor::Pink,
        EventColor::Indigo,
        EventColor::Teal,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            EventColor::Blue => "#3B82F6",
            EventColor::Red => "#EF4444",
            EventColor::Green => "#10B981",
            EventColor::Purple => "#8B5CF6",
            EventColor::Orange => "#F59E0B",
            EventColor::Pink => "#EC4899",
            EventColor::Indigo => "#6366F1",
            EventColor::Teal => "#14B8A6",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventColor::Blue => "Blue",
            EventColor::Red => "Red",
            EventColor::Green => "Green",
            EventColor::Purple => "Purple",
            EventColor::Orange => "Orange",
            EventColor::Pink => "Pink",
            EventColor::Indigo => "Indigo",
            EventColor::Teal => "Teal",
        }
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventColor {
    type Err = String;

    /// Accepts either the palette hex value or the color name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EventColor::ALL
            .iter()
            .copied()
            .find(|c| c.hex().eq_ignore_ascii_case(wanted) || c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("'{}' is not one of the palette colors", wanted))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecurrenceKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl FromStr for RecurrenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(RecurrenceKind::None),
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "monthly" => Ok(RecurrenceKind::Monthly),
            "custom" => Ok(RecurrenceKind::Custom),
            other => Err(format!("Unknown recurrence type: '{}'", other)),
        }
    }
}

/// How a template repeats. Only consumed at creation time; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub kind: RecurrenceKind,
    /// "Every N units". Zero is treated as one by the expander.
    pub interval: u32,
    /// Weekday indices, Sunday = 0 through Saturday = 6. Weekly rules only.
    pub days_of_week: Vec<u8>,
    /// Exclusive upper bound: no occurrence on or after this date.
    pub end_date: Option<NaiveDate>,
    pub count: Option<u32>,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self { kind: RecurrenceKind::None, interval: 1, days_of_week: Vec::new(), end_date: None, count: None }
    }
}

impl RecurrenceRule {
    pub fn new(kind: RecurrenceKind) -> Self {
        Self { kind, ..Self::default() }
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn on_days(mut self, days: &[u8]) -> Self {
        self.days_of_week = days.to_vec();
        self
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn times(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.kind != RecurrenceKind::None
    }
}

/// Half-open occupied interval `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
}

impl TimeSlot {
    pub fn new(start: NaiveDateTime, duration_minutes: u32) -> Self {
        Self { start, duration_minutes }
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// A user-authored event prior to recurrence expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTemplate {
    pub title: String,
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    pub color: EventColor,
    pub category: String,
    pub recurrence: Option<RecurrenceRule>,
}

impl EventTemplate {
    pub fn new(title: &str, start: NaiveDateTime) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            start,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            color: EventColor::default(),
            category: NO_CATEGORY.to_string(),
            recurrence: None,
        }
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.start, self.duration_minutes)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.as_ref().is_some_and(RecurrenceRule::is_recurring)
    }

    /// Concrete instance at `start`, carrying this template's content.
    pub fn instantiate(&self, id: String, start: NaiveDateTime, recurring_id: Option<String>) -> EventInstance {
        EventInstance {
            id,
            title: self.title.clone(),
            description: self.description.clone(),
            date: start,
            duration: self.duration_minutes,
            color: self.color,
            category: self.category.clone(),
            recurring_id,
        }
    }
}

/// A concrete, persisted occurrence. Field names follow the stored record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInstance {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDateTime,
    /// Minutes, always positive.
    pub duration: u32,
    pub color: EventColor,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<String>,
}

impl EventInstance {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.date, self.duration)
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn is_in_series(&self, recurring_id: &str) -> bool {
        self.recurring_id.as_deref() == Some(recurring_id)
    }
}

/// Field-level changes for editing one stored instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub start: Option<NaiveDateTime>,
    pub duration_minutes: Option<u32>,
    pub color: Option<EventColor>,
    pub category: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    /// Copy of `event` with the patched fields replaced; id and series link are kept.
    pub fn apply_to(&self, event: &EventInstance) -> EventInstance {
        let mut updated = event.clone();
        if let Some(title) = &self.title {
            updated.title = title.clone();
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(start) = self.start {
            updated.date = start;
        }
        if let Some(duration) = self.duration_minutes {
            updated.duration = duration;
        }
        if let Some(color) = self.color {
            updated.color = color;
        }
        if let Some(category) = &self.category {
            updated.category = category.clone();
        }
        updated
    }
}
