//! Read-only views over the event collection: day buckets, the month grid,
//! category listing and text search.

use crate::calendar::{CalendarError, CalendarResult, EventInstance};
use crate::state::EventStorage;
use crate::store::EventStore;
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Category filter value that matches every event.
pub const ALL_CATEGORIES: &str = "all";

/// Events starting on `date`, in collection order.
pub fn events_on(events: &[EventInstance], date: NaiveDate) -> Vec<&EventInstance> {
    events.iter().filter(|e| e.day() == date).collect()
}

/// Distinct non-empty categories, sorted.
pub fn list_categories(events: &[EventInstance]) -> Vec<String> {
    events
        .iter()
        .map(|e| e.category.as_str())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Case-insensitive title/description match combined with an exact category match.
///
/// An empty `term` matches everything; an empty `category` or [`ALL_CATEGORIES`]
/// disables the category filter.
pub fn matches_filter(event: &EventInstance, term: &str, category: &str) -> bool {
    let term = term.trim().to_lowercase();
    let matches_search = term.is_empty()
        || event.title.to_lowercase().contains(&term)
        || event.description.as_ref().is_some_and(|d| d.to_lowercase().contains(&term));

    let matches_category = category.is_empty() || category == ALL_CATEGORIES || event.category == category;

    matches_search && matches_category
}

pub fn search<'a>(events: &'a [EventInstance], term: &str, category: &str) -> Vec<&'a EventInstance> {
    events.iter().filter(|e| matches_filter(e, term, category)).collect()
}

/// Events on `date` that also pass the search filter.
pub fn events_on_filtered<'a>(
    events: &'a [EventInstance],
    date: NaiveDate,
    term: &str,
    category: &str,
) -> Vec<&'a EventInstance> {
    events.iter().filter(|e| e.day() == date && matches_filter(e, term, category)).collect()
}

/// Groups events by start day for every day in `[from, to]`, including empty days.
pub fn bucket_by_day(
    events: &[EventInstance],
    from: NaiveDate,
    to: NaiveDate,
) -> BTreeMap<NaiveDate, Vec<&EventInstance>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&EventInstance>> =
        from.iter_days().take_while(|d| *d <= to).map(|d| (d, Vec::new())).collect();
    for event in events {
        if let Some(bucket) = buckets.get_mut(&event.day()) {
            bucket.push(event);
        }
    }
    buckets
}

/// Days shown for a month: whole Sunday-to-Saturday weeks covering the month.
pub fn month_grid(year: i32, month: u32) -> CalendarResult<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CalendarError::Validation(format!("Invalid month {}-{}", year, month)))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| CalendarError::Validation(format!("Month {}-{} is out of range", year, month)))?;

    let grid_start = first - Duration::days(i64::from(first.weekday().num_days_from_sunday()));
    let grid_end = last + Duration::days(6 - i64::from(last.weekday().num_days_from_sunday()));
    Ok(grid_start.iter_days().take_while(|d| *d <= grid_end).collect())
}

impl<S: EventStorage> EventStore<S> {
    pub fn query_by_date(&self, date: NaiveDate) -> Vec<&EventInstance> {
        events_on(self.events(), date)
    }

    pub fn list_categories(&self) -> Vec<String> {
        list_categories(self.events())
    }

    pub fn search(&self, term: &str, category: &str) -> Vec<&EventInstance> {
        search(self.events(), term, category)
    }

    pub fn query_by_date_filtered(&self, date: NaiveDate, term: &str, category: &str) -> Vec<&EventInstance> {
        events_on_filtered(self.events(), date, term, category)
    }

    /// Month grid days paired with the events that pass the filter on each day.
    pub fn month_view(
        &self,
        year: i32,
        month: u32,
        term: &str,
        category: &str,
    ) -> CalendarResult<Vec<(NaiveDate, Vec<&EventInstance>)>> {
        Ok(month_grid(year, month)?
            .into_iter()
            .map(|day| (day, self.query_by_date_filtered(day, term, category)))
            .collect())
    }
}
