use crate::calendar::{
    parse_color, parse_date, parse_time, EventInstance, EventPatch, EventTemplate, RecurrenceKind,
    RecurrenceRule, TimeSlot,
};
use crate::commands::CommandArgs;
use crate::config::EventDefaults;
use crate::env_manager;
use crate::state::EventStorage;
use crate::store::{EventStore, MutationOutcome};
use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use std::fmt::Write;
use std::path::Path;

fn required<'a>(args: &'a CommandArgs, index: usize, what: &str) -> Result<&'a str> {
    args.arg(index).ok_or_else(|| anyhow!("Missing {}. Type 'help' for usage.", what))
}

fn number_flag(args: &CommandArgs, name: &str) -> Result<Option<u32>> {
    args.flag(name)
        .map(|v| v.parse::<u32>().with_context(|| format!("{} expects a whole number, got '{}'", name, v)))
        .transpose()
}

fn parse_days(days: &str) -> Result<Vec<u8>> {
    days.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<u8>().with_context(|| format!("Invalid weekday index '{}'", d)))
        .collect()
}

fn recurrence_from_flags(args: &CommandArgs) -> Result<Option<RecurrenceRule>> {
    let Some(kind) = args.flag("--repeat") else {
        return Ok(None);
    };
    let kind: RecurrenceKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let mut rule = RecurrenceRule::new(kind);
    if let Some(interval) = number_flag(args, "--every")? {
        rule.interval = interval;
    }
    if let Some(days) = args.flag("--days") {
        rule.days_of_week = parse_days(days)?;
    }
    if let Some(until) = args.flag("--until") {
        rule.end_date = Some(parse_date(until)?);
    }
    rule.count = number_flag(args, "--count")?;
    Ok(Some(rule))
}

fn describe(event: &EventInstance) -> String {
    let mut line = format!(
        "{}  {} ({} min)  {}  [{}] {}",
        event.date.format("%Y-%m-%d %H:%M"),
        event.title,
        event.duration,
        event.color,
        event.category,
        event.id
    );
    if let Some(series) = &event.recurring_id {
        let _ = write!(line, "  series {}", series);
    }
    line
}

fn describe_all(events: &[&EventInstance], empty: &str) -> String {
    if events.is_empty() {
        return empty.to_string();
    }
    events.iter().map(|e| describe(e)).collect::<Vec<_>>().join("\n")
}

fn summarize(verb: &str, outcome: &MutationOutcome) -> String {
    let mut text = format!("{} {} event(s)", verb, outcome.affected.len());
    if let Some(series) = &outcome.recurring_id {
        let _ = write!(text, " in series {}", series);
    }
    for conflict in &outcome.conflicts {
        let _ = write!(
            text,
            "\nWarning: {} overlaps {}",
            conflict.event_id,
            conflict.conflicting_ids.join(", ")
        );
    }
    if let Some(e) = &outcome.storage_error {
        let _ = write!(text, "\nWarning: changes were not saved: {}", e);
    }
    text
}

pub fn add_event<S: EventStorage>(
    store: &mut EventStore<S>,
    defaults: &EventDefaults,
    args: &CommandArgs,
) -> Result<String> {
    let title = required(args, 0, "title")?;
    let date = required(args, 1, "date")?;
    let time = required(args, 2, "time")?;

    let mut template = EventTemplate::from_form(title, date, time, None)?;
    defaults.apply(&mut template);
    if let Some(duration) = number_flag(args, "--duration")? {
        template.duration_minutes = duration;
    }
    if let Some(color) = args.flag("--color") {
        template.color = parse_color(color)?;
    }
    if let Some(category) = args.flag("--category") {
        template.category = category.to_string();
    }
    template.description = args.flag("--description").map(String::from);
    template.recurrence = recurrence_from_flags(args)?;

    let outcome = store.add(template)?;
    Ok(summarize("Added", &outcome))
}

pub fn edit_event<S: EventStorage>(store: &mut EventStore<S>, args: &CommandArgs) -> Result<String> {
    let id = required(args, 0, "event id")?;
    let current = store.get(id).ok_or_else(|| anyhow!("Event '{}' not found", id))?;

    let mut patch = EventPatch {
        title: args.flag("--title").map(String::from),
        description: args.flag("--description").map(|d| Some(d.to_string())),
        duration_minutes: number_flag(args, "--duration")?,
        color: args.flag("--color").map(parse_color).transpose()?,
        category: args.flag("--category").map(String::from),
        ..EventPatch::default()
    };
    let date = args.flag("--date").map(parse_date).transpose()?;
    let time = args.flag("--time").map(parse_time).transpose()?;
    if date.is_some() || time.is_some() {
        let date = date.unwrap_or_else(|| current.day());
        let time = time.unwrap_or_else(|| current.date.time());
        patch.start = Some(date.and_time(time));
    }
    if patch.is_empty() {
        return Ok("Nothing to change".to_string());
    }

    let outcome = store.edit(id, &patch)?;
    Ok(summarize("Updated", &outcome))
}

pub fn move_event<S: EventStorage>(store: &mut EventStore<S>, args: &CommandArgs) -> Result<String> {
    let id = required(args, 0, "event id")?;
    let date = parse_date(required(args, 1, "target date")?)?;
    let outcome = store.move_event(id, date)?;
    Ok(summarize("Moved", &outcome))
}

pub fn delete_event<S: EventStorage>(store: &mut EventStore<S>, args: &CommandArgs) -> Result<String> {
    let id = required(args, 0, "event id")?;
    let outcome = store.delete_one(id)?;
    Ok(summarize("Deleted", &outcome))
}

pub fn delete_series<S: EventStorage>(store: &mut EventStore<S>, args: &CommandArgs) -> Result<String> {
    let recurring_id = required(args, 0, "series id")?;
    let outcome = store.delete_series(recurring_id);
    Ok(summarize("Deleted", &outcome))
}

pub fn show_day<S: EventStorage>(store: &EventStore<S>, args: &CommandArgs) -> Result<String> {
    let date = parse_date(required(args, 0, "date")?)?;
    Ok(describe_all(&store.query_by_date(date), "No events"))
}

pub fn show_month<S: EventStorage>(store: &EventStore<S>, args: &CommandArgs) -> Result<String> {
    let month = required(args, 0, "month")?;
    let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}'. Expected YYYY-MM", month))?;
    let term = args.flag("--search").unwrap_or("");
    let category = args.flag("--category").unwrap_or("");

    let mut text = String::new();
    for (day, events) in store.month_view(first.year(), first.month(), term, category)? {
        if events.is_empty() {
            continue;
        }
        let _ = writeln!(text, "{}", day.format("%a %Y-%m-%d"));
        for event in events {
            let _ = writeln!(text, "  {}", describe(event));
        }
    }
    if text.is_empty() {
        text.push_str("No events");
    }
    Ok(text.trim_end().to_string())
}

pub fn search_events<S: EventStorage>(store: &EventStore<S>, args: &CommandArgs) -> String {
    let term = args.arg(0).unwrap_or("");
    let category = args.flag("--category").unwrap_or("");
    describe_all(&store.search(term, category), "No matching events")
}

pub fn list_categories<S: EventStorage>(store: &EventStore<S>) -> String {
    let categories = store.list_categories();
    if categories.is_empty() {
        return "No categories".to_string();
    }
    categories.join("\n")
}

pub fn check_conflicts<S: EventStorage>(
    store: &EventStore<S>,
    defaults: &EventDefaults,
    args: &CommandArgs,
) -> Result<String> {
    let date = parse_date(required(args, 0, "date")?)?;
    let time = parse_time(required(args, 1, "time")?)?;
    let duration = number_flag(args, "--duration")?.unwrap_or(defaults.duration_minutes);
    let slot = TimeSlot::new(date.and_time(time), duration);
    Ok(describe_all(&store.conflicts_for(&slot, args.flag("--exclude")), "No conflicts"))
}

pub fn list_events<S: EventStorage>(store: &EventStore<S>) -> String {
    let events: Vec<&EventInstance> = store.events().iter().collect();
    describe_all(&events, "No events")
}

pub fn clear_events<S: EventStorage>(store: &mut EventStore<S>) -> String {
    summarize("Deleted", &store.clear_all())
}

pub fn write_env_template() -> Result<String> {
    let path = Path::new(".env");
    if env_manager::create_env_template(path)? {
        Ok("Wrote .env template".to_string())
    } else {
        Ok(".env already exists; left unchanged".to_string())
    }
}
