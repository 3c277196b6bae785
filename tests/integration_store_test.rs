use anyhow::Result;
use calgrid::event_search::ALL_CATEGORIES;
use calgrid::{
    CalendarError, EventColor, EventStorage, EventStore, EventTemplate, JsonFileStorage,
    RecurrenceKind, RecurrenceRule, TimeSlot,
};
use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
}

fn seeded_store(dir: &std::path::Path) -> Result<(EventStore<JsonFileStorage>, String)> {
    calgrid::init_logger();
    let mut store = EventStore::open(JsonFileStorage::new(dir, "integration")?);

    let mut standup = EventTemplate::new("Standup", at(2024, 1, 1, 9, 0));
    standup.duration_minutes = 15;
    standup.category = "Work".to_string();
    standup.recurrence = Some(RecurrenceRule::new(RecurrenceKind::Weekly).on_days(&[1, 3]).times(6));
    let series = store.add(standup)?.recurring_id.expect("weekly template starts a series");

    let mut dentist = EventTemplate::new("Dentist", at(2024, 1, 3, 15, 0));
    dentist.description = Some("Bring the insurance card".to_string());
    dentist.color = EventColor::Red;
    dentist.category = "Health".to_string();
    store.add(dentist)?;

    Ok((store, series))
}

#[test]
fn integration_test_collection_survives_restart() -> Result<()> {
    let temp_dir = tempdir()?;
    let (store, _) = seeded_store(temp_dir.path())?;
    assert_eq!(store.len(), 7);

    let reopened = EventStore::open(JsonFileStorage::new(temp_dir.path(), "integration")?);
    assert_eq!(reopened.events(), store.events());

    // A different key selects a different, empty slot.
    let other = EventStore::open(JsonFileStorage::new(temp_dir.path(), "someone-else")?);
    assert!(other.is_empty());
    Ok(())
}

#[test]
fn integration_test_series_lifecycle() -> Result<()> {
    let temp_dir = tempdir()?;
    let (mut store, series) = seeded_store(temp_dir.path())?;

    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let titles: Vec<&str> = store.query_by_date(wednesday).iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Standup", "Dentist"]);

    // Moving one member leaves the rest of the series alone.
    let second = format!("{}-1", series);
    store.move_event(&second, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap())?;
    assert_eq!(store.get(&second).unwrap().date, at(2024, 1, 4, 9, 0));
    assert_eq!(store.get(&format!("{}-2", series)).unwrap().date, at(2024, 1, 8, 9, 0));

    let outcome = store.delete_series(&series);
    assert_eq!(outcome.affected.len(), 6);
    assert_eq!(store.len(), 1);

    let reloaded = JsonFileStorage::new(temp_dir.path(), "integration")?.load();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].title, "Dentist");
    Ok(())
}

#[test]
fn integration_test_queries() -> Result<()> {
    let temp_dir = tempdir()?;
    let (store, _) = seeded_store(temp_dir.path())?;

    assert_eq!(store.search("", ALL_CATEGORIES).len(), store.len());
    assert_eq!(store.search("INSURANCE", "").len(), 1);
    assert_eq!(store.search("standup", "Health").len(), 0);
    assert_eq!(store.list_categories(), vec!["Health", "Work"]);

    let january = store.month_view(2024, 1, "", "Work")?;
    let busy_days = january.iter().filter(|(_, events)| !events.is_empty()).count();
    assert_eq!(busy_days, 6);
    Ok(())
}

#[test]
fn integration_test_conflicts_are_advisory() -> Result<()> {
    let temp_dir = tempdir()?;
    let (mut store, _) = seeded_store(temp_dir.path())?;

    let slot = TimeSlot::new(at(2024, 1, 3, 15, 30), 30);
    assert!(store.check_conflict(&slot, None));

    let mut overlapping = EventTemplate::new("Call", slot.start);
    overlapping.duration_minutes = slot.duration_minutes;
    assert_eq!(overlapping.slot(), slot);
    let outcome = store.add(overlapping)?;
    assert!(outcome.has_conflicts());
    assert!(store.get(&outcome.affected[0]).is_some());
    Ok(())
}

#[test]
fn integration_test_validation_happens_before_mutation() -> Result<()> {
    let temp_dir = tempdir()?;
    let (mut store, _) = seeded_store(temp_dir.path())?;

    let mut broken = EventTemplate::new("Broken", at(2024, 2, 1, 9, 0));
    broken.recurrence = Some(RecurrenceRule::new(RecurrenceKind::Daily).every(0));
    assert!(matches!(store.add(broken), Err(CalendarError::Validation(_))));
    assert_eq!(store.len(), 7);
    assert_eq!(JsonFileStorage::new(temp_dir.path(), "integration")?.load().len(), 7);
    Ok(())
}
