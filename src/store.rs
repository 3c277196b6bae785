//! The event store: the single owned collection of event instances,
//! mirrored to an [`EventStorage`] after every mutation.
//!
//! Persistence is write-through. A failed save is logged and reported in the
//! returned [`MutationOutcome`], but the in-memory change stays applied and
//! the collection remains authoritative for the rest of the session.

use crate::calendar::{
    self, validate_instance, validate_template, CalendarError, CalendarResult, EventInstance,
    EventPatch, EventTemplate, TimeSlot,
};
use crate::state::{EventStorage, StorageError};
use chrono::NaiveDate;
use log::{debug, error, info, warn};

/// An instance written by a mutation that overlaps other stored events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub event_id: String,
    pub conflicting_ids: Vec<String>,
}

/// What a mutation did. Conflicts are advisory and never block a write.
#[derive(Debug, Default)]
pub struct MutationOutcome {
    /// Ids of the instances added, replaced or removed.
    pub affected: Vec<String>,
    /// Series id when a recurring template was added.
    pub recurring_id: Option<String>,
    pub conflicts: Vec<Conflict>,
    /// Set when the change could not be persisted.
    pub storage_error: Option<StorageError>,
}

impl MutationOutcome {
    pub fn is_persisted(&self) -> bool {
        self.storage_error.is_none()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

pub struct EventStore<S: EventStorage> {
    events: Vec<EventInstance>,
    storage: S,
}

impl<S: EventStorage> EventStore<S> {
    /// Opens the store, loading the persisted collection exactly once.
    pub fn open(storage: S) -> Self {
        let events = storage.load();
        info!("Opened event store with {} events", events.len());
        Self { events, storage }
    }

    pub fn events(&self) -> &[EventInstance] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn get(&self, id: &str) -> Option<&EventInstance> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Members of a series in collection order.
    pub fn series(&self, recurring_id: &str) -> Vec<&EventInstance> {
        self.events.iter().filter(|e| e.is_in_series(recurring_id)).collect()
    }

    pub fn check_conflict(&self, slot: &TimeSlot, exclude_id: Option<&str>) -> bool {
        calendar::has_conflict(slot, &self.events, exclude_id)
    }

    pub fn conflicts_for(&self, slot: &TimeSlot, exclude_id: Option<&str>) -> Vec<&EventInstance> {
        calendar::conflicts_for(slot, &self.events, exclude_id)
    }

    /// Validates and expands `template`, then appends every resulting instance.
    pub fn add(&mut self, template: EventTemplate) -> CalendarResult<MutationOutcome> {
        validate_template(&template)?;

        let id = self.fresh_id();
        let instances = calendar::expand_with_id(&template, &id);
        let recurring_id = template.is_recurring().then(|| id.clone());
        let affected: Vec<String> = instances.iter().map(|e| e.id.clone()).collect();

        self.events.extend(instances);
        info!("Added '{}' as {} event(s)", template.title, affected.len());

        let mut outcome = MutationOutcome {
            conflicts: self.collect_conflicts(&affected),
            affected,
            recurring_id,
            storage_error: None,
        };
        self.persist(&mut outcome);
        Ok(outcome)
    }

    /// Replaces the stored instance carrying `event.id`. Series membership cannot change.
    pub fn update(&mut self, event: EventInstance) -> CalendarResult<MutationOutcome> {
        validate_instance(&event)?;
        let index = self.position(&event.id)?;
        if self.events[index].recurring_id != event.recurring_id {
            return Err(CalendarError::Validation(format!(
                "Event '{}' cannot change its series",
                event.id
            )));
        }

        debug!("Updating event '{}'", event.id);
        let id = event.id.clone();
        self.events[index] = event;

        let mut outcome = MutationOutcome {
            conflicts: self.collect_conflicts(std::slice::from_ref(&id)),
            affected: vec![id],
            ..MutationOutcome::default()
        };
        self.persist(&mut outcome);
        Ok(outcome)
    }

    /// Applies `patch` to one stored instance; the rest of its series is untouched.
    pub fn edit(&mut self, id: &str, patch: &EventPatch) -> CalendarResult<MutationOutcome> {
        let current = self.get(id).ok_or_else(|| CalendarError::NotFound(id.to_string()))?;
        let updated = patch.apply_to(current);
        self.update(updated)
    }

    /// Moves an instance to `new_date`, keeping its time of day.
    pub fn move_event(&mut self, id: &str, new_date: NaiveDate) -> CalendarResult<MutationOutcome> {
        let current = self.get(id).ok_or_else(|| CalendarError::NotFound(id.to_string()))?;
        let mut moved = current.clone();
        moved.date = new_date.and_time(current.date.time());
        info!("Moving event '{}' from {} to {}", id, current.day(), new_date);
        self.update(moved)
    }

    pub fn delete_one(&mut self, id: &str) -> CalendarResult<MutationOutcome> {
        let index = self.position(id)?;
        let removed = self.events.remove(index);
        info!("Deleted event '{}'", removed.id);

        let mut outcome = MutationOutcome { affected: vec![removed.id], ..MutationOutcome::default() };
        self.persist(&mut outcome);
        Ok(outcome)
    }

    /// Removes every member of a series. An unknown series id changes nothing.
    pub fn delete_series(&mut self, recurring_id: &str) -> MutationOutcome {
        let (removed, kept): (Vec<EventInstance>, Vec<EventInstance>) =
            std::mem::take(&mut self.events).into_iter().partition(|e| e.is_in_series(recurring_id));
        self.events = kept;

        let mut outcome = MutationOutcome {
            affected: removed.into_iter().map(|e| e.id).collect(),
            ..MutationOutcome::default()
        };
        if outcome.affected.is_empty() {
            debug!("No events belong to series '{}'", recurring_id);
            return outcome;
        }
        info!("Deleted series '{}' ({} events)", recurring_id, outcome.affected.len());
        self.persist(&mut outcome);
        outcome
    }

    pub fn clear_all(&mut self) -> MutationOutcome {
        let mut outcome = MutationOutcome {
            affected: self.events.drain(..).map(|e| e.id).collect(),
            ..MutationOutcome::default()
        };
        info!("Cleared {} events", outcome.affected.len());
        self.persist(&mut outcome);
        outcome
    }

    fn position(&self, id: &str) -> CalendarResult<usize> {
        self.events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CalendarError::NotFound(id.to_string()))
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = calendar::recurrence::new_event_id();
            if self.get(&id).is_none() && self.series(&id).is_empty() {
                return id;
            }
        }
    }

    fn collect_conflicts(&self, ids: &[String]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for event in self.events.iter().filter(|e| ids.contains(&e.id)) {
            let overlapping = self.conflicts_for(&event.slot(), Some(&event.id));
            if overlapping.is_empty() {
                continue;
            }
            let conflicting_ids: Vec<String> = overlapping.iter().map(|e| e.id.clone()).collect();
            warn!(
                "Event '{}' on {} overlaps {}",
                event.title,
                event.date.format("%Y-%m-%d %H:%M"),
                conflicting_ids.join(", ")
            );
            conflicts.push(Conflict { event_id: event.id.clone(), conflicting_ids });
        }
        conflicts
    }

    fn persist(&mut self, outcome: &mut MutationOutcome) {
        if let Err(e) = self.storage.save(&self.events) {
            error!("Failed to save events to storage: {}", e);
            outcome.storage_error = Some(e);
        }
    }
}
