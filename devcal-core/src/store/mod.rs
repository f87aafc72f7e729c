//! Calendar storage.
//!
//! `CalendarStore` is the seam between the bridge and wherever calendars
//! actually live. `LocalStore` keeps them in a directory tree of .ics files.

mod local;
mod metadata;

pub use local::LocalStore;
pub use metadata::CalendarMetadata;

use crate::calendar::{Calendar, Color};
use crate::error::{CoreError, CoreResult};
use crate::event::Event;
use crate::recurrence;
use crate::timestamp::Timestamp;

/// An event as persisted: the record plus the occurrences excluded from its series.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub event: Event,
    pub exdates: Vec<Timestamp>,
}

impl StoredEvent {
    pub fn new(event: Event) -> Self {
        StoredEvent {
            event,
            exdates: Vec::new(),
        }
    }
}

pub trait CalendarStore {
    /// All calendars, in a stable order.
    fn calendars(&self) -> CoreResult<Vec<Calendar>>;

    /// Fails with `CalendarNotFound` for unknown ids.
    fn calendar(&self, calendar_id: &str) -> CoreResult<Calendar> {
        self.calendars()?
            .into_iter()
            .find(|c| c.id == calendar_id)
            .ok_or_else(|| CoreError::CalendarNotFound(calendar_id.to_string()))
    }

    fn create_calendar(&self, name: &str, color: Color, account_name: &str)
    -> CoreResult<Calendar>;

    fn delete_calendar(&self, calendar_id: &str) -> CoreResult<()>;

    /// Every stored event of a calendar, recurring series unexpanded.
    fn events(&self, calendar_id: &str) -> CoreResult<Vec<StoredEvent>>;

    /// Look an event up by id across all calendars.
    fn find_event(&self, event_id: &str) -> CoreResult<Option<StoredEvent>>;

    /// Insert or replace the event in its calendar.
    fn save_event(&self, stored: &StoredEvent) -> CoreResult<()>;

    /// Fails with `EventNotFound` when the calendar has no such event.
    fn remove_event(&self, calendar_id: &str, event_id: &str) -> CoreResult<()>;

    /// Events overlapping `[from, to]` in the given calendars, recurring series
    /// expanded into their instances, ordered by start. A series that cannot
    /// be expanded is skipped.
    fn events_in_range(
        &self,
        calendar_ids: &[String],
        from: Timestamp,
        to: Timestamp,
    ) -> CoreResult<Vec<Event>> {
        let mut instances = Vec::new();

        for calendar_id in calendar_ids {
            for stored in self.events(calendar_id)? {
                match recurrence::expand(&stored.event, &stored.exdates, from, to) {
                    Ok(expanded) => instances.extend(expanded),
                    Err(e) => {
                        tracing::warn!(
                            event_id = %stored.event.event_id,
                            calendar_id = %calendar_id,
                            error = %e,
                            "Skipping event that could not be expanded"
                        );
                    }
                }
            }
        }

        instances.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.title.cmp(&b.title)));
        Ok(instances)
    }

    /// Remove one occurrence of a series, or that occurrence and every later one.
    ///
    /// Dropping the first occurrence together with its followers removes the
    /// whole series, as does any removal from a non-recurring event.
    fn delete_occurrence(
        &self,
        mut stored: StoredEvent,
        instance_start: Timestamp,
        following: bool,
    ) -> CoreResult<()> {
        let event = &stored.event;
        let Some(rule) = event.recurrence_rule.as_ref() else {
            return self.remove_event(&event.calendar_id, &event.event_id);
        };

        if following {
            if instance_start <= event.start {
                return self.remove_event(&event.calendar_id, &event.event_id);
            }
            let truncated = rule.truncated_before(instance_start);
            stored.event.recurrence_rule = Some(truncated);
            stored.exdates.retain(|exdate| *exdate < instance_start);
        } else if !stored.exdates.contains(&instance_start) {
            stored.exdates.push(instance_start);
            stored.exdates.sort();
        }

        tracing::debug!(
            event_id = %stored.event.event_id,
            %instance_start,
            following,
            "Removing occurrence"
        );
        self.save_event(&stored)
    }
}
