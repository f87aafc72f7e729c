//! Directory-backed calendar store.
//!
//! ```text
//! <root>/
//!   <calendar-id>/
//!     .devcal/calendar.toml
//!     <event-id>.ics
//! ```
//!
//! Nothing is cached; every call reads the tree again.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{CalendarMetadata, CalendarStore, StoredEvent};
use crate::calendar::{Calendar, Color, account_type};
use crate::error::{CoreError, CoreResult};
use crate::ics::{generate_ics, parse_event};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    default_calendar: Option<String>,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore {
            root: root.into(),
            default_calendar: None,
        }
    }

    /// Calendar reported as default. Falls back to the first writable calendar
    /// when unset or unknown.
    pub fn with_default_calendar(mut self, calendar_id: Option<String>) -> Self {
        self.default_calendar = calendar_id;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn calendar_dir(&self, calendar_id: &str) -> Option<PathBuf> {
        is_safe_id(calendar_id).then(|| self.root.join(calendar_id))
    }

    fn event_path(&self, calendar_id: &str, event_id: &str) -> Option<PathBuf> {
        if !is_safe_id(event_id) {
            return None;
        }
        self.calendar_dir(calendar_id)
            .map(|dir| dir.join(format!("{event_id}.ics")))
    }

    fn existing_calendar_dir(&self, calendar_id: &str) -> CoreResult<PathBuf> {
        self.calendar_dir(calendar_id)
            .filter(|dir| CalendarMetadata::exists(dir))
            .ok_or_else(|| CoreError::CalendarNotFound(calendar_id.to_string()))
    }

    fn calendar_ids(&self) -> CoreResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && CalendarMetadata::exists(path))
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(String::from))
            .filter(|name| !name.starts_with('.'))
            .collect();

        ids.sort();
        Ok(ids)
    }

    fn read_event(&self, path: &Path, calendar_id: &str) -> Option<StoredEvent> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read event file");
                return None;
            }
        };

        let stored = parse_event(&content, calendar_id);
        if stored.is_none() {
            tracing::warn!(path = %path.display(), "Skipping unparseable event file");
        }
        stored
    }
}

impl CalendarStore for LocalStore {
    fn calendars(&self) -> CoreResult<Vec<Calendar>> {
        let mut entries = Vec::new();
        for id in self.calendar_ids()? {
            match CalendarMetadata::load(&self.root.join(&id)) {
                Ok(metadata) => entries.push((id, metadata)),
                Err(e) => tracing::warn!(calendar_id = %id, error = %e, "Skipping calendar"),
            }
        }

        let default_id = self
            .default_calendar
            .as_ref()
            .filter(|wanted| entries.iter().any(|(id, _)| id == *wanted))
            .cloned()
            .or_else(|| {
                entries
                    .iter()
                    .find(|(_, metadata)| !metadata.read_only)
                    .map(|(id, _)| id.clone())
            });

        Ok(entries
            .iter()
            .map(|(id, metadata)| {
                let is_default = default_id.as_deref() == Some(id.as_str());
                metadata.to_calendar(id, is_default)
            })
            .collect())
    }

    fn create_calendar(
        &self,
        name: &str,
        color: Color,
        account_name: &str,
    ) -> CoreResult<Calendar> {
        let id = Uuid::new_v4().to_string();
        let metadata = CalendarMetadata {
            name: name.to_string(),
            color,
            account_name: account_name.to_string(),
            account_type: account_type::LOCAL.to_string(),
            read_only: false,
        };

        metadata.save(&self.root.join(&id))?;
        tracing::info!(calendar_id = %id, name, "Created calendar");

        self.calendar(&id)
    }

    fn delete_calendar(&self, calendar_id: &str) -> CoreResult<()> {
        let calendar = self.calendar(calendar_id)?;
        if calendar.is_read_only {
            return Err(CoreError::ReadOnlyCalendar(calendar_id.to_string()));
        }

        let dir = self.existing_calendar_dir(calendar_id)?;
        std::fs::remove_dir_all(&dir)?;
        tracing::info!(calendar_id, "Deleted calendar");

        Ok(())
    }

    fn events(&self, calendar_id: &str) -> CoreResult<Vec<StoredEvent>> {
        let dir = self.existing_calendar_dir(calendar_id)?;

        let mut events: Vec<StoredEvent> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "ics"))
            .filter_map(|path| self.read_event(&path, calendar_id))
            .collect();

        events.sort_by(|a, b| a.event.start.cmp(&b.event.start));
        Ok(events)
    }

    fn find_event(&self, event_id: &str) -> CoreResult<Option<StoredEvent>> {
        for calendar_id in self.calendar_ids()? {
            let Some(path) = self.event_path(&calendar_id, event_id) else {
                return Ok(None);
            };
            if path.is_file() {
                return Ok(self.read_event(&path, &calendar_id));
            }
        }
        Ok(None)
    }

    fn save_event(&self, stored: &StoredEvent) -> CoreResult<()> {
        let event = &stored.event;
        self.existing_calendar_dir(&event.calendar_id)?;

        let path = self
            .event_path(&event.calendar_id, &event.event_id)
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!("Invalid event ID '{}'", event.event_id))
            })?;

        let content = generate_ics(stored)?;
        std::fs::write(&path, content)?;
        tracing::debug!(
            calendar_id = %event.calendar_id,
            event_id = %event.event_id,
            "Saved event"
        );

        Ok(())
    }

    fn remove_event(&self, calendar_id: &str, event_id: &str) -> CoreResult<()> {
        self.existing_calendar_dir(calendar_id)?;

        let path = self
            .event_path(calendar_id, event_id)
            .filter(|path| path.is_file())
            .ok_or_else(|| CoreError::EventNotFound(event_id.to_string()))?;

        std::fs::remove_file(&path)?;
        tracing::debug!(calendar_id, event_id, "Removed event");

        Ok(())
    }
}

/// Ids become path components, so they must stay inside their directory.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\'])
        && !id.contains("..")
}
