//! Method dispatcher for the bridge protocol.
//!
//! Turns one `Request` into one `Response`, answering from a `CalendarStore`.
//! Store and argument errors become protocol error codes here and nowhere else.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::calendar::{Calendar, Color};
use crate::codec;
use crate::error::{CoreError, CoreResult};
use crate::event::Event;
use crate::permission::Permissions;
use crate::protocol::{
    CreateCalendarArgs, CreateOrUpdateEventArgs, DeleteCalendarArgs, DeleteEventArgs,
    DeleteEventInstanceArgs, ErrorCode, Method, Request, Response, RetrieveEventsArgs,
    UpdateEventInstanceArgs,
};
use crate::store::{CalendarStore, StoredEvent};

const MISSING_RETRIEVE_ARGUMENTS: &str =
    "Provided arguments (i.e. start, end and event ids) are null or empty";

pub struct Bridge<S> {
    store: S,
    permissions: Permissions,
    local_account_name: String,
}

impl<S: CalendarStore> Bridge<S> {
    pub fn new(store: S, permissions: Permissions, local_account_name: &str) -> Self {
        Bridge {
            store,
            permissions,
            local_account_name: local_account_name.to_string(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one raw request line.
    pub fn handle_line(&self, line: &str) -> Response {
        match codec::decode::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed request");
                Response::error(ErrorCode::InvalidArgument, e.to_string())
            }
        }
    }

    pub fn handle(&self, request: Request) -> Response {
        let Some(method) = Method::from_name(&request.method) else {
            tracing::info!(method = %request.method, "Method not implemented");
            return Response::NotImplemented {
                method: request.method,
            };
        };

        tracing::debug!(method = method.as_str(), "Handling request");

        match self.dispatch(method, request.arguments) {
            Ok(data) => Response::success(data),
            Err(e) => {
                let code = error_code(&e);
                if code == ErrorCode::Generic {
                    tracing::error!(method = method.as_str(), error = %e, "Request failed");
                } else {
                    tracing::info!(
                        method = method.as_str(),
                        code = code.as_str(),
                        error = %e,
                        "Request rejected"
                    );
                }
                Response::error(code, e.to_string())
            }
        }
    }

    fn dispatch(&self, method: Method, arguments: Value) -> CoreResult<Value> {
        if method.requires_permission() {
            self.permissions.ensure_granted()?;
        }

        match method {
            Method::RequestPermissions => to_data(self.permissions.request()?),
            Method::HasPermissions => to_data(self.permissions.is_granted()?),
            Method::RetrieveCalendars => to_data(self.store.calendars()?),
            Method::RetrieveEvents => to_data(self.retrieve_events(arguments_as(arguments)?)?),
            Method::CreateOrUpdateEvent => {
                to_data(self.create_or_update_event(arguments_as(arguments)?)?)
            }
            Method::UpdateEventInstance => {
                to_data(self.update_event_instance(arguments_as(arguments)?)?)
            }
            Method::DeleteEvent => to_data(self.delete_event(arguments_as(arguments)?)?),
            Method::DeleteEventInstance => {
                to_data(self.delete_event_instance(arguments_as(arguments)?)?)
            }
            Method::CreateCalendar => to_data(self.create_calendar(arguments_as(arguments)?)?),
            Method::DeleteCalendar => to_data(self.delete_calendar(arguments_as(arguments)?)?),
        }
    }

    fn retrieve_events(&self, args: RetrieveEventsArgs) -> CoreResult<Vec<Event>> {
        let event_ids = args.event_ids.filter(|ids| !ids.is_empty());

        if let (Some(from), Some(to)) = (args.start_date, args.end_date) {
            let known: Vec<String> = self.store.calendars()?.into_iter().map(|c| c.id).collect();
            let calendar_ids: Vec<String> = match args.calendar_ids.filter(|ids| !ids.is_empty()) {
                Some(wanted) => wanted.into_iter().filter(|id| known.contains(id)).collect(),
                None => known,
            };

            let mut events = self.store.events_in_range(&calendar_ids, from, to)?;
            if let Some(ids) = event_ids {
                events.retain(|e| ids.contains(&e.event_id));
            }
            return Ok(events);
        }

        let Some(ids) = event_ids else {
            return Err(CoreError::InvalidArgument(
                MISSING_RETRIEVE_ARGUMENTS.to_string(),
            ));
        };

        let mut events = Vec::new();
        for id in &ids {
            match self.store.find_event(id)? {
                Some(stored) => events.push(stored.event),
                None => tracing::debug!(event_id = %id, "Skipping unknown event"),
            }
        }
        Ok(events)
    }

    fn create_or_update_event(&self, args: CreateOrUpdateEventArgs) -> CoreResult<Event> {
        let mut event = args.event;
        self.writable_calendar(&event.calendar_id)?;
        normalize(&mut event);
        event.validate()?;

        let stored = if event.event_id.is_empty() {
            event.event_id = Uuid::new_v4().to_string();
            tracing::info!(
                event_id = %event.event_id,
                calendar_id = %event.calendar_id,
                "Creating event"
            );
            StoredEvent::new(event)
        } else {
            let existing = self
                .store
                .find_event(&event.event_id)?
                .ok_or_else(|| CoreError::EventNotFound(event.event_id.clone()))?;

            if existing.event.calendar_id != event.calendar_id {
                self.writable_calendar(&existing.event.calendar_id)?;
                self.store
                    .remove_event(&existing.event.calendar_id, &existing.event.event_id)?;
            }

            // Exclusions only mean something while the event still recurs
            let exdates = if event.is_recurring() {
                existing.exdates
            } else {
                Vec::new()
            };
            StoredEvent { event, exdates }
        };

        self.store.save_event(&stored)?;
        Ok(stored.event)
    }

    /// Split `event` off its series at `startDate`: the series loses that
    /// occurrence (or that and all later ones) and `event` is saved anew.
    fn update_event_instance(&self, args: UpdateEventInstanceArgs) -> CoreResult<Event> {
        let mut event = args.event;
        self.writable_calendar(&event.calendar_id)?;

        let series = self
            .store
            .find_event(&event.event_id)?
            .ok_or_else(|| CoreError::EventNotFound(event.event_id.clone()))?;
        self.writable_calendar(&series.event.calendar_id)?;

        if !args.following_instances {
            event.recurrence_rule = None;
        }
        normalize(&mut event);
        event.validate()?;

        self.store
            .delete_occurrence(series, args.start_date, args.following_instances)?;

        event.event_id = Uuid::new_v4().to_string();
        let stored = StoredEvent::new(event);
        self.store.save_event(&stored)?;
        Ok(stored.event)
    }

    fn delete_event(&self, args: DeleteEventArgs) -> CoreResult<bool> {
        self.writable_calendar(&args.calendar_id)?;
        self.store.remove_event(&args.calendar_id, &args.event_id)?;
        tracing::info!(event_id = %args.event_id, "Deleted event");
        Ok(true)
    }

    fn delete_event_instance(&self, args: DeleteEventInstanceArgs) -> CoreResult<bool> {
        self.writable_calendar(&args.calendar_id)?;

        let stored = self
            .store
            .find_event(&args.event_id)?
            .filter(|s| s.event.calendar_id == args.calendar_id)
            .ok_or_else(|| CoreError::EventNotFound(args.event_id.clone()))?;

        self.store
            .delete_occurrence(stored, args.start_date, args.following_instances)?;
        Ok(true)
    }

    fn create_calendar(&self, args: CreateCalendarArgs) -> CoreResult<String> {
        let color = match args.calendar_color.as_deref() {
            Some(hex) => Color::from_hex(hex).ok_or_else(|| {
                CoreError::InvalidArgument(format!("Invalid calendar color '{hex}'"))
            })?,
            None => Color::DEFAULT,
        };
        let account_name = args
            .local_account_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.local_account_name);

        let calendar = self
            .store
            .create_calendar(&args.calendar_name, color, account_name)?;
        Ok(calendar.id)
    }

    fn delete_calendar(&self, args: DeleteCalendarArgs) -> CoreResult<bool> {
        self.store.delete_calendar(&args.calendar_id)?;
        Ok(true)
    }

    fn writable_calendar(&self, calendar_id: &str) -> CoreResult<Calendar> {
        let calendar = self.store.calendar(calendar_id)?;
        if calendar.is_read_only {
            return Err(CoreError::ReadOnlyCalendar(calendar_id.to_string()));
        }
        Ok(calendar)
    }
}

/// All-day events end on the day they start.
fn normalize(event: &mut Event) {
    if event.all_day {
        event.end = event.start;
    }
}

fn arguments_as<T: DeserializeOwned>(arguments: Value) -> CoreResult<T> {
    codec::decode_value(arguments)
}

fn to_data<T: Serialize>(value: T) -> CoreResult<Value> {
    codec::encode_value(&value)
}

fn error_code(error: &CoreError) -> ErrorCode {
    match error {
        CoreError::Decode { .. } | CoreError::InvalidArgument(_) => ErrorCode::InvalidArgument,
        CoreError::NotAuthorized => ErrorCode::NotAuthorized,
        CoreError::CalendarNotFound(_) | CoreError::EventNotFound(_) => ErrorCode::NotFound,
        CoreError::ReadOnlyCalendar(_) => ErrorCode::NotAllowed,
        CoreError::Encode(_)
        | CoreError::Config(_)
        | CoreError::Recurrence(_)
        | CoreError::IcsParse(_)
        | CoreError::Io(_) => ErrorCode::Generic,
    }
}
