//! Bridge protocol types.
//!
//! Defines the line-delimited JSON protocol spoken between the cross-platform
//! caller and the native side: one request object per line in, one response
//! object per line out.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::event::Event;
use crate::timestamp::Timestamp;

/// Methods the native side implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    RequestPermissions,
    HasPermissions,
    RetrieveCalendars,
    RetrieveEvents,
    CreateOrUpdateEvent,
    UpdateEventInstance,
    DeleteEvent,
    DeleteEventInstance,
    CreateCalendar,
    DeleteCalendar,
}

impl Method {
    pub const ALL: [Method; 10] = [
        Method::RequestPermissions,
        Method::HasPermissions,
        Method::RetrieveCalendars,
        Method::RetrieveEvents,
        Method::CreateOrUpdateEvent,
        Method::UpdateEventInstance,
        Method::DeleteEvent,
        Method::DeleteEventInstance,
        Method::CreateCalendar,
        Method::DeleteCalendar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::RequestPermissions => "requestPermissions",
            Method::HasPermissions => "hasPermissions",
            Method::RetrieveCalendars => "retrieveCalendars",
            Method::RetrieveEvents => "retrieveEvents",
            Method::CreateOrUpdateEvent => "createOrUpdateEvent",
            Method::UpdateEventInstance => "updateEventInstance",
            Method::DeleteEvent => "deleteEvent",
            Method::DeleteEventInstance => "deleteEventInstance",
            Method::CreateCalendar => "createCalendar",
            Method::DeleteCalendar => "deleteCalendar",
        }
    }

    /// None for methods this side does not implement.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Permission methods are the only ones callable before access is granted.
    pub fn requires_permission(self) -> bool {
        !matches!(self, Method::RequestPermissions | Method::HasPermissions)
    }
}

/// Request sent by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    /// Absent and `null` arguments both read as `{}`.
    #[serde(default = "empty_arguments", deserialize_with = "null_as_empty")]
    pub arguments: Value,
}

fn empty_arguments() -> Value {
    Value::Object(Default::default())
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or_else(empty_arguments))
}

impl Request {
    pub fn new(method: &str, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Null => empty_arguments(),
            arguments => arguments,
        };
        Request {
            method: method.to_string(),
            arguments,
        }
    }
}

/// Error codes reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "400")]
    InvalidArgument,
    #[serde(rename = "401")]
    NotAuthorized,
    #[serde(rename = "404")]
    NotFound,
    #[serde(rename = "405")]
    NotAllowed,
    #[serde(rename = "500")]
    Generic,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "400",
            ErrorCode::NotAuthorized => "401",
            ErrorCode::NotFound => "404",
            ErrorCode::NotAllowed => "405",
            ErrorCode::Generic => "500",
        }
    }
}

/// Response sent back for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success { data: Value },
    Error { code: ErrorCode, message: String },
    NotImplemented { method: String },
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response::Success { data }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    /// Single-line JSON form written to the transport.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"status":"error","code":"500","message":{}}}"#,
                Value::String(format!("Failed to encode response: {e}"))
            )
        })
    }
}

// ============================================================================
// Method arguments
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveEventsArgs {
    #[serde(default)]
    pub calendar_ids: Option<Vec<String>>,
    #[serde(default)]
    pub start_date: Option<Timestamp>,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    #[serde(default)]
    pub event_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrUpdateEventArgs {
    pub event: Event,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInstanceArgs {
    pub event: Event,
    pub start_date: Timestamp,
    pub following_instances: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventArgs {
    pub calendar_id: String,
    pub event_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventInstanceArgs {
    pub calendar_id: String,
    pub event_id: String,
    pub start_date: Timestamp,
    pub following_instances: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCalendarArgs {
    pub calendar_name: String,
    /// `0xAARRGGBB`
    #[serde(default)]
    pub calendar_color: Option<String>,
    #[serde(default)]
    pub local_account_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCalendarArgs {
    pub calendar_id: String,
}
