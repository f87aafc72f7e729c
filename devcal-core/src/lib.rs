//! Core types for devcal.
//!
//! This crate provides the records exchanged with a cross-platform calendar
//! caller and everything needed to answer its requests:
//! - `Event`, `Calendar` and `RecurrenceRule` records with their JSON codec
//! - `protocol` and `bridge` for the line-delimited method protocol
//! - `store` for calendars kept as directories of .ics files

pub mod bridge;
pub mod calendar;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod ics;
pub mod permission;
pub mod protocol;
pub mod recurrence;
pub mod store;
pub mod timestamp;

pub use calendar::{Calendar, Color};
pub use error::{CoreError, CoreResult};
pub use event::*;
pub use recurrence::{DayOfWeek, RecurrenceFrequency, RecurrenceRule};
pub use timestamp::Timestamp;
