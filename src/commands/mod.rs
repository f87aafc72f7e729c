pub mod bridge;
pub mod calendars;
pub mod call;
pub mod events;
pub mod permission;
