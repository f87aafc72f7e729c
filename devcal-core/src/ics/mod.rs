//! Event files in RFC 5545 form.
//!
//! Each stored event is one VCALENDAR holding a single VEVENT. Availability
//! states TRANSP cannot express travel in an X- property.

mod generate;
mod parse;

pub use generate::generate_ics;
pub use parse::parse_event;

pub(crate) const PRODID: &str = "DEVCAL";
pub(crate) const AVAILABILITY_PROPERTY: &str = "X-DEVCAL-AVAILABILITY";
