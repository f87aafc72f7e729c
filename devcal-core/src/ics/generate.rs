//! ICS file generation.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

use crate::error::{CoreError, CoreResult};
use crate::event::{Attendee, Availability};
use crate::store::StoredEvent;
use crate::timestamp::Timestamp;

use super::{AVAILABILITY_PROPERTY, PRODID};

/// Generate .ics content for a stored event
pub fn generate_ics(stored: &StoredEvent) -> CoreResult<String> {
    let event = &stored.event;
    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.event_id);
    ics_event.summary(&event.title);

    // DTSTAMP - required by RFC 5545
    ics_event.add_property("DTSTAMP", Utc::now().format("%Y%m%dT%H%M%SZ").to_string());

    let start = to_utc(event.start, "start")?;
    let end = to_utc(event.end, "end")?;

    if event.all_day {
        // DTEND is exclusive for dates
        let end_date = end.date_naive().max(start.date_naive()) + Duration::days(1);
        add_date_property(&mut ics_event, "DTSTART", start);
        add_date_property(
            &mut ics_event,
            "DTEND",
            end_date.and_time(NaiveTime::MIN).and_utc(),
        );
    } else {
        let zone = event.start_time_zone.as_deref();
        add_datetime_property(&mut ics_event, "DTSTART", start, zone);
        add_datetime_property(&mut ics_event, "DTEND", end, zone);
    }

    if !event.description.is_empty() {
        ics_event.description(&event.description);
    }

    if !event.location.is_empty() {
        ics_event.location(&event.location);
    }

    if !event.url.is_empty() {
        ics_event.add_property("URL", &event.url);
    }

    // TRANSP covers busy/free; the finer availability rides along as an X- property
    match event.availability {
        Availability::Busy => {}
        Availability::Free => {
            ics_event.add_property("TRANSP", "TRANSPARENT");
        }
        Availability::Tentative | Availability::Unavailable => {
            ics_event.add_property(AVAILABILITY_PROPERTY, event.availability.as_str());
        }
    }

    // Recurrence rule and excluded occurrences
    if let Some(ref rule) = event.recurrence_rule {
        ics_event.add_property("RRULE", rule.to_rrule_string());
        for exdate in &stored.exdates {
            let exdate = to_utc(*exdate, "exdate")?;
            let prop = Property::new("EXDATE", exdate.format("%Y%m%dT%H%M%SZ").to_string());
            ics_event.append_multi_property(prop);
        }
    }

    // Add alarms (VALARM components) - minimal per RFC 5545
    for reminder in &event.reminders {
        let trigger = Trigger::before_start(reminder.offset()?);
        let alarm = Alarm::display("Reminder", trigger);
        ics_event.alarm(alarm);
    }

    if let Some(ref organizer) = event.organizer {
        ics_event.append_property(participant_property("ORGANIZER", organizer));
    }

    // ATTENDEE (multi-property - can appear multiple times)
    for attendee in &event.attendees {
        ics_event.append_multi_property(participant_property("ATTENDEE", attendee));
    }

    let ics_event = ics_event.done();
    cal.push(ics_event);
    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

fn to_utc(timestamp: Timestamp, field: &str) -> CoreResult<DateTime<Utc>> {
    timestamp.to_utc().ok_or_else(|| {
        CoreError::InvalidArgument(format!(
            "The {field} timestamp {} is out of range",
            timestamp.as_millis()
        ))
    })
}

fn participant_property(name: &str, attendee: &Attendee) -> Property {
    let mut prop = Property::new(name, format!("mailto:{}", attendee.email_address));
    if !attendee.name.is_empty() {
        prop.add_parameter("CN", &attendee.name);
    }
    if let Some(role) = attendee.role.as_ics_str() {
        prop.add_parameter("ROLE", role);
    }
    if let Some(partstat) = attendee.attendance_status.as_ics_str() {
        prop.add_parameter("PARTSTAT", partstat);
    }
    prop
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with ours
/// - Remove CALSCALE:GREGORIAN (it's the default)
/// - Remove DTSTAMP and UID inside VALARM sections (not required by RFC 5545)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    let mut in_valarm = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        if line == "BEGIN:VALARM" {
            in_valarm = true;
        } else if line == "END:VALARM" {
            in_valarm = false;
        }

        if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn add_date_property(ics_event: &mut icalendar::Event, name: &str, time: DateTime<Utc>) {
    let mut prop = Property::new(name, time.format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    ics_event.append_property(prop);
}

/// Zoned datetimes get a TZID parameter and local wall time; everything else is UTC
fn add_datetime_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    time: DateTime<Utc>,
    zone: Option<&str>,
) {
    match zone.and_then(|z| z.parse::<chrono_tz::Tz>().ok()) {
        Some(tz) => {
            let local = time.with_timezone(&tz);
            let mut prop = Property::new(name, local.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", tz.name());
            ics_event.append_property(prop);
        }
        None => {
            ics_event.add_property(name, time.format("%Y%m%dT%H%M%SZ").to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AttendanceStatus, AttendeeRole, Event, Reminder};
    use crate::recurrence::{DayOfWeek, RecurrenceFrequency, RecurrenceRule};
    use chrono::TimeZone;

    fn make_test_event() -> StoredEvent {
        let mut event = Event::new(
            "work",
            "Test Event",
            Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap().into(),
            Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap().into(),
        );
        event.event_id = "test-event-123".to_string();
        StoredEvent::new(event)
    }

    #[test]
    fn test_generate_ics_multiple_attendees() {
        let mut stored = make_test_event();
        stored.event.attendees = vec![
            Attendee {
                name: "Alice".to_string(),
                email_address: "alice@example.com".to_string(),
                role: AttendeeRole::Required,
                attendance_status: AttendanceStatus::Accepted,
            },
            Attendee {
                name: String::new(),
                email_address: "bob@example.com".to_string(),
                role: AttendeeRole::Unknown,
                attendance_status: AttendanceStatus::Unknown,
            },
        ];

        let ics = generate_ics(&stored).unwrap();

        let attendee_count = ics.lines().filter(|l| l.starts_with("ATTENDEE")).count();
        assert_eq!(attendee_count, 2, "ICS:\n{}", ics);

        let bob = ics
            .lines()
            .find(|l| l.contains("bob@example.com"))
            .expect("Should have Bob");
        assert!(!bob.contains("CN="), "Empty name should not emit CN: {}", bob);
        assert!(!bob.contains("ROLE="), "Unknown role should not emit ROLE: {}", bob);
    }

    #[test]
    fn test_generate_ics_all_day_event_has_value_date() {
        let mut stored = make_test_event();
        stored.event.all_day = true;
        stored.event.end = stored.event.start;

        let ics = generate_ics(&stored).unwrap();

        assert!(ics.contains("DTSTART;VALUE=DATE:20250320"), "ICS:\n{}", ics);
        assert!(ics.contains("DTEND;VALUE=DATE:20250321"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_zoned_start_uses_tzid() {
        let mut stored = make_test_event();
        stored.event.start_time_zone = Some("Europe/Berlin".to_string());

        let ics = generate_ics(&stored).unwrap();

        // 15:00 UTC is 16:00 in Berlin in March (before DST starts)
        assert!(
            ics.contains("DTSTART;TZID=Europe/Berlin:20250320T160000"),
            "ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_generate_ics_alarm_is_minimal() {
        let mut stored = make_test_event();
        stored.event.reminders = vec![Reminder { minutes: 30 }];

        let ics = generate_ics(&stored).unwrap();

        assert!(ics.contains("BEGIN:VALARM"), "Should have VALARM");
        assert!(ics.contains("ACTION:DISPLAY"), "Should have ACTION:DISPLAY");
        let valarm_section = ics
            .split("BEGIN:VALARM")
            .nth(1)
            .unwrap()
            .split("END:VALARM")
            .next()
            .unwrap();
        assert!(!valarm_section.contains("UID:"), "Got:\n{}", valarm_section);
        assert!(!valarm_section.contains("DTSTAMP:"), "Got:\n{}", valarm_section);
    }

    #[test]
    fn test_generate_ics_rejects_reminder_out_of_range() {
        let mut stored = make_test_event();
        stored.event.reminders = vec![Reminder { minutes: i64::MIN }];

        let err = generate_ics(&stored).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)), "{err}");
    }

    #[test]
    fn test_generate_ics_recurrence_with_exdate() {
        let mut stored = make_test_event();
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Weekly);
        rule.days_of_week = vec![DayOfWeek::Thursday];
        stored.event.recurrence_rule = Some(rule);
        stored
            .exdates
            .push(Utc.with_ymd_and_hms(2025, 3, 27, 15, 0, 0).unwrap().into());

        let ics = generate_ics(&stored).unwrap();

        assert!(ics.contains("RRULE:FREQ=WEEKLY;BYDAY=TH"), "ICS:\n{}", ics);
        assert!(ics.contains("EXDATE:20250327T150000Z"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_replaces_prodid() {
        let ics = generate_ics(&make_test_event()).unwrap();
        assert!(ics.contains("PRODID:DEVCAL"), "ICS:\n{}", ics);
        assert!(!ics.contains("CALSCALE:GREGORIAN"));
    }
}
