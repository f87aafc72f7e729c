//! ICS file parsing using the icalendar crate's parser.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Property, read_calendar, unfold},
};

use crate::event::{AttendanceStatus, Attendee, AttendeeRole, Availability, Event, Reminder};
use crate::recurrence::RecurrenceRule;
use crate::store::StoredEvent;
use crate::timestamp::Timestamp;

use super::AVAILABILITY_PROPERTY;

/// Parse ICS content into a stored event belonging to `calendar_id`
pub fn parse_event(content: &str, calendar_id: &str) -> Option<StoredEvent> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    // Required fields
    let event_id = vevent.find_prop("UID")?.val.to_string();
    let title = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();

    let dtstart = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?;
    let all_day = matches!(dtstart, DatePerhapsTime::Date(_));
    let start_time_zone = match &dtstart {
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { tzid, .. }) => {
            Some(tzid.clone())
        }
        _ => None,
    };
    let start = to_timestamp(dtstart)?;

    let end = match vevent.find_prop("DTEND") {
        // Dates in DTEND are exclusive; the bridge ends all-day events on their last day
        Some(prop) if all_day => to_timestamp(DatePerhapsTime::try_from(prop).ok()?)?
            .saturating_sub(Duration::days(1))
            .max(start),
        Some(prop) => to_timestamp(DatePerhapsTime::try_from(prop).ok()?)?,
        None => start,
    };

    let description = text_prop(vevent.find_prop("DESCRIPTION"));
    let location = text_prop(vevent.find_prop("LOCATION"));
    let url = text_prop(vevent.find_prop("URL"));

    let availability = vevent
        .find_prop(AVAILABILITY_PROPERTY)
        .and_then(|p| Availability::try_from(p.val.to_string()).ok())
        .or_else(|| {
            vevent
                .find_prop("TRANSP")
                .filter(|p| p.val == "TRANSPARENT")
                .map(|_| Availability::Free)
        })
        .unwrap_or(Availability::Busy);

    // Recurrence (RRULE, EXDATE)
    let recurrence_rule = match vevent.find_prop("RRULE") {
        Some(prop) => Some(RecurrenceRule::from_rrule_str(prop.val.as_ref(), start).ok()?),
        None => None,
    };
    let exdates: Vec<Timestamp> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_exdate_property)
        .collect();

    // Attendees
    let organizer = vevent.find_prop("ORGANIZER").map(parse_attendee);
    let attendees: Vec<Attendee> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "ATTENDEE")
        .map(parse_attendee)
        .collect();

    // Reminders from VALARM components
    let reminders: Vec<Reminder> = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .filter_map(|alarm| {
            let trigger = alarm.find_prop("TRIGGER")?.val.as_ref();
            let minutes = parse_trigger_minutes(trigger)?;
            Some(Reminder { minutes })
        })
        .collect();

    let event = Event {
        event_id,
        calendar_id: calendar_id.to_string(),
        title,
        description,
        start,
        end,
        all_day,
        start_time_zone,
        attendees,
        location,
        recurrence_rule,
        organizer,
        reminders,
        url,
        availability,
    };

    Some(StoredEvent { event, exdates })
}

fn text_prop(prop: Option<&Property>) -> String {
    prop.map(|p| p.val.to_string()).unwrap_or_default()
}

/// Resolve icalendar's DatePerhapsTime to an instant. Dates are midnight UTC,
/// floating times are read as UTC.
fn to_timestamp(dpt: DatePerhapsTime) -> Option<Timestamp> {
    let utc = match dpt {
        DatePerhapsTime::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => dt,
            CalendarDateTime::Floating(naive) => naive.and_utc(),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                zoned_to_utc(date_time, &tzid)?
            }
        },
    };
    Some(utc.into())
}

fn zoned_to_utc(local: NaiveDateTime, tzid: &str) -> Option<DateTime<Utc>> {
    let tz: chrono_tz::Tz = tzid.parse().ok()?;
    // Ambiguous wall times (DST fall-back) resolve to the earlier instant
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an EXDATE property into instants.
///
/// Handles UTC, TZID-qualified and VALUE=DATE forms, and comma-separated lists.
fn parse_exdate_property(prop: &Property) -> Vec<Timestamp> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if is_date {
                chrono::NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN).and_utc().into())
            } else {
                let naive =
                    NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), "%Y%m%dT%H%M%S").ok()?;
                match tzid {
                    Some(ref tz) if !s.ends_with('Z') => zoned_to_utc(naive, tz).map(Into::into),
                    _ => Some(naive.and_utc().into()),
                }
            }
        })
        .collect()
}

/// Parse ATTENDEE/ORGANIZER property
fn parse_attendee(prop: &Property) -> Attendee {
    let email_address = prop
        .val
        .as_ref()
        .strip_prefix("mailto:")
        .unwrap_or(prop.val.as_ref())
        .to_string();

    let param = |key: &str| {
        prop.params
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.val.as_ref().map(|v| v.to_string()))
    };

    Attendee {
        name: param("CN").unwrap_or_default(),
        email_address,
        role: param("ROLE")
            .map(|r| AttendeeRole::from_ics_str(&r))
            .unwrap_or(AttendeeRole::Unknown),
        attendance_status: param("PARTSTAT")
            .map(|s| AttendanceStatus::from_ics_str(&s))
            .unwrap_or(AttendanceStatus::Unknown),
    }
}

/// Parse TRIGGER value to minutes before event (-PT30M, -P1D, etc.)
fn parse_trigger_minutes(value: &str) -> Option<i64> {
    let is_before = value.starts_with('-');
    let duration_str = value.trim_start_matches(['-', '+']);

    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let minutes = (std_duration.as_secs() / 60) as i64;

    Some(if is_before { minutes } else { -minutes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::generate_ics;
    use crate::recurrence::{DayOfWeek, RecurrenceFrequency};

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap().into()
    }

    fn full_event() -> StoredEvent {
        let mut event = Event::new("work", "Planning", ts(2025, 3, 20, 15, 0), ts(2025, 3, 20, 16, 30));
        event.event_id = "evt-42".to_string();
        event.description = "Quarterly planning".to_string();
        event.location = "Room 4".to_string();
        event.url = "https://example.com/planning".to_string();
        event.availability = Availability::Tentative;
        event.start_time_zone = Some("America/New_York".to_string());
        event.reminders = vec![Reminder { minutes: 15 }, Reminder { minutes: 60 }];
        event.organizer = Some(Attendee {
            name: "Olivia Organizer".to_string(),
            email_address: "olivia@example.com".to_string(),
            role: AttendeeRole::Chair,
            attendance_status: AttendanceStatus::Accepted,
        });
        event.attendees = vec![
            Attendee {
                name: "Alice".to_string(),
                email_address: "alice@example.com".to_string(),
                role: AttendeeRole::Required,
                attendance_status: AttendanceStatus::Pending,
            },
            Attendee {
                name: String::new(),
                email_address: "bob@example.com".to_string(),
                role: AttendeeRole::Optional,
                attendance_status: AttendanceStatus::Declined,
            },
        ];
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Weekly);
        rule.days_of_week = vec![DayOfWeek::Thursday];
        rule.total_occurrences = Some(8);
        event.recurrence_rule = Some(rule);

        StoredEvent {
            event,
            exdates: vec![ts(2025, 3, 27, 15, 0)],
        }
    }

    #[test]
    fn test_generate_then_parse_preserves_event() {
        let stored = full_event();

        let ics = generate_ics(&stored).unwrap();
        let parsed = parse_event(&ics, "work").expect("Should parse generated ICS");

        assert_eq!(parsed, stored);
    }

    #[test]
    fn test_all_day_event_ends_on_its_last_day() {
        let mut stored = full_event();
        stored.event.all_day = true;
        stored.event.start_time_zone = None;
        stored.event.recurrence_rule = None;
        stored.exdates.clear();
        stored.event.start = ts(2025, 3, 20, 0, 0);
        stored.event.end = ts(2025, 3, 20, 0, 0);

        let ics = generate_ics(&stored).unwrap();
        let parsed = parse_event(&ics, "work").unwrap();

        assert!(parsed.event.all_day);
        assert_eq!(parsed.event.start, ts(2025, 3, 20, 0, 0));
        assert_eq!(parsed.event.end, ts(2025, 3, 20, 0, 0));
    }

    #[test]
    fn test_parse_foreign_ics() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:foreign-1\r\n\
SUMMARY:Imported\r\n\
DTSTART;TZID=Europe/Berlin:20240101T100000\r\n\
DTEND;TZID=Europe/Berlin:20240101T110000\r\n\
TRANSP:TRANSPARENT\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO\r\n\
EXDATE;TZID=Europe/Berlin:20240108T100000,20240115T100000\r\n\
DESCRIPTION:Hello \r\n world\r\n\
END:VEVENT\r\n\
END:VCALENDAR";

        let stored = parse_event(ics, "imported").expect("Should parse");

        assert_eq!(stored.event.event_id, "foreign-1");
        assert_eq!(stored.event.calendar_id, "imported");
        assert_eq!(stored.event.description, "Hello world");
        assert_eq!(stored.event.availability, Availability::Free);
        assert_eq!(stored.event.start_time_zone.as_deref(), Some("Europe/Berlin"));
        // Berlin is UTC+1 in January
        assert_eq!(stored.event.start, ts(2024, 1, 1, 9, 0));
        assert_eq!(
            stored.exdates,
            vec![ts(2024, 1, 8, 9, 0), ts(2024, 1, 15, 9, 0)]
        );
        let rule = stored.event.recurrence_rule.expect("Should have recurrence");
        assert_eq!(rule.days_of_week, vec![DayOfWeek::Monday]);
    }

    #[test]
    fn test_parse_without_uid_fails() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:No id\r\n\
DTSTART:20240101T100000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR";

        assert!(parse_event(ics, "work").is_none());
    }

    #[test]
    fn test_trigger_minutes() {
        assert_eq!(parse_trigger_minutes("-PT30M"), Some(30));
        assert_eq!(parse_trigger_minutes("-P1D"), Some(1440));
        assert_eq!(parse_trigger_minutes("PT5M"), Some(-5));
    }
}
