//! Recurrence rules: the bridge representation, RRULE conversion, and
//! expansion of a recurring event into instances within a range.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::event::Event;
use crate::timestamp::Timestamp;

/// Upper bound on instances produced by a single expansion.
const MAX_INSTANCES: u16 = 1000;

/// A recurrence rule as the caller sends it.
///
/// The scalar `by*` fields use `0` for "no constraint". `weekOfMonth` may be
/// `-1` for "last week of the month".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    #[serde(alias = "frequency")]
    pub recurrence_frequency: RecurrenceFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_occurrences: Option<i64>,
    pub interval: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    pub days_of_week: Vec<DayOfWeek>,
    pub days_of_month: i32,
    pub months_of_year: i32,
    pub weeks_of_year: i32,
    pub week_of_month: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceFrequency {
    pub fn as_rrule_str(self) -> &'static str {
        match self {
            RecurrenceFrequency::Daily => "DAILY",
            RecurrenceFrequency::Weekly => "WEEKLY",
            RecurrenceFrequency::Monthly => "MONTHLY",
            RecurrenceFrequency::Yearly => "YEARLY",
        }
    }

    fn from_rrule_str(s: &str) -> Option<Self> {
        match s {
            "DAILY" => Some(RecurrenceFrequency::Daily),
            "WEEKLY" => Some(RecurrenceFrequency::Weekly),
            "MONTHLY" => Some(RecurrenceFrequency::Monthly),
            "YEARLY" => Some(RecurrenceFrequency::Yearly),
            _ => None,
        }
    }
}

impl TryFrom<i64> for RecurrenceFrequency {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RecurrenceFrequency::Daily),
            1 => Ok(RecurrenceFrequency::Weekly),
            2 => Ok(RecurrenceFrequency::Monthly),
            3 => Ok(RecurrenceFrequency::Yearly),
            other => Err(format!("unknown recurrence frequency {other}, expected 0..=3")),
        }
    }
}

impl From<RecurrenceFrequency> for i64 {
    fn from(frequency: RecurrenceFrequency) -> Self {
        match frequency {
            RecurrenceFrequency::Daily => 0,
            RecurrenceFrequency::Weekly => 1,
            RecurrenceFrequency::Monthly => 2,
            RecurrenceFrequency::Yearly => 3,
        }
    }
}

/// Day of the week, Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub fn as_rrule_str(self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "SU",
            DayOfWeek::Monday => "MO",
            DayOfWeek::Tuesday => "TU",
            DayOfWeek::Wednesday => "WE",
            DayOfWeek::Thursday => "TH",
            DayOfWeek::Friday => "FR",
            DayOfWeek::Saturday => "SA",
        }
    }

    fn from_rrule_str(s: &str) -> Option<Self> {
        match s {
            "SU" => Some(DayOfWeek::Sunday),
            "MO" => Some(DayOfWeek::Monday),
            "TU" => Some(DayOfWeek::Tuesday),
            "WE" => Some(DayOfWeek::Wednesday),
            "TH" => Some(DayOfWeek::Thursday),
            "FR" => Some(DayOfWeek::Friday),
            "SA" => Some(DayOfWeek::Saturday),
            _ => None,
        }
    }
}

impl TryFrom<i64> for DayOfWeek {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DayOfWeek::Sunday),
            1 => Ok(DayOfWeek::Monday),
            2 => Ok(DayOfWeek::Tuesday),
            3 => Ok(DayOfWeek::Wednesday),
            4 => Ok(DayOfWeek::Thursday),
            5 => Ok(DayOfWeek::Friday),
            6 => Ok(DayOfWeek::Saturday),
            other => Err(format!("unknown day of week {other}, expected 0..=6")),
        }
    }
}

impl From<DayOfWeek> for i64 {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Sunday => 0,
            DayOfWeek::Monday => 1,
            DayOfWeek::Tuesday => 2,
            DayOfWeek::Wednesday => 3,
            DayOfWeek::Thursday => 4,
            DayOfWeek::Friday => 5,
            DayOfWeek::Saturday => 6,
        }
    }
}

impl RecurrenceRule {
    pub fn new(frequency: RecurrenceFrequency) -> Self {
        RecurrenceRule {
            recurrence_frequency: frequency,
            total_occurrences: None,
            interval: 1,
            end_date: None,
            days_of_week: Vec::new(),
            days_of_month: 0,
            months_of_year: 0,
            weeks_of_year: 0,
            week_of_month: 0,
        }
    }

    /// The RRULE value (without the `RRULE:` prefix).
    ///
    /// An end date wins over an occurrence count. The week of month prefixes
    /// BYDAY for yearly rules and for "last week"; on monthly rules a positive
    /// week of month becomes BYSETPOS.
    pub fn to_rrule_string(&self) -> String {
        let frequency = self.recurrence_frequency;
        let mut parts = vec![format!("FREQ={}", frequency.as_rrule_str())];

        if self.interval > 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }

        if let Some(end_date) = self.end_date.and_then(Timestamp::to_utc) {
            parts.push(format!("UNTIL={}", end_date.format("%Y%m%dT%H%M%SZ")));
        } else if let Some(count) = self.total_occurrences.filter(|c| *c > 0) {
            parts.push(format!("COUNT={count}"));
        }

        if !self.days_of_week.is_empty() {
            let prefix_week = self.week_of_month != 0
                && (frequency == RecurrenceFrequency::Yearly || self.week_of_month == -1);
            let days: Vec<String> = self
                .days_of_week
                .iter()
                .map(|day| {
                    if prefix_week {
                        format!("{}{}", self.week_of_month, day.as_rrule_str())
                    } else {
                        day.as_rrule_str().to_string()
                    }
                })
                .collect();
            parts.push(format!("BYDAY={}", days.join(",")));
        }

        if self.days_of_month != 0 {
            parts.push(format!("BYMONTHDAY={}", self.days_of_month));
        }

        if self.months_of_year != 0 {
            parts.push(format!("BYMONTH={}", self.months_of_year));
        }

        if frequency == RecurrenceFrequency::Yearly && self.weeks_of_year != 0 {
            parts.push(format!("BYWEEKNO={}", self.weeks_of_year));
        }

        if frequency == RecurrenceFrequency::Monthly
            && self.week_of_month > 0
            && !self.days_of_week.is_empty()
        {
            parts.push(format!("BYSETPOS={}", self.week_of_month));
        }

        parts.join(";")
    }

    /// Parse an RRULE value back into a rule.
    ///
    /// `start` is the event start: a yearly rule without any by-part recurs on
    /// the start's day and month, and that is made explicit here.
    pub fn from_rrule_str(rrule: &str, start: Timestamp) -> CoreResult<Self> {
        let rrule = rrule.trim().trim_start_matches("RRULE:");
        let mut frequency = None;
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Daily);
        let mut set_position = None;

        for part in rrule.split(';').filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| CoreError::Recurrence(format!("Malformed RRULE part '{part}'")))?;

            match key.to_ascii_uppercase().as_str() {
                "FREQ" => {
                    frequency = Some(RecurrenceFrequency::from_rrule_str(value).ok_or_else(
                        || CoreError::Recurrence(format!("Unsupported frequency '{value}'")),
                    )?);
                }
                "INTERVAL" => rule.interval = parse_number(key, value)?,
                "COUNT" => rule.total_occurrences = Some(parse_number(key, value)?),
                "UNTIL" => rule.end_date = Some(parse_until(value)?),
                "BYDAY" => {
                    for entry in value.split(',') {
                        let unknown =
                            || CoreError::Recurrence(format!("Unknown weekday '{entry}'"));
                        let (week, day) = entry
                            .split_at_checked(entry.len().saturating_sub(2))
                            .ok_or_else(unknown)?;
                        let day = DayOfWeek::from_rrule_str(day).ok_or_else(unknown)?;
                        if !week.is_empty() && rule.week_of_month == 0 {
                            rule.week_of_month = parse_number(key, week.trim_start_matches('+'))?;
                        }
                        rule.days_of_week.push(day);
                    }
                }
                "BYMONTHDAY" => rule.days_of_month = first_number(key, value)?,
                "BYMONTH" => rule.months_of_year = first_number(key, value)?,
                "BYWEEKNO" => rule.weeks_of_year = first_number(key, value)?,
                "BYSETPOS" => set_position = Some(first_number(key, value)?),
                _ => {}
            }
        }

        rule.recurrence_frequency =
            frequency.ok_or_else(|| CoreError::Recurrence("RRULE is missing FREQ".to_string()))?;

        if let Some(position) = set_position {
            rule.week_of_month = position;
        }

        if rule.recurrence_frequency == RecurrenceFrequency::Yearly
            && rule.days_of_week.is_empty()
            && rule.weeks_of_year == 0
            && rule.week_of_month == 0
            && rule.days_of_month == 0
            && rule.months_of_year == 0
        {
            if let Some(date) = start.date_naive() {
                rule.days_of_month = date.day() as i32;
                rule.months_of_year = date.month() as i32;
            }
        }

        Ok(rule)
    }

    /// Rule that stops just before `instance_start`, for "this and following"
    /// edits and deletions.
    pub fn truncated_before(&self, instance_start: Timestamp) -> Self {
        let mut rule = self.clone();
        rule.end_date = Some(instance_start.saturating_sub(Duration::seconds(1)));
        rule.total_occurrences = None;
        rule
    }

    /// Check the by-fields against the ranges RRULE allows. `0` means
    /// "unconstrained" for every scalar by-field.
    pub fn validate(&self) -> CoreResult<()> {
        fn check(name: &str, value: i32, valid: bool) -> CoreResult<()> {
            if value == 0 || valid {
                Ok(())
            } else {
                Err(CoreError::InvalidArgument(format!(
                    "Recurrence rule {name} {value} is out of range"
                )))
            }
        }

        if self.interval < 1 || self.interval > i64::from(u16::MAX) {
            return Err(CoreError::InvalidArgument(format!(
                "Recurrence rule interval {} is out of range",
                self.interval
            )));
        }

        let days = self.days_of_month.unsigned_abs();
        let weeks = self.weeks_of_year.unsigned_abs();
        check("monthsOfYear", self.months_of_year, (1..=12).contains(&self.months_of_year))?;
        check("daysOfMonth", self.days_of_month, (1..=31).contains(&days))?;
        check("weeksOfYear", self.weeks_of_year, (1..=53).contains(&weeks))?;
        check("weekOfMonth", self.week_of_month, (-1..=5).contains(&self.week_of_month))
    }
}

/// Reject a recurring event whose rule cannot be expanded, before it is stored.
pub fn validate_series(event: &Event) -> CoreResult<()> {
    let Some(rule) = &event.recurrence_rule else {
        return Ok(());
    };
    rule.validate()?;

    let text = build_rrule_set_string(event, rule, &[])
        .map_err(|e| CoreError::InvalidArgument(e.to_string()))?;
    text.parse::<RRuleSet>()
        .map(|_| ())
        .map_err(|e| CoreError::InvalidArgument(format!("Invalid recurrence rule: {e}")))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> CoreResult<T> {
    value
        .parse()
        .map_err(|_| CoreError::Recurrence(format!("Invalid {key} value '{value}'")))
}

fn first_number(key: &str, value: &str) -> CoreResult<i32> {
    let first = value.split(',').next().unwrap_or_default();
    parse_number(key, first)
}

fn parse_until(value: &str) -> CoreResult<Timestamp> {
    let value = value.trim_end_matches('Z');
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Ok(dt.and_utc().into());
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc().into())
        .ok_or_else(|| CoreError::Recurrence(format!("Invalid UNTIL value '{value}'")))
}

/// Build the DTSTART/RRULE/EXDATE text the rrule crate parses.
fn build_rrule_set_string(
    event: &Event,
    rule: &RecurrenceRule,
    exdates: &[Timestamp],
) -> CoreResult<String> {
    let start = event
        .start
        .to_utc()
        .ok_or_else(|| CoreError::Recurrence(format!("Event '{}' has an invalid start", event.event_id)))?;

    let zone = event
        .start_time_zone
        .as_deref()
        .filter(|_| !event.all_day)
        .and_then(|tz| tz.parse::<chrono_tz::Tz>().ok());

    let mut lines = Vec::new();

    // All-day events recur on dates, so anchor them at midnight UTC
    lines.push(match zone {
        Some(tz) => format!(
            "DTSTART;TZID={}:{}",
            tz.name(),
            start.with_timezone(&tz).format("%Y%m%dT%H%M%S")
        ),
        None if event.all_day => format!("DTSTART:{}T000000Z", start.format("%Y%m%d")),
        None => format!("DTSTART:{}", start.format("%Y%m%dT%H%M%SZ")),
    });

    lines.push(format!("RRULE:{}", rule.to_rrule_string()));

    for exdate in exdates.iter().filter_map(|t| t.to_utc()) {
        lines.push(format!("EXDATE:{}", exdate.format("%Y%m%dT%H%M%SZ")));
    }

    Ok(lines.join("\n"))
}

/// Start times of the occurrences of `event` that overlap `[from, to]`.
///
/// Non-recurring events yield their own start when they overlap.
pub fn occurrence_starts(
    event: &Event,
    exdates: &[Timestamp],
    from: Timestamp,
    to: Timestamp,
) -> CoreResult<Vec<Timestamp>> {
    let Some(rule) = &event.recurrence_rule else {
        return Ok(if event.overlaps(from, to) {
            vec![event.start]
        } else {
            Vec::new()
        });
    };

    let text = build_rrule_set_string(event, rule, exdates)?;
    let rrule_set: RRuleSet = text.parse().map_err(|e| {
        CoreError::Recurrence(format!(
            "Failed to parse RRULE for event '{}': {}",
            event.event_id, e
        ))
    })?;

    // An occurrence starting before `from` still overlaps while it lasts.
    // after/before are exclusive, so widen by a second on both ends.
    let (Some(after), Some(before)) = (
        from.saturating_sub(event.duration() + Duration::seconds(1)).to_utc(),
        to.saturating_add(Duration::seconds(1)).to_utc(),
    ) else {
        return Ok(Vec::new());
    };

    let tz: rrule::Tz = Utc.into();
    let result = rrule_set
        .after(after.with_timezone(&tz))
        .before(before.with_timezone(&tz))
        .all(MAX_INSTANCES);

    if result.limited {
        tracing::warn!(
            event_id = %event.event_id,
            limit = MAX_INSTANCES,
            "Recurrence expansion truncated"
        );
    }

    let duration = event.duration();
    Ok(result
        .dates
        .iter()
        .map(|dt| Timestamp::from(dt.with_timezone(&Utc)))
        .filter(|start| *start <= to && start.saturating_add(duration) >= from)
        .collect())
}

/// Expand a recurring event into its instances overlapping `[from, to]`.
/// Instances keep the series' `eventId`.
pub fn expand(
    event: &Event,
    exdates: &[Timestamp],
    from: Timestamp,
    to: Timestamp,
) -> CoreResult<Vec<Event>> {
    Ok(occurrence_starts(event, exdates, from, to)?
        .into_iter()
        .map(|start| event.occurrence_at(start))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().into()
    }

    fn weekly_standup() -> Event {
        // 2024-01-01 is a Monday
        let mut event = Event::new("work", "Standup", ts(2024, 1, 1, 9), ts(2024, 1, 1, 10));
        event.event_id = "standup".to_string();
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Weekly);
        rule.days_of_week = vec![DayOfWeek::Monday];
        event.recurrence_rule = Some(rule);
        event
    }

    #[test]
    fn test_optional_fields_stay_absent() {
        let input = json!({
            "recurrenceFrequency": 1,
            "interval": 2,
            "daysOfWeek": [1, 3],
            "daysOfMonth": 0,
            "monthsOfYear": 0,
            "weeksOfYear": 0,
            "weekOfMonth": 0
        });

        let rule: RecurrenceRule = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(rule.total_occurrences, None);
        assert_eq!(rule.end_date, None);
        assert_eq!(serde_json::to_value(&rule).unwrap(), input);
    }

    #[test]
    fn test_frequency_alias_is_accepted() {
        let rule: RecurrenceRule = serde_json::from_value(json!({
            "frequency": 3,
            "interval": 1,
            "daysOfWeek": [],
            "daysOfMonth": 14,
            "monthsOfYear": 2,
            "weeksOfYear": 0,
            "weekOfMonth": 0
        }))
        .unwrap();
        assert_eq!(rule.recurrence_frequency, RecurrenceFrequency::Yearly);
    }

    #[test]
    fn test_weekly_rule_to_rrule() {
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Weekly);
        rule.interval = 2;
        rule.total_occurrences = Some(10);
        rule.days_of_week = vec![DayOfWeek::Monday, DayOfWeek::Wednesday];

        assert_eq!(rule.to_rrule_string(), "FREQ=WEEKLY;INTERVAL=2;COUNT=10;BYDAY=MO,WE");
    }

    #[test]
    fn test_end_date_wins_over_count() {
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Daily);
        rule.total_occurrences = Some(5);
        rule.end_date = Some(ts(2024, 2, 1, 0));

        assert_eq!(rule.to_rrule_string(), "FREQ=DAILY;UNTIL=20240201T000000Z");
    }

    #[test]
    fn test_monthly_last_friday_prefixes_byday() {
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Monthly);
        rule.days_of_week = vec![DayOfWeek::Friday];
        rule.week_of_month = -1;

        assert_eq!(rule.to_rrule_string(), "FREQ=MONTHLY;BYDAY=-1FR");
    }

    #[test]
    fn test_monthly_second_tuesday_uses_setpos() {
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Monthly);
        rule.days_of_week = vec![DayOfWeek::Tuesday];
        rule.week_of_month = 2;

        assert_eq!(rule.to_rrule_string(), "FREQ=MONTHLY;BYDAY=TU;BYSETPOS=2");
    }

    #[test]
    fn test_yearly_nth_weekday_of_month() {
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Yearly);
        rule.days_of_week = vec![DayOfWeek::Thursday];
        rule.week_of_month = 4;
        rule.months_of_year = 11;

        assert_eq!(rule.to_rrule_string(), "FREQ=YEARLY;BYDAY=4TH;BYMONTH=11");
    }

    #[test]
    fn test_rrule_parses_back() {
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Monthly);
        rule.interval = 3;
        rule.days_of_week = vec![DayOfWeek::Tuesday];
        rule.week_of_month = 2;
        rule.end_date = Some(ts(2025, 6, 1, 12));

        let parsed =
            RecurrenceRule::from_rrule_str(&rule.to_rrule_string(), ts(2025, 1, 14, 9)).unwrap();
        assert_eq!(parsed, rule);
    }

    #[test]
    fn test_yearly_rule_without_parts_takes_start_date() {
        let parsed = RecurrenceRule::from_rrule_str("FREQ=YEARLY", ts(2024, 7, 4, 12)).unwrap();
        assert_eq!(parsed.days_of_month, 4);
        assert_eq!(parsed.months_of_year, 7);
    }

    #[test]
    fn test_yearly_weekday_rule_keeps_its_parts() {
        let parsed =
            RecurrenceRule::from_rrule_str("FREQ=YEARLY;BYDAY=MO", ts(2024, 7, 1, 12)).unwrap();
        assert_eq!(parsed.days_of_month, 0);
        assert_eq!(parsed.months_of_year, 0);
        assert_eq!(parsed.to_rrule_string(), "FREQ=YEARLY;BYDAY=MO");
    }

    #[test]
    fn test_non_ascii_weekday_is_rejected() {
        for rrule in ["FREQ=WEEKLY;BYDAY=éa", "FREQ=WEEKLY;BYDAY=1日"] {
            let err = RecurrenceRule::from_rrule_str(rrule, ts(2024, 1, 1, 0)).unwrap_err();
            assert!(err.to_string().contains("Unknown weekday"), "{err}");
        }
    }

    #[test]
    fn test_validate_accepts_unconstrained_and_edge_values() {
        let mut rule = RecurrenceRule::new(RecurrenceFrequency::Yearly);
        assert!(rule.validate().is_ok());

        rule.months_of_year = 12;
        rule.days_of_month = -31;
        rule.weeks_of_year = 53;
        rule.week_of_month = -1;
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_fields() {
        let cases: [fn(&mut RecurrenceRule); 6] = [
            |r| r.months_of_year = 13,
            |r| r.days_of_month = 32,
            |r| r.weeks_of_year = -54,
            |r| r.week_of_month = 6,
            |r| r.interval = 0,
            |r| r.interval = 100_000,
        ];

        for set in cases {
            let mut rule = RecurrenceRule::new(RecurrenceFrequency::Monthly);
            set(&mut rule);
            let err = rule.validate().unwrap_err();
            assert!(matches!(err, CoreError::InvalidArgument(_)), "{err}");
        }
    }

    #[test]
    fn test_validate_series_rejects_rule_rrule_cannot_expand() {
        let mut event = weekly_standup();
        assert!(validate_series(&event).is_ok());

        // in range, but BYMONTHDAY is not allowed on weekly rules
        if let Some(rule) = event.recurrence_rule.as_mut() {
            rule.days_of_month = 15;
        }
        let err = validate_series(&event).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)), "{err}");
    }

    #[test]
    fn test_rrule_without_freq_is_rejected() {
        let err = RecurrenceRule::from_rrule_str("INTERVAL=2", ts(2024, 1, 1, 0)).unwrap_err();
        assert!(matches!(err, CoreError::Recurrence(_)));
    }

    #[test]
    fn test_expand_weekly_event_in_range() {
        let event = weekly_standup();
        let instances = expand(&event, &[], ts(2024, 1, 1, 0), ts(2024, 1, 31, 0)).unwrap();

        let starts: Vec<Timestamp> = instances.iter().map(|e| e.start).collect();
        assert_eq!(
            starts,
            vec![
                ts(2024, 1, 1, 9),
                ts(2024, 1, 8, 9),
                ts(2024, 1, 15, 9),
                ts(2024, 1, 22, 9),
                ts(2024, 1, 29, 9),
            ]
        );
        assert!(instances.iter().all(|e| e.event_id == "standup"));
        assert!(instances.iter().all(|e| e.duration() == Duration::hours(1)));
    }

    #[test]
    fn test_expand_skips_excluded_occurrences() {
        let event = weekly_standup();
        let instances = expand(
            &event,
            &[ts(2024, 1, 8, 9)],
            ts(2024, 1, 1, 0),
            ts(2024, 1, 16, 0),
        )
        .unwrap();

        let starts: Vec<Timestamp> = instances.iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![ts(2024, 1, 1, 9), ts(2024, 1, 15, 9)]);
    }

    #[test]
    fn test_expand_includes_occurrence_in_progress_at_range_start() {
        let event = weekly_standup();
        let instances = expand(
            &event,
            &[],
            ts(2024, 1, 8, 9).saturating_add(Duration::minutes(30)),
            ts(2024, 1, 8, 23),
        )
        .unwrap();

        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].start, ts(2024, 1, 8, 9));
    }

    #[test]
    fn test_truncated_rule_stops_before_instance() {
        let mut event = weekly_standup();
        let rule = event.recurrence_rule.clone().unwrap();
        event.recurrence_rule = Some(rule.truncated_before(ts(2024, 1, 15, 9)));

        let instances = expand(&event, &[], ts(2024, 1, 1, 0), ts(2024, 2, 28, 0)).unwrap();
        assert_eq!(instances.len(), 2);
    }

    #[test]
    fn test_non_recurring_event_yields_itself_when_overlapping() {
        let mut event = weekly_standup();
        event.recurrence_rule = None;

        let inside = occurrence_starts(&event, &[], ts(2024, 1, 1, 0), ts(2024, 1, 2, 0)).unwrap();
        assert_eq!(inside, vec![ts(2024, 1, 1, 9)]);

        let outside = occurrence_starts(&event, &[], ts(2024, 1, 2, 0), ts(2024, 1, 3, 0)).unwrap();
        assert!(outside.is_empty());
    }
}
