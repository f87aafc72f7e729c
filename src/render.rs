//! Terminal rendering for devcal types.
//!
//! Extension traits that add colored output to devcal-core types using owo_colors.

use chrono::Local;
use devcal_core::{Availability, Calendar, Event};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Calendar {
    fn render(&self) -> String {
        let (_, r, g, b) = self.color.argb();
        let mut line = format!(
            "{} {} {}",
            "●".truecolor(r, g, b),
            self.name.bold(),
            format!("({})", self.id).dimmed()
        );

        if self.is_default {
            line.push_str(&format!(" {}", "default".green()));
        }
        if self.is_read_only {
            line.push_str(&format!(" {}", "read-only".yellow()));
        }

        line.push_str(&format!(
            "\n    {}",
            format!("{} · {}", self.account_name, self.account_type).dimmed()
        ));
        line
    }
}

impl Render for Event {
    fn render(&self) -> String {
        let title = match self.availability {
            Availability::Free => self.title.dimmed().to_string(),
            Availability::Tentative => self.title.italic().to_string(),
            Availability::Busy | Availability::Unavailable => self.title.clone(),
        };

        let mut line = format!("{} {}", format_time(self), title);
        if self.is_recurring() {
            line.push_str(&format!(" {}", "↻".cyan()));
        }
        if !self.location.is_empty() {
            line.push_str(&format!(" {}", format!("@ {}", self.location).dimmed()));
        }
        line
    }
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(event: &Event) -> String {
    let today = Local::now().date_naive();

    let Some(date) = local_date(event) else {
        return "Unknown date".to_string();
    };

    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// All-day events are stored at UTC midnight and keep their UTC date.
pub fn local_date(event: &Event) -> Option<chrono::NaiveDate> {
    let start = event.start.to_utc()?;
    if event.all_day {
        Some(start.date_naive())
    } else {
        Some(start.with_timezone(&Local).date_naive())
    }
}

/// Format the time portion of an event (e.g. "15:00" or "all-day")
fn format_time(event: &Event) -> String {
    if event.all_day {
        return format!("{:>7}", "all-day");
    }
    match event.start.to_utc() {
        Some(dt) => format!("{:>7}", dt.with_timezone(&Local).format("%H:%M")),
        None => format!("{:>7}", "?"),
    }
}
