use anyhow::Result;
use devcal_core::config::DevcalConfig;
use devcal_core::store::CalendarStore;
use owo_colors::OwoColorize;

use crate::date_range::DateRange;
use crate::render::{Render, format_date_label, local_date};

pub fn run(config: &DevcalConfig, calendar: Option<&str>, range: DateRange) -> Result<()> {
    let store = config.store();
    let calendars = store.calendars()?;

    let calendar_ids: Vec<String> = match calendar {
        Some(id) => match calendars.iter().find(|c| c.id == id || c.name == id) {
            Some(cal) => vec![cal.id.clone()],
            None => {
                let available: Vec<_> = calendars
                    .iter()
                    .map(|c| format!("{} ({})", c.name, c.id))
                    .collect();
                anyhow::bail!(
                    "Calendar '{}' not found. Available: {}",
                    id,
                    available.join(", ")
                );
            }
        },
        None => calendars.iter().map(|c| c.id.clone()).collect(),
    };

    let events = store.events_in_range(&calendar_ids, range.from, range.to)?;

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    // Group events by day and print
    let mut current_date = None;

    for event in &events {
        let date = local_date(event);
        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", format_date_label(event).bold());
            current_date = Some(date);
        }

        let calendar_name = calendars
            .iter()
            .find(|c| c.id == event.calendar_id)
            .map(|c| c.name.as_str())
            .unwrap_or(event.calendar_id.as_str());
        println!("  {} {}", event.render(), format!("[{}]", calendar_name).dimmed());
    }

    Ok(())
}
