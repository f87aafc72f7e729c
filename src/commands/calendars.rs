use anyhow::Result;
use devcal_core::config::DevcalConfig;
use devcal_core::store::CalendarStore;
use owo_colors::OwoColorize;

use crate::render::Render;

pub fn run(config: &DevcalConfig) -> Result<()> {
    let calendars = config.store().calendars()?;

    if calendars.is_empty() {
        println!(
            "{}",
            format!("No calendars in {}", config.display_path().display()).dimmed()
        );
        return Ok(());
    }

    for calendar in &calendars {
        println!("{}", calendar.render());
    }

    Ok(())
}
