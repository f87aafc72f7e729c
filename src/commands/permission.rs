use anyhow::Result;
use devcal_core::permission::{PermissionState, Permissions};
use owo_colors::OwoColorize;

pub fn grant(permissions: &Permissions) -> Result<()> {
    permissions.set(PermissionState::Granted)?;
    println!("{} Calendar access granted", "✓".green());
    Ok(())
}

pub fn deny(permissions: &Permissions) -> Result<()> {
    permissions.set(PermissionState::Denied)?;
    println!("{} Calendar access denied", "✗".red());
    Ok(())
}

pub fn status(permissions: &Permissions) -> Result<()> {
    let label = match permissions.state()? {
        PermissionState::Granted => "granted".green().to_string(),
        PermissionState::Denied => "denied".red().to_string(),
        PermissionState::NotDetermined => "not determined".yellow().to_string(),
    };
    println!("Calendar access: {}", label);
    Ok(())
}
