//! Per-calendar metadata.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calendar::{Calendar, Color, account_type};
use crate::error::{CoreError, CoreResult};

const METADATA_PATH: &str = ".devcal/calendar.toml";

/// Metadata stored in each calendar's .devcal/calendar.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CalendarMetadata {
    pub name: String,
    #[serde(default)]
    pub color: Color,
    pub account_name: String,
    #[serde(default = "default_account_type")]
    pub account_type: String,
    #[serde(default)]
    pub read_only: bool,
}

fn default_account_type() -> String {
    account_type::LOCAL.to_string()
}

impl CalendarMetadata {
    pub fn exists(calendar_dir: &Path) -> bool {
        calendar_dir.join(METADATA_PATH).is_file()
    }

    /// Load metadata from .devcal/calendar.toml
    pub fn load(calendar_dir: &Path) -> CoreResult<Self> {
        let path = calendar_dir.join(METADATA_PATH);
        let content = std::fs::read_to_string(&path)?;

        toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save metadata to .devcal/calendar.toml
    pub fn save(&self, calendar_dir: &Path) -> CoreResult<()> {
        let path = calendar_dir.join(METADATA_PATH);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;

        std::fs::write(&path, content)?;

        Ok(())
    }

    pub fn to_calendar(&self, id: &str, is_default: bool) -> Calendar {
        Calendar {
            id: id.to_string(),
            name: self.name.clone(),
            is_read_only: self.read_only,
            is_default,
            color: self.color,
            account_name: self.account_name.clone(),
            account_type: self.account_type.clone(),
        }
    }
}
