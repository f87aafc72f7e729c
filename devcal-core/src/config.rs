//! Global devcal configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::calendar::account_type;
use crate::error::{CoreError, CoreResult};
use crate::permission::{PermissionPolicy, Permissions};
use crate::store::LocalStore;

static DEFAULT_CALENDAR_DIR: &str = "~/device-calendars";

fn default_calendar_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CALENDAR_DIR)
}

fn default_local_account_name() -> String {
    account_type::LOCAL.to_string()
}

/// Configuration at ~/.config/devcal/config.toml, overridable with
/// `DEVCAL_*` environment variables (`DEVCAL_CALENDAR_DIR`, ...).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DevcalConfig {
    #[serde(default = "default_calendar_dir")]
    pub calendar_dir: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_calendar: Option<String>,

    #[serde(default)]
    pub permission_policy: PermissionPolicy,

    /// Account name given to calendars created over the bridge.
    #[serde(default = "default_local_account_name")]
    pub local_account_name: String,
}

impl Default for DevcalConfig {
    fn default() -> Self {
        DevcalConfig {
            calendar_dir: default_calendar_dir(),
            default_calendar: None,
            permission_policy: PermissionPolicy::default(),
            local_account_name: default_local_account_name(),
        }
    }
}

impl DevcalConfig {
    pub fn config_path() -> CoreResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CoreError::Config("Could not determine config directory".into()))?
            .join("devcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented template first if
    /// there is no config file yet.
    pub fn load() -> CoreResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> CoreResult<Self> {
        let config: DevcalConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("DEVCAL"))
            .build()
            .map_err(|e| CoreError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CoreResult<()> {
        let contents = format!(
            "\
# devcal configuration

# Where calendars live:
# calendar_dir = \"{}\"

# Calendar reported as default (by id):
# default_calendar = \"<calendar-id>\"

# Answer to the first permission request (\"grant\" or \"deny\"):
# permission_policy = \"grant\"

# Account name for calendars created over the bridge:
# local_account_name = \"{}\"
",
            DEFAULT_CALENDAR_DIR,
            account_type::LOCAL
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CoreError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Calendar root with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.calendar_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// Returns the calendar directory path in display-friendly form,
    /// keeping `~` instead of expanding to the full home directory.
    pub fn display_path(&self) -> &Path {
        &self.calendar_dir
    }

    pub fn store(&self) -> LocalStore {
        LocalStore::new(self.data_path()).with_default_calendar(self.default_calendar.clone())
    }

    pub fn permissions(&self) -> Permissions {
        Permissions::new(&self.data_path(), self.permission_policy)
    }
}
