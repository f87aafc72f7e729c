//! Calendar access permission.
//!
//! The answer to a permission request is persisted under the store root so
//! that it survives restarts, the way a platform remembers the user's choice.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

const PERMISSION_PATH: &str = ".devcal/permission.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    NotDetermined,
    Granted,
    Denied,
}

/// How an undetermined permission request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionPolicy {
    #[default]
    Grant,
    Deny,
}

impl From<PermissionPolicy> for PermissionState {
    fn from(policy: PermissionPolicy) -> Self {
        match policy {
            PermissionPolicy::Grant => PermissionState::Granted,
            PermissionPolicy::Deny => PermissionState::Denied,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PermissionFile {
    state: PermissionState,
}

#[derive(Debug, Clone)]
pub struct Permissions {
    path: PathBuf,
    policy: PermissionPolicy,
}

impl Permissions {
    pub fn new(root: &Path, policy: PermissionPolicy) -> Self {
        Permissions {
            path: root.join(PERMISSION_PATH),
            policy,
        }
    }

    pub fn state(&self) -> CoreResult<PermissionState> {
        if !self.path.exists() {
            return Ok(PermissionState::NotDetermined);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let file: PermissionFile = toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("{}: {}", self.path.display(), e)))?;
        Ok(file.state)
    }

    pub fn set(&self, state: PermissionState) -> CoreResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(&PermissionFile { state })
            .map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(&self.path, content)?;

        tracing::info!(?state, "Permission state changed");
        Ok(())
    }

    pub fn is_granted(&self) -> CoreResult<bool> {
        Ok(self.state()? == PermissionState::Granted)
    }

    /// Ask for access. Only an undetermined state consults the policy; an
    /// earlier answer stands until changed with `set`.
    pub fn request(&self) -> CoreResult<bool> {
        let state = match self.state()? {
            PermissionState::NotDetermined => {
                let decided = PermissionState::from(self.policy);
                self.set(decided)?;
                decided
            }
            decided => decided,
        };
        Ok(state == PermissionState::Granted)
    }

    pub fn ensure_granted(&self) -> CoreResult<()> {
        if self.is_granted()? {
            Ok(())
        } else {
            Err(CoreError::NotAuthorized)
        }
    }
}
