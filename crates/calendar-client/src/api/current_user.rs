use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calendar_shared::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The account this machine acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// JSON file holding the selected user between runs.
pub struct CurrentUserStore {
    path: PathBuf,
}

impl CurrentUserStore {
    /// Store under the user's config directory.
    pub fn new() -> Result<Self> {
        let path = dirs::config_dir()
            .context("Could not find config directory")?
            .join("calendar")
            .join("current_user.json");
        Ok(Self { path })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<CurrentUser>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).context("Could not read user file")?;
        let user = serde_json::from_str(&contents).context("Could not parse user file")?;

        Ok(Some(user))
    }

    pub fn save(&self, user: &CurrentUser) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Could not create config directory")?;
        }

        let contents = serde_json::to_string_pretty(user).context("Could not serialize user")?;
        fs::write(&self.path, contents).context("Could not write user file")?;

        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Could not delete user file")?;
        }

        Ok(())
    }
}
