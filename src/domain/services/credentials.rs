#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::CredentialStore;
use crate::domain::models::Credentials;

// Field names follow the cookie entries the web client kept.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CredentialsPayload {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Credential pair persisted as a JSON file in the user cache directory.
pub struct FileCredentials {
    pub file_path: PathBuf,
}

impl Default for FileCredentials {
    fn default() -> FileCredentials {
        return FileCredentials {
            file_path: PathBuf::from(Config::get(ConfigKey::CredentialsFile)),
        };
    }
}

impl FileCredentials {
    pub fn new(file_path: PathBuf) -> FileCredentials {
        return FileCredentials { file_path };
    }

    fn read_payload(&self) -> Option<CredentialsPayload> {
        let contents = fs::read_to_string(&self.file_path).ok()?;
        return serde_json::from_str(&contents).ok();
    }

    fn write_payload(&self, payload: &CredentialsPayload) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let text = serde_json::to_string(payload)?;
        fs::write(&self.file_path, text)?;

        return Ok(());
    }
}

impl CredentialStore for FileCredentials {
    fn get(&self) -> Option<Credentials> {
        let payload = self.read_payload()?;
        // A half-written pair counts as signed out.
        if let (Some(access), Some(refresh)) = (payload.access_token, payload.refresh_token) {
            return Some(Credentials { access, refresh });
        }

        return None;
    }

    fn store(&self, credentials: &Credentials) -> Result<()> {
        return self.write_payload(&CredentialsPayload {
            access_token: Some(credentials.access.to_string()),
            refresh_token: Some(credentials.refresh.to_string()),
        });
    }

    fn update_access(&self, access: &str) -> Result<()> {
        let current = match self.get() {
            Some(credentials) => credentials,
            None => bail!("No stored credentials to update"),
        };

        return self.write_payload(&CredentialsPayload {
            access_token: Some(access.to_string()),
            refresh_token: Some(current.refresh),
        });
    }

    fn clear(&self) -> Result<()> {
        if !self.file_path.exists() {
            return Ok(());
        }

        fs::remove_file(&self.file_path)?;
        return Ok(());
    }
}

/// In-memory credential pair, used by tests and embedders that do not want
/// tokens touching disk.
#[derive(Default)]
pub struct MemoryCredentials {
    credentials: RwLock<Option<Credentials>>,
}

impl MemoryCredentials {
    pub fn new(credentials: Option<Credentials>) -> MemoryCredentials {
        return MemoryCredentials {
            credentials: RwLock::new(credentials),
        };
    }
}

impl CredentialStore for MemoryCredentials {
    fn get(&self) -> Option<Credentials> {
        // A poisoned lock still holds a usable pair.
        return self
            .credentials
            .read()
            .unwrap_or_else(|err| return err.into_inner())
            .clone();
    }

    fn store(&self, credentials: &Credentials) -> Result<()> {
        *self
            .credentials
            .write()
            .unwrap_or_else(|err| return err.into_inner()) = Some(credentials.clone());
        return Ok(());
    }

    fn update_access(&self, access: &str) -> Result<()> {
        let mut guard = self
            .credentials
            .write()
            .unwrap_or_else(|err| return err.into_inner());
        let current = match guard.as_ref() {
            Some(credentials) => credentials,
            None => bail!("No stored credentials to update"),
        };

        *guard = Some(Credentials::new(access, &current.refresh));
        return Ok(());
    }

    fn clear(&self) -> Result<()> {
        *self
            .credentials
            .write()
            .unwrap_or_else(|err| return err.into_inner()) = None;
        return Ok(());
    }
}
