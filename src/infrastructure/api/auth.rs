#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::CredentialStore;
use crate::domain::models::Credentials;
use crate::domain::services::FileCredentials;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
}

/// Sign-in and sign-out against the backend. Login is the one call that never
/// carries a bearer header, so it bypasses the gateway entirely.
pub struct Auth {
    base_url: String,
    login_path: String,
    client: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
}

impl Default for Auth {
    fn default() -> Auth {
        return Auth::new(
            Config::get(ConfigKey::BackendURL),
            Config::get(ConfigKey::LoginPath),
            Arc::new(FileCredentials::default()),
        );
    }
}

impl Auth {
    pub fn new(base_url: String, login_path: String, credentials: Arc<dyn CredentialStore>) -> Auth {
        return Auth {
            base_url,
            login_path,
            client: reqwest::Client::new(),
            credentials,
        };
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let res = self
            .client
            .post(format!(
                "{url}{path}",
                url = self.base_url,
                path = self.login_path
            ))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Login failed");
            bail!("Login failed");
        }

        let payload = res.json::<LoginResponse>().await?;
        self.credentials
            .store(&Credentials::new(&payload.access, &payload.refresh))?;

        return Ok(());
    }

    pub fn logout(&self) -> Result<()> {
        return self.credentials.clear();
    }
}
