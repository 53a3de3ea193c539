#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::CredentialStore;
use crate::domain::models::GatewayError;
use crate::domain::services::FileCredentials;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RefreshRequest {
    refresh: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Issues HTTP requests with the current access token attached. On a 401 the
/// gateway attempts exactly one silent recovery through the refresh token and
/// retries the original request once; a failed or impossible refresh clears
/// the credential pair, fires the session-expired callback, and surfaces a
/// terminal [`GatewayError`].
pub struct Gateway {
    base_url: String,
    refresh_path: String,
    timeout: Option<Duration>,
    client: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
    on_session_expired: Option<Box<dyn Fn() + Send + Sync>>,
}

impl Default for Gateway {
    fn default() -> Gateway {
        let mut gateway = Gateway::new(
            Config::get(ConfigKey::BackendURL),
            Config::get(ConfigKey::RefreshPath),
            Arc::new(FileCredentials::default()),
        );
        gateway.timeout = parse_timeout(&Config::get(ConfigKey::RequestTimeout));

        return gateway;
    }
}

fn parse_timeout(value: &str) -> Option<Duration> {
    return match value.parse::<u64>() {
        Ok(millis) => Some(Duration::from_millis(millis)),
        Err(err) => {
            tracing::warn!(error = ?err, value = value, "Invalid request-timeout, requests will not time out");
            None
        }
    };
}

impl Gateway {
    pub fn new(
        base_url: String,
        refresh_path: String,
        credentials: Arc<dyn CredentialStore>,
    ) -> Gateway {
        return Gateway {
            base_url,
            refresh_path,
            timeout: None,
            client: reqwest::Client::new(),
            credentials,
            on_session_expired: None,
        };
    }

    /// Registers a callback fired when the session is terminally expired. The
    /// web ancestor of this client redirected to the sign-in page here;
    /// callers decide what that means for them.
    pub fn with_session_expired<F>(mut self, callback: F) -> Gateway
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_session_expired = Some(Box::new(callback));
        return self;
    }

    #[allow(clippy::implicit_return)]
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{url}{path}", url = self.base_url);
        return self.send(|client| return client.get(&url)).await;
    }

    #[allow(clippy::implicit_return)]
    pub async fn post_json<T>(&self, path: &str, body: &T) -> Result<reqwest::Response, GatewayError>
    where
        T: serde::Serialize,
    {
        let url = format!("{url}{path}", url = self.base_url);
        return self.send(|client| return client.post(&url).json(body)).await;
    }

    /// The form builder is a closure because a multipart body is consumed on
    /// send and must be rebuilt for the refresh retry.
    #[allow(clippy::implicit_return)]
    pub async fn post_multipart<F>(
        &self,
        path: &str,
        form: F,
    ) -> Result<reqwest::Response, GatewayError>
    where
        F: Fn() -> reqwest::multipart::Form,
    {
        let url = format!("{url}{path}", url = self.base_url);
        return self
            .send(|client| return client.post(&url).multipart(form()))
            .await;
    }

    /// Sends a request built by `build`, attaching the bearer header when an
    /// access token is stored. Only a 401 triggers the refresh path; any other
    /// response is returned untouched, and transport failures propagate with
    /// no retry.
    pub async fn send<F>(&self, build: F) -> Result<reqwest::Response, GatewayError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut req = build(&self.client);
        if let Some(credentials) = self.credentials.get() {
            req = req.header("Authorization", format!("Bearer {}", credentials.access));
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let res = req.send().await?;
        if res.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(res);
        }

        let refresh = match self.credentials.get() {
            Some(credentials) => credentials.refresh,
            None => {
                tracing::warn!("Unauthorized with no refresh token available");
                self.expire_session()?;
                return Err(GatewayError::Unauthorized);
            }
        };

        let access = match self.refresh_access(&refresh).await {
            Ok(access) => access,
            Err(err) => {
                // A refresh transport failure logs out the same way a
                // rejected refresh does.
                tracing::warn!(error = ?err, "Token refresh failed");
                self.expire_session()?;
                return Err(GatewayError::SessionExpired);
            }
        };

        self.credentials
            .update_access(&access)
            .map_err(|err| {
                return GatewayError::Store {
                    message: err.to_string(),
                };
            })?;

        let mut retry = build(&self.client).header("Authorization", format!("Bearer {access}"));
        if let Some(timeout) = self.timeout {
            retry = retry.timeout(timeout);
        }

        // At most one retry. Whatever this yields goes back to the caller,
        // even another 401.
        let res = retry.send().await?;
        return Ok(res);
    }

    async fn refresh_access(&self, refresh: &str) -> Result<String> {
        let req = RefreshRequest {
            refresh: refresh.to_string(),
        };

        let mut builder = self
            .client
            .post(format!(
                "{url}{path}",
                url = self.base_url,
                path = self.refresh_path
            ))
            .json(&req);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let res = builder.send().await?;
        if !res.status().is_success() {
            tracing::warn!(status = res.status().as_u16(), "Token refresh was rejected");
            bail!("Token refresh was rejected");
        }

        let payload = res.json::<RefreshResponse>().await?;
        return Ok(payload.access);
    }

    fn expire_session(&self) -> Result<(), GatewayError> {
        self.credentials.clear().map_err(|err| {
            return GatewayError::Store {
                message: err.to_string(),
            };
        })?;

        if let Some(callback) = &self.on_session_expired {
            callback();
        }

        return Ok(());
    }
}
