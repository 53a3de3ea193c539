use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

/// The access and refresh token pair handed out at login. The pair is always
/// persisted and cleared as a unit; a missing access token means signed out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access: String,
    pub refresh: String,
}

impl Credentials {
    pub fn new(access: &str, refresh: &str) -> Credentials {
        return Credentials {
            access: access.to_string(),
            refresh: refresh.to_string(),
        };
    }
}

/// Storage for the credential pair. Injected into the gateway so callers can
/// decide where tokens live.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored pair, or None when signed out.
    fn get(&self) -> Option<Credentials>;

    /// Persists both tokens together.
    fn store(&self, credentials: &Credentials) -> Result<()>;

    /// Replaces the access token while keeping the current refresh token.
    fn update_access(&self, access: &str) -> Result<()>;

    /// Removes both tokens. Clearing an already empty store is not an error.
    fn clear(&self) -> Result<()>;
}
