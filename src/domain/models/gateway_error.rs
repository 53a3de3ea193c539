use thiserror::Error;

/// Failure classes surfaced by the authenticated request gateway. Non-2xx
/// non-401 responses are not errors at this layer; the response is handed back
/// to the caller to interpret.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response. No retry is attempted.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend returned 401 and no refresh token was available.
    #[error("unauthorized, sign in required")]
    Unauthorized,

    /// The backend returned 401 and the refresh attempt was rejected.
    #[error("session expired, sign in again")]
    SessionExpired,

    #[error("credential store failed: {message}")]
    Store { message: String },
}
