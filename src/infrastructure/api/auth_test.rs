use std::sync::Arc;

use anyhow::Result;
use mockito::Matcher;

use super::Auth;
use crate::domain::models::CredentialStore;
use crate::domain::models::Credentials;
use crate::domain::services::MemoryCredentials;

const LOGIN_PATH: &str = "/auth/login/";

fn auth_with(url: String, store: Arc<MemoryCredentials>) -> Auth {
    return Auth::new(url, LOGIN_PATH.to_string(), store);
}

#[tokio::test]
async fn it_logs_in_and_stores_both_tokens() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", LOGIN_PATH)
        .match_body(Matcher::Json(serde_json::json!({
            "username": "doc",
            "password": "hunter2"
        })))
        .with_status(200)
        .with_body(r#"{"access": "A1", "refresh": "R1"}"#)
        .create();

    let store = Arc::new(MemoryCredentials::default());
    let auth = auth_with(server.url(), store.clone());
    auth.login("doc", "hunter2").await?;

    mock.assert();
    assert_eq!(store.get(), Some(Credentials::new("A1", "R1")));

    return Ok(());
}

#[tokio::test]
async fn it_fails_login_and_stores_nothing() {
    let mut server = mockito::Server::new();
    let mock = server.mock("POST", LOGIN_PATH).with_status(401).create();

    let store = Arc::new(MemoryCredentials::default());
    let auth = auth_with(server.url(), store.clone());
    let res = auth.login("doc", "wrong").await;

    assert!(res.is_err());
    mock.assert();
    assert!(store.get().is_none());
}

#[test]
fn it_logs_out_idempotently() -> Result<()> {
    let store = Arc::new(MemoryCredentials::new(Some(Credentials::new("A1", "R1"))));
    let auth = auth_with("http://localhost".to_string(), store.clone());

    auth.logout()?;
    assert!(store.get().is_none());

    auth.logout()?;
    assert!(store.get().is_none());

    return Ok(());
}
