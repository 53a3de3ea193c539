extern crate tempdir;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use mockito::Matcher;
use tempdir::TempDir;

use super::Chatbot;
use crate::domain::models::Credentials;
use crate::domain::services::MemoryCredentials;
use crate::infrastructure::gateway::Gateway;

fn chatbot_with(url: String) -> Chatbot {
    let store = Arc::new(MemoryCredentials::new(Some(Credentials::new("A1", "R1"))));
    return Chatbot::new(Gateway::new(
        url,
        "/auth/token/refresh/".to_string(),
        store,
    ));
}

#[tokio::test]
async fn it_sends_chat_messages() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/chatbot/chat/")
        .match_header("Authorization", "Bearer A1")
        .match_body(Matcher::Json(serde_json::json!({
            "message": "What is ibuprofen for?"
        })))
        .with_status(200)
        .with_body(
            r#"{
                "id": 7,
                "message": "What is ibuprofen for?",
                "response": "Pain and inflammation relief.",
                "timestamp": "2024-05-01T10:00:00Z"
            }"#,
        )
        .create();

    let chatbot = chatbot_with(server.url());
    let turn = chatbot.send_message("What is ibuprofen for?").await?;

    mock.assert();
    assert_eq!(turn.id, 7);
    assert_eq!(turn.message, "What is ibuprofen for?");
    assert_eq!(turn.response, "Pain and inflammation relief.");
    assert_eq!(
        turn.timestamp,
        "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>()?
    );

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_send_on_server_errors() {
    let mut server = mockito::Server::new();
    let mock = server.mock("POST", "/chatbot/chat/").with_status(500).create();

    let chatbot = chatbot_with(server.url());
    let res = chatbot.send_message("hello").await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_fetches_history_in_backend_order() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/chatbot/chat/history/")
        .match_header("Authorization", "Bearer A1")
        .with_status(200)
        .with_body(
            r#"[
                {"id": 1, "message": "first", "response": "one", "timestamp": "2024-05-01T10:00:00Z"},
                {"id": 2, "message": "second", "response": "two", "timestamp": "2024-05-01T10:05:00Z"}
            ]"#,
        )
        .create();

    let chatbot = chatbot_with(server.url());
    let turns = chatbot.history().await?;

    mock.assert();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].id, 1);
    assert_eq!(turns[1].id, 2);

    return Ok(());
}

#[tokio::test]
async fn it_rejects_non_pdf_uploads() {
    let chatbot = chatbot_with("http://localhost".to_string());
    let res = chatbot.upload_pdf(Path::new("./notes.txt")).await;

    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains("Only PDF files"));
}

#[tokio::test]
async fn it_uploads_pdfs() -> Result<()> {
    let tmp_dir = TempDir::new("mediq")?;
    let file_path = tmp_dir.path().join("handbook.pdf");
    std::fs::write(&file_path, b"%PDF-1.4")?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/chatbot/upload-pdf/")
        .match_header("Authorization", "Bearer A1")
        .with_status(201)
        .with_body(
            r#"{
                "id": 3,
                "original_filename": "handbook.pdf",
                "uploaded_at": "2024-05-01T10:00:00Z",
                "chunk_count": 42,
                "message": "PDF uploaded and ingested successfully."
            }"#,
        )
        .create();

    let chatbot = chatbot_with(server.url());
    let receipt = chatbot.upload_pdf(&file_path).await?;

    mock.assert();
    assert_eq!(receipt.id, 3);
    assert_eq!(receipt.original_filename, "handbook.pdf");
    assert_eq!(receipt.chunk_count, 42);

    return Ok(());
}

#[tokio::test]
async fn it_lists_uploaded_pdfs() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/chatbot/uploaded-pdfs/")
        .match_header("Authorization", "Bearer A1")
        .with_status(200)
        .with_body(
            r#"[
                {"id": 3, "original_filename": "handbook.pdf", "uploaded_at": "2024-05-01T10:00:00Z"},
                {"id": 2, "original_filename": "dosages.pdf", "uploaded_at": "2024-04-28T09:00:00Z"}
            ]"#,
        )
        .create();

    let chatbot = chatbot_with(server.url());
    let documents = chatbot.uploaded_pdfs().await?;

    mock.assert();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].original_filename, "handbook.pdf");
    assert_eq!(documents[1].id, 2);

    return Ok(());
}
