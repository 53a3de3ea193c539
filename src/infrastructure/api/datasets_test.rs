extern crate tempdir;

use std::sync::Arc;

use anyhow::Result;
use mockito::Matcher;
use tempdir::TempDir;

use super::Datasets;
use crate::domain::models::Credentials;
use crate::domain::services::MemoryCredentials;
use crate::infrastructure::gateway::Gateway;

fn datasets_with(url: String) -> Datasets {
    let store = Arc::new(MemoryCredentials::new(Some(Credentials::new("A1", "R1"))));
    return Datasets::new(Gateway::new(
        url,
        "/auth/token/refresh/".to_string(),
        store,
    ));
}

#[tokio::test]
async fn it_lists_datasets() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/datasets/")
        .match_header("Authorization", "Bearer A1")
        .with_status(200)
        .with_body(r#"["pubmed.csv", "trials.csv"]"#)
        .create();

    let datasets = datasets_with(server.url());
    let res = datasets.list().await?;

    mock.assert();
    assert_eq!(res, serde_json::json!(["pubmed.csv", "trials.csv"]));

    return Ok(());
}

#[tokio::test]
async fn it_sets_the_active_dataset() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/set_datasets/")
        .match_body(Matcher::Json(serde_json::json!({
            "file_name": "pubmed.csv"
        })))
        .with_status(200)
        .with_body(r#"{"status": "ok"}"#)
        .create();

    let datasets = datasets_with(server.url());
    let res = datasets.set("pubmed.csv").await?;

    mock.assert();
    assert_eq!(res, serde_json::json!({"status": "ok"}));

    return Ok(());
}

#[tokio::test]
async fn it_uploads_dataset_files() -> Result<()> {
    let tmp_dir = TempDir::new("mediq")?;
    let file_path = tmp_dir.path().join("trials.csv");
    std::fs::write(&file_path, "id,outcome\n1,ok\n")?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/upload_file/")
        .match_header("Authorization", "Bearer A1")
        .with_status(200)
        .with_body(r#"{"uploaded": "trials.csv"}"#)
        .create();

    let datasets = datasets_with(server.url());
    let res = datasets.upload_file(&file_path).await?;

    mock.assert();
    assert_eq!(res, serde_json::json!({"uploaded": "trials.csv"}));

    return Ok(());
}

#[tokio::test]
async fn it_processes_queries() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/test_url/")
        .match_header("Authorization", "Bearer A1")
        .with_status(200)
        .with_body(r#"{"answer": "42"}"#)
        .create();

    let datasets = datasets_with(server.url());
    let res = datasets.process_query("what dosage?").await?;

    mock.assert();
    assert_eq!(res, serde_json::json!({"answer": "42"}));

    return Ok(());
}
