#[cfg(test)]
#[path = "datasets_test.rs"]
mod tests;

use std::path::Path;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;

use crate::infrastructure::gateway::Gateway;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SetDatasetRequest {
    file_name: String,
}

/// Auxiliary dataset endpoints. The backend owns the payload shapes, so
/// responses pass through as raw JSON.
pub struct Datasets {
    gateway: Gateway,
}

impl Datasets {
    pub fn new(gateway: Gateway) -> Datasets {
        return Datasets { gateway };
    }

    pub async fn list(&self) -> Result<serde_json::Value> {
        let res = self.gateway.get("/datasets/").await?;
        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to list datasets");
            bail!("Failed to list datasets");
        }

        let payload = res.json::<serde_json::Value>().await?;
        return Ok(payload);
    }

    pub async fn set(&self, file_name: &str) -> Result<serde_json::Value> {
        let req = SetDatasetRequest {
            file_name: file_name.to_string(),
        };

        let res = self.gateway.post_json("/set_datasets/", &req).await?;
        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to set dataset");
            bail!("Failed to set dataset");
        }

        let payload = res.json::<serde_json::Value>().await?;
        return Ok(payload);
    }

    pub async fn upload_file(&self, file_path: &Path) -> Result<serde_json::Value> {
        let filename = match file_path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => bail!("No file name in path"),
        };

        let bytes = fs::read(file_path).await?;
        let res = self
            .gateway
            .post_multipart("/upload_file/", || {
                return reqwest::multipart::Form::new().part(
                    "file",
                    reqwest::multipart::Part::bytes(bytes.clone()).file_name(filename.clone()),
                );
            })
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to upload file");
            bail!("Failed to upload file");
        }

        let payload = res.json::<serde_json::Value>().await?;
        return Ok(payload);
    }

    pub async fn process_query(&self, query: &str) -> Result<serde_json::Value> {
        let query = query.to_string();
        let res = self
            .gateway
            .post_multipart("/test_url/", || {
                return reqwest::multipart::Form::new().text("query", query.clone());
            })
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to process query");
            bail!("Failed to process query");
        }

        let payload = res.json::<serde_json::Value>().await?;
        return Ok(payload);
    }
}
