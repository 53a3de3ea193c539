#[cfg(test)]
#[path = "chatbot_test.rs"]
mod tests;

use std::path::Path;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;

use crate::domain::models::ChatTurn;
use crate::domain::models::IngestReceipt;
use crate::domain::models::UploadedDocument;
use crate::infrastructure::gateway::Gateway;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatRequest {
    message: String,
}

/// Chat and knowledge base endpoints, all behind the authenticated gateway.
pub struct Chatbot {
    gateway: Gateway,
}

impl Chatbot {
    pub fn new(gateway: Gateway) -> Chatbot {
        return Chatbot { gateway };
    }

    pub async fn send_message(&self, message: &str) -> Result<ChatTurn> {
        let req = ChatRequest {
            message: message.to_string(),
        };

        let res = self.gateway.post_json("/chatbot/chat/", &req).await?;
        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to send chat message");
            bail!("Failed to send chat message");
        }

        let turn = res.json::<ChatTurn>().await?;
        return Ok(turn);
    }

    /// Returns past turns oldest first, as the backend orders them.
    pub async fn history(&self) -> Result<Vec<ChatTurn>> {
        let res = self.gateway.get("/chatbot/chat/history/").await?;
        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to fetch chat history");
            bail!("Failed to fetch chat history");
        }

        let turns = res.json::<Vec<ChatTurn>>().await?;
        return Ok(turns);
    }

    pub async fn upload_pdf(&self, file_path: &Path) -> Result<IngestReceipt> {
        let filename = match file_path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => bail!("No file name in path"),
        };

        // The backend rejects anything else; fail before reading the file.
        if !filename.to_lowercase().ends_with(".pdf") {
            bail!("Only PDF files are allowed");
        }

        let bytes = fs::read(file_path).await?;
        let res = self
            .gateway
            .post_multipart("/chatbot/upload-pdf/", || {
                return reqwest::multipart::Form::new().part(
                    "file",
                    reqwest::multipart::Part::bytes(bytes.clone()).file_name(filename.clone()),
                );
            })
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to upload PDF");
            bail!(format!("Failed to upload PDF: {}", res.text().await?));
        }

        let receipt = res.json::<IngestReceipt>().await?;
        return Ok(receipt);
    }

    pub async fn uploaded_pdfs(&self) -> Result<Vec<UploadedDocument>> {
        let res = self.gateway.get("/chatbot/uploaded-pdfs/").await?;
        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to fetch uploaded PDFs"
            );
            bail!("Failed to fetch uploaded PDFs");
        }

        let documents = res.json::<Vec<UploadedDocument>>().await?;
        return Ok(documents);
    }
}
