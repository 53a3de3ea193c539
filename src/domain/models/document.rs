use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

/// A PDF already ingested into the backend knowledge base. Backend-owned, the
/// client only lists it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub id: i64,
    pub original_filename: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Returned by the backend after a PDF upload has been chunked into the
/// vector store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub id: i64,
    pub original_filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub chunk_count: u64,
    pub message: String,
}
