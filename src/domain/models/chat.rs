use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

/// One question and answer round trip with the chatbot. Produced by the
/// backend, immutable once received, and rendered as a user entry followed by
/// an assistant entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: i64,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}
