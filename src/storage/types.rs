use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CajaError;

/// Author of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed by the user
    Human,
    /// Answer produced by the assistant
    Ai,
    /// Compressed recap of earlier messages
    Summary,
}

impl MessageRole {
    /// Persisted string form of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::Human => "human",
            MessageRole::Ai => "ai",
            MessageRole::Summary => "summary",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = CajaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(MessageRole::Human),
            "ai" => Ok(MessageRole::Ai),
            "summary" => Ok(MessageRole::Summary),
            other => Err(CajaError::Storage(format!("Unknown message role: {}", other))),
        }
    }
}

/// A conversation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Optional display name
    pub session_name: Option<String>,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When a message was last appended
    pub updated_at: DateTime<Utc>,
}

/// A message persisted within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owning session
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Listing view of a session; never carries message bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub session_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of messages in the session
    pub message_count: usize,
}

/// A session together with all of its messages in insertion order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    pub messages: Vec<StoredMessage>,
}
