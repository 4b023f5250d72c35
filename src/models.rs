use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix used for locally generated (optimistic) message ids. Messages keep
/// this id only until the server-confirmed copy replaces them.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// The authenticated local user, as delivered by `auth_success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_time: Option<String>,
    #[serde(default)]
    pub muted: bool,
}

impl Contact {
    /// Placeholder created when a message arrives from a sender we have never
    /// seen. The real profile shows up with the next contacts_list refresh.
    pub fn unknown(id: &str) -> Self {
        Contact {
            id: id.to_string(),
            name: "Unknown User".to_string(),
            avatar: "U".to_string(),
            online: true,
            last_message: Some("New message".to_string()),
            last_time: None,
            muted: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Video,
    File,
}

impl MessageType {
    pub fn label(&self) -> &'static str {
        match self {
            MessageType::Text => "Messages",
            MessageType::Image => "Photos",
            MessageType::Video => "Videos",
            MessageType::File => "Files",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,   // Optimistic local copy, not yet confirmed by the server
    Delivered, // Confirmed by the server
    Failed,    // Server rejected the send (e.g. file_message_error)
}

impl Default for DeliveryStatus {
    // Anything arriving off the wire is authoritative.
    fn default() -> Self {
        DeliveryStatus::Delivered
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub timestamp: DateTime<Utc>,
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    /// Correlation id generated on send and echoed back by the server so the
    /// optimistic copy can be replaced by exact match instead of guessing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip)]
    pub status: DeliveryStatus,
}

impl Message {
    /// Build the optimistic copy of an outgoing text message.
    pub fn outgoing_text(sender_id: &str, receiver_id: &str, text: &str) -> Self {
        let correlation = Uuid::new_v4().to_string();
        Message {
            id: format!("{}{}", TEMP_ID_PREFIX, correlation),
            text: text.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            timestamp: Utc::now(),
            message_type: MessageType::Text,
            file_url: None,
            file_name: None,
            file_size: None,
            client_id: Some(correlation),
            status: DeliveryStatus::Pending,
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }

    /// Content signature used as the reconciliation fallback when the server
    /// does not echo the correlation id.
    pub fn signature(&self) -> (&str, MessageType, Option<&str>) {
        (&self.text, self.message_type, self.file_name.as_deref())
    }

    /// One-line summary for the contact sidebar preview.
    pub fn preview(&self) -> String {
        match self.message_type {
            MessageType::Text => self.text.clone(),
            MessageType::Image => "📷 Photo".to_string(),
            MessageType::Video => "🎥 Video".to_string(),
            MessageType::File => {
                format!("📄 {}", self.file_name.as_deref().unwrap_or("File"))
            }
        }
    }
}
