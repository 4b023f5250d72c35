// Re-export needed modules for testing
pub mod client;
pub mod models;
pub mod notify;
pub mod storage;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use client::{CallKind, CallManager, CallState, InboundEvent, OutboundEvent, Router, Session,
                 SessionState};
pub use models::*;
pub use notify::{Notice, Notifier, Severity};
pub use store::{ChatStore, FileAttachment, StoreError};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_optimistic_message_shape() {
        let msg = Message::outgoing_text("self", "peer", "hello");
        assert!(msg.id.starts_with(TEMP_ID_PREFIX));
        assert!(msg.is_optimistic());
        assert_eq!(msg.status, DeliveryStatus::Pending);
        assert_eq!(msg.sender_id, "self");
        assert_eq!(msg.receiver_id, "peer");
        // The correlation id is embedded in the temp id
        let cid = msg.client_id.as_deref().unwrap();
        assert_eq!(msg.id, format!("{}{}", TEMP_ID_PREFIX, cid));
    }

    #[test]
    fn test_message_preview_labels() {
        let mut msg = Message::outgoing_text("self", "peer", "plain text");
        assert_eq!(msg.preview(), "plain text");

        msg.message_type = MessageType::Image;
        assert_eq!(msg.preview(), "📷 Photo");

        msg.message_type = MessageType::File;
        msg.file_name = Some("notes.pdf".to_string());
        assert_eq!(msg.preview(), "📄 notes.pdf");
    }

    #[test]
    fn test_unknown_contact_placeholder() {
        let contact = Contact::unknown("b7");
        assert_eq!(contact.id, "b7");
        assert_eq!(contact.name, "Unknown User");
        assert!(!contact.muted);
    }

    #[test]
    fn test_wire_message_roundtrip_defaults_to_delivered() {
        let raw = serde_json::json!({
            "id": "42",
            "text": "yo",
            "senderId": "B",
            "receiverId": "self",
            "timestamp": Utc::now(),
            "messageType": "text",
        });
        let msg: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.status, DeliveryStatus::Delivered);
        assert!(!msg.is_optimistic());
    }

    #[test]
    fn test_content_signature() {
        let a = Message::outgoing_text("self", "peer", "same");
        let mut b = Message::outgoing_text("self", "peer", "same");
        b.client_id = None;
        assert_eq!(a.signature(), b.signature());
    }
}
