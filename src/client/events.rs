// Named events exchanged with the realtime server.
// Wire shape is adjacently tagged JSON, one event per line:
//   {"event":"new_message","data":{"message":{...}}}
// Event names are snake_case, payload fields camelCase, matching the server.

use serde::{Deserialize, Serialize};

use super::calls::CallKind;
use crate::models::{Contact, Message, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    #[serde(rename_all = "camelCase")]
    AuthSuccess { user: User },
    #[serde(rename_all = "camelCase")]
    AuthFailed { message: String },
    #[serde(rename_all = "camelCase")]
    NewMessage { message: Message },
    #[serde(rename_all = "camelCase")]
    UserOnline { user_id: String },
    #[serde(rename_all = "camelCase")]
    UserOffline { user_id: String },
    #[serde(rename_all = "camelCase")]
    ContactsList { contacts: Vec<Contact> },
    #[serde(rename_all = "camelCase")]
    AllUsersList { users: Vec<User> },
    #[serde(rename_all = "camelCase")]
    ConversationHistory { messages: Vec<Message> },
    #[serde(rename_all = "camelCase")]
    MessageDeleted { message_id: String },
    #[serde(rename_all = "camelCase")]
    NewUserAdded { user: Contact },
    #[serde(rename_all = "camelCase")]
    SearchUsersResults { results: Vec<Contact> },
    #[serde(rename_all = "camelCase")]
    FileMessageNotification { file_name: String },
    #[serde(rename_all = "camelCase")]
    FileMessageError { error: String },
    #[serde(rename_all = "camelCase")]
    IncomingCall { caller_id: String, call_type: CallKind },
    #[serde(rename_all = "camelCase")]
    CallInitiated { receiver_id: String, call_type: CallKind },
    #[serde(rename_all = "camelCase")]
    CallAnswered { receiver_id: String },
    #[serde(rename_all = "camelCase")]
    CallRejected { receiver_id: String },
    #[serde(rename_all = "camelCase")]
    CallEnded { ended_by: String },
    #[serde(rename_all = "camelCase")]
    CallFailed { reason: String },
    // WebRTC signaling payloads are carried opaquely; see calls.rs.
    WebrtcOffer { payload: serde_json::Value },
    WebrtcAnswer { payload: serde_json::Value },
    WebrtcIceCandidate { payload: serde_json::Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    #[serde(rename_all = "camelCase")]
    Authenticate { token: String },
    #[serde(rename_all = "camelCase")]
    Login { email: String, password: String },
    #[serde(rename_all = "camelCase")]
    Register {
        name: String,
        email: String,
        password: String,
    },
    GetContacts,
    GetAllUsers,
    #[serde(rename_all = "camelCase")]
    GetConversation { contact_id: String },
    #[serde(rename_all = "camelCase")]
    SendMessage { message: Message },
    #[serde(rename_all = "camelCase")]
    SendFileMessage {
        receiver_id: String,
        file_url: String,
        file_name: String,
        file_size: String,
        message_type: crate::models::MessageType,
        client_id: String,
    },
    #[serde(rename_all = "camelCase")]
    DeleteMessage {
        message_id: String,
        contact_id: String,
    },
    #[serde(rename_all = "camelCase")]
    TypingStart { user_id: String, contact_id: String },
    #[serde(rename_all = "camelCase")]
    TypingStop { user_id: String, contact_id: String },
    #[serde(rename_all = "camelCase")]
    SearchUsers { search_term: String },
    #[serde(rename_all = "camelCase")]
    InitiateCall {
        receiver_id: String,
        call_type: CallKind,
    },
    #[serde(rename_all = "camelCase")]
    AnswerCall { caller_id: String },
    #[serde(rename_all = "camelCase")]
    RejectCall { caller_id: String },
    #[serde(rename_all = "camelCase")]
    EndCall {
        other_user_id: String,
        duration: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_event_names_match_wire() {
        let raw = r#"{"event":"user_online","data":{"userId":"u7"}}"#;
        let event: InboundEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event,
            InboundEvent::UserOnline {
                user_id: "u7".to_string()
            }
        );
    }

    #[test]
    fn outbound_event_serializes_snake_case_tag() {
        let event = OutboundEvent::SearchUsers {
            search_term: "ann".to_string(),
        };
        let raw = serde_json::to_string(&event).unwrap();
        assert!(raw.contains(r#""event":"search_users""#), "got {}", raw);
        assert!(raw.contains(r#""searchTerm":"ann""#), "got {}", raw);
    }

    #[test]
    fn unit_events_serialize_without_data() {
        let raw = serde_json::to_string(&OutboundEvent::GetContacts).unwrap();
        assert!(raw.contains(r#""event":"get_contacts""#), "got {}", raw);
    }
}
