// Conversation store: the single authoritative in-memory state for contacts
// and messages. All mutation flows through here; the view layer only reads.

use chrono::Local;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::client::events::OutboundEvent;
use crate::models::{Contact, Message, MessageType, User};
use crate::notify::Notifier;
use crate::storage::{self, keys, KvStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("message text is empty")]
    EmptyMessage,
    #[error("no contact selected")]
    NoActiveContact,
    #[error("not logged in")]
    NotLoggedIn,
}

/// File payload handed to `send_file_message` once the file has been read
/// and classified by the UI layer.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub file_url: String,
    pub file_name: String,
    pub file_size: String,
    pub message_type: MessageType,
}

pub struct ChatStore {
    current_user: Option<User>,
    contacts: Vec<Contact>,
    /// Messages of the currently open conversation, in insertion order.
    /// Timestamps are informational; confirmed copies may arrive after
    /// optimistic ones that carry an earlier logical time.
    messages: Vec<Message>,
    all_users: Vec<User>,
    search_results: Vec<Contact>,
    showing_search_results: bool,
    current_contact: Option<String>,
    current_media_filter: Option<MessageType>,
    pinned: HashSet<String>,
    archived: HashSet<String>,
    /// Whether the message pane is currently visible to the user. Drives the
    /// incoming-message notification gate.
    pane_visible: bool,
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    notifier: Notifier,
    kv: Box<dyn KvStore>,
}

impl ChatStore {
    pub fn new(
        outbound: mpsc::UnboundedSender<OutboundEvent>,
        notifier: Notifier,
        kv: Box<dyn KvStore>,
    ) -> Self {
        let pinned = storage::get_id_list(kv.as_ref(), keys::PINNED_CHATS)
            .into_iter()
            .collect();
        let archived = storage::get_id_list(kv.as_ref(), keys::ARCHIVED_CHATS)
            .into_iter()
            .collect();

        ChatStore {
            current_user: None,
            contacts: Vec::new(),
            messages: Vec::new(),
            all_users: Vec::new(),
            search_results: Vec::new(),
            showing_search_results: false,
            current_contact: None,
            current_media_filter: None,
            pinned,
            archived,
            pane_visible: true,
            outbound,
            notifier,
            kv,
        }
    }

    fn emit(&self, event: OutboundEvent) {
        if let Err(e) = self.outbound.send(event) {
            error!("Failed to forward event to transport: {}", e);
        }
    }

    // ---- session lifecycle ----

    pub fn init_session(&mut self, user: User) {
        info!("Conversation store initialized for {}", user.name);
        self.current_user = Some(user);
    }

    /// Logout teardown. Membership sets stay persisted; everything tied to
    /// the session is dropped.
    pub fn reset(&mut self) {
        self.current_user = None;
        self.contacts.clear();
        self.messages.clear();
        self.all_users.clear();
        self.search_results.clear();
        self.showing_search_results = false;
        self.current_contact = None;
        self.current_media_filter = None;
    }

    pub fn kv_mut(&mut self) -> &mut dyn KvStore {
        self.kv.as_mut()
    }

    // ---- sending ----

    pub fn send_message(&mut self, text: &str) -> Result<(), StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::EmptyMessage);
        }
        let user_id = self
            .current_user
            .as_ref()
            .map(|u| u.id.clone())
            .ok_or(StoreError::NotLoggedIn)?;
        let contact_id = self
            .current_contact
            .clone()
            .ok_or(StoreError::NoActiveContact)?;

        // Optimistic append: shown immediately, replaced once the server
        // echoes the correlation id back.
        let message = Message::outgoing_text(&user_id, &contact_id, text);
        self.emit(OutboundEvent::SendMessage {
            message: message.clone(),
        });
        debug!("Sent message {} to {}", message.id, contact_id);
        self.messages.push(message);
        self.touch_summary(&contact_id, text.to_string());
        Ok(())
    }

    pub fn send_file_message(&mut self, attachment: FileAttachment) -> Result<(), StoreError> {
        let user_id = self
            .current_user
            .as_ref()
            .map(|u| u.id.clone())
            .ok_or(StoreError::NotLoggedIn)?;
        let contact_id = self
            .current_contact
            .clone()
            .ok_or(StoreError::NoActiveContact)?;

        let mut message = Message::outgoing_text(&user_id, &contact_id, "");
        message.message_type = attachment.message_type;
        message.file_url = Some(attachment.file_url.clone());
        message.file_name = Some(attachment.file_name.clone());
        message.file_size = Some(attachment.file_size.clone());
        message.text = message.preview();

        self.emit(OutboundEvent::SendFileMessage {
            receiver_id: contact_id.clone(),
            file_url: attachment.file_url,
            file_name: attachment.file_name,
            file_size: attachment.file_size,
            message_type: attachment.message_type,
            client_id: message
                .client_id
                .clone()
                .unwrap_or_default(),
        });
        debug!("Sent {:?} attachment to {}", attachment.message_type, contact_id);
        let preview = message.preview();
        self.messages.push(message);
        self.touch_summary(&contact_id, preview);
        Ok(())
    }

    fn touch_summary(&mut self, contact_id: &str, preview: String) {
        if let Some(contact) = self.contacts.iter_mut().find(|c| c.id == contact_id) {
            contact.last_message = Some(preview);
            contact.last_time = Some(Local::now().format("%H:%M").to_string());
        }
    }

    // ---- receiving ----

    /// Reconcile a server-confirmed message with local state.
    ///
    /// Step order matters: drop the optimistic duplicate before appending,
    /// append before the summary update, update the summary (which may create
    /// a placeholder contact) before deciding on a notification.
    pub fn receive_message(&mut self, message: Message) {
        let self_id = match &self.current_user {
            Some(user) => user.id.clone(),
            None => {
                warn!("Dropping inbound message {}: no session", message.id);
                return;
            }
        };

        // 1. Collapse the optimistic copy, at most one.
        self.reconcile_optimistic(&message);

        // 2. Append when it belongs to the open conversation.
        let current = self.current_contact.clone();
        if let Some(current) = current {
            if message.sender_id == current || message.receiver_id == current {
                self.messages.push(message.clone());
                debug!("Message {} appended to open conversation", message.id);
            }
        }

        // 3. Update the peer's sidebar summary, synthesizing a placeholder
        // contact for senders we have never seen.
        let peer_id = if message.sender_id == self_id {
            message.receiver_id.clone()
        } else {
            message.sender_id.clone()
        };
        if self.contacts.iter().any(|c| c.id == peer_id) {
            self.touch_summary(&peer_id, message.preview());
        } else if peer_id != self_id {
            info!("Adding placeholder contact for unknown sender {}", peer_id);
            self.contacts.push(Contact::unknown(&peer_id));
        }

        // 4. Notify only when the pane is hidden and someone else sent it.
        if !self.pane_visible && message.sender_id != self_id {
            let sender_name = self
                .contacts
                .iter()
                .find(|c| c.id == message.sender_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            let body = match message.message_type {
                MessageType::Text => message.text.clone(),
                MessageType::Image => "sent a photo".to_string(),
                MessageType::Video => "sent a video".to_string(),
                MessageType::File => format!(
                    "sent a file: {}",
                    message.file_name.as_deref().unwrap_or("file")
                ),
            };
            self.notifier.push(&sender_name, &body);
        }
    }

    /// Remove at most one optimistic entry matching the confirmed message:
    /// exact correlation-id match when the server echoes it, otherwise the
    /// (text, type, file name) content signature.
    fn reconcile_optimistic(&mut self, incoming: &Message) -> bool {
        let position = match &incoming.client_id {
            Some(cid) => self
                .messages
                .iter()
                .position(|m| m.is_optimistic() && m.client_id.as_deref() == Some(cid)),
            None => None,
        };
        let position = position.or_else(|| {
            self.messages
                .iter()
                .position(|m| m.is_optimistic() && m.signature() == incoming.signature())
        });

        match position {
            Some(idx) => {
                let removed = self.messages.remove(idx);
                debug!("Reconciled optimistic message {} -> {}", removed.id, incoming.id);
                true
            }
            None => false,
        }
    }

    /// A server-side rejection of the latest pending file send. The
    /// optimistic copy stays visible but is marked failed.
    pub fn fail_pending_file(&mut self, error: &str) {
        if let Some(message) = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.is_optimistic() && m.message_type != MessageType::Text)
        {
            message.status = crate::models::DeliveryStatus::Failed;
        }
        self.notifier.error("File Error", error);
    }

    // ---- deletion ----

    /// Locally initiated delete. Idempotent: an absent id changes nothing and
    /// emits nothing.
    pub fn delete_message(&mut self, message_id: &str) {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != message_id);
        if self.messages.len() == before {
            debug!("Delete of unknown message {} ignored", message_id);
            return;
        }
        if let Some(contact_id) = self.current_contact.clone() {
            self.emit(OutboundEvent::DeleteMessage {
                message_id: message_id.to_string(),
                contact_id,
            });
        }
        self.notifier.info("Message Deleted", "Message has been deleted");
    }

    /// Server-driven delete confirmation, also idempotent.
    pub fn apply_remote_delete(&mut self, message_id: &str) {
        self.messages.retain(|m| m.id != message_id);
    }

    // ---- selection & sections ----

    /// Select a conversation. Clears any media filter, remembers the
    /// selection for session restore, and requests the history.
    pub fn switch_contact(&mut self, contact_id: &str) -> bool {
        if !self.contacts.iter().any(|c| c.id == contact_id) {
            warn!("Cannot switch to unknown contact {}", contact_id);
            return false;
        }
        self.current_contact = Some(contact_id.to_string());
        self.current_media_filter = None;
        self.showing_search_results = false;
        self.kv.set(keys::LAST_ACTIVE_CONTACT, contact_id);
        self.emit(OutboundEvent::GetConversation {
            contact_id: contact_id.to_string(),
        });
        true
    }

    /// Promote a search result into the contact list and open it.
    pub fn start_new_conversation(&mut self, contact: Contact) {
        let id = contact.id.clone();
        if !self.contacts.iter().any(|c| c.id == id) {
            let mut contact = contact;
            contact.last_message = Some("Start chatting...".to_string());
            contact.last_time = Some("Now".to_string());
            contact.muted = false;
            self.contacts.push(contact);
        }
        self.search_results.clear();
        self.switch_contact(&id);
    }

    pub fn archive_chat(&mut self, contact_id: &str) {
        if self.archived.insert(contact_id.to_string()) {
            self.persist_archived();
            if self.current_contact.as_deref() == Some(contact_id) {
                self.current_contact = None;
                self.current_media_filter = None;
            }
            self.notifier
                .info("Chat Archived", "Chat has been moved to archive");
        }
    }

    pub fn unarchive_chat(&mut self, contact_id: &str) {
        if self.archived.remove(contact_id) {
            self.persist_archived();
            self.notifier.info("Chat Unarchived", "Chat has been restored");
        }
    }

    pub fn toggle_pin(&mut self, contact_id: &str) {
        if self.pinned.remove(contact_id) {
            self.notifier.info("Chat Unpinned", "Chat has been unpinned");
        } else {
            self.pinned.insert(contact_id.to_string());
            self.notifier.info("Chat Pinned", "Chat has been pinned to top");
        }
        self.persist_pinned();
    }

    /// Remove the contact and every trace of the conversation.
    pub fn delete_chat(&mut self, contact_id: &str) {
        self.contacts.retain(|c| c.id != contact_id);
        self.messages
            .retain(|m| m.sender_id != contact_id && m.receiver_id != contact_id);
        self.pinned.remove(contact_id);
        self.archived.remove(contact_id);
        self.persist_pinned();
        self.persist_archived();
        if self.current_contact.as_deref() == Some(contact_id) {
            self.current_contact = None;
            self.current_media_filter = None;
        }
        self.notifier
            .info("Chat Deleted", "Chat has been permanently deleted");
    }

    pub fn toggle_mute(&mut self, contact_id: &str) {
        let (name, muted) = match self.contacts.iter_mut().find(|c| c.id == contact_id) {
            Some(contact) => {
                contact.muted = !contact.muted;
                (contact.name.clone(), contact.muted)
            }
            None => return,
        };
        self.notifier.info(
            "Notifications",
            &format!(
                "Notifications {} for {}",
                if muted { "muted" } else { "unmuted" },
                name
            ),
        );
    }

    fn persist_pinned(&mut self) {
        let ids: Vec<String> = self.pinned.iter().cloned().collect();
        storage::set_id_list(self.kv.as_mut(), keys::PINNED_CHATS, &ids);
    }

    fn persist_archived(&mut self) {
        let ids: Vec<String> = self.archived.iter().cloned().collect();
        storage::set_id_list(self.kv.as_mut(), keys::ARCHIVED_CHATS, &ids);
    }

    // ---- inbound list events ----

    pub fn set_contacts(&mut self, contacts: Vec<Contact>) {
        info!("Contacts list received: {} contacts", contacts.len());
        self.contacts = contacts;
        self.showing_search_results = false;
    }

    pub fn set_all_users(&mut self, users: Vec<User>) {
        self.all_users = users;
    }

    pub fn set_history(&mut self, messages: Vec<Message>) {
        debug!("Conversation history received: {} messages", messages.len());
        self.messages = messages;
    }

    pub fn add_new_user(&mut self, user: Contact) {
        if self.contacts.iter().any(|c| c.id == user.id) {
            return;
        }
        self.notifier
            .info("New User", &format!("{} joined the chat!", user.name));
        self.contacts.push(user);
    }

    pub fn set_search_results(&mut self, results: Vec<Contact>) {
        debug!("Search results received: {} users", results.len());
        self.search_results = results;
        self.showing_search_results = true;
    }

    pub fn clear_search_results(&mut self) {
        self.search_results.clear();
        self.showing_search_results = false;
    }

    /// Re-request the contact list from the server.
    pub fn refresh_contacts(&mut self) {
        self.emit(OutboundEvent::GetContacts);
    }

    /// Ask the server for users matching a term. Results come back as a
    /// search_users_results event.
    pub fn search_users(&mut self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            self.clear_search_results();
            return;
        }
        self.emit(OutboundEvent::SearchUsers {
            search_term: term.to_string(),
        });
    }

    // ---- typing notifications ----

    pub fn typing_start(&mut self) {
        if let (Some(user), Some(contact_id)) = (&self.current_user, &self.current_contact) {
            self.emit(OutboundEvent::TypingStart {
                user_id: user.id.clone(),
                contact_id: contact_id.clone(),
            });
        }
    }

    pub fn typing_stop(&mut self) {
        if let (Some(user), Some(contact_id)) = (&self.current_user, &self.current_contact) {
            self.emit(OutboundEvent::TypingStop {
                user_id: user.id.clone(),
                contact_id: contact_id.clone(),
            });
        }
    }

    pub fn update_presence(&mut self, user_id: &str, online: bool) {
        if let Some(contact) = self.contacts.iter_mut().find(|c| c.id == user_id) {
            contact.online = online;
        }
    }

    /// Reopen the conversation that was active when the app last exited.
    pub fn restore_last_conversation(&mut self) {
        if let Some(last_id) = self.kv.get(keys::LAST_ACTIVE_CONTACT) {
            if self.switch_contact(&last_id) {
                info!("Restored last conversation with {}", last_id);
            }
        }
    }

    // ---- media filter & visibility ----

    pub fn set_media_filter(&mut self, filter: MessageType) -> Result<(), StoreError> {
        if self.current_contact.is_none() {
            return Err(StoreError::NoActiveContact);
        }
        self.current_media_filter = Some(filter);
        Ok(())
    }

    pub fn clear_media_filter(&mut self) {
        self.current_media_filter = None;
    }

    pub fn set_pane_visible(&mut self, visible: bool) {
        self.pane_visible = visible;
    }

    // ---- read access for the view layer ----

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn all_users(&self) -> &[User] {
        &self.all_users
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn search_results(&self) -> &[Contact] {
        &self.search_results
    }

    pub fn showing_search_results(&self) -> bool {
        self.showing_search_results
    }

    pub fn current_contact_id(&self) -> Option<&str> {
        self.current_contact.as_deref()
    }

    pub fn current_contact(&self) -> Option<&Contact> {
        let id = self.current_contact.as_deref()?;
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn current_media_filter(&self) -> Option<MessageType> {
        self.current_media_filter
    }

    pub fn is_pinned(&self, contact_id: &str) -> bool {
        self.pinned.contains(contact_id)
    }

    pub fn is_archived(&self, contact_id: &str) -> bool {
        self.archived.contains(contact_id)
    }
}
