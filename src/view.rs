// Pure projections from store state to view-models. Nothing in this module
// mutates anything; the terminal layer (or a test harness) renders the
// structs returned here.

use crate::models::{DeliveryStatus, MessageType};
use crate::store::ChatStore;

/// One row of the contact sidebar.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactRow {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub online: bool,
    pub preview: String,
    pub time: String,
    pub muted: bool,
    pub pinned: bool,
    pub active: bool,
}

/// Sidebar sections. The three groups are mutually exclusive: a contact in
/// both the pinned and archived sets renders under Pinned and only there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactListView {
    pub pinned: Vec<ContactRow>,
    pub normal: Vec<ContactRow>,
    pub archived: Vec<ContactRow>,
}

/// Search results replace the sidebar while active.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarView {
    Contacts(ContactListView),
    SearchResults(Vec<ContactRow>),
}

pub fn sidebar(store: &ChatStore) -> SidebarView {
    if store.showing_search_results() {
        let rows = store
            .search_results()
            .iter()
            .map(|c| ContactRow {
                id: c.id.clone(),
                name: c.name.clone(),
                avatar: c.avatar.clone(),
                online: c.online,
                preview: if c.online { "Online" } else { "Offline" }.to_string(),
                time: String::new(),
                muted: false,
                pinned: false,
                active: false,
            })
            .collect();
        return SidebarView::SearchResults(rows);
    }

    let mut view = ContactListView::default();
    for contact in store.contacts() {
        let row = ContactRow {
            id: contact.id.clone(),
            name: contact.name.clone(),
            avatar: contact.avatar.clone(),
            online: contact.online,
            preview: contact
                .last_message
                .clone()
                .unwrap_or_else(|| "No messages yet".to_string()),
            time: contact.last_time.clone().unwrap_or_default(),
            muted: contact.muted,
            pinned: store.is_pinned(&contact.id),
            active: store.current_contact_id() == Some(contact.id.as_str()),
        };
        if store.is_pinned(&contact.id) {
            view.pinned.push(row);
        } else if store.is_archived(&contact.id) {
            view.archived.push(row);
        } else {
            view.normal.push(row);
        }
    }
    SidebarView::Contacts(view)
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Text(String),
    Image { url: String, caption: String },
    Video { url: String, caption: String },
    File { name: String, size: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub id: String,
    pub outgoing: bool,
    pub body: MessageBody,
    pub time: String,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationHeader {
    pub name: String,
    pub avatar: String,
    pub online: bool,
}

/// The message pane: either the welcome screen or the open conversation,
/// optionally narrowed by the media filter.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePaneView {
    Welcome,
    Conversation {
        header: ConversationHeader,
        rows: Vec<MessageRow>,
        filter: Option<MessageType>,
    },
}

pub fn message_pane(store: &ChatStore) -> MessagePaneView {
    let contact = match store.current_contact() {
        Some(contact) => contact,
        None => return MessagePaneView::Welcome,
    };

    let self_id = store.current_user().map(|u| u.id.as_str()).unwrap_or("");
    let filter = store.current_media_filter();

    let rows = store
        .messages()
        .iter()
        .filter(|m| filter.map_or(true, |f| m.message_type == f))
        .map(|m| {
            let body = match m.message_type {
                MessageType::Text => MessageBody::Text(m.text.clone()),
                MessageType::Image => MessageBody::Image {
                    url: m.file_url.clone().unwrap_or_default(),
                    caption: m.text.clone(),
                },
                MessageType::Video => MessageBody::Video {
                    url: m.file_url.clone().unwrap_or_default(),
                    caption: m.text.clone(),
                },
                MessageType::File => MessageBody::File {
                    name: m.file_name.clone().unwrap_or_default(),
                    size: m.file_size.clone().unwrap_or_default(),
                },
            };
            MessageRow {
                id: m.id.clone(),
                outgoing: m.sender_id == self_id,
                body,
                time: m.timestamp.format("%H:%M").to_string(),
                status: m.status,
            }
        })
        .collect();

    MessagePaneView::Conversation {
        header: ConversationHeader {
            name: contact.name.clone(),
            avatar: contact.avatar.clone(),
            online: contact.online,
        },
        rows,
        filter,
    }
}
