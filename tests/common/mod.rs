// Common test utilities for integration tests
// This module contains shared code for all integration tests

use std::sync::Once;

use chrono::Utc;
use log::LevelFilter;
use tokio::sync::mpsc;

use palaver::client::{CallManager, InboundEvent, OutboundEvent, Router, Session};
use palaver::models::{Contact, Message, MessageType, User};
use palaver::notify::{Notice, Notifier};
use palaver::storage::MemoryKv;
use palaver::store::ChatStore;

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

/// A fully wired client core over an in-memory state store, with the
/// transport replaced by channels so tests can inspect everything emitted.
pub struct TestHarness {
    pub router: Router,
    pub outbound_rx: mpsc::UnboundedReceiver<OutboundEvent>,
    pub notice_rx: mpsc::UnboundedReceiver<Notice>,
}

impl TestHarness {
    pub fn new() -> Self {
        setup_logging();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (notifier, notice_rx) = Notifier::new();
        let store = ChatStore::new(
            outbound_tx.clone(),
            notifier.clone(),
            Box::new(MemoryKv::new()),
        );
        let session = Session::new(outbound_tx.clone(), notifier.clone());
        let calls = CallManager::new(outbound_tx, notifier.clone());
        let router = Router::new(store, session, calls, notifier);
        TestHarness {
            router,
            outbound_rx,
            notice_rx,
        }
    }

    /// Harness with an authenticated session for the given user id, with the
    /// auth side effects already drained.
    pub fn logged_in(user_id: &str) -> Self {
        let mut harness = Self::new();
        harness.router.handle(InboundEvent::AuthSuccess {
            user: test_user(user_id),
        });
        harness.drain_outbound();
        harness.drain_notices();
        harness
    }

    /// Collect everything emitted toward the server since the last drain.
    pub fn drain_outbound(&mut self) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.outbound_rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notice_rx.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

pub fn test_user(id: &str) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@example.com", id),
        avatar: "U".to_string(),
        token: Some(format!("token-{}", id)),
    }
}

pub fn test_contact(id: &str, name: &str) -> Contact {
    Contact {
        id: id.to_string(),
        name: name.to_string(),
        avatar: name.chars().next().unwrap_or('?').to_string(),
        online: true,
        last_message: None,
        last_time: None,
        muted: false,
    }
}

/// A server-confirmed text message, as the new_message event would carry it.
pub fn confirmed_text(id: &str, sender: &str, receiver: &str, text: &str) -> Message {
    Message {
        id: id.to_string(),
        text: text.to_string(),
        sender_id: sender.to_string(),
        receiver_id: receiver.to_string(),
        timestamp: Utc::now(),
        message_type: MessageType::Text,
        file_url: None,
        file_name: None,
        file_size: None,
        client_id: None,
        status: Default::default(),
    }
}
