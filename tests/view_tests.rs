// View-model projections: sidebar sections and the message pane.

mod common;

use common::{confirmed_text, test_contact, TestHarness};
use palaver::client::InboundEvent;
use palaver::models::{Message, MessageType};
use palaver::view::{self, MessageBody, MessagePaneView, SidebarView};

fn file_message(id: &str, sender: &str, receiver: &str, kind: MessageType) -> Message {
    let mut message = confirmed_text(id, sender, receiver, "");
    message.message_type = kind;
    message.file_url = Some(format!("/uploads/{}", id));
    message.file_name = Some(format!("{}.bin", id));
    message.file_size = Some("2 KB".to_string());
    message
}

#[test]
fn sidebar_splits_contacts_into_sections() {
    let mut harness = TestHarness::logged_in("me");
    harness.router.store.set_contacts(vec![
        test_contact("alice", "Alice"),
        test_contact("bob", "Bob"),
        test_contact("carol", "Carol"),
    ]);
    harness.router.store.toggle_pin("alice");
    harness.router.store.archive_chat("carol");

    match view::sidebar(&harness.router.store) {
        SidebarView::Contacts(list) => {
            assert_eq!(list.pinned.len(), 1);
            assert_eq!(list.pinned[0].id, "alice");
            assert_eq!(list.normal.len(), 1);
            assert_eq!(list.normal[0].id, "bob");
            assert_eq!(list.archived.len(), 1);
            assert_eq!(list.archived[0].id, "carol");
        }
        other => panic!("expected contact sections, got {:?}", other),
    }
}

#[test]
fn pinned_wins_over_archived_in_the_sidebar() {
    let mut harness = TestHarness::logged_in("me");
    harness
        .router
        .store
        .set_contacts(vec![test_contact("alice", "Alice")]);
    harness.router.store.toggle_pin("alice");
    harness.router.store.archive_chat("alice");

    // Both memberships are held at once; the projection shows the contact
    // under Pinned and nowhere else.
    assert!(harness.router.store.is_pinned("alice"));
    assert!(harness.router.store.is_archived("alice"));

    match view::sidebar(&harness.router.store) {
        SidebarView::Contacts(list) => {
            assert_eq!(list.pinned.len(), 1);
            assert!(list.archived.is_empty());
            assert!(list.normal.is_empty());
        }
        other => panic!("expected contact sections, got {:?}", other),
    }
}

#[test]
fn search_results_replace_the_contact_list() {
    let mut harness = TestHarness::logged_in("me");
    harness
        .router
        .store
        .set_contacts(vec![test_contact("alice", "Alice")]);
    harness
        .router
        .store
        .set_search_results(vec![test_contact("dave", "Dave")]);

    match view::sidebar(&harness.router.store) {
        SidebarView::SearchResults(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, "dave");
        }
        other => panic!("expected search results, got {:?}", other),
    }

    harness.router.store.clear_search_results();
    assert!(matches!(
        view::sidebar(&harness.router.store),
        SidebarView::Contacts(_)
    ));
}

#[test]
fn message_pane_is_welcome_without_open_conversation() {
    let harness = TestHarness::logged_in("me");
    assert_eq!(
        view::message_pane(&harness.router.store),
        MessagePaneView::Welcome
    );
}

#[test]
fn message_pane_marks_direction_and_bodies() {
    let mut harness = TestHarness::logged_in("me");
    harness
        .router
        .store
        .set_contacts(vec![test_contact("alice", "Alice")]);
    harness.router.store.switch_contact("alice");
    harness.router.handle(InboundEvent::NewMessage {
        message: confirmed_text("m1", "alice", "me", "hello"),
    });
    harness.router.handle(InboundEvent::NewMessage {
        message: file_message("m2", "me", "alice", MessageType::File),
    });

    match view::message_pane(&harness.router.store) {
        MessagePaneView::Conversation { header, rows, .. } => {
            assert_eq!(header.name, "Alice");
            assert_eq!(rows.len(), 2);
            assert!(!rows[0].outgoing);
            assert_eq!(rows[0].body, MessageBody::Text("hello".to_string()));
            assert!(rows[1].outgoing);
            assert!(matches!(rows[1].body, MessageBody::File { .. }));
        }
        other => panic!("expected open conversation, got {:?}", other),
    }
}

#[test]
fn media_filter_narrows_the_pane() {
    let mut harness = TestHarness::logged_in("me");
    harness
        .router
        .store
        .set_contacts(vec![test_contact("alice", "Alice")]);
    harness.router.store.switch_contact("alice");
    harness.router.handle(InboundEvent::NewMessage {
        message: confirmed_text("m1", "alice", "me", "text"),
    });
    harness.router.handle(InboundEvent::NewMessage {
        message: file_message("m2", "alice", "me", MessageType::Image),
    });
    harness.router.handle(InboundEvent::NewMessage {
        message: file_message("m3", "alice", "me", MessageType::Video),
    });

    harness
        .router
        .store
        .set_media_filter(MessageType::Image)
        .unwrap();

    match view::message_pane(&harness.router.store) {
        MessagePaneView::Conversation { rows, filter, .. } => {
            assert_eq!(filter, Some(MessageType::Image));
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, "m2");
        }
        other => panic!("expected open conversation, got {:?}", other),
    }

    harness.router.store.clear_media_filter();
    match view::message_pane(&harness.router.store) {
        MessagePaneView::Conversation { rows, .. } => assert_eq!(rows.len(), 3),
        other => panic!("expected open conversation, got {:?}", other),
    }
}
