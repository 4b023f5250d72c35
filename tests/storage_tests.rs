// File-backed key-value persistence.

mod common;

use palaver::storage::{self, FileKv, KvStore, MemoryKv};

#[test]
fn file_kv_round_trips_across_reopen() {
    common::setup_logging();
    let dir = tempfile::tempdir().unwrap();

    {
        let mut kv = FileKv::open_default(Some(dir.path().to_path_buf())).unwrap();
        kv.set("chat_token", "abc123");
        kv.set("dark_mode", "true");
    }

    let kv = FileKv::open_default(Some(dir.path().to_path_buf())).unwrap();
    assert_eq!(kv.get("chat_token").as_deref(), Some("abc123"));
    assert_eq!(kv.get("dark_mode").as_deref(), Some("true"));
    assert_eq!(kv.get("missing"), None);
}

#[test]
fn file_kv_remove_persists() {
    common::setup_logging();
    let dir = tempfile::tempdir().unwrap();

    {
        let mut kv = FileKv::open_default(Some(dir.path().to_path_buf())).unwrap();
        kv.set("chat_token", "abc123");
        kv.remove("chat_token");
    }

    let kv = FileKv::open_default(Some(dir.path().to_path_buf())).unwrap();
    assert_eq!(kv.get("chat_token"), None);
}

#[test]
fn corrupt_state_file_is_discarded_not_fatal() {
    common::setup_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not valid json").unwrap();

    let mut kv = FileKv::open(path).unwrap();
    assert_eq!(kv.get("anything"), None);

    // The store works normally afterwards.
    kv.set("k", "v");
    assert_eq!(kv.get("k").as_deref(), Some("v"));
}

#[test]
fn id_lists_round_trip_and_tolerate_garbage() {
    let mut kv = MemoryKv::new();

    let ids = vec!["alice".to_string(), "bob".to_string()];
    storage::set_id_list(&mut kv, "pinned_chats", &ids);
    assert_eq!(storage::get_id_list(&kv, "pinned_chats"), ids);

    assert!(storage::get_id_list(&kv, "absent").is_empty());

    kv.set("archived_chats", "not json");
    assert!(storage::get_id_list(&kv, "archived_chats").is_empty());
}
