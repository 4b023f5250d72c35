// Key-value persistence for client-side state.
// Everything here is best-effort: a missing or unreadable store never takes
// the app down, it just loses the cached state.

use anyhow::{anyhow, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::PathBuf;

/// Well-known keys. String-keyed, no schema versioning.
pub mod keys {
    pub const AUTH_TOKEN: &str = "chat_token";
    pub const USER: &str = "chat_user";
    pub const DARK_MODE: &str = "dark_mode";
    pub const LAST_ACTIVE_CONTACT: &str = "last_active_contact";
    pub const PINNED_CHATS: &str = "pinned_chats";
    pub const ARCHIVED_CHATS: &str = "archived_chats";
}

/// Minimal persistence seam injected into the store and session instead of
/// being reached for as an ambient global.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory backend, used by tests and as a fallback when no config
/// directory is available.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// JSON-file backend stored in the platform config directory. The whole map
/// is rewritten on every mutation; the state is tiny.
pub struct FileKv {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileKv {
    pub fn open(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Discarding unreadable state file {}: {}", path.display(), e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        info!("Client state file: {}", path.display());
        Ok(FileKv { path, entries })
    }

    /// Open the state file in the default config directory, creating the
    /// directory if needed.
    pub fn open_default(dir_override: Option<PathBuf>) -> Result<Self> {
        let dir = match dir_override {
            Some(dir) => dir,
            None => dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("palaver"),
        };

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        Self::open(dir.join("state.json"))
    }

    fn flush(&self) {
        let result = File::create(&self.path)
            .map_err(anyhow::Error::from)
            .and_then(|file| serde_json::to_writer_pretty(file, &self.entries).map_err(Into::into));
        if let Err(e) = result {
            warn!("Failed to write state file {}: {}", self.path.display(), e);
        }
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.flush();
        }
    }
}

/// Read a JSON-serialized string list, tolerating absent or corrupt values.
pub fn get_id_list(kv: &dyn KvStore, key: &str) -> Vec<String> {
    kv.get(key)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub fn set_id_list(kv: &mut dyn KvStore, key: &str, ids: &[String]) {
    match serde_json::to_string(ids) {
        Ok(raw) => kv.set(key, &raw),
        Err(e) => warn!("Failed to serialize {} list: {}", key, e),
    }
}
