// Session and auth gate: owns login state and token persistence and decides
// which top-level view (login form vs chat) is shown.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::{info, warn};
use thiserror::Error;
use tokio::sync::mpsc;

use super::events::OutboundEvent;
use crate::models::User;
use crate::notify::Notifier;
use crate::storage::{keys, KvStore};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    LoggedOut,
    /// Credentials sent, waiting for auth_success / auth_failed.
    Authenticating,
    Active(User),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("please fill in all fields")]
    MissingFields,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
}

pub struct Session {
    state: SessionState,
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    notifier: Notifier,
}

impl Session {
    pub fn new(outbound: mpsc::UnboundedSender<OutboundEvent>, notifier: Notifier) -> Self {
        Session {
            state: SessionState::LoggedOut,
            outbound,
            notifier,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Active(user) => Some(user),
            _ => None,
        }
    }

    fn emit(&self, event: OutboundEvent) {
        if self.outbound.send(event).is_err() {
            warn!("Auth event dropped, transport channel closed");
        }
    }

    /// Try to resume the previous session from the persisted token.
    pub fn check_stored(&mut self, kv: &dyn KvStore) {
        match kv.get(keys::AUTH_TOKEN) {
            Some(encoded) => {
                let token = decode_token(&encoded);
                info!("Authenticating with stored token");
                self.emit(OutboundEvent::Authenticate { token });
                self.state = SessionState::Authenticating;
            }
            None => {
                info!("No stored authentication found");
                self.state = SessionState::LoggedOut;
            }
        }
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        info!("Attempting login for {}", email);
        self.emit(OutboundEvent::Login {
            email: email.trim().to_string(),
            password: password.to_string(),
        });
        self.state = SessionState::Authenticating;
        Ok(())
    }

    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if password != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }
        info!("Attempting registration for {}", email);
        self.emit(OutboundEvent::Register {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        });
        self.state = SessionState::Authenticating;
        Ok(())
    }

    pub fn on_auth_success(&mut self, user: User, kv: &mut dyn KvStore) {
        info!("Authentication successful for {}", user.name);
        if let Some(token) = &user.token {
            kv.set(keys::AUTH_TOKEN, &BASE64.encode(token));
        }
        match serde_json::to_string(&user) {
            Ok(raw) => kv.set(keys::USER, &raw),
            Err(e) => warn!("Failed to serialize user for persistence: {}", e),
        }

        self.emit(OutboundEvent::GetContacts);
        self.emit(OutboundEvent::GetAllUsers);
        self.notifier
            .success("Welcome", &format!("Hello, {}!", user.name));
        self.state = SessionState::Active(user);
    }

    pub fn on_auth_failed(&mut self, message: &str, kv: &mut dyn KvStore) {
        warn!("Authentication failed: {}", message);
        kv.remove(keys::AUTH_TOKEN);
        kv.remove(keys::USER);
        self.state = SessionState::LoggedOut;
        self.notifier.error("Authentication Failed", message);
    }

    pub fn logout(&mut self, kv: &mut dyn KvStore) {
        info!("Logging out");
        kv.remove(keys::AUTH_TOKEN);
        kv.remove(keys::USER);
        kv.remove(keys::DARK_MODE);
        kv.remove(keys::LAST_ACTIVE_CONTACT);
        self.state = SessionState::LoggedOut;
        self.notifier
            .info("Logged Out", "You have been successfully logged out");
    }
}

fn decode_token(encoded: &str) -> String {
    BASE64
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| encoded.to_string())
}
