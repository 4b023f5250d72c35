// Call signaling helper. A thin state machine over the call_* events; no
// media payloads are processed, the WebRTC handlers below are observability
// stubs kept as extension points.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::events::OutboundEvent;
use crate::notify::Notifier;

/// How long an unanswered incoming call stays on screen before it expires.
pub const INCOMING_CALL_TIMEOUT_SECS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Audio,
    Video,
}

impl CallKind {
    pub fn label(&self) -> &'static str {
        match self {
            CallKind::Audio => "audio",
            CallKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallState {
    Idle,
    Outgoing {
        peer_id: String,
        kind: CallKind,
    },
    Incoming {
        peer_id: String,
        kind: CallKind,
        expires_at: DateTime<Utc>,
    },
    Active {
        peer_id: String,
        kind: CallKind,
        connected_at: DateTime<Utc>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("already in a call")]
    Busy,
    #[error("no call to act on")]
    NoCall,
}

pub struct CallManager {
    state: CallState,
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    notifier: Notifier,
}

impl CallManager {
    pub fn new(outbound: mpsc::UnboundedSender<OutboundEvent>, notifier: Notifier) -> Self {
        CallManager {
            state: CallState::Idle,
            outbound,
            notifier,
        }
    }

    pub fn state(&self) -> &CallState {
        &self.state
    }

    fn emit(&self, event: OutboundEvent) {
        if self.outbound.send(event).is_err() {
            warn!("Call event dropped, transport channel closed");
        }
    }

    // ---- locally initiated transitions ----

    pub fn initiate(&mut self, peer_id: &str, kind: CallKind) -> Result<(), CallError> {
        if self.state != CallState::Idle {
            return Err(CallError::Busy);
        }
        info!("Initiating {} call to {}", kind.label(), peer_id);
        self.emit(OutboundEvent::InitiateCall {
            receiver_id: peer_id.to_string(),
            call_type: kind,
        });
        self.state = CallState::Outgoing {
            peer_id: peer_id.to_string(),
            kind,
        };
        Ok(())
    }

    pub fn answer(&mut self, now: DateTime<Utc>) -> Result<(), CallError> {
        match self.state.clone() {
            CallState::Incoming { peer_id, kind, .. } => {
                self.emit(OutboundEvent::AnswerCall {
                    caller_id: peer_id.clone(),
                });
                self.state = CallState::Active {
                    peer_id,
                    kind,
                    connected_at: now,
                };
                Ok(())
            }
            _ => Err(CallError::NoCall),
        }
    }

    pub fn reject(&mut self) -> Result<(), CallError> {
        match self.state.clone() {
            CallState::Incoming { peer_id, .. } => {
                self.emit(OutboundEvent::RejectCall { caller_id: peer_id });
                self.state = CallState::Idle;
                Ok(())
            }
            _ => Err(CallError::NoCall),
        }
    }

    pub fn end(&mut self, now: DateTime<Utc>) -> Result<(), CallError> {
        match self.state.clone() {
            CallState::Active {
                peer_id,
                connected_at,
                ..
            } => {
                let duration = (now - connected_at).num_seconds().max(0) as u64;
                self.emit(OutboundEvent::EndCall {
                    other_user_id: peer_id,
                    duration,
                });
                self.state = CallState::Idle;
                Ok(())
            }
            _ => Err(CallError::NoCall),
        }
    }

    // ---- transport-driven transitions ----

    pub fn on_incoming(&mut self, caller_id: &str, kind: CallKind, now: DateTime<Utc>) {
        if self.state != CallState::Idle {
            // Busy: decline straight away rather than stacking prompts.
            info!("Rejecting incoming call from {} while busy", caller_id);
            self.emit(OutboundEvent::RejectCall {
                caller_id: caller_id.to_string(),
            });
            return;
        }
        self.state = CallState::Incoming {
            peer_id: caller_id.to_string(),
            kind,
            expires_at: now + Duration::seconds(INCOMING_CALL_TIMEOUT_SECS),
        };
    }

    /// Server acknowledgment of our initiate; the state is already Outgoing.
    pub fn on_initiated(&mut self, receiver_id: &str) {
        debug!("Call to {} acknowledged by server", receiver_id);
    }

    pub fn on_answered(&mut self, now: DateTime<Utc>) {
        if let CallState::Outgoing { peer_id, kind } = self.state.clone() {
            self.state = CallState::Active {
                peer_id,
                kind,
                connected_at: now,
            };
        }
    }

    pub fn on_rejected(&mut self, peer_name: &str) {
        if matches!(self.state, CallState::Outgoing { .. }) {
            self.state = CallState::Idle;
            self.notifier
                .error("Call Rejected", &format!("{} rejected the call", peer_name));
        }
    }

    pub fn on_ended(&mut self, ended_by: &str, self_id: &str) {
        if self.state != CallState::Idle {
            self.state = CallState::Idle;
            if ended_by != self_id {
                self.notifier.info("Call Ended", "The other party ended the call");
            }
        }
    }

    pub fn on_failed(&mut self, reason: &str) {
        self.state = CallState::Idle;
        self.notifier.error("Call Failed", reason);
    }

    /// Auto-expire an unanswered incoming prompt. Polled from the UI tick so
    /// the timeout is a plain deadline comparison.
    pub fn expire_stale(&mut self, now: DateTime<Utc>) {
        if let CallState::Incoming {
            peer_id,
            expires_at,
            ..
        } = &self.state
        {
            if now >= *expires_at {
                info!("Incoming call from {} expired unanswered", peer_id);
                self.state = CallState::Idle;
            }
        }
    }

    // ---- WebRTC signaling stubs ----

    pub fn on_webrtc_offer(&self, payload: &serde_json::Value) {
        debug!("WebRTC offer received: {}", payload);
    }

    pub fn on_webrtc_answer(&self, payload: &serde_json::Value) {
        debug!("WebRTC answer received: {}", payload);
    }

    pub fn on_webrtc_ice_candidate(&self, payload: &serde_json::Value) {
        debug!("WebRTC ICE candidate received: {}", payload);
    }
}
