// Transport event router: every named inbound event maps to exactly one
// handler on the store, session, or call manager. Dispatch is a single match,
// so a handler can never be attached twice.

use chrono::Utc;
use log::debug;

use super::calls::CallManager;
use super::events::InboundEvent;
use super::session::Session;
use crate::notify::Notifier;
use crate::store::ChatStore;

pub struct Router {
    pub store: ChatStore,
    pub session: Session,
    pub calls: CallManager,
    notifier: Notifier,
}

impl Router {
    pub fn new(store: ChatStore, session: Session, calls: CallManager, notifier: Notifier) -> Self {
        Router {
            store,
            session,
            calls,
            notifier,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn handle(&mut self, event: InboundEvent) {
        debug!("Dispatching inbound event: {:?}", event_name(&event));
        match event {
            InboundEvent::AuthSuccess { user } => {
                self.session.on_auth_success(user.clone(), self.store.kv_mut());
                self.store.init_session(user);
            }
            InboundEvent::AuthFailed { message } => {
                self.session.on_auth_failed(&message, self.store.kv_mut());
                self.store.reset();
            }
            InboundEvent::NewMessage { message } => self.store.receive_message(message),
            InboundEvent::UserOnline { user_id } => self.store.update_presence(&user_id, true),
            InboundEvent::UserOffline { user_id } => self.store.update_presence(&user_id, false),
            InboundEvent::ContactsList { contacts } => {
                self.store.set_contacts(contacts);
                self.store.restore_last_conversation();
            }
            InboundEvent::AllUsersList { users } => self.store.set_all_users(users),
            InboundEvent::ConversationHistory { messages } => self.store.set_history(messages),
            InboundEvent::MessageDeleted { message_id } => {
                self.store.apply_remote_delete(&message_id)
            }
            InboundEvent::NewUserAdded { user } => self.store.add_new_user(user),
            InboundEvent::SearchUsersResults { results } => {
                self.store.set_search_results(results)
            }
            InboundEvent::FileMessageNotification { file_name } => {
                self.notifier
                    .info("File Received", &format!("{} received", file_name));
            }
            InboundEvent::FileMessageError { error } => self.store.fail_pending_file(&error),
            InboundEvent::IncomingCall {
                caller_id,
                call_type,
            } => self.calls.on_incoming(&caller_id, call_type, Utc::now()),
            InboundEvent::CallInitiated { receiver_id, .. } => {
                self.calls.on_initiated(&receiver_id)
            }
            InboundEvent::CallAnswered { .. } => self.calls.on_answered(Utc::now()),
            InboundEvent::CallRejected { receiver_id } => {
                let name = self
                    .store
                    .contacts()
                    .iter()
                    .find(|c| c.id == receiver_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "User".to_string());
                self.calls.on_rejected(&name);
            }
            InboundEvent::CallEnded { ended_by } => {
                let self_id = self
                    .store
                    .current_user()
                    .map(|u| u.id.clone())
                    .unwrap_or_default();
                self.calls.on_ended(&ended_by, &self_id);
            }
            InboundEvent::CallFailed { reason } => self.calls.on_failed(&reason),
            InboundEvent::WebrtcOffer { payload } => self.calls.on_webrtc_offer(&payload),
            InboundEvent::WebrtcAnswer { payload } => self.calls.on_webrtc_answer(&payload),
            InboundEvent::WebrtcIceCandidate { payload } => {
                self.calls.on_webrtc_ice_candidate(&payload)
            }
        }
    }
}

fn event_name(event: &InboundEvent) -> &'static str {
    match event {
        InboundEvent::AuthSuccess { .. } => "auth_success",
        InboundEvent::AuthFailed { .. } => "auth_failed",
        InboundEvent::NewMessage { .. } => "new_message",
        InboundEvent::UserOnline { .. } => "user_online",
        InboundEvent::UserOffline { .. } => "user_offline",
        InboundEvent::ContactsList { .. } => "contacts_list",
        InboundEvent::AllUsersList { .. } => "all_users_list",
        InboundEvent::ConversationHistory { .. } => "conversation_history",
        InboundEvent::MessageDeleted { .. } => "message_deleted",
        InboundEvent::NewUserAdded { .. } => "new_user_added",
        InboundEvent::SearchUsersResults { .. } => "search_users_results",
        InboundEvent::FileMessageNotification { .. } => "file_message_notification",
        InboundEvent::FileMessageError { .. } => "file_message_error",
        InboundEvent::IncomingCall { .. } => "incoming_call",
        InboundEvent::CallInitiated { .. } => "call_initiated",
        InboundEvent::CallAnswered { .. } => "call_answered",
        InboundEvent::CallRejected { .. } => "call_rejected",
        InboundEvent::CallEnded { .. } => "call_ended",
        InboundEvent::CallFailed { .. } => "call_failed",
        InboundEvent::WebrtcOffer { .. } => "webrtc_offer",
        InboundEvent::WebrtcAnswer { .. } => "webrtc_answer",
        InboundEvent::WebrtcIceCandidate { .. } => "webrtc_ice_candidate",
    }
}
