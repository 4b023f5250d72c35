// Client-side plumbing around the conversation store: the wire event
// vocabulary, the inbound event router, the auth gate, call signaling, and
// the TCP transport glue.

pub mod calls;
pub mod events;
pub mod router;
pub mod session;
pub mod transport;

pub use calls::{CallKind, CallManager, CallState};
pub use events::{InboundEvent, OutboundEvent};
pub use router::Router;
pub use session::{Session, SessionState};
