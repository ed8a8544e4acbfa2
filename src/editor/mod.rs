//! Node-graph editor bridge.
//!
//! Graph-authored materials can be edited interactively. The editor runs on
//! one background thread; the main evaluation thread talks to it only through
//! two single-slot mailboxes (graph in, edited graph out) and a stop flag.
//!
//! ```text
//! Closed --open()--> Opening --session up--> Open
//!    ^                                         |
//!    +--refresh()/close_and_wait()-- Closing <-+ (user closed / request_close)
//! ```
//!
//! Only one editor may be open per process; see [`EditorSlot`].

pub mod bridge;
pub mod mailbox;
pub mod session;
pub mod slot;
pub mod ws_session;

pub use bridge::{DEFAULT_POLL_PERIOD, EditorBridge, EditorState, OpenOutcome};
pub use mailbox::{LatestReceiver, LatestSender, latest_channel};
pub use session::{EditorSession, SessionEvent};
pub use slot::EditorSlot;
pub use ws_session::WsEditorSession;
