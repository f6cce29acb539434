//! Per-room client state: conversation record, presence, composition.

pub mod compose;
pub mod conversation;
pub mod presence;
pub mod session;

pub use compose::{OutboundComposer, TypingDebounce};
pub use conversation::{Append, Apply, ConversationView, RenderItem};
pub use presence::PresenceTracker;
pub use session::RoomSession;
