//! Room session: the single owner of all per-room client state.
//!
//! Created when the user completes setup (room + password accepted),
//! discarded on leave; switching rooms builds a fresh session instead of
//! mutating this one in place, so nothing leaks across rooms.
//!
//! The session also handles the join race: the history fetch and the live
//! channel start concurrently, and a live message may arrive before the
//! history response. Conversation-affecting events are buffered until
//! `complete_history` runs, then replayed in arrival order, so a racing
//! message can neither render ahead of history nor be dropped by the
//! wholesale history load.

use std::collections::VecDeque;

use crate::models::Message;
use crate::room::conversation::{Append, Apply, ConversationView};
use crate::room::presence::PresenceTracker;
use crate::socket::ChatEvent;

/// Room notices kept for display (joins, leaves, file uploads).
const MAX_NOTICES: usize = 5;

pub struct RoomSession {
    pub room_id: String,
    pub local_user_id: String,
    pub local_username: String,
    conversation: ConversationView,
    presence: PresenceTracker,
    history_loaded: bool,
    /// Conversation events that raced the history fetch.
    pending: Vec<ChatEvent>,
    notices: VecDeque<String>,
}

impl RoomSession {
    pub fn new(
        room_id: impl Into<String>,
        local_user_id: impl Into<String>,
        local_username: impl Into<String>,
    ) -> Self {
        let room_id = room_id.into();
        let local_user_id = local_user_id.into();
        Self {
            presence: PresenceTracker::new(room_id.clone(), local_user_id.clone()),
            room_id,
            local_user_id,
            local_username: local_username.into(),
            conversation: ConversationView::new(),
            history_loaded: false,
            pending: Vec::new(),
            notices: VecDeque::new(),
        }
    }

    /// Install the history fetch result and replay any buffered live
    /// events in their arrival order.
    pub fn complete_history(&mut self, history: Vec<Message>) {
        self.conversation.load_history(history);
        self.history_loaded = true;

        for event in std::mem::take(&mut self.pending) {
            self.apply(event);
        }
    }

    /// Dispatch one inbound live event.
    ///
    /// Presence updates apply immediately (replace-only, no ordering
    /// dependency on the conversation). Message, reaction and deletion
    /// events are buffered while the history fetch is outstanding.
    pub fn handle_event(&mut self, event: ChatEvent) {
        match &event {
            ChatEvent::Message(_)
            | ChatEvent::ReactionUpdate { .. }
            | ChatEvent::MessageDeleted { .. }
                if !self.history_loaded =>
            {
                self.pending.push(event);
            }
            _ => self.apply(event),
        }
    }

    fn apply(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Message(wire) => {
                let msg = Message::from_wire(wire, &self.local_user_id);
                if self.conversation.append_live(msg) == Append::Duplicate {
                    tracing::debug!("Dropping duplicate live message");
                }
            }
            ChatEvent::ReactionUpdate {
                message_id,
                reactions,
            } => {
                if self.conversation.apply_reaction_update(&message_id, reactions)
                    == Apply::NotFound
                {
                    // The referenced message may belong to unloaded history.
                    tracing::debug!("Dropping reaction update for unknown id {}", message_id);
                }
            }
            ChatEvent::MessageDeleted { message_id } => {
                if self.conversation.apply_deletion(&message_id) == Apply::NotFound {
                    tracing::debug!("Dropping deletion for unknown id {}", message_id);
                }
            }
            ChatEvent::OnlineCount { room, count } => {
                self.presence.set_online_count(&room, count);
            }
            ChatEvent::TypingStatus { room, typing_users } => {
                self.presence.set_typing_users(&room, typing_users);
            }
            ChatEvent::Status { msg } => {
                self.push_notice(msg);
            }
            ChatEvent::FileUploaded(notice) => {
                self.push_notice(format!(
                    "{} uploaded {} ({} KB) {}",
                    notice.uploaded_by,
                    notice.filename,
                    notice.size / 1024,
                    notice.display_time(),
                ));
            }
        }
    }

    /// Reset transient presence after a transport drop.
    pub fn transport_lost(&mut self) {
        self.presence.reset();
    }

    fn push_notice(&mut self, notice: String) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    pub fn conversation(&self) -> &ConversationView {
        &self.conversation
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn notices(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WireMessage;
    use serde_json::json;

    fn wire(id: &str, user: &str) -> WireMessage {
        serde_json::from_value(json!({
            "id": id,
            "user_id": user,
            "username": user,
            "message": "hello",
            "timestamp": 1700000000000i64,
            "date": "Nov 14",
            "time": "10:13 PM"
        }))
        .unwrap()
    }

    fn history(session: &RoomSession) -> Vec<String> {
        use crate::room::conversation::RenderItem;
        session
            .conversation()
            .snapshot()
            .filter_map(|item| match item {
                RenderItem::Message(m) => Some(m.id.clone()),
                RenderItem::DateSeparator(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_events_before_history_are_buffered_and_replayed_in_order() {
        let mut session = RoomSession::new("general", "alice", "Alice");

        // Live events race the history fetch.
        session.handle_event(ChatEvent::Message(wire("l1", "bob")));
        session.handle_event(ChatEvent::Message(wire("l2", "bob")));
        assert!(session.conversation().is_empty());

        session.complete_history(vec![
            Message::from_wire(wire("h1", "bob"), "alice"),
            Message::from_wire(wire("h2", "bob"), "alice"),
        ]);

        assert_eq!(history(&session), vec!["h1", "h2", "l1", "l2"]);
    }

    #[test]
    fn test_replay_dedups_message_already_in_history() {
        let mut session = RoomSession::new("general", "alice", "Alice");

        // The server broadcast "h2" live while it was also in the history
        // response.
        session.handle_event(ChatEvent::Message(wire("h2", "bob")));
        session.complete_history(vec![
            Message::from_wire(wire("h1", "bob"), "alice"),
            Message::from_wire(wire("h2", "bob"), "alice"),
        ]);

        assert_eq!(history(&session), vec!["h1", "h2"]);
    }

    #[test]
    fn test_buffered_reaction_applies_to_history_message() {
        let mut session = RoomSession::new("general", "alice", "Alice");

        let reactions: crate::models::Reactions =
            serde_json::from_value(json!({"\u{2764}": ["bob"]})).unwrap();
        session.handle_event(ChatEvent::ReactionUpdate {
            message_id: "h1".to_string(),
            reactions,
        });

        session.complete_history(vec![Message::from_wire(wire("h1", "bob"), "alice")]);
        assert_eq!(
            session.conversation().get("h1").unwrap().reactions.len(),
            1
        );
    }

    #[test]
    fn test_update_for_unknown_id_is_dropped_silently() {
        let mut session = RoomSession::new("general", "alice", "Alice");
        session.complete_history(vec![]);

        session.handle_event(ChatEvent::MessageDeleted {
            message_id: "ghost".to_string(),
        });
        session.handle_event(ChatEvent::ReactionUpdate {
            message_id: "ghost".to_string(),
            reactions: Default::default(),
        });
        assert!(session.conversation().is_empty());
    }

    #[test]
    fn test_presence_applies_before_history_resolves() {
        let mut session = RoomSession::new("general", "alice", "Alice");
        session.handle_event(ChatEvent::OnlineCount {
            room: "general".to_string(),
            count: 3,
        });
        assert_eq!(session.presence().online_count(), 3);
    }

    #[test]
    fn test_own_message_is_marked_sent() {
        let mut session = RoomSession::new("general", "alice", "Alice");
        session.complete_history(vec![]);
        session.handle_event(ChatEvent::Message(wire("m1", "alice")));
        assert!(session.conversation().get("m1").unwrap().sent_by_local_user);
    }

    #[test]
    fn test_notices_are_bounded() {
        let mut session = RoomSession::new("general", "alice", "Alice");
        for i in 0..10 {
            session.handle_event(ChatEvent::Status {
                msg: format!("notice {i}"),
            });
        }
        let notices: Vec<_> = session.notices().collect();
        assert_eq!(notices.len(), MAX_NOTICES);
        assert_eq!(notices[0], "notice 5");
    }
}
