//! Conversation view: the authoritative in-memory record of a room's
//! messages.
//!
//! One history fetch and a stream of live events are merged into a single
//! ordered, de-duplicated sequence. Messages keep their arrival order and
//! are never re-sorted by timestamp; the only reconciliation performed here
//! is duplicate-by-id rejection (the sender's optimistic copy and the
//! server's echo may both arrive). Reaction updates replace the tally
//! wholesale, and deletions are soft.

use std::collections::HashMap;

use crate::models::{Message, Reactions};

/// Outcome of appending a live message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    /// Appended at the end of the sequence. `date_separator` is true when
    /// the view layer must place a day separator before this message.
    Inserted { date_separator: bool },
    /// A message with this id is already in the record; nothing changed.
    Duplicate,
}

/// Outcome of a reaction or deletion update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apply {
    Applied,
    /// No message with that id is in the record. The caller drops the
    /// update; off-screen history is not retroactively fetched.
    NotFound,
}

/// One item of the rendered conversation: a day separator or a message.
#[derive(Debug, Clone, Copy)]
pub enum RenderItem<'a> {
    DateSeparator(&'a str),
    Message(&'a Message),
}

/// Ordered, de-duplicated record of a room's messages.
#[derive(Debug, Default)]
pub struct ConversationView {
    messages: Vec<Message>,
    /// Message id -> position in `messages`.
    index: HashMap<String, usize>,
    /// Calendar day of the most recently ingested message. Carries over
    /// from history into live appends so a day rollover produces exactly
    /// one new separator.
    last_date: Option<String>,
}

impl ConversationView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire record with a history fetch.
    ///
    /// Used once, on room join. Live events that raced the fetch must be
    /// buffered by the caller and replayed after this returns (see
    /// `RoomSession`). History entries repeating an already-seen id are
    /// skipped; id uniqueness holds per room.
    pub fn load_history(&mut self, history: Vec<Message>) {
        self.messages.clear();
        self.index.clear();
        self.last_date = None;

        for msg in history {
            if self.index.contains_key(&msg.id) {
                tracing::debug!("Skipping duplicate id {} in history", msg.id);
                continue;
            }
            self.last_date = Some(msg.date.clone());
            self.index.insert(msg.id.clone(), self.messages.len());
            self.messages.push(msg);
        }
    }

    /// Insert a message arriving from the live channel.
    ///
    /// Appends at the end of the sequence, never re-sorting by time. A
    /// message whose id is already present (e.g. already delivered by the
    /// history fetch) is rejected without mutation.
    pub fn append_live(&mut self, msg: Message) -> Append {
        if self.index.contains_key(&msg.id) {
            return Append::Duplicate;
        }

        let date_separator = self.last_date.as_deref() != Some(msg.date.as_str());
        self.last_date = Some(msg.date.clone());
        self.index.insert(msg.id.clone(), self.messages.len());
        self.messages.push(msg);

        Append::Inserted { date_separator }
    }

    /// Replace the reaction tallies for a message wholesale.
    ///
    /// Earlier updates for the same id are superseded, never merged: the
    /// server always sends the complete current state.
    pub fn apply_reaction_update(&mut self, message_id: &str, reactions: Reactions) -> Apply {
        match self.index.get(message_id) {
            Some(&pos) => {
                self.messages[pos].reactions = reactions;
                Apply::Applied
            }
            None => Apply::NotFound,
        }
    }

    /// Mark a message deleted, retaining its record (soft-delete).
    ///
    /// Idempotent: re-applying to an already-deleted message is a no-op
    /// success.
    pub fn apply_deletion(&mut self, message_id: &str) -> Apply {
        match self.index.get(message_id) {
            Some(&pos) => {
                self.messages[pos].deleted = true;
                Apply::Applied
            }
            None => Apply::NotFound,
        }
    }

    /// Lazy, restartable sequence of render items: date separators
    /// interleaved with messages, a separator exactly where the calendar
    /// day changes. Pure function of current state.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            rest: &self.messages,
            prev_date: None,
            pending: None,
        }
    }

    pub fn get(&self, message_id: &str) -> Option<&Message> {
        self.index.get(message_id).map(|&pos| &self.messages[pos])
    }

    /// Number of messages (separators not counted).
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Iterator over the rendered conversation. See
/// [`ConversationView::snapshot`].
pub struct Snapshot<'a> {
    rest: &'a [Message],
    prev_date: Option<&'a str>,
    /// Message whose separator was just emitted, due next.
    pending: Option<&'a Message>,
}

impl<'a> Iterator for Snapshot<'a> {
    type Item = RenderItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(msg) = self.pending.take() {
            return Some(RenderItem::Message(msg));
        }

        let (msg, rest) = self.rest.split_first()?;
        self.rest = rest;

        if self.prev_date != Some(msg.date.as_str()) {
            self.prev_date = Some(msg.date.as_str());
            self.pending = Some(msg);
            Some(RenderItem::DateSeparator(msg.date.as_str()))
        } else {
            Some(RenderItem::Message(msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reactions;
    use std::collections::BTreeSet;

    fn msg(id: &str, date: &str) -> Message {
        Message {
            id: id.to_string(),
            sender_id: "alice".to_string(),
            sender_name: "Alice".to_string(),
            text: Some(format!("text-{id}")),
            media: None,
            date: date.to_string(),
            time: "9:15 AM".to_string(),
            sent_by_local_user: false,
            deleted: false,
            reactions: Reactions::new(),
        }
    }

    fn ids(view: &ConversationView) -> Vec<String> {
        view.snapshot()
            .filter_map(|item| match item {
                RenderItem::Message(m) => Some(m.id.clone()),
                RenderItem::DateSeparator(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_append_after_history_preserves_arrival_order() {
        let mut view = ConversationView::new();
        view.load_history(vec![msg("h1", "Jan 1"), msg("h2", "Jan 1")]);

        // Live arrivals with out-of-order timestamps still append at the end.
        assert!(matches!(
            view.append_live(msg("l1", "Jan 1")),
            Append::Inserted { .. }
        ));
        assert!(matches!(
            view.append_live(msg("l2", "Jan 1")),
            Append::Inserted { .. }
        ));

        assert_eq!(ids(&view), vec!["h1", "h2", "l1", "l2"]);
    }

    #[test]
    fn test_duplicate_id_is_rejected_without_mutation() {
        let mut view = ConversationView::new();
        view.load_history(vec![msg("h1", "Jan 1")]);

        assert_eq!(view.append_live(msg("h1", "Jan 1")), Append::Duplicate);
        assert_eq!(view.len(), 1);

        // Echo of an optimistic send: same id arriving twice live.
        assert!(matches!(
            view.append_live(msg("l1", "Jan 1")),
            Append::Inserted { .. }
        ));
        assert_eq!(view.append_live(msg("l1", "Jan 1")), Append::Duplicate);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_snapshot_emits_separator_on_each_day_change() {
        let mut view = ConversationView::new();
        view.load_history(vec![
            msg("a", "Jan 1"),
            msg("b", "Jan 1"),
            msg("c", "Jan 2"),
        ]);

        let items: Vec<_> = view.snapshot().collect();
        assert_eq!(items.len(), 5);
        assert!(matches!(items[0], RenderItem::DateSeparator("Jan 1")));
        assert!(matches!(items[1], RenderItem::Message(m) if m.id == "a"));
        assert!(matches!(items[2], RenderItem::Message(m) if m.id == "b"));
        assert!(matches!(items[3], RenderItem::DateSeparator("Jan 2")));
        assert!(matches!(items[4], RenderItem::Message(m) if m.id == "c"));
    }

    #[test]
    fn test_snapshot_is_restartable() {
        let mut view = ConversationView::new();
        view.load_history(vec![msg("a", "Jan 1"), msg("b", "Jan 2")]);

        let first: usize = view.snapshot().count();
        let second: usize = view.snapshot().count();
        assert_eq!(first, 4);
        assert_eq!(second, 4);
    }

    #[test]
    fn test_live_day_rollover_carries_history_date() {
        let mut view = ConversationView::new();
        view.load_history(vec![msg("h1", "Jan 1")]);

        // Same day as the end of history: no separator.
        assert_eq!(
            view.append_live(msg("l1", "Jan 1")),
            Append::Inserted {
                date_separator: false
            }
        );
        // New day: exactly one separator.
        assert_eq!(
            view.append_live(msg("l2", "Jan 2")),
            Append::Inserted {
                date_separator: true
            }
        );
        // And not again for the next message on that day.
        assert_eq!(
            view.append_live(msg("l3", "Jan 2")),
            Append::Inserted {
                date_separator: false
            }
        );
    }

    #[test]
    fn test_first_live_message_into_empty_view_needs_separator() {
        let mut view = ConversationView::new();
        assert_eq!(
            view.append_live(msg("l1", "Jan 1")),
            Append::Inserted {
                date_separator: true
            }
        );
    }

    #[test]
    fn test_reaction_update_replaces_not_merges() {
        let mut view = ConversationView::new();
        view.load_history(vec![msg("m1", "Jan 1")]);

        let mut first = Reactions::new();
        first.insert(
            "\u{1F44D}".to_string(),
            BTreeSet::from(["a".to_string()]),
        );
        assert_eq!(view.apply_reaction_update("m1", first), Apply::Applied);

        let mut second = Reactions::new();
        second.insert(
            "\u{1F44D}".to_string(),
            BTreeSet::from(["a".to_string(), "b".to_string()]),
        );
        assert_eq!(view.apply_reaction_update("m1", second), Apply::Applied);

        let reactions = &view.get("m1").unwrap().reactions;
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions["\u{1F44D}"].len(), 2);
    }

    #[test]
    fn test_reaction_update_for_unknown_id_is_not_found() {
        let mut view = ConversationView::new();
        assert_eq!(
            view.apply_reaction_update("ghost", Reactions::new()),
            Apply::NotFound
        );
    }

    #[test]
    fn test_deletion_is_soft_and_idempotent() {
        let mut view = ConversationView::new();
        view.load_history(vec![msg("m1", "Jan 1"), msg("m2", "Jan 1")]);

        assert_eq!(view.apply_deletion("m1"), Apply::Applied);
        assert_eq!(view.apply_deletion("m1"), Apply::Applied);
        assert_eq!(view.apply_deletion("ghost"), Apply::NotFound);

        // Soft: the record (and its content) survives.
        let deleted = view.get("m1").unwrap();
        assert!(deleted.deleted);
        assert!(deleted.text.is_some());
        assert_eq!(view.len(), 2);
        assert_eq!(ids(&view), vec!["m1", "m2"]);
    }

    #[test]
    fn test_load_history_replaces_previous_record() {
        let mut view = ConversationView::new();
        view.load_history(vec![msg("old", "Jan 1")]);
        view.load_history(vec![msg("new", "Feb 2")]);

        assert_eq!(view.len(), 1);
        assert!(view.get("old").is_none());
        assert!(view.get("new").is_some());
        // The carried date is the new history's, not the old one's.
        assert_eq!(
            view.append_live(msg("l1", "Feb 2")),
            Append::Inserted {
                date_separator: false
            }
        );
    }
}
