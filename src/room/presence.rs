//! Presence state for the active room: online count and typing users.
//!
//! Both fields are transient and fully replaced by each inbound update;
//! nothing is merged. Updates tagged with another room id are ignored, so
//! stale broadcasts from a previously joined room cannot leak in.

/// Latest room-scoped presence, replace-on-update.
#[derive(Debug)]
pub struct PresenceTracker {
    active_room: String,
    local_user_id: String,
    online_count: u32,
    /// Typing user ids as last broadcast, local user excluded.
    typing_users: Vec<String>,
}

impl PresenceTracker {
    pub fn new(active_room: impl Into<String>, local_user_id: impl Into<String>) -> Self {
        Self {
            active_room: active_room.into(),
            local_user_id: local_user_id.into(),
            online_count: 0,
            typing_users: Vec::new(),
        }
    }

    /// Replace the online count. No-op when the update is for another room.
    pub fn set_online_count(&mut self, room: &str, count: u32) {
        if room != self.active_room {
            return;
        }
        self.online_count = count;
    }

    /// Replace the typing set. No-op when the update is for another room.
    ///
    /// The local user is filtered out before exposure; their own typing is
    /// never displayed back to them.
    pub fn set_typing_users(&mut self, room: &str, users: Vec<String>) {
        if room != self.active_room {
            return;
        }
        self.typing_users = users
            .into_iter()
            .filter(|u| *u != self.local_user_id)
            .collect();
    }

    /// Reset on transport disconnect: the server's counts are no longer
    /// current.
    pub fn reset(&mut self) {
        self.online_count = 0;
        self.typing_users.clear();
    }

    pub fn online_count(&self) -> u32 {
        self.online_count
    }

    pub fn typing_users(&self) -> &[String] {
        &self.typing_users
    }

    /// Display line for the typing indicator, or None when nobody (other
    /// than the local user) is typing.
    pub fn typing_line(&self) -> Option<String> {
        match self.typing_users.as_slice() {
            [] => None,
            [one] => Some(format!("{one} is typing...")),
            many => Some(format!("{} are typing...", many.join(", "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_for_other_rooms_are_ignored() {
        let mut presence = PresenceTracker::new("general", "alice");
        presence.set_online_count("general", 3);
        presence.set_online_count("random", 99);
        assert_eq!(presence.online_count(), 3);

        presence.set_typing_users("random", vec!["bob".to_string()]);
        assert!(presence.typing_line().is_none());
    }

    #[test]
    fn test_typing_set_is_replaced_not_merged() {
        let mut presence = PresenceTracker::new("general", "alice");
        presence.set_typing_users("general", vec!["bob".to_string(), "carol".to_string()]);
        presence.set_typing_users("general", vec!["bob".to_string()]);
        assert_eq!(presence.typing_users(), ["bob".to_string()]);
    }

    #[test]
    fn test_local_user_is_filtered_from_typing() {
        let mut presence = PresenceTracker::new("general", "alice");
        presence.set_typing_users("general", vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(presence.typing_line().as_deref(), Some("bob is typing..."));

        // Only the local user typing renders as nobody typing.
        presence.set_typing_users("general", vec!["alice".to_string()]);
        assert!(presence.typing_line().is_none());
    }

    #[test]
    fn test_typing_line_pluralizes() {
        let mut presence = PresenceTracker::new("general", "alice");
        presence.set_typing_users("general", vec!["bob".to_string(), "carol".to_string()]);
        assert_eq!(
            presence.typing_line().as_deref(),
            Some("bob, carol are typing...")
        );
    }

    #[test]
    fn test_reset_clears_both_fields() {
        let mut presence = PresenceTracker::new("general", "alice");
        presence.set_online_count("general", 5);
        presence.set_typing_users("general", vec!["bob".to_string()]);
        presence.reset();
        assert_eq!(presence.online_count(), 0);
        assert!(presence.typing_line().is_none());
    }
}
