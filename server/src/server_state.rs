use std::num::Wrapping;

use system::{
    resolve_username, sanitize_username, ConnectionId, Point, SessionRegistry, Timestamp, User,
    CURSOR_MIN_INTERVAL_MS, DEFAULT_POINT_WIDTH, MAX_CHAT_LEN,
};

/// Authoritative session state plus the connection id source. All mutation
/// happens on the single server task, so no locking. Each method returns the
/// data the broadcast layer needs, or `None` when the event must be silently
/// ignored.
pub struct ServerState {
    connection_id_source: Wrapping<ConnectionId>,
    pub registry: SessionRegistry,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            connection_id_source: Wrapping(0),
            registry: SessionRegistry::new(),
        }
    }

    pub fn create_connection(&mut self) -> ConnectionId {
        self.connection_id_source += Wrapping(1);
        self.connection_id_source.0
    }

    /// Registers a user for the connection, resolving name collisions.
    /// A second join on an active connection is a no-op.
    pub fn join(&mut self, id: ConnectionId, requested: Option<String>) -> Option<User> {
        if self.registry.contains(&id) {
            return None;
        }
        let candidate = sanitize_username(requested.as_deref());
        let username = resolve_username(&candidate, self.registry.users(), id);
        let user = User::new(id, username);
        self.registry.insert(user.clone());
        Some(user)
    }

    /// Recomputes the username; `None` when the record did not change, so
    /// identical updates cause no broadcast.
    pub fn rename(&mut self, id: ConnectionId, requested: Option<String>) -> Option<User> {
        let prev = self.registry.user(&id)?.clone();
        let candidate = match requested.as_deref() {
            Some(name) if !name.is_empty() => sanitize_username(Some(name)),
            _ => prev.username.clone(),
        };
        let username = resolve_username(&candidate, self.registry.users(), id);

        let user = self.registry.user_mut(&id)?;
        user.username = username;
        if *user != prev {
            Some(user.clone())
        } else {
            None
        }
    }

    /// Rate-limited cursor/draw update. Absent coordinates keep the previous
    /// position, an absent width keeps the previous point's width, an absent
    /// color is a pen lift. `now` is supplied by the caller so the 20ms
    /// floor is testable.
    pub fn cursor(
        &mut self,
        id: ConnectionId,
        now: Timestamp,
        x: Option<f32>,
        y: Option<f32>,
        color: Option<String>,
        width: Option<f32>,
    ) -> Option<(User, Point)> {
        let prev_width = self
            .registry
            .points(&id)?
            .last()
            .map(Point::width)
            .unwrap_or(DEFAULT_POINT_WIDTH);

        let user = self.registry.user_mut(&id)?;
        if now.saturating_sub(user.last_update) < CURSOR_MIN_INTERVAL_MS {
            return None;
        }
        user.last_update = now;
        user.x = x.unwrap_or(user.x);
        user.y = y.unwrap_or(user.y);

        let point = Point(user.x, user.y, color, width.unwrap_or(prev_width));
        let user = user.clone();
        self.registry.points_mut(&id)?.push(point.clone());
        Some((user, point))
    }

    /// Empty messages are dropped; text is cut at the chat limit on a char
    /// boundary.
    pub fn chat(&self, id: &ConnectionId, message: String) -> Option<(User, String)> {
        if message.is_empty() {
            return None;
        }
        let user = self.registry.user(id)?.clone();
        let message = message.chars().take(MAX_CHAT_LEN).collect();
        Some((user, message))
    }

    /// Disconnect cleanup. `None` when the connection never joined.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<User> {
        self.registry.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_keeps_usernames_pairwise_distinct_across_joins() {
        let mut state = ServerState::new();
        let a = state.create_connection();
        let b = state.create_connection();
        let c = state.create_connection();

        assert_eq!(state.join(a, Some("bob".into())).unwrap().username, "bob");
        assert_eq!(state.join(b, Some("bob".into())).unwrap().username, "bob1");
        assert_eq!(state.join(c, Some("bob".into())).unwrap().username, "bob2");

        let mut names: Vec<_> = state
            .registry
            .users()
            .values()
            .map(|u| u.username.clone())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn it_ignores_a_second_join_on_an_active_connection() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        state.join(id, Some("alice".into())).unwrap();
        state
            .cursor(id, 100, Some(10.0), Some(10.0), Some("#000".into()), None)
            .unwrap();

        assert!(state.join(id, Some("other".into())).is_none());
        assert_eq!(state.registry.user(&id).unwrap().username, "alice");
        assert_eq!(state.registry.points(&id).unwrap().len(), 1);
    }

    #[test]
    fn it_defaults_missing_usernames() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        assert_eq!(state.join(id, None).unwrap().username, "Anonymous");
    }

    #[test]
    fn it_suppresses_no_op_renames() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        state.join(id, Some("alice".into())).unwrap();

        assert!(state.rename(id, Some("alice".into())).is_none());
        assert!(state.rename(id, None).is_none());
        assert_eq!(
            state.rename(id, Some("carol".into())).unwrap().username,
            "carol"
        );
    }

    #[test]
    fn it_resolves_collisions_on_rename() {
        let mut state = ServerState::new();
        let a = state.create_connection();
        let b = state.create_connection();
        state.join(a, Some("alice".into())).unwrap();
        state.join(b, Some("bob".into())).unwrap();

        let renamed = state.rename(b, Some("alice".into())).unwrap();
        assert_eq!(renamed.username, "alice1");
    }

    #[test]
    fn it_rate_limits_cursor_events() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        state.join(id, Some("alice".into())).unwrap();

        assert!(state
            .cursor(id, 100, Some(1.0), Some(1.0), Some("#000".into()), None)
            .is_some());
        // 19ms later: dropped, no state change.
        assert!(state
            .cursor(id, 119, Some(2.0), Some(2.0), Some("#000".into()), None)
            .is_none());
        assert_eq!(state.registry.points(&id).unwrap().len(), 1);
        assert_eq!(state.registry.user(&id).unwrap().last_update, 100);
        // 20ms later: accepted.
        assert!(state
            .cursor(id, 120, Some(3.0), Some(3.0), Some("#000".into()), None)
            .is_some());
        assert_eq!(state.registry.points(&id).unwrap().len(), 2);
    }

    #[test]
    fn it_falls_back_to_previous_values_for_absent_fields() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        state.join(id, Some("alice".into())).unwrap();

        let (_, first) = state
            .cursor(id, 100, Some(10.0), Some(20.0), Some("#000".into()), Some(7.0))
            .unwrap();
        assert_eq!(first.width(), 7.0);

        // Absent x/width keep the prior values; explicit 0.0 is respected.
        let (user, second) = state
            .cursor(id, 200, None, Some(0.0), Some("#000".into()), None)
            .unwrap();
        assert_eq!(user.x, 10.0);
        assert_eq!(user.y, 0.0);
        assert_eq!(second.width(), 7.0);
    }

    #[test]
    fn it_defaults_width_for_the_first_point() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        state.join(id, Some("alice".into())).unwrap();

        let (_, point) = state
            .cursor(id, 100, Some(1.0), Some(1.0), Some("#000".into()), None)
            .unwrap();
        assert_eq!(point.width(), DEFAULT_POINT_WIDTH);
    }

    #[test]
    fn it_records_pen_lifts_as_null_color_points() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        state.join(id, Some("alice".into())).unwrap();

        state
            .cursor(id, 100, Some(10.0), Some(10.0), Some("#000".into()), Some(5.0))
            .unwrap();
        state.cursor(id, 130, None, None, None, Some(5.0)).unwrap();
        state
            .cursor(id, 160, Some(20.0), Some(20.0), Some("#000".into()), Some(5.0))
            .unwrap();

        let points = state.registry.points(&id).unwrap();
        assert_eq!(points.len(), 3);
        assert!(points[1].is_pen_lift());
    }

    #[test]
    fn it_truncates_chat_to_the_limit() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        state.join(id, Some("alice".into())).unwrap();

        let (_, message) = state.chat(&id, "x".repeat(300)).unwrap();
        assert_eq!(message.chars().count(), 256);
        assert!(state.chat(&id, String::new()).is_none());
    }

    #[test]
    fn it_truncates_multi_byte_chat_on_char_boundaries() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        state.join(id, Some("alice".into())).unwrap();

        let (_, message) = state.chat(&id, "é".repeat(300)).unwrap();
        assert_eq!(message.chars().count(), 256);
        // Two bytes per char; no char was split.
        assert_eq!(message.len(), 512);
        assert!(message.chars().all(|c| c == 'é'));

        let (_, message) = state.chat(&id, "画".repeat(300)).unwrap();
        assert_eq!(message.chars().count(), 256);
        assert_eq!(message.len(), 256 * 3);
    }

    #[test]
    fn it_ignores_events_before_join() {
        let mut state = ServerState::new();
        let id = state.create_connection();

        assert!(state
            .cursor(id, 100, Some(1.0), Some(1.0), None, None)
            .is_none());
        assert!(state.chat(&id, "hello".into()).is_none());
        assert!(state.rename(id, Some("alice".into())).is_none());
    }

    #[test]
    fn it_cleans_up_on_remove() {
        let mut state = ServerState::new();
        let id = state.create_connection();
        state.join(id, Some("alice".into())).unwrap();
        state
            .cursor(id, 100, Some(1.0), Some(1.0), Some("#000".into()), None)
            .unwrap();

        assert!(state.remove(&id).is_some());
        assert!(!state.registry.contains(&id));
        assert!(state.registry.points(&id).is_none());
        // Disconnect before join: nothing to remove.
        assert!(state.remove(&id).is_none());
    }
}
