use std::collections::HashMap;

use crate::message::{ChatMessage, Point, SessionEvent, User};
use crate::types::{ConnectionId, INTERPOLATION_FACTOR};

/// A `User` extended with the client-only smoothing fields. `display_*` is
/// what gets painted, `target_*` is the latest authoritative position; only
/// the interpolation step moves `display_*`.
#[derive(Debug, Clone)]
pub struct MirrorUser {
    pub user: User,
    pub display_x: f32,
    pub display_y: f32,
    pub target_x: f32,
    pub target_y: f32,
}

impl MirrorUser {
    fn new(user: User) -> Self {
        Self {
            display_x: user.x,
            display_y: user.y,
            target_x: user.x,
            target_y: user.y,
            user,
        }
    }
}

/// Client-local replica of the server's registry and stroke store, updated
/// only by inbound session events. Never authoritative: applying an echo of
/// your own cursor/chat/rename merely restates what the server accepted.
#[derive(Debug, Default)]
pub struct ClientMirror {
    local_id: Option<ConnectionId>,
    users: HashMap<ConnectionId, MirrorUser>,
    points: HashMap<ConnectionId, Vec<Point>>,
    chat: Vec<ChatMessage>,
    user_list_invalidated: bool,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_id(&self) -> Option<ConnectionId> {
        self.local_id
    }

    pub fn users(&self) -> &HashMap<ConnectionId, MirrorUser> {
        &self.users
    }

    pub fn points(&self) -> &HashMap<ConnectionId, Vec<Point>> {
        &self.points
    }

    /// Full chat history, append-only for the life of the session.
    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected { connection_id } => {
                log::debug!("Connected as {}", connection_id);
                self.local_id = Some(connection_id);
            }
            SessionEvent::Init { users, points } => {
                self.points = points;
                self.users = users
                    .into_iter()
                    .map(|(id, user)| (id, MirrorUser::new(user)))
                    .collect();
                // The snapshot may omit point lists for users who have not
                // drawn yet; every registered user gets one.
                for id in self.users.keys() {
                    self.points.entry(*id).or_insert_with(Vec::new);
                }
                self.user_list_invalidated = true;
            }
            SessionEvent::UserJoined(user) => {
                self.points.insert(user.id, Vec::new());
                self.users.insert(user.id, MirrorUser::new(user));
                self.user_list_invalidated = true;
            }
            SessionEvent::UserUpdated(user) => {
                if let Some(entry) = self.users.get_mut(&user.id) {
                    let moved = entry.user.x != user.x || entry.user.y != user.y;
                    if moved {
                        entry.target_x = user.x;
                        entry.target_y = user.y;
                    }
                    entry.user = user;
                } else {
                    self.points.entry(user.id).or_insert_with(Vec::new);
                    self.users.insert(user.id, MirrorUser::new(user));
                }
                self.user_list_invalidated = true;
            }
            SessionEvent::UserLeft(id) => {
                self.users.remove(&id);
                self.points.remove(&id);
                self.user_list_invalidated = true;
            }
            SessionEvent::Cursor { user, color, width } => {
                self.points
                    .entry(user.id)
                    .or_insert_with(Vec::new)
                    .push(Point(user.x, user.y, color, width));
                if let Some(entry) = self.users.get_mut(&user.id) {
                    // Only the target moves here; display is owned by the
                    // render loop.
                    entry.target_x = user.x;
                    entry.target_y = user.y;
                }
            }
            SessionEvent::Chat(message) => {
                self.chat.push(message);
            }
        }
    }

    /// One smoothing step: move every display position halfway to its
    /// target. Driven at the render cadence (60 Hz).
    pub fn step_interpolation(&mut self) {
        for entry in self.users.values_mut() {
            entry.display_x = lerp(entry.display_x, entry.target_x, INTERPOLATION_FACTOR);
            entry.display_y = lerp(entry.display_y, entry.target_y, INTERPOLATION_FACTOR);
        }
    }

    /// True once per roster change, so a shell only rebuilds the user list
    /// when membership or a name actually changed.
    pub fn take_user_list_invalidation(&mut self) -> bool {
        std::mem::replace(&mut self.user_list_invalidated, false)
    }
}

fn lerp(start: f32, end: f32, factor: f32) -> f32 {
    start + (end - start) * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_at(id: ConnectionId, name: &str, x: f32, y: f32) -> User {
        let mut user = User::new(id, name.into());
        user.x = x;
        user.y = y;
        user
    }

    #[test]
    fn it_seeds_display_and_target_on_join() {
        let mut mirror = ClientMirror::new();
        mirror.handle_session_event(SessionEvent::UserJoined(user_at(1, "alice", 30.0, 40.0)));

        let entry = &mirror.users()[&1];
        assert_eq!(entry.display_x, 30.0);
        assert_eq!(entry.target_y, 40.0);
        assert_eq!(mirror.points()[&1].len(), 0);
    }

    #[test]
    fn it_fills_missing_point_lists_on_init() {
        let mut users = HashMap::new();
        users.insert(1, user_at(1, "alice", 50.0, 50.0));
        users.insert(2, user_at(2, "bob", 50.0, 50.0));
        let mut points = HashMap::new();
        points.insert(1, vec![Point(1.0, 1.0, Some("#fff".into()), 5.0)]);

        let mut mirror = ClientMirror::new();
        mirror.handle_session_event(SessionEvent::Init { users, points });

        assert_eq!(mirror.points()[&1].len(), 1);
        assert_eq!(mirror.points()[&2].len(), 0);
        assert!(mirror.take_user_list_invalidation());
        assert!(!mirror.take_user_list_invalidation());
    }

    #[test]
    fn it_moves_target_but_not_display_on_cursor() {
        let mut mirror = ClientMirror::new();
        mirror.handle_session_event(SessionEvent::UserJoined(user_at(1, "alice", 50.0, 50.0)));
        mirror.handle_session_event(SessionEvent::Cursor {
            user: user_at(1, "alice", 80.0, 20.0),
            color: Some("#000".into()),
            width: 5.0,
        });

        let entry = &mirror.users()[&1];
        assert_eq!(entry.target_x, 80.0);
        assert_eq!(entry.display_x, 50.0);
        assert_eq!(mirror.points()[&1].len(), 1);
    }

    #[test]
    fn it_interpolates_display_halfway_per_step() {
        let mut mirror = ClientMirror::new();
        mirror.handle_session_event(SessionEvent::UserJoined(user_at(1, "alice", 0.0, 0.0)));
        mirror.handle_session_event(SessionEvent::Cursor {
            user: user_at(1, "alice", 100.0, 0.0),
            color: None,
            width: 5.0,
        });

        mirror.step_interpolation();
        assert_eq!(mirror.users()[&1].display_x, 50.0);
        mirror.step_interpolation();
        assert_eq!(mirror.users()[&1].display_x, 75.0);
    }

    #[test]
    fn it_keeps_display_on_rename_only_updates() {
        let mut mirror = ClientMirror::new();
        mirror.handle_session_event(SessionEvent::UserJoined(user_at(1, "alice", 50.0, 50.0)));
        mirror.handle_session_event(SessionEvent::Cursor {
            user: user_at(1, "alice", 90.0, 90.0),
            color: None,
            width: 5.0,
        });
        mirror.step_interpolation();
        let display_before = mirror.users()[&1].display_x;

        // Same position, new name: target/display derivation untouched.
        mirror.handle_session_event(SessionEvent::UserUpdated(user_at(1, "alice2", 90.0, 90.0)));
        let entry = &mirror.users()[&1];
        assert_eq!(entry.user.username, "alice2");
        assert_eq!(entry.display_x, display_before);
        assert_eq!(entry.target_x, 90.0);
    }

    #[test]
    fn it_invalidates_the_roster_only_on_membership_or_name_changes() {
        let mut mirror = ClientMirror::new();
        mirror.handle_session_event(SessionEvent::Connected { connection_id: 1 });
        assert!(!mirror.take_user_list_invalidation());

        mirror.handle_session_event(SessionEvent::UserJoined(user_at(2, "bob", 50.0, 50.0)));
        assert!(mirror.take_user_list_invalidation());

        // Cursor and chat traffic leaves the roster alone.
        mirror.handle_session_event(SessionEvent::Cursor {
            user: user_at(2, "bob", 10.0, 10.0),
            color: Some("#000".into()),
            width: 5.0,
        });
        mirror.handle_session_event(SessionEvent::Chat(ChatMessage {
            user: user_at(2, "bob", 10.0, 10.0),
            message: "hi".into(),
        }));
        assert!(!mirror.take_user_list_invalidation());

        mirror.handle_session_event(SessionEvent::UserUpdated(user_at(2, "bob2", 10.0, 10.0)));
        assert!(mirror.take_user_list_invalidation());

        mirror.handle_session_event(SessionEvent::UserLeft(2));
        assert!(mirror.take_user_list_invalidation());
        assert!(!mirror.take_user_list_invalidation());
    }

    #[test]
    fn it_removes_both_entries_on_user_left() {
        let mut mirror = ClientMirror::new();
        mirror.handle_session_event(SessionEvent::UserJoined(user_at(1, "alice", 50.0, 50.0)));
        mirror.handle_session_event(SessionEvent::UserLeft(1));

        assert!(mirror.users().is_empty());
        assert!(mirror.points().is_empty());
    }

    #[test]
    fn it_applies_self_echo_idempotently() {
        let mut mirror = ClientMirror::new();
        mirror.handle_session_event(SessionEvent::Connected { connection_id: 1 });
        mirror.handle_session_event(SessionEvent::UserJoined(user_at(1, "alice", 50.0, 50.0)));

        // The sender receives its own cursor event back; applying it must
        // only restate authoritative state.
        let echo = SessionEvent::Cursor {
            user: user_at(1, "alice", 10.0, 10.0),
            color: Some("#abc".into()),
            width: 3.0,
        };
        mirror.handle_session_event(echo.clone());
        let target_after_first = mirror.users()[&1].target_x;
        mirror.handle_session_event(echo);

        assert_eq!(mirror.users()[&1].target_x, target_after_first);
        assert_eq!(mirror.points()[&1].len(), 2);
    }

    #[test]
    fn it_accumulates_chat_without_pruning() {
        let mut mirror = ClientMirror::new();
        for i in 0..3 {
            mirror.handle_session_event(SessionEvent::Chat(ChatMessage {
                user: user_at(1, "alice", 50.0, 50.0),
                message: format!("hello {}", i),
            }));
        }
        assert_eq!(mirror.chat().len(), 3);
        assert_eq!(mirror.chat()[2].message, "hello 2");
    }
}
