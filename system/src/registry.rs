use std::collections::HashMap;

use crate::message::{Point, User};
use crate::types::ConnectionId;

/// The connection registry and the per-connection stroke store, keyed by the
/// same connection identity. Entries in both maps are created together on an
/// accepted join and removed together on disconnect.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    users: HashMap<ConnectionId, User>,
    points: HashMap<ConnectionId, Vec<Point>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            points: HashMap::new(),
        }
    }

    pub fn insert(&mut self, user: User) {
        self.points.insert(user.id, Vec::new());
        self.users.insert(user.id, user);
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<User> {
        self.points.remove(connection_id);
        self.users.remove(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.users.contains_key(connection_id)
    }

    pub fn user(&self, connection_id: &ConnectionId) -> Option<&User> {
        self.users.get(connection_id)
    }

    pub fn user_mut(&mut self, connection_id: &ConnectionId) -> Option<&mut User> {
        self.users.get_mut(connection_id)
    }

    pub fn users(&self) -> &HashMap<ConnectionId, User> {
        &self.users
    }

    /// Point lists grow without bound for the life of a connection. The whole
    /// `Vec` is handed out so a future eviction layer could bound it without
    /// changing callers.
    pub fn points(&self, connection_id: &ConnectionId) -> Option<&Vec<Point>> {
        self.points.get(connection_id)
    }

    pub fn points_mut(&mut self, connection_id: &ConnectionId) -> Option<&mut Vec<Point>> {
        self.points.get_mut(connection_id)
    }

    /// Deep copy of both maps, as sent to a newly joined connection.
    pub fn snapshot(
        &self,
    ) -> (
        HashMap<ConnectionId, User>,
        HashMap<ConnectionId, Vec<Point>>,
    ) {
        (self.users.clone(), self.points.clone())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
