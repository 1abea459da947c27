use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{ConnectionId, Timestamp};

/// Authoritative per-connection user record. Coordinates are percent of
/// viewport (0–100), so every client renders the same scene regardless of
/// window size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: ConnectionId,
    pub username: String,
    pub last_update: Timestamp,
    pub x: f32,
    pub y: f32,
}

impl User {
    pub fn new(id: ConnectionId, username: String) -> Self {
        Self {
            id,
            username,
            last_update: 0,
            x: 50.0,
            y: 50.0,
        }
    }
}

/// `(x, y, color, width)` in the same percent coordinate space.
/// `color == None` is the pen-lift sentinel: it breaks the stroke and is
/// never drawn itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point(pub f32, pub f32, pub Option<String>, pub f32);

impl Point {
    pub fn x(&self) -> f32 {
        self.0
    }

    pub fn y(&self) -> f32 {
        self.1
    }

    pub fn color(&self) -> Option<&str> {
        self.2.as_deref()
    }

    pub fn width(&self) -> f32 {
        self.3
    }

    pub fn is_pen_lift(&self) -> bool {
        self.2.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: User,
    pub message: String,
}

/// Client → server. Field absence has nullish-coalesce semantics: an absent
/// coordinate or width falls back to the previously stored value, while an
/// explicit `0` is respected. An absent cursor color means pen lift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionCommand {
    Join {
        username: Option<String>,
    },
    UpdateUser {
        username: Option<String>,
    },
    Cursor {
        x: Option<f32>,
        y: Option<f32>,
        color: Option<String>,
        width: Option<f32>,
    },
    Chat {
        message: String,
    },
}

/// Server → client. `Connected` is the transport handshake; everything else
/// mirrors a state change the coordinator accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    Connected {
        connection_id: ConnectionId,
    },
    Init {
        users: HashMap<ConnectionId, User>,
        points: HashMap<ConnectionId, Vec<Point>>,
    },
    UserJoined(User),
    UserUpdated(User),
    UserLeft(ConnectionId),
    Cursor {
        user: User,
        color: Option<String>,
        width: f32,
    },
    Chat(ChatMessage),
}
