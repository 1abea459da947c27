use serde::Serialize;
use system::ConnectionId;
use tokio::sync::oneshot::Sender;

#[derive(Debug)]
pub enum AdminCommand {
    GetSessionState { tx: Sender<SessionDescription> },
}

/// Read-only view of the live session for the status page.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDescription {
    pub users: Vec<UserDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDescription {
    pub id: ConnectionId,
    pub username: String,
    pub stroke_points: usize,
}
