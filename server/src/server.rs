use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc::{channel, Sender};

use system::{ChatMessage, ConnectionId, SessionCommand, SessionEvent, Timestamp};

use crate::admin::{AdminCommand, SessionDescription, UserDescription};
use crate::connection::{ConnectionCommand, ConnectionEvent};
use crate::connection_tx_storage::ConnectionTxStorage;
use crate::server_state::ServerState;

pub type ServerTx = Sender<ServerCommand>;

#[derive(Debug)]
pub enum ServerCommand {
    ConnectionCommand(ConnectionCommand),
    AdminCommand(AdminCommand),
}

/// The session coordinator: the only writer of authoritative state. Runs on
/// one task, processing each command to completion before the next, so
/// events from the same connection are broadcast in arrival order.
struct Server {
    server_state: ServerState,
    connections: ConnectionTxStorage,
}

impl Server {
    fn new() -> Self {
        Self {
            server_state: ServerState::new(),
            connections: ConnectionTxStorage::new(),
        }
    }

    async fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::ConnectionCommand(command) => {
                self.handle_connection_command(command).await
            }
            ServerCommand::AdminCommand(command) => self.handle_admin_command(command),
        }
    }

    async fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { tx } => {
                let connection_id = self.server_state.create_connection();
                self.connections.insert(connection_id, tx);
                self.connections
                    .send(&connection_id, ConnectionEvent::Connected { connection_id })
                    .await;
                log::info!("Connection {} opened", connection_id);
            }
            ConnectionCommand::Disconnect { from } => {
                let user = self.server_state.remove(&from);
                self.connections.remove(&from);
                // Peers get a leave notice even when the connection never
                // joined; see DESIGN.md. The sender's tx is already gone, so
                // a full broadcast reaches everyone else.
                self.connections.broadcast(SessionEvent::UserLeft(from)).await;
                match user {
                    Some(user) => log::info!("Connection {} ({}) left", from, user.username),
                    None => log::info!("Connection {} closed before joining", from),
                }
            }
            ConnectionCommand::SessionCommand { from, command } => {
                self.handle_session_command(from, command).await
            }
        }
    }

    async fn handle_session_command(&mut self, from: ConnectionId, command: SessionCommand) {
        match command {
            SessionCommand::Join { username } => {
                if let Some(user) = self.server_state.join(from, username) {
                    let (users, points) = self.server_state.registry.snapshot();
                    self.connections
                        .send(
                            &from,
                            ConnectionEvent::SessionEvent(SessionEvent::Init { users, points }),
                        )
                        .await;
                    self.connections
                        .broadcast_except(&from, SessionEvent::UserJoined(user.clone()))
                        .await;
                    log::info!("Connection {} joined as {:?}", from, user.username);
                } else {
                    log::debug!("Ignoring duplicate join from {}", from);
                }
            }
            SessionCommand::UpdateUser { username } => {
                if let Some(user) = self.server_state.rename(from, username) {
                    self.connections
                        .broadcast(SessionEvent::UserUpdated(user))
                        .await;
                }
            }
            SessionCommand::Cursor { x, y, color, width } => {
                let now = now_ms();
                if let Some((user, point)) = self.server_state.cursor(from, now, x, y, color, width)
                {
                    let color = point.color().map(str::to_owned);
                    let width = point.width();
                    self.connections
                        .broadcast(SessionEvent::Cursor { user, color, width })
                        .await;
                }
            }
            SessionCommand::Chat { message } => {
                if let Some((user, message)) = self.server_state.chat(&from, message) {
                    self.connections
                        .broadcast(SessionEvent::Chat(ChatMessage { user, message }))
                        .await;
                }
            }
        }
    }

    fn handle_admin_command(&mut self, command: AdminCommand) {
        match command {
            AdminCommand::GetSessionState { tx } => {
                let registry = &self.server_state.registry;
                let mut users: Vec<_> = registry
                    .users()
                    .values()
                    .map(|user| UserDescription {
                        id: user.id,
                        username: user.username.clone(),
                        stroke_points: registry.points(&user.id).map(Vec::len).unwrap_or(0),
                    })
                    .collect();
                users.sort_by_key(|user| user.id);
                if tx.send(SessionDescription { users }).is_err() {
                    log::warn!("Status request abandoned before reply");
                }
            }
        }
    }
}

fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}

pub fn spawn_server() -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ServerCommand>(16);

    tokio::spawn(async move {
        let mut server = Box::new(Server::new());

        while let Some(command) = srv_rx.recv().await {
            server.handle_command(command).await;
        }
    });

    srv_tx
}
