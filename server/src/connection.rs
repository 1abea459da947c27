use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use actix_web_actors::ws::{CloseCode, CloseReason};

use system::{bincode, ConnectionId, SessionCommand, SessionEvent};

use crate::connection_tx_storage::ConnectionTx;
use crate::server::{ServerCommand, ServerTx};

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        tx: ConnectionTx,
    },
    Disconnect {
        from: ConnectionId,
    },
    SessionCommand {
        from: ConnectionId,
        command: SessionCommand,
    },
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { connection_id: ConnectionId },
    SessionEvent(SessionEvent),
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

enum ConnectionState {
    Idle,
    Connected(ConnectionId),
}

struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(32);

        self.srv_tx
            .try_send(ServerCommand::ConnectionCommand(ConnectionCommand::Connect {
                tx,
            }))
            .expect("server must not be closed yet");

        let addr = ctx.address().recipient();

        tokio::spawn(async move {
            let addr = addr;
            log::info!("connection green thread - started");
            while let Some(msg) = rx.recv().await {
                addr.try_send(ConnectionActorMessage(msg))
                    .expect("should have enough buffer")
            }
            log::info!("connection green thread - terminated");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Connected(id) = self.state {
            self.srv_tx
                .try_send(ServerCommand::ConnectionCommand(
                    ConnectionCommand::Disconnect { from: id },
                ))
                .expect("should have enough buffer");
        }

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Binary(bin)) => {
                log::debug!("Ingress size: {}", bin.len());
                if let ConnectionState::Connected(from) = self.state {
                    if let Ok(command) = bincode::deserialize::<SessionCommand>(&bin) {
                        log::debug!("Ingress {:?}", command);
                        self.srv_tx
                            .try_send(ServerCommand::ConnectionCommand(
                                ConnectionCommand::SessionCommand { from, command },
                            ))
                            .expect("should have enough buffer");
                    } else {
                        ctx.close(Some(CloseReason {
                            code: CloseCode::Invalid,
                            description: None,
                        }));
                    }
                }
            }
            Ok(ws::Message::Close(_)) => {
                // stopping() sends the Disconnect; it must happen exactly
                // once, so nothing is emitted here.
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        let connection_event = &msg.0;
        log::debug!("Egress {:?}", connection_event);
        match connection_event {
            ConnectionEvent::Connected { connection_id } => {
                self.state = ConnectionState::Connected(*connection_id);
                // The client needs its own id to suppress its own cursor.
                let handshake = SessionEvent::Connected {
                    connection_id: *connection_id,
                };
                let serialized = bincode::serialize(&handshake).expect("must succeed");
                ctx.binary(serialized);
            }
            ConnectionEvent::SessionEvent(event) => {
                let serialized = bincode::serialize(event).expect("must succeed");
                ctx.binary(serialized);
            }
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
) -> Result<HttpResponse, Error> {
    ws::start(
        ConnectionActor {
            srv_tx: srv_tx.get_ref().clone(),
            state: ConnectionState::Idle,
        },
        &req,
        stream,
    )
}
