use actix_web::error;
use actix_web::web::{self, HttpResponse};
use actix_web::Responder;
use actix_web::Result;
use askama_actix::Template;

use crate::admin::{AdminCommand, SessionDescription, UserDescription};
use crate::server::{ServerCommand, ServerTx};

#[derive(Template)]
#[template(path = "status.html")]
pub struct StatusTemplate {
    users: Vec<UserDescription>,
}

pub fn configure_status_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/status").route(web::get().to(status_page)))
        .service(web::resource("/status.json").route(web::get().to(status_json)));
}

async fn status_page(srv_tx: web::Data<ServerTx>) -> Result<impl Responder> {
    let description = fetch_session_state(&srv_tx).await?;
    Ok(StatusTemplate {
        users: description.users,
    })
}

async fn status_json(srv_tx: web::Data<ServerTx>) -> Result<impl Responder> {
    let description = fetch_session_state(&srv_tx).await?;
    Ok(HttpResponse::Ok().json(description))
}

async fn fetch_session_state(srv_tx: &web::Data<ServerTx>) -> Result<SessionDescription> {
    let (tx, rx) = tokio::sync::oneshot::channel::<SessionDescription>();

    srv_tx
        .get_ref()
        .clone()
        .send(ServerCommand::AdminCommand(AdminCommand::GetSessionState {
            tx,
        }))
        .await
        .map_err(|_| error::ErrorInternalServerError("Internal Server Error"))?;

    rx.await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))
}
