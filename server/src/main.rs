use actix_web::{App, HttpServer};

use server::handlers;
use server::server::spawn_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let srv_tx = spawn_server();
    let bind = std::env::var("BIND").unwrap_or_else(|_| "127.0.0.1:8080".into());

    HttpServer::new(move || {
        App::new()
            .data(srv_tx.clone())
            .configure(handlers::root)
    })
    .bind(bind)?
    .run()
    .await
}
