mod admin;
pub mod connection;
mod connection_tx_storage;
pub mod handlers;
pub mod server;
mod server_state;
