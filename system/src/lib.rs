pub extern crate serde;
pub extern crate bincode;
pub extern crate serde_json;

mod client_mirror;
mod message;
mod registry;
mod render;
mod types;
mod username;

pub use client_mirror::*;
pub use message::*;
pub use registry::*;
pub use render::*;
pub use types::*;
pub use username::*;
