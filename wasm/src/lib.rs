mod session_state;
mod utils;

use session_state::SessionState;
use system::{bincode, serde_json, ConnectionId, SessionCommand, SessionEvent};
use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen]
pub struct CanvasSession {
    state: SessionState,
}

#[wasm_bindgen]
impl CanvasSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        utils::set_panic_hook();

        CanvasSession {
            state: SessionState::new(),
        }
    }

    /// Encode an outbound command written as JSON by the shell into its wire
    /// form. `None` when the JSON is not a valid command.
    pub fn session_command_from_json(&self, json: String) -> Option<Box<[u8]>> {
        let command = serde_json::from_str::<SessionCommand>(&json).ok()?;
        bincode::serialize(&command).ok().map(Vec::into_boxed_slice)
    }

    /// Apply one inbound wire frame to the mirror. Undecodable frames are
    /// dropped; there is nothing the shell could do with them.
    pub fn handle_event(&mut self, bytes: &[u8]) {
        match bincode::deserialize::<SessionEvent>(bytes) {
            Ok(event) => self.state.handle_session_event(event),
            Err(_) => log::warn!("Ignoring undecodable event frame"),
        }
    }

    /// Debugging aid: the JSON form of a wire frame.
    pub fn translate_event_to_json(&self, bytes: &[u8]) -> Option<String> {
        let event = bincode::deserialize::<SessionEvent>(bytes).ok()?;
        serde_json::to_string(&event).ok()
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.state.connection_id()
    }

    pub fn tick(&mut self, viewport_width: f32, viewport_height: f32) -> String {
        self.state.tick(viewport_width, viewport_height)
    }

    pub fn consume_user_list(&mut self) -> Option<String> {
        self.state.consume_user_list()
    }

    pub fn chat_log(&self) -> String {
        self.state.chat_log()
    }
}
