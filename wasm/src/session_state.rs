use system::{
    materialize_frame, materialize_user_list, serde_json, ClientMirror, ConnectionId, SessionEvent,
};

/// Wraps the mirror for the browser shell: events in, JSON out. The shell
/// drives `tick` from its own 60 Hz timer, independent of network arrival.
pub struct SessionState {
    mirror: ClientMirror,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            mirror: ClientMirror::new(),
        }
    }

    pub fn handle_session_event(&mut self, event: SessionEvent) {
        self.mirror.handle_session_event(event);
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.mirror.local_id()
    }

    /// One render tick: advance interpolation, then hand the shell a frame
    /// for the current viewport.
    pub fn tick(&mut self, viewport_width: f32, viewport_height: f32) -> String {
        self.mirror.step_interpolation();
        let frame = materialize_frame(&self.mirror, viewport_width, viewport_height);
        serde_json::to_string(&frame).expect("must succeed")
    }

    /// Roster JSON, only when it changed since the last call.
    pub fn consume_user_list(&mut self) -> Option<String> {
        if self.mirror.take_user_list_invalidation() {
            serde_json::to_string(&materialize_user_list(&self.mirror)).ok()
        } else {
            None
        }
    }

    /// The full chat history; the list only ever grows.
    pub fn chat_log(&self) -> String {
        serde_json::to_string(self.mirror.chat()).expect("must succeed")
    }
}
