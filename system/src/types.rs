pub type ConnectionId = u16;

/// Wall-clock milliseconds. `0` means "never updated".
pub type Timestamp = u64;

pub const MAX_USERNAME_LEN: usize = 24;
pub const MAX_CHAT_LEN: usize = 256;

/// Minimum interval between accepted cursor events per connection.
pub const CURSOR_MIN_INTERVAL_MS: Timestamp = 20;

pub const DEFAULT_USERNAME: &str = "Anonymous";
pub const DEFAULT_POINT_WIDTH: f32 = 5.0;

/// Per-tick lerp factor for cursor smoothing. Single-step, not
/// time-integrated, so perceived smoothness depends on tick cadence.
pub const INTERPOLATION_FACTOR: f32 = 0.5;

/// Cursor glyph size in pixels.
pub const CURSOR_SIZE: f32 = 15.0;
