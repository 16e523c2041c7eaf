//! Application-wide constants and runtime menu configuration.
//!
//! Display geometry, timing parameters and buffer capacities live here so
//! they can be tuned in one place. `MenuConfig` carries the values a
//! controller actually runs with; its `Default` is built from the constants.

// Display

/// Rows of the default character display (HD44780-style 20×4).
pub const DISPLAY_ROWS: u8 = 4;

/// Columns of the default character display.
pub const DISPLAY_COLUMNS: u8 = 20;

/// Widest row any supported character display offers.
pub const MAX_COLUMNS: usize = 40;

/// Byte capacity of one rendered row (4 bytes per UTF-8 character).
pub const ROW_CAPACITY: usize = MAX_COLUMNS * 4;

/// Glyph drawn in column 0 next to the selected entry.
pub const CURSOR_GLYPH: &str = ">";

/// Column where entry text starts; column 0 is reserved for the cursor glyph.
pub const TEXT_COLUMN: u8 = 1;

// Input

/// Button debounce window (ms). Presses closer together are ignored.
pub const BUTTON_DEBOUNCE_MS: u32 = 300;

/// Depth of the hand-off between input sources and the control loop.
///
/// One slot: anything arriving while an event is pending is dropped.
pub const EVENT_QUEUE_DEPTH: usize = 1;

// Marquee

/// Settle delay before an overflowing entry starts scrolling (ms).
pub const SCROLL_SETTLE_MS: u32 = 1_000;

/// Interval between two marquee frames (ms).
pub const SCROLL_TICK_MS: u32 = 250;

/// Scheduler yields a canceller waits for the scroller to acknowledge.
pub const CANCEL_ACK_MAX_POLLS: usize = 64;

// Idle timeout

/// Seconds of inactivity before the root menu is restored. 0 disables it.
pub const MENU_TIMEOUT_SECS: u32 = 0;

/// Period of the idle supervisor tick (ms).
pub const TIMEOUT_TICK_MS: u32 = 1_000;

// Menus

/// Commands a single callback invocation may queue.
pub const MAX_CALLBACK_COMMANDS: usize = 4;

/// Runtime configuration of a menu controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuConfig {
    /// Seconds of inactivity before returning to the root menu (0 = never).
    pub timeout_secs: u32,
    /// Settle delay before scrolling starts (ms). Sent with every scroll job.
    pub scroll_settle_ms: u32,
    /// Interval between marquee frames (ms). Sent with every scroll job.
    pub scroll_tick_ms: u32,
    /// Keep the last marquee frame on screen instead of snapping back.
    pub preserve_scroll_position: bool,
}

impl MenuConfig {
    pub const fn new() -> Self {
        Self {
            timeout_secs: MENU_TIMEOUT_SECS,
            scroll_settle_ms: SCROLL_SETTLE_MS,
            scroll_tick_ms: SCROLL_TICK_MS,
            preserve_scroll_position: false,
        }
    }

    pub const fn with_timeout(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub const fn with_scroll_timing(mut self, settle_ms: u32, tick_ms: u32) -> Self {
        self.scroll_settle_ms = settle_ms;
        self.scroll_tick_ms = tick_ms;
        self
    }

    pub const fn with_preserved_scroll(mut self, preserve: bool) -> Self {
        self.preserve_scroll_position = preserve;
        self
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self::new()
    }
}
