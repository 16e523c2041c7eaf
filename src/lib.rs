//! Library interface for rotary-menu.
//!
//! A scrollable single-selection menu for small character displays, driven
//! by a rotary encoder and a push button. All logic lives here so it can be
//! tested on the host; the embedded binary (`main.rs`, feature `embedded`)
//! only wires it to the nRF52840 peripherals.
//!
//! Usage: `cargo test` (host, `std` feature on by default)
//!
//! ```text
//! encoder/button tasks ──offer──▶ InputArbiter ──admit──▶ MenuController ──▶ CharDisplay
//!                                      ▲                       │
//!            MarqueeScroller ──frame───┤                       └─start/cancel─▶ MarqueeScroller
//!          TimeoutSupervisor ──tick────┘
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

// fmt must come first so its macros are visible everywhere below.
#[macro_use]
mod fmt;

pub mod arbiter;
pub mod config;
pub mod error;
pub mod marquee;
pub mod menu;
pub mod timeout;
pub mod ui;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use arbiter::{InputArbiter, InputSink};
pub use config::MenuConfig;
pub use error::Error;
pub use marquee::{MarqueeScroller, ScrollPhase};
pub use menu::browser::{FileMenu, FileSystem, MemoryFileSystem};
pub use menu::controller::MenuController;
pub use menu::{Menu, MenuEvent, MenuFlags, MenuHandle, MenuId};
#[cfg(feature = "std")]
pub use menu::std_fs::StdFileSystem;
pub use timeout::TimeoutSupervisor;
pub use ui::display::{BufferDisplay, CharDisplay};
pub use ui::slot::{Affix, Entry, Field};
pub use ui::{Direction, InputEvent};

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
