//! Unified error type for rotary-menu.
//!
//! All error variants carry only fixed-size data so the type stays `Copy`
//! and cheap to log. Implements `defmt::Format` for on-target logging when
//! the `defmt` feature is enabled.

use core::fmt;

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Display
    /// A cursor move, write or clear on the display failed.
    Display,

    // Menus
    /// A browse depth below zero was requested.
    InvalidDepth(i32),

    /// A menu id that was never registered with the controller.
    UnknownMenu(u8),

    /// The controller cannot register more menus.
    TooManyMenus,

    /// A directory could not be opened at all.
    Filesystem,

    // Marquee
    /// The scroller did not acknowledge a cancel request in time.
    ScrollerUnresponsive,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Display => f.write_str("display write failed"),
            Error::InvalidDepth(depth) => write!(f, "invalid browse depth {}", depth),
            Error::UnknownMenu(id) => write!(f, "unknown menu id {}", id),
            Error::TooManyMenus => f.write_str("menu registry is full"),
            Error::Filesystem => f.write_str("directory could not be read"),
            Error::ScrollerUnresponsive => f.write_str("scroller did not acknowledge cancel"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
