//! User interface subsystem - character display + rotary encoder + button.
//!
//! The control loop reacts to discrete input events and renders the menu
//! window on a character display.
//!
//! ## Components
//!
//! - **Display**: any `rows × columns` character grid (`CharDisplay`)
//! - **Slots**: entry formatting into fixed-width rows
//! - **Navigation**: index / cursor / shift windowing
//! - **Encoder**: quadrature decoding into detents
//! - **Buttons**: press debouncing
//! - **OLED**: SSD1306 panel as a character grid (feature `embedded`)

pub mod buttons;
pub mod display;
pub mod encoder;
pub mod navigation;
#[cfg(feature = "embedded")]
pub mod oled;
pub mod slot;

/// Direction of one encoder detent.
///
/// `Previous` moves the selection towards index 0, `Next` towards the end
/// of the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Previous,
    Next,
}

/// Discrete input events after decoding and debouncing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// The encoder moved one detent.
    Rotate(Direction),
    /// The push button was pressed.
    Press,
}
