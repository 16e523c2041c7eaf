//! SSD1306 OLED as a character display.

use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use super::display::{CharDisplay, GraphicsCharDisplay};

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Panel<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// 128×64 OLED seen as a 6 × 21 character grid.
///
/// Drawing goes to the driver's frame buffer; `flush` sends it over I²C.
pub struct OledDisplay<I2C> {
    grid: GraphicsCharDisplay<Panel<I2C>>,
}

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> OledDisplay<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut panel = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    if panel.init().is_err() {
        warn!("Display: SSD1306 init failed");
    }
    panel.clear_buffer();
    let _ = panel.flush();
    OledDisplay {
        grid: GraphicsCharDisplay::new(panel),
    }
}

impl<I2C> CharDisplay for OledDisplay<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    type Error = <GraphicsCharDisplay<Panel<I2C>> as CharDisplay>::Error;

    fn rows(&self) -> u8 {
        self.grid.rows()
    }

    fn columns(&self) -> u8 {
        self.grid.columns()
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Self::Error> {
        self.grid.set_cursor(row, col)
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        self.grid.write_str(text)
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.grid.clear()
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.grid.target_mut().flush()
    }
}
