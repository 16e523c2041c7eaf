//! Character display abstraction and the two bundled implementations.
//!
//! - `BufferDisplay`: an in-memory grid, used by tests and simulators.
//! - `GraphicsCharDisplay`: a character grid drawn with `FONT_6X10` on any
//!   `embedded-graphics` target, e.g. the SSD1306 OLED in buffered mode.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

/// A `rows × columns` character grid.
///
/// Writes start at the cursor and advance it; characters past the last
/// column are dropped.
pub trait CharDisplay {
    type Error: Debug;

    fn rows(&self) -> u8;

    fn columns(&self) -> u8;

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Self::Error>;

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error>;

    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Push buffered changes to the panel. Unbuffered displays need nothing.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Error raised by `BufferDisplay` when a failure was injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFault;

/// One recorded `write_str` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub row: u8,
    pub col: u8,
    pub text: String,
}

/// In-memory character display.
#[derive(Debug, Clone)]
pub struct BufferDisplay {
    rows: u8,
    columns: u8,
    cells: Vec<char>,
    cursor: (u8, u8),
    history: Vec<WriteRecord>,
    fail_writes: bool,
}

impl BufferDisplay {
    pub fn new(rows: u8, columns: u8) -> Self {
        Self {
            rows,
            columns,
            cells: vec![' '; usize::from(rows) * usize::from(columns)],
            cursor: (0, 0),
            history: Vec::new(),
            fail_writes: false,
        }
    }

    /// Full text of one row, including the cursor column.
    pub fn row_text(&self, row: u8) -> String {
        let start = usize::from(row) * usize::from(self.columns);
        self.cells[start..start + usize::from(self.columns)]
            .iter()
            .collect()
    }

    /// Every write since construction or the last `clear_history`.
    pub fn history(&self) -> &[WriteRecord] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Make every following write fail until switched off again.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl CharDisplay for BufferDisplay {
    type Error = BufferFault;

    fn rows(&self) -> u8 {
        self.rows
    }

    fn columns(&self) -> u8 {
        self.columns
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Self::Error> {
        if row >= self.rows || col >= self.columns {
            return Err(BufferFault);
        }
        self.cursor = (row, col);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(BufferFault);
        }
        let (row, col) = self.cursor;
        self.history.push(WriteRecord {
            row,
            col,
            text: text.into(),
        });

        let mut col = col;
        for c in text.chars() {
            if col >= self.columns {
                break;
            }
            let cell = usize::from(row) * usize::from(self.columns) + usize::from(col);
            self.cells[cell] = c;
            col += 1;
        }
        self.cursor = (row, col);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(BufferFault);
        }
        self.cells.fill(' ');
        self.cursor = (0, 0);
        Ok(())
    }
}

/// Width of one character cell in pixels.
pub const CELL_WIDTH: u32 = 6;

/// Height of one character cell in pixels.
pub const CELL_HEIGHT: u32 = 10;

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

/// Character grid rendered on a monochrome `embedded-graphics` target.
///
/// A 128×64 panel yields 6 rows of 21 characters.
pub struct GraphicsCharDisplay<D> {
    target: D,
    rows: u8,
    columns: u8,
    cursor: (u8, u8),
}

impl<D> GraphicsCharDisplay<D>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
    D::Error: Debug,
{
    pub fn new(target: D) -> Self {
        let size = target.size();
        let rows = (size.height / CELL_HEIGHT).min(u32::from(u8::MAX)) as u8;
        let columns = (size.width / CELL_WIDTH).min(u32::from(u8::MAX)) as u8;
        Self {
            target,
            rows,
            columns,
            cursor: (0, 0),
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut D {
        &mut self.target
    }

    fn cell_origin(row: u8, col: u8) -> Point {
        Point::new(
            i32::from(col) * CELL_WIDTH as i32,
            i32::from(row) * CELL_HEIGHT as i32,
        )
    }

    fn draw_cell(&mut self, row: u8, col: u8, c: char) -> Result<(), D::Error> {
        let origin = Self::cell_origin(row, col);
        Rectangle::new(origin, Size::new(CELL_WIDTH, CELL_HEIGHT))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(&mut self.target)?;
        if c != ' ' {
            let mut buf = [0u8; 4];
            Text::with_baseline(c.encode_utf8(&mut buf), origin, text_style(), Baseline::Top)
                .draw(&mut self.target)?;
        }
        Ok(())
    }
}

impl<D> CharDisplay for GraphicsCharDisplay<D>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
    D::Error: Debug,
{
    type Error = D::Error;

    fn rows(&self) -> u8 {
        self.rows
    }

    fn columns(&self) -> u8 {
        self.columns
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Self::Error> {
        self.cursor = (row.min(self.rows.saturating_sub(1)), col.min(self.columns));
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        let (row, mut col) = self.cursor;
        for c in text.chars() {
            if col >= self.columns {
                break;
            }
            self.draw_cell(row, col, c)?;
            col += 1;
        }
        self.cursor = (row, col);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.cursor = (0, 0);
        self.target.clear(BinaryColor::Off)
    }
}
