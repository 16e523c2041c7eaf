//! Selection index, cursor row and window shift for a list shown on a
//! display with a fixed number of rows.
//!
//! The cursor moves freely through interior rows; at the first or last row
//! it stays put and the window scrolls instead.

use core::ops::Range;

use super::Direction;

/// Move selection cursor one item up.
pub fn select_prev(selected: usize) -> usize {
    selected.saturating_sub(1)
}

/// Move selection cursor one item down if another item exists.
pub fn select_next(selected: usize, item_count: usize) -> usize {
    if selected + 1 < item_count {
        selected + 1
    } else {
        selected
    }
}

/// What a single `step` changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Moved {
    pub index: bool,
    pub cursor_row: bool,
    pub shift: bool,
}

impl Moved {
    pub fn any(&self) -> bool {
        self.index || self.cursor_row || self.shift
    }
}

/// Windowing state of the active menu.
///
/// Invariant between mutations: `shift + cursor_row == index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigationState {
    index: usize,
    cursor_row: usize,
    shift: usize,
    count: usize,
    rows: usize,
}

impl NavigationState {
    /// Navigation at the top of a list of `count` entries on `rows` rows.
    pub fn new(count: usize, rows: usize) -> Self {
        Self {
            index: 0,
            cursor_row: 0,
            shift: 0,
            count,
            rows: rows.max(1),
        }
    }

    /// Jump back to the first entry and recompute bounds for `count` entries.
    pub fn reset_to_top(&mut self, count: usize) {
        self.count = count;
        self.index = 0;
        self.cursor_row = 0;
        self.shift = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn shift(&self) -> usize {
        self.shift
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn max_index(&self) -> usize {
        self.count.saturating_sub(1)
    }

    pub fn max_shift(&self) -> usize {
        self.count.saturating_sub(self.rows)
    }

    pub fn max_cursor_row(&self) -> usize {
        self.rows
    }

    /// Entry indices currently on screen, top row first.
    pub fn visible(&self) -> Range<usize> {
        self.shift..(self.shift + self.rows).min(self.count)
    }

    /// Move the selection one entry in `direction`.
    pub fn step(&mut self, direction: Direction) -> Moved {
        let before = *self;
        match direction {
            Direction::Previous => self.step_previous(),
            Direction::Next => self.step_next(),
        }
        Moved {
            index: before.index != self.index,
            cursor_row: before.cursor_row != self.cursor_row,
            shift: before.shift != self.shift,
        }
    }

    fn step_previous(&mut self) {
        if self.count == 0 || self.index == 0 {
            return;
        }
        self.index = select_prev(self.index);
        if self.cursor_row == 0 {
            self.shift = self.shift.saturating_sub(1);
        } else {
            self.cursor_row -= 1;
        }
    }

    fn step_next(&mut self) {
        if self.count == 0 || self.index == self.max_index() {
            return;
        }
        self.index = select_next(self.index, self.count);
        if self.cursor_row == self.max_cursor_row() - 1 {
            self.shift = (self.shift + 1).min(self.max_shift());
        } else {
            self.cursor_row += 1;
        }
    }
}
