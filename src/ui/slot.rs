//! Entry formatting - one logical menu entry into one fixed-width row.
//!
//! An entry is an explicit three-field record (prefix, name, suffix). Any
//! field may be dynamic: a closure evaluated on every render, so values such
//! as a volume level or a clock stay current without rebuilding the menu.
//!
//! Column 0 of every row belongs to the cursor glyph, so an entry has
//! `columns - 1` characters to work with.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use crate::config::ROW_CAPACITY;

/// Marks the prefix/suffix boundary inside an affix template.
pub const AFFIX_SEPARATOR: &str = "#+#";

/// One rendered display row (never longer than the display is wide).
pub type Row = heapless::String<ROW_CAPACITY>;

/// Text placed before and after an entry name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Affix {
    pub prefix: String,
    pub suffix: String,
}

impl Affix {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Split a template such as `"[#+#]"` into prefix `"["` and suffix `"]"`.
    ///
    /// Templates without exactly one separator yield an empty affix.
    pub fn parse(template: &str) -> Self {
        let mut parts = template.split(AFFIX_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => Self::new(prefix, suffix),
            _ => {
                debug!("Slot: malformed affix template ignored");
                Self::default()
            }
        }
    }
}

/// Closure producing a field's text at render time.
pub type DynamicText = Arc<dyn Fn() -> String + Send + Sync>;

/// One of the three text fields of an entry.
#[derive(Clone)]
pub enum Field {
    Static(String),
    Dynamic(DynamicText),
}

impl Field {
    /// A field re-evaluated on every render.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Field::Dynamic(Arc::new(f))
    }

    pub fn resolve(&self) -> Cow<'_, str> {
        match self {
            Field::Static(text) => Cow::Borrowed(text.as_str()),
            Field::Dynamic(f) => Cow::Owned(f()),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Field::Dynamic(_))
    }
}

impl Default for Field {
    fn default() -> Self {
        Field::Static(String::new())
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Field::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for Field {
    fn from(text: &str) -> Self {
        Field::Static(text.into())
    }
}

impl From<String> for Field {
    fn from(text: String) -> Self {
        Field::Static(text)
    }
}

/// What pressing an entry means.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryKind {
    /// Plain entry; a press is reported by index.
    #[default]
    Item,
    /// The `..` row of a browser menu.
    Parent,
    /// A subdirectory in a browser menu.
    Directory,
    /// A file in a browser menu.
    File,
}

/// A logical menu entry.
#[derive(Clone, Debug, Default)]
pub struct Entry {
    pub prefix: Field,
    pub name: Field,
    pub suffix: Field,
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(name: impl Into<Field>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Entry whose prefix and suffix come from an affix template.
    pub fn with_affix(affix: &Affix, name: impl Into<Field>) -> Self {
        Self::new(name)
            .prefix(affix.prefix.as_str())
            .suffix(affix.suffix.as_str())
    }

    pub fn prefix(mut self, prefix: impl Into<Field>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<Field>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Evaluate all three fields once.
    pub fn resolve(&self) -> Resolved {
        Resolved {
            prefix: self.prefix.resolve().into_owned(),
            name: self.name.resolve().into_owned(),
            suffix: self.suffix.resolve().into_owned(),
        }
    }
}

/// An entry with every field evaluated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolved {
    pub prefix: String,
    pub name: String,
    pub suffix: String,
}

impl Resolved {
    /// Characters the entry needs, including the cursor column.
    pub fn width(&self) -> usize {
        char_len(&self.prefix) + char_len(&self.name) + char_len(&self.suffix) + 1
    }

    pub fn name_len(&self) -> usize {
        char_len(&self.name)
    }

    /// Characters left for the name once cursor, prefix and suffix are placed.
    pub fn available(&self, columns: u8) -> usize {
        usize::from(columns)
            .saturating_sub(1)
            .saturating_sub(char_len(&self.prefix))
            .saturating_sub(char_len(&self.suffix))
    }

    pub fn overflows(&self, columns: u8) -> bool {
        self.width() > usize::from(columns)
    }
}

/// A formatted row and whether the entry had to be clipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub text: Row,
    pub overflow: bool,
}

/// Format `entry` for a display `columns` characters wide.
pub fn format(entry: &Entry, columns: u8) -> Rendered {
    format_resolved(&entry.resolve(), columns)
}

/// Format an already resolved entry.
///
/// Fitting names are padded so the suffix lands flush right; overflowing
/// names are clipped to the available width without padding.
pub fn format_resolved(entry: &Resolved, columns: u8) -> Rendered {
    let space = entry.available(columns);
    let overflow = entry.overflows(columns);

    let mut row = RowWriter::new(columns);
    row.push_str(&entry.prefix);
    if overflow {
        row.push_chars(entry.name.chars().take(space));
    } else {
        row.push_str(&entry.name);
        row.pad(space - entry.name_len());
    }
    row.push_str(&entry.suffix);

    Rendered {
        text: row.finish(),
        overflow,
    }
}

/// The marquee frame showing the name window starting at `offset`.
pub fn frame(entry: &Resolved, offset: usize, columns: u8) -> Row {
    let space = entry.available(columns);
    let mut row = RowWriter::new(columns);
    row.push_str(&entry.prefix);
    row.push_chars(entry.name.chars().skip(offset).take(space));
    row.push_str(&entry.suffix);
    row.finish()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Builds a row, silently dropping anything past the text area.
struct RowWriter {
    row: Row,
    written: usize,
    limit: usize,
}

impl RowWriter {
    fn new(columns: u8) -> Self {
        Self {
            row: Row::new(),
            written: 0,
            limit: usize::from(columns).saturating_sub(1),
        }
    }

    fn push_char(&mut self, c: char) {
        if self.written < self.limit && self.row.push(c).is_ok() {
            self.written += 1;
        }
    }

    fn push_chars(&mut self, chars: impl Iterator<Item = char>) {
        for c in chars {
            self.push_char(c);
        }
    }

    fn push_str(&mut self, text: &str) {
        self.push_chars(text.chars());
    }

    fn pad(&mut self, count: usize) {
        for _ in 0..count {
            self.push_char(' ');
        }
    }

    fn finish(self) -> Row {
        self.row
    }
}
