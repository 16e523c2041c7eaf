//! File browser menus.
//!
//! A `FileMenu` lists one directory below a fixed root. The rows are, in
//! order: pinned entries, root-only entries (at depth 0), a `..` row (below
//! depth 0), subdirectories, then files whose extension is allowed.
//! Directories named `__*` are never shown.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::Error;
use crate::ui::slot::{Affix, Entry, EntryKind};

/// Name of the row that leads to the parent directory.
pub const PARENT_ENTRY: &str = "..";

/// One directory listing entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn dir(name: &str) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }

    pub fn file(name: &str) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }
}

/// Directory access used by browser menus.
///
/// Paths are `/`-separated strings.
pub trait FileSystem: Send {
    /// List `path`. Entries that cannot be inspected are left out; only a
    /// directory that cannot be opened at all is an error.
    fn list(&mut self, path: &str) -> Result<Vec<DirEntry>, Error>;

    fn is_dir(&mut self, path: &str) -> bool;
}

/// Join a directory path and an entry name.
pub fn join(dir: &str, name: &str) -> String {
    let mut path = String::from(dir);
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(name);
    path
}

/// Parent directory of `path` (`/` for top-level entries).
pub fn parent(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(i) => &trimmed[..i],
        None => "",
    }
}

/// Last path component.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Everything after the first dot of a file name, e.g. `tar.gz`.
///
/// Leading dots mark hidden files, not extensions.
pub fn compound_extension(name: &str) -> Option<&str> {
    let stem_start = name.len() - name.trim_start_matches('.').len();
    let rest = &name[stem_start..];
    rest.find('.').map(|i| &rest[i + 1..]).filter(|ext| !ext.is_empty())
}

/// Extension after the last dot, e.g. `gz`.
pub fn last_extension(name: &str) -> Option<&str> {
    compound_extension(name).map(|ext| ext.rsplit('.').next().unwrap_or(ext))
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').into()
}

/// What a press on a browser row means.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pressed {
    /// A pinned or root-only entry, by index.
    Pinned(usize),
    Parent,
    Directory { name: String, path: String },
    File { path: String },
}

pub struct FileMenu {
    fs: Box<dyn FileSystem>,
    root: String,
    current: String,
    depth: usize,
    extensions: Vec<String>,
    show_folders: bool,
    folder_affix: Affix,
    file_affixes: BTreeMap<String, Affix>,
    pinned: Vec<Entry>,
    root_entries: Vec<Entry>,
    delegate_folders: bool,
}

impl FileMenu {
    /// Browser rooted at `root`, showing every file and folder.
    pub fn new(fs: impl FileSystem + 'static, root: &str) -> Self {
        Self {
            fs: Box::new(fs),
            root: root.into(),
            current: root.into(),
            depth: 0,
            extensions: Vec::new(),
            show_folders: true,
            folder_affix: Affix::default(),
            file_affixes: BTreeMap::new(),
            pinned: Vec::new(),
            root_entries: Vec::new(),
            delegate_folders: false,
        }
    }

    /// Only list files with one of these extensions (`"py"` or `".py"`).
    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|ext| normalize_extension(ext)).collect();
        self
    }

    pub fn show_folders(mut self, show: bool) -> Self {
        self.show_folders = show;
        self
    }

    /// Affix template for folder rows, e.g. `"[#+#]"`.
    pub fn folder_affix(mut self, template: &str) -> Self {
        self.folder_affix = Affix::parse(template);
        self
    }

    /// Affix template for files with extension `ext` (`"tar.gz"` works too).
    pub fn file_affix(mut self, ext: &str, template: &str) -> Self {
        self.file_affixes
            .insert(normalize_extension(ext), Affix::parse(template));
        self
    }

    /// Entries shown above the listing at every depth.
    pub fn pinned(mut self, entries: Vec<Entry>) -> Self {
        self.pinned = entries;
        self
    }

    /// Entries shown after the pinned ones, only at the root.
    pub fn root_entries(mut self, entries: Vec<Entry>) -> Self {
        self.root_entries = entries;
        self
    }

    /// Report folder presses to the callback instead of entering them.
    pub fn delegate_folders(mut self, delegate: bool) -> Self {
        self.delegate_folders = delegate;
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn current_path(&self) -> &str {
        &self.current
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn delegates_folders(&self) -> bool {
        self.delegate_folders
    }

    /// Rows before the listing starts.
    pub fn pinned_len(&self) -> usize {
        if self.depth == 0 {
            self.pinned.len() + self.root_entries.len()
        } else {
            self.pinned.len()
        }
    }

    /// Descend into `name` below the current directory.
    ///
    /// Returns `false` (and stays put) if it is not a directory.
    pub fn enter_directory(&mut self, name: &str) -> bool {
        let path = join(&self.current, name);
        if !self.fs.is_dir(&path) {
            debug!("Browser: not a directory, ignored");
            return false;
        }
        self.current = path;
        self.depth += 1;
        true
    }

    /// Go up one level; a no-op at the root.
    pub fn return_to_parent(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        self.current = if self.depth == 0 {
            self.root.clone()
        } else {
            parent(&self.current).into()
        };
    }

    pub fn return_to_root(&mut self) {
        self.current = self.root.clone();
        self.depth = 0;
    }

    /// Jump to `path`. Without a `depth` the current one is kept; negative
    /// depths are rejected.
    pub fn set_path(&mut self, path: &str, depth: Option<i32>) -> Result<(), Error> {
        let depth = match depth {
            None => self.depth,
            Some(d) => usize::try_from(d).map_err(|_| Error::InvalidDepth(d))?,
        };
        self.current = path.into();
        self.depth = depth;
        Ok(())
    }

    fn affix_for_file(&self, name: &str) -> Affix {
        let lookup = |ext: Option<&str>| ext.and_then(|ext| self.file_affixes.get(ext));
        lookup(compound_extension(name))
            .or_else(|| lookup(last_extension(name)))
            .cloned()
            .unwrap_or_default()
    }

    fn file_allowed(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        match last_extension(name) {
            Some(ext) => self.extensions.iter().any(|allowed| allowed == ext),
            None => false,
        }
    }

    /// Build the rows for the current directory.
    pub fn entries(&mut self) -> Result<Vec<Entry>, Error> {
        let mut listing = self.fs.list(&self.current)?;
        listing.sort_by(|a, b| a.name.cmp(&b.name));

        let mut rows = self.pinned.clone();
        if self.depth == 0 {
            rows.extend(self.root_entries.iter().cloned());
        } else {
            rows.push(Entry::with_affix(&self.folder_affix, PARENT_ENTRY).kind(EntryKind::Parent));
        }

        if self.show_folders {
            rows.extend(
                listing
                    .iter()
                    .filter(|e| e.is_dir && !e.name.starts_with("__"))
                    .map(|e| {
                        Entry::with_affix(&self.folder_affix, e.name.as_str())
                            .kind(EntryKind::Directory)
                    }),
            );
        }

        rows.extend(
            listing
                .iter()
                .filter(|e| !e.is_dir && self.file_allowed(&e.name))
                .map(|e| {
                    Entry::with_affix(&self.affix_for_file(&e.name), e.name.as_str())
                        .kind(EntryKind::File)
                }),
        );

        debug!(
            "Browser: {} rows at depth {}",
            rows.len(),
            self.depth
        );
        Ok(rows)
    }

    /// Work out what pressing row `index` (showing `entry`) means.
    pub fn classify(&self, index: usize, entry: &Entry) -> Pressed {
        if index < self.pinned_len() {
            return Pressed::Pinned(index);
        }
        let name = entry.name.resolve();
        match entry.kind {
            EntryKind::Parent => Pressed::Parent,
            EntryKind::Directory => Pressed::Directory {
                path: join(&self.current, &name),
                name: name.into_owned(),
            },
            EntryKind::File => Pressed::File {
                path: join(&self.current, &name),
            },
            EntryKind::Item => Pressed::Pinned(index),
        }
    }
}

/// In-memory directory tree, for simulators and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryFileSystem {
    dirs: BTreeMap<String, Vec<DirEntry>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at `path`, creating parent directories as needed.
    pub fn with_file(mut self, path: &str) -> Self {
        self.insert(path, false);
        self
    }

    /// Add a directory at `path`, creating parents as needed.
    pub fn with_dir(mut self, path: &str) -> Self {
        self.insert(path, true);
        self
    }

    fn insert(&mut self, path: &str, is_dir: bool) {
        let path = path.trim_end_matches('/');
        if is_dir {
            self.dirs.entry(path.into()).or_default();
        }
        let dir = parent(path);
        if dir.is_empty() || dir == path {
            return;
        }
        let name = basename(path);
        let siblings = self.dirs.entry(dir.into()).or_default();
        if !siblings.iter().any(|e| e.name == name) {
            siblings.push(DirEntry {
                name: name.into(),
                is_dir,
            });
        }
        if dir != "/" {
            self.insert(dir, true);
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn list(&mut self, path: &str) -> Result<Vec<DirEntry>, Error> {
        let key = if path == "/" { path } else { path.trim_end_matches('/') };
        self.dirs.get(key).cloned().ok_or(Error::Filesystem)
    }

    fn is_dir(&mut self, path: &str) -> bool {
        let key = if path == "/" { path } else { path.trim_end_matches('/') };
        self.dirs.contains_key(key)
    }
}
