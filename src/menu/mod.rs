//! Menu definitions and the callback contract.
//!
//! A menu is an ordered list of entries plus one callback. The callback
//! receives a `MenuEvent` and a `MenuHandle`; anything it asks for through
//! the handle (open another menu, refresh, ...) is applied by the controller
//! once the callback has returned.

pub mod browser;
pub mod controller;
#[cfg(feature = "std")]
pub mod std_fs;


use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::config::MAX_CALLBACK_COMMANDS;
use crate::error::Error;
use crate::ui::slot::Entry;
use crate::ui::Direction;

use browser::FileMenu;

/// Handle to a menu registered with a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MenuId(pub(crate) u8);

impl MenuId {
    /// The first menu registered, shown at start and after a timeout.
    pub const ROOT: MenuId = MenuId(0);

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

/// Event delivered to a menu callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuEvent<'a> {
    /// The menu is about to be shown (`invoke_on_setup`).
    Setup,
    /// The menu has just been drawn (`invoke_on_after_setup`).
    AfterSetup,
    /// Entry `index` was pressed.
    Press(usize),
    /// The encoder turned while the menu draws its own cursor.
    Direction(Direction),
    /// A folder was pressed in a browser that delegates folders.
    DirPress(&'a str),
    /// A file was pressed in a browser menu.
    FilePress(&'a str),
}

/// Request queued by a callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Open(MenuId),
    OpenRoot,
    /// Re-render the visible window.
    Refresh,
    /// Re-render the selected row only.
    UpdateCurrent,
    /// Rebuild the entry list and jump back to the top.
    Reload,
}

pub type Callback = Box<dyn FnMut(MenuEvent<'_>, &mut MenuHandle<'_>) + Send>;

/// Callback-side view of the active menu.
pub struct MenuHandle<'a> {
    menu: MenuId,
    index: usize,
    entries: &'a mut Vec<Entry>,
    browser: Option<&'a mut FileMenu>,
    commands: heapless::Vec<Command, MAX_CALLBACK_COMMANDS>,
}

impl<'a> MenuHandle<'a> {
    pub(crate) fn new(
        menu: MenuId,
        index: usize,
        entries: &'a mut Vec<Entry>,
        browser: Option<&'a mut FileMenu>,
    ) -> Self {
        Self {
            menu,
            index,
            entries,
            browser,
            commands: heapless::Vec::new(),
        }
    }

    /// The menu the event belongs to.
    pub fn menu(&self) -> MenuId {
        self.menu
    }

    /// Index of the selected entry.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entries(&self) -> &[Entry] {
        self.entries
    }

    /// Edit entries in place. Follow with `refresh` (same count) or
    /// `reload` (entries added or removed) to show the change.
    pub fn entries_mut(&mut self) -> &mut Vec<Entry> {
        self.entries
    }

    /// The browser state, for browser menus.
    pub fn browser_mut(&mut self) -> Option<&mut FileMenu> {
        self.browser.as_deref_mut()
    }

    pub fn open(&mut self, menu: MenuId) {
        self.push(Command::Open(menu));
    }

    pub fn open_root(&mut self) {
        self.push(Command::OpenRoot);
    }

    pub fn refresh(&mut self) {
        self.push(Command::Refresh);
    }

    pub fn update_current(&mut self) {
        self.push(Command::UpdateCurrent);
    }

    pub fn reload(&mut self) {
        self.push(Command::Reload);
    }

    fn push(&mut self, command: Command) {
        if self.commands.push(command).is_err() {
            warn!("Menu: command queue full, dropped {:?}", command);
        }
    }

    pub(crate) fn into_commands(self) -> heapless::Vec<Command, MAX_CALLBACK_COMMANDS> {
        self.commands
    }
}

/// Behaviour switches of a menu.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MenuFlags {
    /// Call back with `Setup` before the menu is drawn.
    pub invoke_on_setup: bool,
    /// Call back with `AfterSetup` once it is drawn.
    pub invoke_on_after_setup: bool,
    /// The menu draws its own cursor; rotations go to the callback.
    pub custom_cursor: bool,
}

pub enum MenuKind {
    Static,
    FileBrowser(FileMenu),
}

pub struct Menu {
    entries: Vec<Entry>,
    callback: Option<Callback>,
    flags: MenuFlags,
    kind: MenuKind,
}

impl Menu {
    /// Static menu with the given entries.
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            callback: None,
            flags: MenuFlags::default(),
            kind: MenuKind::Static,
        }
    }

    /// Menu whose entries come from a directory listing.
    pub fn file_browser(browser: FileMenu) -> Self {
        Self {
            entries: Vec::new(),
            callback: None,
            flags: MenuFlags::default(),
            kind: MenuKind::FileBrowser(browser),
        }
    }

    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: FnMut(MenuEvent<'_>, &mut MenuHandle<'_>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Replace the callback of a menu that is already registered.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(MenuEvent<'_>, &mut MenuHandle<'_>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn flags(mut self, flags: MenuFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn menu_flags(&self) -> MenuFlags {
        self.flags
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.entries
    }

    pub fn kind(&self) -> &MenuKind {
        &self.kind
    }

    pub fn browser(&self) -> Option<&FileMenu> {
        match &self.kind {
            MenuKind::FileBrowser(browser) => Some(browser),
            MenuKind::Static => None,
        }
    }

    pub fn browser_mut(&mut self) -> Option<&mut FileMenu> {
        match &mut self.kind {
            MenuKind::FileBrowser(browser) => Some(browser),
            MenuKind::Static => None,
        }
    }

    /// Re-read the directory of a browser menu. Static menus keep theirs.
    pub(crate) fn refresh_entries(&mut self) -> Result<(), Error> {
        if let MenuKind::FileBrowser(browser) = &mut self.kind {
            self.entries = browser.entries()?;
        }
        Ok(())
    }

    /// Run the callback, if any, and collect what it asked for.
    pub(crate) fn invoke(
        &mut self,
        id: MenuId,
        index: usize,
        event: MenuEvent<'_>,
    ) -> heapless::Vec<Command, MAX_CALLBACK_COMMANDS> {
        let Some(mut callback) = self.callback.take() else {
            return heapless::Vec::new();
        };
        let browser = match &mut self.kind {
            MenuKind::FileBrowser(browser) => Some(browser),
            MenuKind::Static => None,
        };
        let mut handle = MenuHandle::new(id, index, &mut self.entries, browser);
        callback(event, &mut handle);
        let commands = handle.into_commands();
        self.callback = Some(callback);
        commands
    }
}
