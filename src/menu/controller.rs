//! The menu controller - owns the menus, the navigation state and the
//! display, and turns admitted input into screen updates.
//!
//! The controller lives inside the `InputArbiter` gate. Every method here
//! runs with the gate held, so the marquee scroller (which takes the gate
//! per frame) never writes concurrently.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::arbiter::InputSink;
use crate::config::{MenuConfig, MAX_CALLBACK_COMMANDS, CURSOR_GLYPH, TEXT_COLUMN};
use crate::error::Error;
use crate::marquee::{FrameSink, MarqueeScroller, ScrollJob};
use crate::timeout::RootMenu;
use crate::ui::display::CharDisplay;
use crate::ui::navigation::NavigationState;
use crate::ui::slot::{self, Row};
use crate::ui::{Direction, InputEvent};

use super::browser::Pressed;
use super::{Command, Menu, MenuEvent, MenuFlags, MenuId, MenuKind};

/// Menu switches one call may chain through callbacks before giving up.
const MAX_MENU_HOPS: usize = 8;

type Commands = heapless::Vec<Command, MAX_CALLBACK_COMMANDS>;

fn display_error<E: Debug>(_e: E) -> Error {
    error!("Display: write failed");
    Error::Display
}

pub struct MenuController<'a, D: CharDisplay> {
    display: D,
    scroller: &'a MarqueeScroller,
    config: MenuConfig,
    menus: Vec<Menu>,
    active: MenuId,
    nav: NavigationState,
    /// Bumped whenever a scroll job starts; frames of older jobs are ignored.
    generation: u32,
    /// Entry index the marquee was last started for.
    marquee: Option<usize>,
    /// Last marquee frame shown, kept on screen in preserve-scroll mode.
    preserved: Option<(usize, Row)>,
}

impl<'a, D: CharDisplay> MenuController<'a, D> {
    /// Controller showing nothing yet; call `start` to draw the root menu.
    pub fn new(display: D, root: Menu, scroller: &'a MarqueeScroller, config: MenuConfig) -> Self {
        let rows = usize::from(display.rows());
        let mut menus = Vec::new();
        menus.push(root);
        Self {
            display,
            scroller,
            config,
            menus,
            active: MenuId::ROOT,
            nav: NavigationState::new(0, rows),
            generation: 0,
            marquee: None,
            preserved: None,
        }
    }

    /// Register another menu.
    pub fn add_menu(&mut self, menu: Menu) -> Result<MenuId, Error> {
        let id = u8::try_from(self.menus.len()).map_err(|_| Error::TooManyMenus)?;
        self.menus.push(menu);
        Ok(MenuId(id))
    }

    pub fn active(&self) -> MenuId {
        self.active
    }

    pub fn is_root(&self) -> bool {
        self.active.is_root()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn menu(&self, id: MenuId) -> Option<&Menu> {
        self.menus.get(id.index())
    }

    pub fn menu_mut(&mut self, id: MenuId) -> Option<&mut Menu> {
        self.menus.get_mut(id.index())
    }

    fn current(&self) -> &Menu {
        &self.menus[self.active.index()]
    }

    fn current_mut(&mut self) -> &mut Menu {
        &mut self.menus[self.active.index()]
    }

    fn flags(&self) -> MenuFlags {
        self.current().menu_flags()
    }

    fn columns(&self) -> u8 {
        self.display.columns()
    }

    /// Draw the root menu.
    pub async fn start(&mut self) -> Result<(), Error> {
        info!(
            "Menu: starting on a {}x{} display",
            self.display.columns(),
            self.display.rows()
        );
        self.set(MenuId::ROOT).await
    }

    /// Switch to `id` and draw it from the top.
    pub async fn set(&mut self, id: MenuId) -> Result<(), Error> {
        let mut next = Some(id);
        let mut hops = 0;
        while let Some(id) = next.take() {
            if hops == MAX_MENU_HOPS {
                warn!("Menu: too many chained menu switches, stopped");
                break;
            }
            hops += 1;
            next = self.set_once(id).await?;
        }
        self.flush()
    }

    async fn set_once(&mut self, id: MenuId) -> Result<Option<MenuId>, Error> {
        if id.index() >= self.menus.len() {
            return Err(Error::UnknownMenu(id.0));
        }
        debug!("Menu: set {}", id.0);
        self.stop_marquee().await?;
        let previous = self.active;
        self.active = id;
        self.preserved = None;

        let mut commands = if self.flags().invoke_on_setup {
            self.invoke(MenuEvent::Setup)
        } else {
            Commands::new()
        };

        if let Err(e) = self.redraw_from_top() {
            // The old menu is still on screen and `nav` still describes it.
            self.active = previous;
            self.start_marquee();
            return Err(e);
        }

        if self.flags().invoke_on_after_setup {
            let after = self.invoke(MenuEvent::AfterSetup);
            for command in after {
                if commands.push(command).is_err() {
                    warn!("Menu: command queue full, dropped {:?}", command);
                }
            }
        }
        self.apply(commands).await
    }

    /// React to one encoder detent.
    pub async fn on_rotate(&mut self, direction: Direction) -> Result<(), Error> {
        if self.flags().custom_cursor {
            let commands = self.invoke(MenuEvent::Direction(direction));
            return self.finish(commands).await;
        }
        if self.current().entries().len() != self.nav.count() {
            debug!("Menu: entry count changed, reloading");
            return self.reload().await;
        }

        let before = self.nav;
        let moved = self.nav.step(direction);
        if !moved.any() {
            return Ok(());
        }
        trace!(
            "Menu: index {} row {} shift {}",
            self.nav.index(),
            self.nav.cursor_row(),
            self.nav.shift()
        );

        self.stop_marquee().await?;
        if moved.cursor_row {
            self.draw_cursor(before.cursor_row())?;
        }
        if moved.shift {
            // a preserved frame only lasts while the window stays put
            self.preserved = None;
            self.render_window()?;
        }
        self.start_marquee();
        self.flush()
    }

    /// React to a button press on the selected entry.
    pub async fn on_press(&mut self) -> Result<(), Error> {
        let index = self.nav.index();
        let menu = &self.menus[self.active.index()];
        let Some(entry) = menu.entries().get(index) else {
            debug!("Menu: press on empty menu ignored");
            return Ok(());
        };

        let pressed = match menu.kind() {
            MenuKind::Static => Pressed::Pinned(index),
            MenuKind::FileBrowser(browser) => browser.classify(index, entry),
        };

        let commands = match pressed {
            Pressed::Pinned(index) => self.invoke(MenuEvent::Press(index)),
            Pressed::Parent => {
                if let Some(browser) = self.current_mut().browser_mut() {
                    browser.return_to_parent();
                }
                return self.reload().await;
            }
            Pressed::Directory { name, path } => {
                let delegate = self
                    .current()
                    .browser()
                    .is_some_and(|browser| browser.delegates_folders());
                if delegate {
                    self.invoke(MenuEvent::DirPress(&path))
                } else {
                    if let Some(browser) = self.current_mut().browser_mut() {
                        browser.enter_directory(&name);
                    }
                    return self.reload().await;
                }
            }
            Pressed::File { path } => self.invoke(MenuEvent::FilePress(&path)),
        };
        self.finish(commands).await
    }

    /// Re-render the visible window, re-evaluating dynamic fields.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        if self.current().entries().len() != self.nav.count() {
            debug!("Menu: entry count changed, reloading");
            return self.reload().await;
        }
        self.stop_marquee().await?;
        self.preserved = None;
        self.render_window()?;
        self.start_marquee();
        self.flush()
    }

    /// Re-render the selected row only.
    pub async fn update_current(&mut self) -> Result<(), Error> {
        if self.current().entries().len() != self.nav.count() {
            return self.reload().await;
        }
        self.stop_marquee().await?;
        self.preserved = None;
        self.render_row(self.nav.index())?;
        self.start_marquee();
        self.flush()
    }

    /// Rebuild the entry list of the active menu and redraw from the top.
    ///
    /// Unlike `set`, no setup callbacks run.
    pub async fn reload(&mut self) -> Result<(), Error> {
        self.stop_marquee().await?;
        self.preserved = None;
        self.redraw_from_top()?;
        self.flush()
    }

    async fn finish(&mut self, commands: Commands) -> Result<(), Error> {
        if let Some(id) = self.apply(commands).await? {
            return self.set(id).await;
        }
        self.flush()
    }

    /// Apply queued commands; returns the menu to switch to, if any.
    async fn apply(&mut self, commands: Commands) -> Result<Option<MenuId>, Error> {
        let mut next = None;
        for command in commands {
            match command {
                Command::Open(id) => next = Some(id),
                Command::OpenRoot => next = Some(MenuId::ROOT),
                Command::Refresh => self.refresh().await?,
                Command::UpdateCurrent => self.update_current().await?,
                Command::Reload => self.reload().await?,
            }
        }
        Ok(next)
    }

    fn invoke(&mut self, event: MenuEvent<'_>) -> Commands {
        let (id, index) = (self.active, self.nav.index());
        self.current_mut().invoke(id, index, event)
    }

    fn redraw_from_top(&mut self) -> Result<(), Error> {
        self.current_mut().refresh_entries()?;
        let count = self.current().entries().len();
        self.nav.reset_to_top(count);
        self.display.clear().map_err(display_error)?;
        self.render_window()?;
        self.draw_cursor(0)?;
        self.start_marquee();
        Ok(())
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), Error> {
        self.display.set_cursor(row, col).map_err(display_error)?;
        self.display.write_str(text).map_err(display_error)
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.display.flush().map_err(display_error)
    }

    /// Render entry `index` into its row, if it is on screen.
    fn render_row(&mut self, index: usize) -> Result<(), Error> {
        if !self.nav.visible().contains(&index) {
            return Ok(());
        }
        let row = row_u8(index - self.nav.shift());
        let text = match &self.preserved {
            Some((preserved, frame)) if *preserved == index => frame.clone(),
            _ => match self.current().entries().get(index) {
                Some(entry) => slot::format(entry, self.columns()).text,
                None => return Ok(()),
            },
        };
        self.write_at(row, TEXT_COLUMN, &text)
    }

    fn render_window(&mut self) -> Result<(), Error> {
        for index in self.nav.visible() {
            self.render_row(index)?;
        }
        // rows past the end of a short list stay blank from the last clear
        Ok(())
    }

    /// Move the cursor glyph from `previous_row` to the current row.
    fn draw_cursor(&mut self, previous_row: usize) -> Result<(), Error> {
        if self.flags().custom_cursor || self.nav.count() == 0 {
            return Ok(());
        }
        self.write_at(row_u8(previous_row), 0, " ")?;
        self.write_at(row_u8(self.nav.cursor_row()), 0, CURSOR_GLYPH)
    }

    /// Queue a marquee job if the selected entry does not fit.
    fn start_marquee(&mut self) {
        if self.flags().custom_cursor {
            return;
        }
        let index = self.nav.index();
        let Some(entry) = self.current().entries().get(index) else {
            return;
        };
        let columns = self.columns();
        let entry = entry.resolve();
        if !entry.overflows(columns) || entry.available(columns) == 0 {
            return;
        }

        self.generation = self.generation.wrapping_add(1);
        self.marquee = Some(index);
        self.scroller.start(ScrollJob {
            index,
            row: row_u8(self.nav.cursor_row()),
            columns,
            entry,
            generation: self.generation,
            settle_ms: self.config.scroll_settle_ms,
            tick_ms: self.config.scroll_tick_ms,
        });
    }

    /// Cancel the marquee and put the animated row back to normal.
    ///
    /// In preserve-scroll mode the last frame stays on screen instead.
    async fn stop_marquee(&mut self) -> Result<(), Error> {
        self.scroller.cancel().await?;
        let Some(index) = self.marquee.take() else {
            return Ok(());
        };
        if self.config.preserve_scroll_position {
            return Ok(());
        }
        if index < self.current().entries().len() {
            self.render_row(index)?;
        }
        Ok(())
    }
}

fn row_u8(row: usize) -> u8 {
    u8::try_from(row).unwrap_or(u8::MAX)
}

impl<D: CharDisplay> FrameSink for MenuController<'_, D> {
    fn show_frame(&mut self, job: &ScrollJob, frame: &str, last: bool) -> Result<(), Error> {
        if job.generation != self.generation || self.marquee != Some(job.index) {
            trace!("Menu: stale marquee frame ignored");
            return Ok(());
        }
        self.write_at(job.row, TEXT_COLUMN, frame)?;
        if self.config.preserve_scroll_position {
            let mut kept = Row::new();
            // frames are built as rows, so they always fit
            let _ = kept.push_str(frame);
            self.preserved = Some((job.index, kept));
        }
        if last {
            trace!("Menu: marquee finished on entry {}", job.index);
        }
        self.flush()
    }
}

impl<D: CharDisplay> InputSink for MenuController<'_, D> {
    async fn handle(&mut self, event: InputEvent) -> Result<(), Error> {
        match event {
            InputEvent::Rotate(direction) => self.on_rotate(direction).await,
            InputEvent::Press => self.on_press().await,
        }
    }
}

impl<D: CharDisplay> RootMenu for MenuController<'_, D> {
    fn at_root(&self) -> bool {
        self.is_root()
    }

    async fn return_to_root(&mut self) -> Result<(), Error> {
        self.set(MenuId::ROOT).await
    }
}
