//! rotary-menu firmware - nRF52840 + SSD1306 + rotary encoder.
//!
//! Demo menu tree on a 128×64 OLED (6 rows of 21 characters):
//!
//! ```text
//! Root ── Settings ── Back / Brightness / Uptime
//!      ├─ Files ───── in-memory tree, *.py and *.txt
//!      └─ a long entry that scrolls as a marquee
//! ```
//!
//! Wiring (nRF52840-DK):
//! - Encoder A/B: P0.03 / P0.04 (pull-ups, common to GND)
//! - Encoder push button: P0.28 (active low)
//! - OLED: SDA P0.26, SCL P0.27

#![no_std]
#![no_main]

extern crate alloc;

use alloc::format;
use alloc::vec;
use core::sync::atomic::{AtomicU8, Ordering};

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Pull};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_time::{Delay, Instant};
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use rotary_menu::config::{MenuConfig, BUTTON_DEBOUNCE_MS};
use rotary_menu::ui::buttons::button_task;
use rotary_menu::ui::encoder::encoder_task;
use rotary_menu::ui::oled::{self, OledDisplay};
use rotary_menu::{
    Entry, Field, FileMenu, InputArbiter, MarqueeScroller, MemoryFileSystem, Menu,
    MenuController, MenuEvent, MenuId, TimeoutSupervisor,
};

// ═══════════════════════════════════════════════════════════════════════════
// Shared state
// ═══════════════════════════════════════════════════════════════════════════

#[global_allocator]
static HEAP: Heap = Heap::empty();

const HEAP_SIZE: usize = 16 * 1024;

const CONFIG: MenuConfig = MenuConfig::new().with_timeout(30);

type Controller = MenuController<'static, OledDisplay<Twim<'static, TWISPI0>>>;
type Arbiter = InputArbiter<Controller>;

static SCROLLER: MarqueeScroller = MarqueeScroller::new();
static SUPERVISOR: TimeoutSupervisor = TimeoutSupervisor::new(CONFIG.timeout_secs);
static ARBITER: StaticCell<Arbiter> = StaticCell::new();

/// Demo value shown in the settings menu.
static BRIGHTNESS: AtomicU8 = AtomicU8::new(5);

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

// ═══════════════════════════════════════════════════════════════════════════
// Tasks
// ═══════════════════════════════════════════════════════════════════════════

#[embassy_executor::task]
async fn encoder(a: Input<'static>, b: Input<'static>, arbiter: &'static Arbiter) {
    match encoder_task(a, b, arbiter).await {
        Ok(never) => match never {},
        Err(never) => match never {},
    }
}

#[embassy_executor::task]
async fn button(pin: Input<'static>, arbiter: &'static Arbiter) {
    match button_task(pin, Delay, arbiter, BUTTON_DEBOUNCE_MS).await {
        Ok(never) => match never {},
        Err(never) => match never {},
    }
}

#[embassy_executor::task]
async fn marquee(arbiter: &'static Arbiter) {
    match SCROLLER.run(arbiter, Delay).await {}
}

#[embassy_executor::task]
async fn supervisor(arbiter: &'static Arbiter) {
    if let Err(e) = SUPERVISOR.run(arbiter, Delay).await {
        error!("Timeout supervisor stopped: {:?}", e);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Demo menus
// ═══════════════════════════════════════════════════════════════════════════

fn root_menu(settings: MenuId, files: MenuId) -> Menu {
    Menu::new(vec![
        Entry::new("Settings"),
        Entry::new("Files"),
        Entry::new("An entry far too long for one row of this panel"),
    ])
    .on_event(move |event, menu| match event {
        MenuEvent::Press(0) => menu.open(settings),
        MenuEvent::Press(1) => menu.open(files),
        MenuEvent::Press(index) => info!("Root: pressed {}", index),
        _ => {}
    })
}

fn settings_menu() -> Menu {
    Menu::new(vec![
        Entry::new("Back"),
        Entry::new("Brightness")
            .suffix(Field::dynamic(|| format!(" {}", BRIGHTNESS.load(Ordering::Relaxed)))),
        Entry::new("Uptime")
            .suffix(Field::dynamic(|| format!(" {}s", Instant::now().as_secs()))),
    ])
    .on_event(|event, menu| match event {
        MenuEvent::Press(0) => menu.open_root(),
        MenuEvent::Press(1) => {
            let next = (BRIGHTNESS.load(Ordering::Relaxed) + 1) % 10;
            BRIGHTNESS.store(next, Ordering::Relaxed);
            menu.update_current();
        }
        MenuEvent::Press(_) => menu.refresh(),
        _ => {}
    })
}

fn files_menu() -> Menu {
    let fs = MemoryFileSystem::new()
        .with_file("/apps/clock.py")
        .with_file("/apps/games/snake.py")
        .with_file("/apps/games/tetris.py")
        .with_file("/apps/__pycache__/clock.mpy")
        .with_file("/data/readings.txt")
        .with_file("/data/firmware.bin");
    let browser = FileMenu::new(fs, "/")
        .extensions(&["py", "txt"])
        .folder_affix("[#+#]")
        .file_affix("py", "#+# *")
        .pinned(vec![Entry::new("< Back")]);

    Menu::file_browser(browser).on_event(|event, menu| match event {
        MenuEvent::Press(0) => menu.open_root(),
        MenuEvent::FilePress(path) => info!("Files: selected {}", path),
        _ => {}
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Entry point
// ═══════════════════════════════════════════════════════════════════════════

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    {
        use core::mem::MaybeUninit;
        static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
        // SAFETY: called once, before anything allocates.
        unsafe { HEAP.init(core::ptr::addr_of_mut!(HEAP_MEM) as usize, HEAP_SIZE) }
    }

    let p = embassy_nrf::init(Default::default());
    info!("rotary-menu starting");

    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K400;
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, i2c_config);
    let display = oled::init(i2c);
    info!("Display initialised");

    // Placeholder root; replaced once the other ids are known.
    let mut controller = MenuController::new(display, Menu::new(vec![]), &SCROLLER, CONFIG);
    let settings = match controller.add_menu(settings_menu()) {
        Ok(id) => id,
        Err(e) => defmt::panic!("registering menus failed: {:?}", e),
    };
    let files = match controller.add_menu(files_menu()) {
        Ok(id) => id,
        Err(e) => defmt::panic!("registering menus failed: {:?}", e),
    };
    if let Some(root) = controller.menu_mut(MenuId::ROOT) {
        *root = root_menu(settings, files);
    }

    let arbiter: &'static Arbiter = ARBITER.init(InputArbiter::new(controller));
    if let Err(e) = arbiter.acquire().await.start().await {
        error!("Menu start failed: {:?}", e);
    }

    let enc_a = Input::new(p.P0_03, Pull::Up);
    let enc_b = Input::new(p.P0_04, Pull::Up);
    let push = Input::new(p.P0_28, Pull::Up);

    spawner.must_spawn(encoder(enc_a, enc_b, arbiter));
    spawner.must_spawn(button(push, arbiter));
    spawner.must_spawn(marquee(arbiter));
    spawner.must_spawn(supervisor(arbiter));
    info!("Input, marquee and timeout tasks spawned");

    match arbiter.run().await {
        Ok(never) => match never {},
        Err(e) => error!("Control loop stopped: {:?}", e),
    }
}
