//! Integration tests for rotary-menu: input, marquee and timeout working
//! together against one controller.
//!
//! Run with: `cargo test --test integration`

use std::sync::{Arc, Mutex};

use embassy_futures::join::join;
use embassy_futures::{block_on, yield_now};
use embedded_hal_async::delay::DelayNs;

use rotary_menu::marquee::Outcome;
use rotary_menu::timeout::Tick;
use rotary_menu::ui::display::WriteRecord;
use rotary_menu::{
    BufferDisplay, Direction, Entry, FileMenu, InputArbiter, InputEvent, MarqueeScroller, Menu,
    MenuConfig, MenuController, MenuEvent, MenuId, ScrollPhase, StdFileSystem, TimeoutSupervisor,
};

/// Formatted width 24: 23 characters plus the cursor column.
const LONG: &str = "An entry name too long!";

// ═══════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Delay that records each request and yields once instead of sleeping.
#[derive(Default)]
struct StepDelay {
    requested: Vec<u32>,
}

impl DelayNs for StepDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        yield_now().await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.requested.push(ms);
        yield_now().await;
    }
}

type Controller<'a> = MenuController<'a, BufferDisplay>;

fn arbiter<'a>(
    scroller: &'a MarqueeScroller,
    root: Menu,
    rows: u8,
    columns: u8,
    config: MenuConfig,
) -> InputArbiter<Controller<'a>> {
    let controller = MenuController::new(BufferDisplay::new(rows, columns), root, scroller, config);
    InputArbiter::new(controller)
}

/// Draw the root menu and forget the writes it took.
fn start(arbiter: &InputArbiter<Controller<'_>>) {
    block_on(async {
        let mut controller = arbiter.acquire().await;
        controller.start().await.unwrap();
        controller.display_mut().clear_history();
    });
}

/// Texts written into the text area of `row`, oldest first.
fn writes_at(history: &[WriteRecord], row: u8) -> Vec<String> {
    history
        .iter()
        .filter(|w| w.row == row && w.col == 1)
        .map(|w| w.text.clone())
        .collect()
}

fn row_text(arbiter: &InputArbiter<Controller<'_>>, row: u8) -> String {
    block_on(arbiter.acquire()).display().row_text(row)
}

fn send(arbiter: &InputArbiter<Controller<'_>>, event: InputEvent) -> bool {
    assert!(arbiter.offer(event), "event refused");
    block_on(arbiter.dispatch_next()).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// Marquee through the controller
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn overflowing_entry_scrolls_one_character_per_tick() {
    let scroller = MarqueeScroller::default();
    let root = Menu::new(vec![Entry::new(LONG), Entry::new("Short")]);
    let arbiter = arbiter(&scroller, root, 2, 16, MenuConfig::default());
    start(&arbiter);
    assert_eq!(scroller.phase(), ScrollPhase::PendingStart);

    let mut delay = StepDelay::default();
    let outcome = block_on(scroller.play_next(&arbiter, &mut delay)).unwrap();
    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(scroller.phase(), ScrollPhase::Idle);

    let controller = block_on(arbiter.acquire());
    let frames = writes_at(controller.display().history(), 0);
    assert_eq!(frames.len(), 9);
    assert_eq!(frames[0], "An entry name t");
    assert_eq!(frames[1], "n entry name to");
    assert_eq!(frames[8], " name too long!");
    assert_eq!(controller.display().row_text(0), "> name too long!");

    // settle pause, then one tick after every frame
    let mut expected = vec![1_000];
    expected.extend([250; 9]);
    assert_eq!(delay.requested, expected);
}

#[test]
fn scroll_timings_follow_the_controller_config() {
    let scroller = MarqueeScroller::default();
    let root = Menu::new(vec![Entry::new(LONG)]);
    let config = MenuConfig::new().with_scroll_timing(40, 15);
    let arbiter = arbiter(&scroller, root, 2, 16, config);
    start(&arbiter);

    let mut delay = StepDelay::default();
    let outcome = block_on(scroller.play_next(&arbiter, &mut delay)).unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let mut expected = vec![40];
    expected.extend([15; 9]);
    assert_eq!(delay.requested, expected);
}

#[test]
fn rotation_during_scrolling_cancels_and_restores_the_row() {
    let scroller = MarqueeScroller::default();
    let root = Menu::new(vec![Entry::new(LONG), Entry::new("Short")]);
    let arbiter = arbiter(&scroller, root, 2, 16, MenuConfig::default());
    start(&arbiter);

    let mut delay = StepDelay::default();
    let (outcome, admitted) = block_on(join(scroller.play_next(&arbiter, &mut delay), async {
        // let a couple of frames through first
        loop {
            yield_now().await;
            let frames = match arbiter.try_acquire() {
                Some(controller) => writes_at(controller.display().history(), 0).len(),
                None => 0,
            };
            if frames >= 2 {
                break;
            }
        }
        assert_eq!(scroller.phase(), ScrollPhase::Scrolling);
        assert!(arbiter.offer(InputEvent::Rotate(Direction::Next)));
        arbiter.dispatch_next().await.unwrap()
    }));

    assert!(admitted);
    assert_eq!(outcome.unwrap(), Outcome::Cancelled);
    assert_eq!(scroller.phase(), ScrollPhase::Idle);
    assert_eq!(row_text(&arbiter, 0), " An entry name t");
    assert_eq!(row_text(&arbiter, 1), ">Short          ");
}

#[test]
fn preserved_scroll_position_lasts_until_the_window_shifts() {
    let scroller = MarqueeScroller::default();
    let root = Menu::new(vec![Entry::new(LONG), Entry::new("Short"), Entry::new("Third")]);
    let config = MenuConfig::new().with_preserved_scroll(true);
    let arbiter = arbiter(&scroller, root, 2, 16, config);
    start(&arbiter);

    let mut delay = StepDelay::default();
    block_on(scroller.play_next(&arbiter, &mut delay)).unwrap();

    assert!(send(&arbiter, InputEvent::Rotate(Direction::Next)));
    assert_eq!(row_text(&arbiter, 0), "  name too long!");

    // scrolling the long entry off screen drops the kept frame
    assert!(send(&arbiter, InputEvent::Rotate(Direction::Next)));
    assert_eq!(row_text(&arbiter, 0), " Short          ");
    assert!(send(&arbiter, InputEvent::Rotate(Direction::Previous)));
    assert!(send(&arbiter, InputEvent::Rotate(Direction::Previous)));
    assert_eq!(row_text(&arbiter, 0), ">An entry name t");

    // back on the entry, the animation is queued again
    assert_eq!(scroller.phase(), ScrollPhase::PendingStart);
}

#[test]
fn scroller_task_skips_frames_while_a_handler_holds_the_gate() {
    let scroller = MarqueeScroller::default();
    let root = Menu::new(vec![Entry::new(LONG)]);
    let arbiter = arbiter(&scroller, root, 2, 16, MenuConfig::default());
    start(&arbiter);

    let mut delay = StepDelay::default();
    let (outcome, ()) = block_on(join(scroller.play_next(&arbiter, &mut delay), async {
        let held = arbiter.acquire().await;
        for _ in 0..6 {
            yield_now().await;
        }
        drop(held);
    }));

    assert_eq!(outcome.unwrap(), Outcome::Completed);
    let controller = block_on(arbiter.acquire());
    // every offset is still shown exactly once
    assert_eq!(writes_at(controller.display().history(), 0).len(), 9);
}

// ═══════════════════════════════════════════════════════════════════════════
// Input arbitration
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn press_while_busy_is_dropped_without_a_callback() {
    let presses = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&presses);
    let scroller = MarqueeScroller::default();
    let root = Menu::new(vec![Entry::new("One"), Entry::new("Two")]).on_event(
        move |event, _menu| {
            if let MenuEvent::Press(index) = event {
                seen.lock().unwrap().push(index);
            }
        },
    );
    let arbiter = arbiter(&scroller, root, 2, 8, MenuConfig::default());
    start(&arbiter);

    block_on(async {
        // refused at the door while a handler runs
        let held = arbiter.acquire().await;
        assert!(!arbiter.offer(InputEvent::Press));
        drop(held);

        // accepted, but the gate is taken again before admission
        assert!(arbiter.offer(InputEvent::Press));
        let held = arbiter.acquire().await;
        assert!(!arbiter.dispatch_next().await.unwrap());
        drop(held);
    });
    assert!(presses.lock().unwrap().is_empty());

    assert!(send(&arbiter, InputEvent::Press));
    assert_eq!(*presses.lock().unwrap(), vec![0]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Idle timeout
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn idle_submenu_returns_to_root_after_the_timeout() {
    let scroller = MarqueeScroller::default();
    let root = Menu::new(vec![Entry::new("Open settings"), Entry::new("Other")]);
    let arbiter = arbiter(&scroller, root, 2, 16, MenuConfig::new().with_timeout(5));

    block_on(async {
        let mut controller = arbiter.acquire().await;
        let settings = controller
            .add_menu(Menu::new(vec![Entry::new("Contrast"), Entry::new("Back")]))
            .unwrap();
        controller
            .menu_mut(MenuId::ROOT)
            .unwrap()
            .set_callback(move |event, menu| {
                if event == MenuEvent::Press(0) {
                    menu.open(settings);
                }
            });
        controller.start().await.unwrap();
    });

    assert!(send(&arbiter, InputEvent::Press));
    assert_eq!(row_text(&arbiter, 0), ">Contrast       ");

    let supervisor = TimeoutSupervisor::new(5);
    for second in 1..5 {
        assert_eq!(block_on(supervisor.tick(&arbiter)).unwrap(), Tick::Idle(second));
    }
    assert_eq!(block_on(supervisor.tick(&arbiter)).unwrap(), Tick::Restored);
    assert_eq!(arbiter.idle_secs(), 0);

    let controller = block_on(arbiter.acquire());
    assert!(controller.is_root());
    assert_eq!(controller.display().row_text(0), ">Open settings  ");
}

#[test]
fn input_restarts_the_idle_clock() {
    let scroller = MarqueeScroller::default();
    let root = Menu::new(vec![Entry::new("Sub")]);
    let arbiter = arbiter(&scroller, root, 2, 16, MenuConfig::new().with_timeout(3));
    block_on(async {
        let mut controller = arbiter.acquire().await;
        let sub = controller
            .add_menu(Menu::new(vec![Entry::new("A"), Entry::new("B")]))
            .unwrap();
        controller.set(sub).await.unwrap();
    });

    let supervisor = TimeoutSupervisor::new(3);
    assert_eq!(block_on(supervisor.tick(&arbiter)).unwrap(), Tick::Idle(1));
    assert_eq!(block_on(supervisor.tick(&arbiter)).unwrap(), Tick::Idle(2));

    assert!(send(&arbiter, InputEvent::Rotate(Direction::Next)));
    assert_eq!(block_on(supervisor.tick(&arbiter)).unwrap(), Tick::Idle(1));
}

// ═══════════════════════════════════════════════════════════════════════════
// File browser on the local filesystem
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn browsing_a_directory_tree_on_disk() {
    let dir = std::env::temp_dir().join(format!("rotary-menu-it-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("sub")).unwrap();
    std::fs::create_dir_all(dir.join("__pycache__")).unwrap();
    std::fs::write(dir.join("a.py"), "").unwrap();
    std::fs::write(dir.join("b.txt"), "").unwrap();
    std::fs::write(dir.join("sub").join("c.py"), "").unwrap();

    let picked = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&picked);
    let browser = FileMenu::new(StdFileSystem, dir.to_str().unwrap())
        .extensions(&["py"])
        .folder_affix("[#+#]");
    let root = Menu::file_browser(browser).on_event(move |event, _menu| {
        if let MenuEvent::FilePress(path) = event {
            seen.lock().unwrap().push(path.to_string());
        }
    });

    let scroller = MarqueeScroller::default();
    let arbiter = arbiter(&scroller, root, 4, 20, MenuConfig::default());
    start(&arbiter);
    assert!(row_text(&arbiter, 0).starts_with(">[sub"));
    assert!(row_text(&arbiter, 1).starts_with(" a.py"));
    assert_eq!(row_text(&arbiter, 2).trim(), "");

    // into sub/, then pick its file
    assert!(send(&arbiter, InputEvent::Press));
    assert!(row_text(&arbiter, 0).starts_with(">[.."));
    assert!(row_text(&arbiter, 1).starts_with(" c.py"));
    assert!(send(&arbiter, InputEvent::Rotate(Direction::Next)));
    assert!(send(&arbiter, InputEvent::Press));

    let picked = picked.lock().unwrap().clone();
    assert_eq!(picked.len(), 1);
    assert!(picked[0].ends_with("/sub/c.py"));

    // `..` leads back up
    assert!(send(&arbiter, InputEvent::Rotate(Direction::Previous)));
    assert!(send(&arbiter, InputEvent::Press));
    assert!(row_text(&arbiter, 0).starts_with(">[sub"));

    let _ = std::fs::remove_dir_all(&dir);
}
