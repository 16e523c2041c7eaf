//! Marquee scrolling of the selected entry when it is too wide to fit.
//!
//! The scroller runs as its own task. The controller hands it a `ScrollJob`
//! through `start`; the scroller waits the job's settle delay, then writes one
//! frame per tick, sliding a window over the name. Prefix and suffix stay
//! pinned. After the last frame it waits one more tick and goes idle.
//!
//! ```text
//! Idle --start--> PendingStart --settle--> Scrolling --last frame--> Finishing --tick--> Idle
//!                      \______________________|__________________________/
//!                                           cancel
//! ```
//!
//! Cancellation is a handshake: the canceller raises `cancel` and waits for
//! the scroller's `ack`, so once `cancel` returns no further frame of the
//! old job will be written. A job the scroller has not picked up yet is
//! withdrawn directly.
//!
//! Every frame is written under the input gate. If the gate is held the
//! frame is skipped and the same offset is retried on the next tick.

use core::cell::Cell;
use core::convert::Infallible;

use embassy_futures::select::{select, Either};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;

use crate::arbiter::InputArbiter;
use crate::config::CANCEL_ACK_MAX_POLLS;
use crate::error::Error;
use crate::ui::slot::{self, Resolved, Row};

/// Lifecycle of the scroller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollPhase {
    Idle,
    /// A job is queued or waiting out the settle delay.
    PendingStart,
    Scrolling,
    /// Last frame written, waiting one tick before going idle.
    Finishing,
}

/// How a played job ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// One overflowing entry to animate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollJob {
    /// Entry index in the active menu.
    pub index: usize,
    /// Display row the entry occupies.
    pub row: u8,
    pub columns: u8,
    pub entry: Resolved,
    /// Controller generation the job belongs to; stale jobs are ignored.
    pub generation: u32,
    /// Pause before the first frame (ms).
    pub settle_ms: u32,
    /// Pause after each frame (ms).
    pub tick_ms: u32,
}

impl ScrollJob {
    /// Last window offset; the final frame shows the end of the name.
    pub fn last_offset(&self) -> usize {
        self.entry
            .name_len()
            .saturating_sub(self.entry.available(self.columns))
    }

    pub fn frame_count(&self) -> usize {
        self.last_offset() + 1
    }

    pub fn frame(&self, offset: usize) -> Row {
        slot::frame(&self.entry, offset, self.columns)
    }
}

/// Receiver of marquee frames, normally the menu controller.
pub trait FrameSink {
    /// Write `frame` for `job`. `last` marks the final frame of the job.
    fn show_frame(&mut self, job: &ScrollJob, frame: &str, last: bool) -> Result<(), Error>;
}

pub struct MarqueeScroller {
    jobs: Signal<CriticalSectionRawMutex, ScrollJob>,
    cancel: Signal<CriticalSectionRawMutex, ()>,
    ack: Signal<CriticalSectionRawMutex, ()>,
    phase: BlockingMutex<CriticalSectionRawMutex, Cell<ScrollPhase>>,
}

impl MarqueeScroller {
    /// Timings come with each job, from the controller's `MenuConfig`.
    pub const fn new() -> Self {
        Self {
            jobs: Signal::new(),
            cancel: Signal::new(),
            ack: Signal::new(),
            phase: BlockingMutex::new(Cell::new(ScrollPhase::Idle)),
        }
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase.lock(|phase| phase.get())
    }

    fn set_phase(&self, next: ScrollPhase) {
        self.phase.lock(|phase| phase.set(next));
    }

    pub fn is_active(&self) -> bool {
        self.phase() != ScrollPhase::Idle
    }

    /// Queue `job`. Any previous job must have been cancelled first.
    pub fn start(&self, job: ScrollJob) {
        debug_assert!(
            !self.jobs.signaled(),
            "scroll job started while another is queued"
        );
        trace!("Marquee: queued entry {} ({} frames)", job.index, job.frame_count());
        self.cancel.reset();
        self.ack.reset();
        self.set_phase(ScrollPhase::PendingStart);
        self.jobs.signal(job);
    }

    /// Stop the current job and wait until the scroller has let go of it.
    ///
    /// Returns `Error::ScrollerUnresponsive` if no acknowledgement arrives
    /// within `CANCEL_ACK_MAX_POLLS` scheduler yields.
    pub async fn cancel(&self) -> Result<(), Error> {
        if !self.is_active() {
            return Ok(());
        }

        if self.jobs.try_take().is_some() {
            trace!("Marquee: withdrew queued job");
            self.set_phase(ScrollPhase::Idle);
            return Ok(());
        }

        self.ack.reset();
        self.cancel.signal(());
        match select(self.ack.wait(), yield_budget(CANCEL_ACK_MAX_POLLS)).await {
            Either::First(()) => {
                trace!("Marquee: cancel acknowledged");
                Ok(())
            }
            Either::Second(()) => {
                error!("Marquee: cancel not acknowledged");
                debug_assert!(false, "scroller did not acknowledge cancel");
                Err(Error::ScrollerUnresponsive)
            }
        }
    }

    /// Wait for the next job and play it to completion or cancellation.
    pub async fn play_next<T, D>(
        &self,
        arbiter: &InputArbiter<T>,
        delay: &mut D,
    ) -> Result<Outcome, Error>
    where
        T: FrameSink,
        D: DelayNs,
    {
        let job = self.jobs.wait().await;
        let result = self.play(&job, arbiter, delay).await;
        self.set_phase(ScrollPhase::Idle);

        match result {
            Ok(Outcome::Cancelled) => {
                trace!("Marquee: entry {} cancelled", job.index);
                self.ack.signal(());
            }
            Ok(Outcome::Completed) => trace!("Marquee: entry {} done", job.index),
            Err(e) => {
                warn!("Marquee: entry {} aborted: {:?}", job.index, e);
                // A canceller may be waiting on this job.
                self.ack.signal(());
            }
        }
        result
    }

    /// Scroller task body.
    pub async fn run<T, D>(&self, arbiter: &InputArbiter<T>, mut delay: D) -> Infallible
    where
        T: FrameSink,
        D: DelayNs,
    {
        info!("Marquee: running");
        loop {
            // errors are logged by play_next; the next job starts fresh
            let _ = self.play_next(arbiter, &mut delay).await;
        }
    }

    async fn play<T, D>(
        &self,
        job: &ScrollJob,
        arbiter: &InputArbiter<T>,
        delay: &mut D,
    ) -> Result<Outcome, Error>
    where
        T: FrameSink,
        D: DelayNs,
    {
        if self.pause(delay, job.settle_ms).await {
            return Ok(Outcome::Cancelled);
        }
        self.set_phase(ScrollPhase::Scrolling);

        let last = job.last_offset();
        let mut offset = 0;
        while offset <= last {
            if self.cancel.signaled() {
                return Ok(Outcome::Cancelled);
            }

            match arbiter.try_acquire() {
                Some(mut sink) => {
                    let frame = job.frame(offset);
                    sink.show_frame(job, &frame, offset == last)?;
                    if offset == last {
                        self.set_phase(ScrollPhase::Finishing);
                    }
                    offset += 1;
                }
                None => trace!("Marquee: gate held, retrying offset {}", offset),
            }

            if self.pause(delay, job.tick_ms).await {
                return Ok(Outcome::Cancelled);
            }
        }
        Ok(Outcome::Completed)
    }

    /// Sleep for `ms`; returns `true` if cancelled meanwhile.
    async fn pause<D: DelayNs>(&self, delay: &mut D, ms: u32) -> bool {
        matches!(
            select(delay.delay_ms(ms), self.cancel.wait()).await,
            Either::Second(())
        )
    }
}

impl Default for MarqueeScroller {
    fn default() -> Self {
        Self::new()
    }
}

async fn yield_budget(polls: usize) {
    for _ in 0..polls {
        yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::slot::Entry;
    use alloc::string::String;
    use alloc::vec::Vec;
    use embassy_futures::block_on;
    use embassy_futures::join::join;

    /// Delay that records each request and yields once.
    struct YieldDelay<'a> {
        scroller: &'a MarqueeScroller,
        log: Vec<(u32, ScrollPhase)>,
    }

    impl DelayNs for YieldDelay<'_> {
        async fn delay_ns(&mut self, _ns: u32) {
            yield_now().await;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.log.push((ms, self.scroller.phase()));
            yield_now().await;
        }
    }

    #[derive(Default)]
    struct Frames {
        shown: Vec<(usize, String, bool)>,
    }

    impl FrameSink for Frames {
        fn show_frame(&mut self, job: &ScrollJob, frame: &str, last: bool) -> Result<(), Error> {
            self.shown.push((job.index, frame.into(), last));
            Ok(())
        }
    }

    fn job(name: &str, columns: u8) -> ScrollJob {
        ScrollJob {
            index: 2,
            row: 1,
            columns,
            entry: Entry::new(name).resolve(),
            generation: 0,
            settle_ms: 1000,
            tick_ms: 250,
        }
    }

    #[test]
    fn wide_entry_plays_every_frame_then_goes_idle() {
        // formatted width 24 on 16 columns: offsets 0..=8
        let scroller = MarqueeScroller::new();
        let arbiter = InputArbiter::new(Frames::default());
        let job = job("abcdefghijklmnopqrstuvw", 16);
        assert_eq!(job.entry.width(), 24);
        assert_eq!(job.frame_count(), 9);

        scroller.start(job);
        assert_eq!(scroller.phase(), ScrollPhase::PendingStart);

        let mut delay = YieldDelay { scroller: &scroller, log: Vec::new() };
        let outcome = block_on(scroller.play_next(&arbiter, &mut delay)).unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(scroller.phase(), ScrollPhase::Idle);

        let frames = block_on(arbiter.acquire());
        assert_eq!(frames.shown.len(), 9);
        assert_eq!(frames.shown[0].1, "abcdefghijklmno");
        assert_eq!(frames.shown[8].1, "ijklmnopqrstuvw");
        assert!(frames.shown[8].2);
        assert!(frames.shown[..8].iter().all(|(_, _, last)| !last));

        // settle, one tick per frame; the tick after the last frame is Finishing
        assert_eq!(delay.log.len(), 10);
        assert_eq!(delay.log[0], (1000, ScrollPhase::PendingStart));
        assert!(delay.log[1..9].iter().all(|&d| d == (250, ScrollPhase::Scrolling)));
        assert_eq!(delay.log[9], (250, ScrollPhase::Finishing));
    }

    #[test]
    fn busy_gate_skips_the_tick_and_retries_the_same_offset() {
        let scroller = MarqueeScroller::new();
        let arbiter = InputArbiter::new(Frames::default());
        scroller.start(job("abcdefghijklmnopq", 16));

        block_on(async {
            let mut delay = YieldDelay { scroller: &scroller, log: Vec::new() };
            let holder = async {
                let guard = arbiter.acquire().await;
                // hold the gate across the settle delay and two ticks
                for _ in 0..3 {
                    yield_now().await;
                }
                drop(guard);
            };
            let (outcome, ()) = join(scroller.play_next(&arbiter, &mut delay), holder).await;
            assert_eq!(outcome.unwrap(), Outcome::Completed);
            assert!(delay.log.len() > 4);
        });

        let frames = block_on(arbiter.acquire());
        let offsets: Vec<&str> = frames.shown.iter().map(|(_, f, _)| f.as_str()).collect();
        // every offset appears exactly once, in order
        assert_eq!(offsets, ["abcdefghijklmno", "bcdefghijklmnop", "cdefghijklmnopq"]);
    }

    #[test]
    fn cancel_of_a_queued_job_withdraws_it() {
        let scroller = MarqueeScroller::new();
        scroller.start(job("abcdefghijklmnopq", 16));
        block_on(scroller.cancel()).unwrap();
        assert_eq!(scroller.phase(), ScrollPhase::Idle);
        assert!(!scroller.jobs.signaled());
    }

    #[test]
    fn cancel_while_idle_returns_immediately() {
        let scroller = MarqueeScroller::default();
        assert!(block_on(scroller.cancel()).is_ok());
    }

    #[test]
    fn cancel_during_scrolling_is_acknowledged_and_stops_frames() {
        let scroller = MarqueeScroller::new();
        let arbiter = InputArbiter::new(Frames::default());
        scroller.start(job("abcdefghijklmnopqrstuvwxyz", 16));

        block_on(async {
            let mut delay = YieldDelay { scroller: &scroller, log: Vec::new() };
            let canceller = async {
                while scroller.phase() != ScrollPhase::Scrolling {
                    yield_now().await;
                }
                for _ in 0..2 {
                    yield_now().await;
                }
                scroller.cancel().await
            };
            let (outcome, cancelled) = join(scroller.play_next(&arbiter, &mut delay), canceller).await;
            assert_eq!(outcome.unwrap(), Outcome::Cancelled);
            assert!(cancelled.is_ok());
        });

        assert_eq!(scroller.phase(), ScrollPhase::Idle);
        let shown = block_on(arbiter.acquire()).shown.len();
        assert!(shown > 0 && shown < 12);
    }

    #[test]
    #[should_panic(expected = "scroller did not acknowledge cancel")]
    fn unacknowledged_cancel_fails_loudly() {
        let scroller = MarqueeScroller::new();
        scroller.start(job("abcdefghijklmnopq", 16));
        // simulate a scroller that picked the job up and then stalled
        let _ = scroller.jobs.try_take();
        let _ = block_on(scroller.cancel());
    }

    #[test]
    fn entry_that_fits_has_a_single_frame() {
        let job = job("short", 16);
        assert_eq!(job.last_offset(), 0);
        assert_eq!(job.frame_count(), 1);
    }
}
