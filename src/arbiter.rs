//! Input admission - the busy gate between input sources and the menu.
//!
//! Encoder and button tasks `offer` events; the control loop admits them one
//! at a time. While a handler runs the gate is held, and anything that
//! arrives meanwhile is dropped rather than queued. Rotations that happened
//! during a slow redraw would otherwise replay against a stale screen.
//!
//! The marquee scroller and the idle supervisor also take the gate for each
//! display write, so no two writers ever touch the display at once.

use core::convert::Infallible;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::config::EVENT_QUEUE_DEPTH;
use crate::error::Error;
use crate::ui::InputEvent;

/// Exclusive access to the guarded value, released on drop.
pub type Admitted<'a, T> = MutexGuard<'a, CriticalSectionRawMutex, T>;

/// Something that reacts to admitted input events.
#[allow(async_fn_in_trait)]
pub trait InputSink {
    async fn handle(&mut self, event: InputEvent) -> Result<(), Error>;
}

pub struct InputArbiter<T> {
    gate: Mutex<CriticalSectionRawMutex, T>,
    events: Channel<CriticalSectionRawMutex, InputEvent, EVENT_QUEUE_DEPTH>,
    idle_secs: AtomicU32,
}

impl<T> InputArbiter<T> {
    pub const fn new(inner: T) -> Self {
        Self {
            gate: Mutex::new(inner),
            events: Channel::new(),
            idle_secs: AtomicU32::new(0),
        }
    }

    /// Hand an event to the control loop.
    ///
    /// Returns `false` when the event was dropped: a handler is running, or
    /// an earlier event is still waiting to be admitted.
    pub fn offer(&self, event: InputEvent) -> bool {
        if self.is_busy() {
            trace!("Input: busy, dropped {:?}", event);
            return false;
        }
        // try_send avoids blocking the input task; a pending event wins.
        if self.events.try_send(event).is_err() {
            trace!("Input: pending, dropped {:?}", event);
            return false;
        }
        true
    }

    /// Wait for the next offered event.
    pub async fn next_event(&self) -> InputEvent {
        self.events.receive().await
    }

    /// Take the gate for an input handler, or `None` if it is held.
    ///
    /// Admission counts as activity and restarts the idle clock.
    pub fn try_admit(&self) -> Option<Admitted<'_, T>> {
        let guard = self.gate.try_lock().ok()?;
        self.reset_idle();
        Some(guard)
    }

    /// Take the gate without counting as activity (background writers).
    pub fn try_acquire(&self) -> Option<Admitted<'_, T>> {
        self.gate.try_lock().ok()
    }

    /// Wait until the gate is free and take it.
    pub async fn acquire(&self) -> Admitted<'_, T> {
        self.gate.lock().await
    }

    pub fn is_busy(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    pub fn gate(&self) -> &Mutex<CriticalSectionRawMutex, T> {
        &self.gate
    }

    /// Seconds counted since the last admitted input.
    pub fn idle_secs(&self) -> u32 {
        self.idle_secs.load(Ordering::Relaxed)
    }

    pub fn reset_idle(&self) {
        self.idle_secs.store(0, Ordering::Relaxed);
    }

    /// Count one idle second; returns the new total.
    pub fn tick_idle(&self) -> u32 {
        self.idle_secs.fetch_add(1, Ordering::Relaxed).saturating_add(1)
    }
}

impl<T: InputSink> InputArbiter<T> {
    /// Receive one event and run its handler if the gate is free.
    ///
    /// Returns whether the event was admitted.
    pub async fn dispatch_next(&self) -> Result<bool, Error> {
        let event = self.next_event().await;
        let Some(mut sink) = self.try_admit() else {
            debug!("Input: gate held, dropped {:?}", event);
            return Ok(false);
        };
        sink.handle(event).await?;
        Ok(true)
    }

    /// Control loop: dispatch events forever.
    ///
    /// Handler errors are logged; only an unresponsive scroller stops the
    /// loop, since every later handler would block on it too.
    pub async fn run(&self) -> Result<Infallible, Error> {
        info!("Input: control loop started");
        loop {
            match self.dispatch_next().await {
                Ok(_) => {}
                Err(Error::ScrollerUnresponsive) => return Err(Error::ScrollerUnresponsive),
                Err(e) => warn!("Input: handler failed: {:?}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Direction;
    use alloc::vec::Vec;
    use embassy_futures::block_on;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<InputEvent>,
    }

    impl InputSink for Recorder {
        async fn handle(&mut self, event: InputEvent) -> Result<(), Error> {
            self.seen.push(event);
            Ok(())
        }
    }

    #[test]
    fn offer_while_idle_is_delivered() {
        let arbiter = InputArbiter::new(Recorder::default());
        assert!(arbiter.offer(InputEvent::Press));
        assert!(block_on(arbiter.dispatch_next()).unwrap());
        assert_eq!(block_on(arbiter.acquire()).seen, [InputEvent::Press]);
    }

    #[test]
    fn offer_while_busy_is_dropped() {
        let arbiter = InputArbiter::new(Recorder::default());
        let guard = arbiter.try_admit().unwrap();
        assert!(arbiter.is_busy());
        assert!(!arbiter.offer(InputEvent::Press));
        drop(guard);
        assert!(!arbiter.is_busy());
        assert!(arbiter.events.try_receive().is_err());
    }

    #[test]
    fn second_offer_while_one_is_pending_is_dropped() {
        let arbiter = InputArbiter::new(Recorder::default());
        assert!(arbiter.offer(InputEvent::Rotate(Direction::Next)));
        assert!(!arbiter.offer(InputEvent::Rotate(Direction::Previous)));
        assert_eq!(
            block_on(arbiter.next_event()),
            InputEvent::Rotate(Direction::Next)
        );
    }

    #[test]
    fn pending_event_is_dropped_when_the_gate_is_taken_before_dispatch() {
        let arbiter = InputArbiter::new(Recorder::default());
        assert!(arbiter.offer(InputEvent::Press));
        block_on(async {
            let guard = arbiter.acquire().await;
            assert!(!arbiter.dispatch_next().await.unwrap());
            drop(guard);
        });
        assert!(block_on(arbiter.acquire()).seen.is_empty());
    }

    #[test]
    fn admission_resets_the_idle_clock() {
        let arbiter = InputArbiter::new(Recorder::default());
        assert_eq!(arbiter.tick_idle(), 1);
        assert_eq!(arbiter.tick_idle(), 2);
        // background writers do not count as activity
        drop(arbiter.try_acquire().unwrap());
        assert_eq!(arbiter.idle_secs(), 2);
        drop(arbiter.try_admit().unwrap());
        assert_eq!(arbiter.idle_secs(), 0);
    }
}
