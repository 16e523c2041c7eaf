//! Idle timeout - return to the root menu after a period without input.
//!
//! A supervisor task ticks once per second. Each tick it tries the input
//! gate; while a handler runs the tick is skipped and not counted. On the
//! root menu the clock does not advance. Once the idle count reaches the
//! configured timeout the root menu is set and the clock starts over.

use embedded_hal_async::delay::DelayNs;

use crate::arbiter::InputArbiter;
use crate::config::TIMEOUT_TICK_MS;
use crate::error::Error;

/// Decide whether the idle timeout has elapsed.
pub fn should_return_to_root(timeout_secs: u32, at_root: bool, idle_secs: u32) -> bool {
    if timeout_secs == 0 || at_root {
        return false;
    }

    idle_secs >= timeout_secs
}

/// What the supervisor needs from the menu.
#[allow(async_fn_in_trait)]
pub trait RootMenu {
    fn at_root(&self) -> bool;

    async fn return_to_root(&mut self) -> Result<(), Error>;
}

/// Result of one supervisor tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// The gate was held; nothing counted.
    Skipped,
    /// Already at root; the clock is frozen.
    AtRoot,
    /// Counted one idle second.
    Idle(u32),
    /// Timeout elapsed and the root menu was restored.
    Restored,
}

pub struct TimeoutSupervisor {
    timeout_secs: u32,
}

impl TimeoutSupervisor {
    /// `timeout_secs == 0` disables the supervisor.
    pub const fn new(timeout_secs: u32) -> Self {
        Self { timeout_secs }
    }

    pub fn enabled(&self) -> bool {
        self.timeout_secs > 0
    }

    pub fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    /// Run one tick of the idle clock.
    pub async fn tick<T: RootMenu>(&self, arbiter: &InputArbiter<T>) -> Result<Tick, Error> {
        let Some(mut menu) = arbiter.try_acquire() else {
            return Ok(Tick::Skipped);
        };

        if menu.at_root() {
            return Ok(Tick::AtRoot);
        }

        let idle = arbiter.tick_idle();
        if !should_return_to_root(self.timeout_secs, false, idle) {
            return Ok(Tick::Idle(idle));
        }

        info!("Timeout: idle for {} s, returning to root", idle);
        menu.return_to_root().await?;
        arbiter.reset_idle();
        Ok(Tick::Restored)
    }

    /// Supervisor task body. Returns immediately when disabled.
    pub async fn run<T, D>(&self, arbiter: &InputArbiter<T>, mut delay: D) -> Result<(), Error>
    where
        T: RootMenu,
        D: DelayNs,
    {
        if !self.enabled() {
            info!("Timeout: disabled");
            return Ok(());
        }

        info!("Timeout: returning to root after {} s idle", self.timeout_secs);
        loop {
            delay.delay_ms(TIMEOUT_TICK_MS).await;
            match self.tick(arbiter).await {
                Ok(_) => {}
                Err(Error::ScrollerUnresponsive) => return Err(Error::ScrollerUnresponsive),
                Err(e) => warn!("Timeout: restoring root failed: {:?}", e),
            }
        }
    }
}
