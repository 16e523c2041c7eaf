//! Push-button input with async debouncing.
//!
//! The encoder's push button is active-low with a pull-up. The button task
//! waits for a falling edge, debounces it, offers `InputEvent::Press` to the
//! arbiter, then waits for release before re-arming. Presses closer together
//! than the debounce window never reach the arbiter.

use core::convert::Infallible;

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;

use crate::arbiter::InputArbiter;
use crate::ui::InputEvent;

/// Wait for one debounced press.
///
/// Returns once the pin has gone low and is still low after `debounce_ms`.
/// Bounces shorter than the window are swallowed.
pub async fn next_press<P, D>(pin: &mut P, delay: &mut D, debounce_ms: u32) -> Result<(), P::Error>
where
    P: Wait + InputPin,
    D: DelayNs,
{
    loop {
        pin.wait_for_falling_edge().await?;

        // Debounce: wait and re-check.
        delay.delay_ms(debounce_ms).await;

        if pin.is_low()? {
            return Ok(());
        }
    }
}

/// Wait until the button is released and the contacts have settled.
pub async fn release<P, D>(pin: &mut P, delay: &mut D, debounce_ms: u32) -> Result<(), P::Error>
where
    P: Wait + InputPin,
    D: DelayNs,
{
    pin.wait_for_high().await?;
    delay.delay_ms(debounce_ms).await;
    Ok(())
}

/// Run the button loop forever, offering each press to the arbiter.
pub async fn button_task<P, D, T>(
    mut pin: P,
    mut delay: D,
    arbiter: &InputArbiter<T>,
    debounce_ms: u32,
) -> Result<Infallible, P::Error>
where
    P: Wait + InputPin,
    D: DelayNs,
{
    loop {
        next_press(&mut pin, &mut delay, debounce_ms).await?;
        if !arbiter.offer(InputEvent::Press) {
            debug!("Button: press dropped");
        }

        // Wait for release to avoid repeat triggers.
        release(&mut pin, &mut delay, debounce_ms).await?;
    }
}
