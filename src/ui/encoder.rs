//! Rotary encoder decoding.
//!
//! Channels A and B produce a 2-bit Gray code. Every valid transition moves
//! the accumulator one quarter step; a full detent is reported once the
//! accumulator reaches `steps_per_detent` in either direction. Transitions
//! that skip a state (both channels changing at once) are noise and ignored.

use core::convert::Infallible;

use embassy_futures::select::{select, Either};
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

use crate::arbiter::InputArbiter;
use crate::ui::{Direction, InputEvent};

/// Quarter steps per mechanical detent on common EC11-style encoders.
pub const STEPS_PER_DETENT: i8 = 4;

/// Movement for `(previous << 2) | current`, where a state is `(a << 1) | b`.
const TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuadratureDecoder {
    state: u8,
    steps: i8,
    steps_per_detent: i8,
}

impl QuadratureDecoder {
    /// Decoder starting from the given channel levels.
    pub fn new(a: bool, b: bool) -> Self {
        Self::with_steps(a, b, STEPS_PER_DETENT)
    }

    pub fn with_steps(a: bool, b: bool, steps_per_detent: i8) -> Self {
        Self {
            state: encode(a, b),
            steps: 0,
            steps_per_detent: steps_per_detent.max(1),
        }
    }

    /// Feed the current channel levels; returns a direction on a full detent.
    ///
    /// Channel A leading B is `Next`.
    pub fn update(&mut self, a: bool, b: bool) -> Option<Direction> {
        let current = encode(a, b);
        let delta = TRANSITIONS[usize::from((self.state << 2) | current)];
        self.state = current;
        self.steps += delta;

        if self.steps >= self.steps_per_detent {
            self.steps = 0;
            Some(Direction::Next)
        } else if self.steps <= -self.steps_per_detent {
            self.steps = 0;
            Some(Direction::Previous)
        } else {
            None
        }
    }
}

fn encode(a: bool, b: bool) -> u8 {
    (u8::from(a) << 1) | u8::from(b)
}

/// Decode the encoder forever, offering each detent to the arbiter.
pub async fn encoder_task<A, B, T>(
    mut a: A,
    mut b: B,
    arbiter: &InputArbiter<T>,
) -> Result<Infallible, A::Error>
where
    A: Wait + InputPin,
    B: Wait + InputPin<Error = A::Error>,
{
    let mut decoder = QuadratureDecoder::new(a.is_high()?, b.is_high()?);
    loop {
        match select(a.wait_for_any_edge(), b.wait_for_any_edge()).await {
            Either::First(edge) => edge?,
            Either::Second(edge) => edge?,
        }

        if let Some(direction) = decoder.update(a.is_high()?, b.is_high()?) {
            trace!("Encoder: detent {:?}", direction);
            if !arbiter.offer(InputEvent::Rotate(direction)) {
                debug!("Encoder: rotation dropped");
            }
        }
    }
}
