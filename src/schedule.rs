//! Window timing and the per-tick refresh of the displayed code.
//!
//! Nothing here owns a timer. The host calls [`Ticker::tick`] at whatever
//! cadence it likes (once a second is enough for correctness, ten times a
//! second gives a smooth progress bar) and the ticker recomputes the code
//! only when the window counter moves.

use tracing::debug;

use crate::{totp::Totp, OtpError};

/// Seconds left in the window containing `unix_seconds`, in `1..=time_step`.
///
/// A window that has just started reports the full `time_step`, never zero.
///
/// # Panics
/// If `time_step` is zero
pub fn remaining_seconds(unix_seconds: u64, time_step: u64) -> u64 {
    time_step - unix_seconds % time_step
}

/// Fraction of the window left at `unix_millis`, in `(0, 1]`.
///
/// Windows longer than `u64::MAX` milliseconds are clamped to that length.
///
/// # Panics
/// If `time_step` is zero
pub fn remaining_fraction(unix_millis: u64, time_step: u64) -> f64 {
    let window_millis = time_step.saturating_mul(1000);
    let remaining = window_millis - unix_millis % window_millis;

    remaining as f64 / window_millis as f64
}

/// Seconds at or below which a code is about to expire.
pub const EXPIRY_WARNING_SECONDS: u64 = 5;

/// What the display needs after a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub code: String,
    pub remaining_seconds: u64,
    pub remaining_fraction: f64,
    /// Window index the code belongs to.
    pub counter: u64,
    /// The code differs from the one emitted by the previous tick.
    pub changed: bool,
}

impl Tick {
    pub fn is_expiring(&self) -> bool {
        self.remaining_seconds <= EXPIRY_WARNING_SECONDS
    }
}

/// Caches the last emitted code by window counter.
#[derive(Debug, Default)]
pub struct Ticker {
    last: Option<(u64, String)>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the cached code, e.g. after the selected account changes.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last_code(&self) -> Option<&str> {
        self.last.as_ref().map(|(_, code)| code.as_str())
    }

    pub fn tick(&mut self, totp: &Totp, unix_millis: u64) -> Result<Tick, OtpError> {
        let unix_seconds = unix_millis / 1000;
        let counter = totp.counter(unix_seconds)?;

        let cached = match &self.last {
            Some((last_counter, code)) if *last_counter == counter => Some(code.clone()),
            _ => None,
        };

        let (code, changed) = match cached {
            Some(code) => (code, false),
            None => {
                let code = totp.generate_at_counter(counter)?.to_string();
                let changed = self.last_code() != Some(code.as_str());
                debug!(counter, "time window rolled over");
                self.last = Some((counter, code.clone()));
                (code, changed)
            }
        };

        Ok(Tick {
            code,
            remaining_seconds: remaining_seconds(unix_seconds, totp.period()),
            remaining_fraction: remaining_fraction(unix_millis, totp.period()),
            counter,
            changed,
        })
    }
}
