//! Discrete playback speed ladder.

use core::fmt;
use core::time::Duration;

use crate::decoder::DEFAULT_FRAME_DELAY_MS;

/// Available speeds in percent of normal, slowest first.
pub const SPEED_LADDER_PERCENT: [u16; 11] = [10, 20, 40, 60, 100, 120, 150, 200, 250, 300, 400];

/// A position on the speed ladder.
///
/// Always one of the eleven ladder values; stepping past either end clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Speed(u8);

impl Speed {
    /// 0.1x
    pub const SLOWEST: Speed = Speed(0);
    /// 1x
    pub const NORMAL: Speed = Speed(4);
    /// 4x
    pub const FASTEST: Speed = Speed(SPEED_LADDER_PERCENT.len() as u8 - 1);

    /// The next faster speed, or `self` at the top of the ladder.
    #[must_use]
    pub fn faster(self) -> Speed {
        if self == Self::FASTEST {
            self
        } else {
            Speed(self.0 + 1)
        }
    }

    /// The next slower speed, or `self` at the bottom of the ladder.
    #[must_use]
    pub fn slower(self) -> Speed {
        Speed(self.0.saturating_sub(1))
    }

    /// Speed in percent of normal.
    pub fn percent(self) -> u16 {
        SPEED_LADDER_PERCENT[usize::from(self.0)]
    }

    /// Speed as a multiplier, e.g. `1.5`.
    pub fn factor(self) -> f32 {
        f32::from(self.percent()) / 100.0
    }

    /// The ladder entry exactly matching `factor`, if any.
    pub fn from_factor(factor: f32) -> Option<Speed> {
        SPEED_LADDER_PERCENT
            .iter()
            .position(|&p| {
                let diff = f32::from(p) / 100.0 - factor;
                diff > -1e-4 && diff < 1e-4
            })
            .map(|i| Speed(i as u8))
    }

    /// Whether no faster speed exists.
    pub fn is_fastest(self) -> bool {
        self == Self::FASTEST
    }

    /// Whether no slower speed exists.
    pub fn is_slowest(self) -> bool {
        self == Self::SLOWEST
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.percent();
        if p % 100 == 0 {
            write!(f, "{}x", p / 100)
        } else if p % 10 == 0 {
            write!(f, "{}.{}x", p / 100, (p % 100) / 10)
        } else {
            write!(f, "{}.{:02}x", p / 100, p % 100)
        }
    }
}

/// How long a frame with `delay_ms` stays up at `speed`.
///
/// A zero delay is treated as [`DEFAULT_FRAME_DELAY_MS`].
pub fn effective_delay(delay_ms: u32, speed: Speed) -> Duration {
    let delay_ms = if delay_ms == 0 {
        DEFAULT_FRAME_DELAY_MS
    } else {
        delay_ms
    };
    let micros = u64::from(delay_ms) * 1000 * 100 / u64::from(speed.percent());
    Duration::from_micros(micros)
}
