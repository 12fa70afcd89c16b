//! Playback engine: frame advancement, seeking and speed control.
//!
//! A [`Player`] is driven entirely from outside. Timers come from a
//! [`Scheduler`] and rendered canvases leave through a [`FrameSink`], so the
//! whole state machine runs deterministically under [`ManualScheduler`].

mod engine;
mod scheduler;
mod speed;

pub use engine::{EmittedFrame, FrameSink, PlaybackError, PlaybackState, Player, PlayerConfig};
pub use scheduler::{ManualScheduler, Scheduler, TimerToken};
pub use speed::{effective_delay, Speed, SPEED_LADDER_PERCENT};
