use core::fmt;

use thiserror::Error;

use super::scheduler::{Scheduler, TimerToken};
use super::speed::{effective_delay, Speed};
use crate::compose::{Animation, Compositor};

/// Errors from constructing or driving a [`Player`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaybackError {
    /// The animation has no frames to show.
    #[error("animation has no frames")]
    NoFrames,

    /// A seek target past the last frame.
    #[error("frame {index} out of bounds (animation has {total} frames)")]
    FrameOutOfBounds {
        /// Requested frame.
        index: usize,
        /// Number of frames.
        total: usize,
    },
}

/// One rendered canvas handed to a [`FrameSink`].
#[derive(Debug, Clone, Copy)]
pub struct EmittedFrame<'a> {
    /// Full-canvas RGBA pixels.
    pub rgba: &'a [u8],
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Index of the frame that was just drawn.
    pub index: usize,
}

/// Receives every frame the player renders.
pub trait FrameSink {
    /// Called once per rendered frame.
    fn emit(&mut self, frame: EmittedFrame<'_>);
}

impl<F: FnMut(EmittedFrame<'_>)> FrameSink for F {
    fn emit(&mut self, frame: EmittedFrame<'_>) {
        self(frame)
    }
}

/// Options applied when a [`Player`] is created.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Start playing immediately. Otherwise frame 0 is shown paused.
    pub autoplay: bool,
    /// Initial position on the speed ladder.
    pub initial_speed: Speed,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            initial_speed: Speed::NORMAL,
        }
    }
}

impl PlayerConfig {
    /// Set whether playback starts immediately.
    #[must_use]
    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Set the initial speed.
    #[must_use]
    pub fn initial_speed(mut self, speed: Speed) -> Self {
        self.initial_speed = speed;
        self
    }
}

/// Snapshot of the mutable playback fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    /// Frame drawn by the next render step.
    pub frame_index: usize,
    /// Whether the timer loop is running.
    pub playing: bool,
    /// Current speed.
    pub speed: Speed,
    /// Canvas will be cleared before the next indexed frame.
    pub clear_pending: bool,
    /// The armed timer, if any.
    pub timer: Option<TimerToken>,
}

/// Timer-driven playback of an [`Animation`].
///
/// The player owns the animation, its canvas and the playback state. Each
/// render step draws the frame at the current index, emits the canvas and
/// advances the index circularly; while playing, exactly one timer is armed.
///
/// # Example
///
/// ```rust
/// use zengif::{Animation, ManualScheduler, Player, PlayerConfig};
/// # fn demo(animation: Animation) -> Result<(), zengif::PlaybackError> {
/// let mut shown = 0usize;
/// let mut player = Player::new(
///     animation,
///     PlayerConfig::default(),
///     ManualScheduler::new(),
///     |_frame: zengif::EmittedFrame<'_>| shown += 1,
/// )?;
/// if let Some(token) = player.scheduler_mut().advance_to_next() {
///     player.tick(token);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Player<S: Scheduler, E: FrameSink> {
    animation: Animation,
    compositor: Compositor,
    frame_index: usize,
    playing: bool,
    speed: Speed,
    timer: Option<TimerToken>,
    scheduler: S,
    sink: E,
}

impl<S: Scheduler, E: FrameSink> Player<S, E> {
    /// Attach an animation to a new playback session.
    ///
    /// With `autoplay` the first frame is emitted and the timer armed;
    /// otherwise frame 0 is emitted and the player stays paused.
    pub fn new(
        animation: Animation,
        config: PlayerConfig,
        scheduler: S,
        sink: E,
    ) -> Result<Self, PlaybackError> {
        if animation.is_empty() {
            return Err(PlaybackError::NoFrames);
        }
        let compositor = Compositor::new(animation.width(), animation.height());
        let mut player = Self {
            animation,
            compositor,
            frame_index: 0,
            playing: false,
            speed: config.initial_speed,
            timer: None,
            scheduler,
            sink,
        };
        tracing::debug!(
            frames = player.animation.frame_count(),
            width = player.animation.width(),
            height = player.animation.height(),
            "player attached"
        );
        if config.autoplay {
            player.play();
        } else {
            player.seek_to_frame(0)?;
        }
        Ok(player)
    }

    /// Start the timer loop, rendering the current frame right away.
    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.render_step();
    }

    /// Stop the timer loop. No frame is emitted until [`play`](Self::play).
    pub fn pause(&mut self) {
        self.cancel_timer();
        self.playing = false;
    }

    /// Flip between playing and paused, returning the new playing state.
    pub fn toggle(&mut self) -> bool {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
        self.playing
    }

    /// Deliver a fired timer. Tokens other than the armed one are ignored.
    pub fn tick(&mut self, token: TimerToken) {
        if self.timer != Some(token) {
            tracing::trace!(token = token.0, "ignoring stale timer");
            return;
        }
        self.timer = None;
        self.render_step();
    }

    /// Pause and show frame `index`, composited from frame 0.
    pub fn seek_to_frame(&mut self, index: usize) -> Result<(), PlaybackError> {
        let total = self.animation.frame_count();
        if index >= total {
            return Err(PlaybackError::FrameOutOfBounds { index, total });
        }
        self.pause();
        self.compositor.replay(&self.animation.frames()[..=index]);
        self.frame_index = index;
        self.emit(index);
        Ok(())
    }

    /// Step one rung up the speed ladder, returning the new speed.
    pub fn increase_speed(&mut self) -> Speed {
        self.set_speed(self.speed.faster())
    }

    /// Step one rung down the speed ladder, returning the new speed.
    pub fn decrease_speed(&mut self) -> Speed {
        self.set_speed(self.speed.slower())
    }

    fn set_speed(&mut self, speed: Speed) -> Speed {
        if speed != self.speed {
            tracing::debug!(%speed, "speed changed");
        }
        self.speed = speed;
        speed
    }

    /// Index of the frame the next render step will draw.
    pub fn current_frame_index(&self) -> usize {
        self.frame_index
    }

    /// Number of frames in the animation.
    pub fn frame_count(&self) -> usize {
        self.animation.frame_count()
    }

    /// Current speed.
    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Whether the timer loop is running.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Canvas `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.compositor.dimensions()
    }

    /// Current canvas pixels.
    pub fn canvas(&self) -> &[u8] {
        self.compositor.canvas()
    }

    /// Copy of the playback fields.
    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            frame_index: self.frame_index,
            playing: self.playing,
            speed: self.speed,
            clear_pending: self.compositor.clear_pending(),
            timer: self.timer,
        }
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// The scheduler, mutably; used by hosts to drive timers.
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// The frame sink.
    pub fn sink(&self) -> &E {
        &self.sink
    }

    /// The frame sink, mutably.
    pub fn sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }

    /// End the session: cancel the timer and release every frame.
    pub fn teardown(self) {
        drop(self);
    }

    fn render_step(&mut self) {
        let index = self.frame_index;
        self.compositor.draw(&self.animation.frames()[index]);
        self.emit(index);
        self.frame_index = (index + 1) % self.animation.frame_count();

        if self.playing {
            let delay_ms = self.animation.frames()[self.frame_index].delay_ms();
            let delay = effective_delay(delay_ms, self.speed);
            self.timer = Some(self.scheduler.schedule(delay));
            tracing::trace!(
                rendered = index,
                next = self.frame_index,
                delay_us = delay.as_micros() as u64,
                "timer armed"
            );
        }
    }

    fn emit(&mut self, index: usize) {
        let (width, height) = self.compositor.dimensions();
        self.sink.emit(EmittedFrame {
            rgba: self.compositor.canvas(),
            width,
            height,
            index,
        });
    }

    fn cancel_timer(&mut self) {
        if let Some(token) = self.timer.take() {
            self.scheduler.cancel(token);
        }
    }
}

impl<S: Scheduler, E: FrameSink> Drop for Player<S, E> {
    fn drop(&mut self) {
        self.cancel_timer();
        tracing::debug!("player torn down");
    }
}

impl<S: Scheduler, E: FrameSink> fmt::Debug for Player<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("frames", &self.animation.frame_count())
            .field("state", &self.state())
            .finish()
    }
}
