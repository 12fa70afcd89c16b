//! Decoding and Playback of Animated GIF Images
//!
//! This crate parses GIF files, composites their frames onto a persistent
//! canvas following each frame's disposal method, and drives timer-based
//! playback with seeking and a stepped speed control. Animated WebP files
//! are recognised from their header; their frames are decoded by a
//! host-supplied platform decoder and played through the same engine.
//!
//! # Features
//!
//! - `std` (default): Enable standard library support, including
//!   [`FileSource`] and I/O error conversion.
//!
//! # no_std Support
//!
//! Decoding, compositing and playback work in `no_std` environments
//! (requires `alloc`):
//! ```toml
//! [dependencies]
//! zengif = { version = "...", default-features = false }
//! ```
//!
//! # Decoding
//!
//! ```rust,no_run
//! let gif_data: &[u8] = &[]; // your GIF data
//! let document = zengif::decode(gif_data)?;
//! for patch in zengif::decode_frames(&document) {
//!     println!("{}x{} at ({}, {})", patch.width, patch.height, patch.left, patch.top);
//! }
//! # Ok::<(), zengif::DecodeError>(())
//! ```
//!
//! # Playback
//!
//! A [`Player`] never sleeps or spawns threads. It asks a [`Scheduler`] for
//! one-shot timers and renders when the host hands the fired token back to
//! [`Player::tick`]:
//!
//! ```rust,no_run
//! use zengif::{Animation, ManualScheduler, Player, PlayerConfig};
//!
//! let gif_data: &[u8] = &[]; // your GIF data
//! let animation = Animation::from_document(zengif::decode(gif_data)?);
//! let mut player = Player::new(
//!     animation,
//!     PlayerConfig::default(),
//!     ManualScheduler::new(),
//!     |frame: zengif::EmittedFrame<'_>| println!("frame {}", frame.index),
//! )?;
//! // Playback loops forever; render the next ten frames.
//! for _ in 0..10 {
//!     if let Some(token) = player.scheduler_mut().advance_to_next() {
//!         player.tick(token);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

extern crate alloc;

pub mod compose;
pub mod decoder;
pub mod load;
pub mod player;
pub mod probe;
pub mod source;

// Slice reader utility (used by the block parser)
mod slice_reader;

// Re-export decoder public API
pub use decoder::{
    decode, decode_frames, ColorTable, DecodeConfig, DecodeError, DecodeRequest,
    DisposalMethod, FramePatch, GifDocument, Limits, LoopCount, RawFrame,
};

// Re-export compositing and playback
pub use compose::{
    Animation, ComposedFrame, ComposedImage, CompositedFrame, Compositor, RgbaImage, SourceFrame,
};
pub use player::{
    EmittedFrame, FrameSink, ManualScheduler, PlaybackError, PlaybackState, Player, PlayerConfig,
    Scheduler, Speed, TimerToken,
};

// Re-export loading
pub use load::{
    load_animation, LoadError, PlatformDecoder, PlatformError, PlatformFrame, SourceFormat,
};
pub use probe::{classify_animated, probe_animated};
#[cfg(feature = "std")]
pub use source::FileSource;
pub use source::{ByteSource, FetchError};

// Re-export cooperative cancellation types
pub use enough::{Stop, StopReason, Unstoppable};
