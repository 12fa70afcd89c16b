//! Turning a byte source into a playable [`Animation`].
//!
//! GIF data is parsed in-crate. Animated WebP is only probed here; decoding
//! its frames is delegated to a [`PlatformDecoder`] supplied by the host,
//! which returns fully composited frames.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use thiserror::Error;

use crate::compose::{Animation, ComposedFrame, ComposedImage};
use crate::decoder::{DecodeConfig, DecodeError, DecodeRequest};
use crate::probe::probe_animated;
use crate::source::{ByteSource, FetchError};

/// Encoded formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// GIF87a / GIF89a.
    Gif,
    /// WebP, decoded by a platform decoder.
    WebP,
}

impl SourceFormat {
    /// Detect the format from the first bytes of a file.
    pub fn sniff(header: &[u8]) -> Option<SourceFormat> {
        if header.starts_with(b"GIF") {
            Some(SourceFormat::Gif)
        } else if header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WEBP" {
            Some(SourceFormat::WebP)
        } else {
            None
        }
    }

    /// Guess the format from a path or URL extension, ignoring any query or
    /// fragment. Matching is case-insensitive.
    pub fn from_path(path: &str) -> Option<SourceFormat> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let ext = path.rsplit_once('.')?.1;
        if ext.contains('/') {
            return None;
        }
        if ext.eq_ignore_ascii_case("gif") {
            Some(SourceFormat::Gif)
        } else if ext.eq_ignore_ascii_case("webp") {
            Some(SourceFormat::WebP)
        } else {
            None
        }
    }

    /// MIME type of the format.
    pub fn mime_type(self) -> &'static str {
        match self {
            SourceFormat::Gif => "image/gif",
            SourceFormat::WebP => "image/webp",
        }
    }
}

/// A frame produced by a [`PlatformDecoder`].
pub struct PlatformFrame {
    /// Fully composited canvas image.
    pub image: Box<dyn ComposedImage>,
    /// Display duration in microseconds.
    pub duration_us: u64,
}

impl core::fmt::Debug for PlatformFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PlatformFrame")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("duration_us", &self.duration_us)
            .finish()
    }
}

/// Failure reported by a platform decoder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PlatformError(pub String);

/// External decoder for formats this crate does not decode itself.
pub trait PlatformDecoder {
    /// Decode a complete buffer into composited frames, in display order.
    fn decode(
        &mut self,
        data: &[u8],
        format: SourceFormat,
    ) -> Result<Vec<PlatformFrame>, PlatformError>;
}

/// Errors from [`load_animation`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The GIF data is malformed or exceeds a limit.
    #[error("format error: {0}")]
    Format(#[from] DecodeError),

    /// The bytes could not be fetched.
    #[error("network error: {0}")]
    Network(#[from] FetchError),

    /// The resource cannot be animated here; callers should show it as a
    /// static image.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The platform decoder failed.
    #[error("platform decoder error: {0}")]
    Platform(#[from] PlatformError),
}

/// Fetch and decode a resource into an [`Animation`].
///
/// WebP requires `platform`; without one, or when the header does not carry
/// the animation flag, [`LoadError::UnsupportedFormat`] is returned.
pub fn load_animation<S: ByteSource + ?Sized>(
    source: &mut S,
    format: SourceFormat,
    config: &DecodeConfig,
    platform: Option<&mut dyn PlatformDecoder>,
) -> Result<Animation, LoadError> {
    match format {
        SourceFormat::Gif => {
            let data = source.fetch(None)?;
            let document = DecodeRequest::new(config, &data).decode()?;
            Ok(Animation::from_document(document))
        }
        SourceFormat::WebP => {
            let Some(platform) = platform else {
                return Err(LoadError::UnsupportedFormat(
                    "no platform decoder available for WebP".to_string(),
                ));
            };
            if !probe_animated(source) {
                return Err(LoadError::UnsupportedFormat(
                    "WebP is not animated".to_string(),
                ));
            }

            let data = source.fetch(None)?;
            config.limits.check_file_size(data.len() as u64)?;
            // Dropping a ComposedFrame releases its image.
            let frames: Vec<ComposedFrame> = platform
                .decode(&data, format)?
                .into_iter()
                .map(|f| ComposedFrame::from_duration_us(f.image, f.duration_us))
                .collect();
            let Some(first) = frames.first() else {
                return Err(LoadError::UnsupportedFormat(
                    "platform decoder returned no frames".to_string(),
                ));
            };
            let (width, height) = (first.image().width(), first.image().height());
            config.limits.check_dimensions(width, height)?;
            config.limits.check_frame_count(frames.len() - 1)?;

            tracing::debug!(frames = frames.len(), width, height, "loaded WebP animation");
            Ok(Animation::from_composed(width, height, frames))
        }
    }
}
