use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::num::NonZeroU16;

use rgb::RGB8;
use thiserror::Error;

use super::blocks;
use super::interlace::deinterlace;
use super::limits::Limits;
use super::lzw;

/// Delay substituted for frames that declare no delay (or a zero delay).
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// Errors that can occur when attempting to decode a GIF image.
///
/// Every variant aborts the decode of that resource; no partially parsed
/// document is ever returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The header does not start with `GIF`.
    #[error("Invalid GIF signature: {0:x?}")]
    InvalidSignature([u8; 3]),

    /// The buffer ended in the middle of a structure.
    #[error("Truncated data: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        /// Byte offset at which the read was attempted.
        offset: usize,
        /// Number of bytes the structure required.
        needed: usize,
        /// Number of bytes left in the buffer.
        available: usize,
    },

    /// A frame has neither a local nor a global color table.
    #[error("Frame {frame} has no local color table and there is no global color table")]
    MissingColorTable {
        /// Zero-based index of the offending frame.
        frame: usize,
    },

    /// A frame's rectangle does not fit inside the logical screen.
    #[error(
        "Frame {frame} at ({left}, {top}) size {width}x{height} exceeds canvas {canvas_width}x{canvas_height}"
    )]
    FrameOutsideCanvas {
        /// Zero-based index of the offending frame.
        frame: usize,
        /// Frame left offset.
        left: u16,
        /// Frame top offset.
        top: u16,
        /// Frame width.
        width: u16,
        /// Frame height.
        height: u16,
        /// Logical screen width.
        canvas_width: u16,
        /// Logical screen height.
        canvas_height: u16,
    },

    /// The LZW minimum code size is outside `1..=11`.
    #[error("Invalid LZW minimum code size: {0}")]
    InvalidCodeSize(u8),

    /// A configured [`Limits`] bound was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// Decoding was cancelled via a [`enough::Stop`] token.
    #[error("Decoding cancelled: {0}")]
    Cancelled(enough::StopReason),
}

impl From<enough::StopReason> for DecodeError {
    fn from(reason: enough::StopReason) -> Self {
        Self::Cancelled(reason)
    }
}

/// Number of times that an animation asks to loop.
///
/// This is metadata only: playback always loops forever.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoopCount {
    /// The animation loops forever.
    Forever,
    /// The animation asks to be repeated the specified number of times.
    Times(NonZeroU16),
}

impl core::fmt::Display for LoopCount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LoopCount::Forever => f.write_str("infinite"),
            LoopCount::Times(n) => write!(f, "{} time{}", n, if n.get() == 1 { "" } else { "s" }),
        }
    }
}

impl From<u16> for LoopCount {
    fn from(n: u16) -> Self {
        match NonZeroU16::new(n) {
            None => LoopCount::Forever,
            Some(n) => LoopCount::Times(n),
        }
    }
}

/// How the canvas is treated after a frame has been shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DisposalMethod {
    /// No disposal specified; the frame stays on the canvas.
    #[default]
    Unspecified,
    /// Leave the frame in place.
    Keep,
    /// Clear the canvas to transparent before the next frame.
    RestoreBackground,
    /// Restore the canvas as it was before this frame.
    ///
    /// No snapshot is kept, so this behaves exactly like [`DisposalMethod::Keep`].
    RestorePrevious,
}

impl DisposalMethod {
    /// Interpret the 3-bit disposal field of a graphic control extension.
    ///
    /// Values 4-7 are undefined by the format and treated as unspecified.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            1 => Self::Keep,
            2 => Self::RestoreBackground,
            3 => Self::RestorePrevious,
            _ => Self::Unspecified,
        }
    }

    /// Whether the canvas is cleared before the following frame is drawn.
    pub const fn clears_canvas(self) -> bool {
        matches!(self, Self::RestoreBackground)
    }
}

/// A color table: an ordered list of RGB triples, shared between frames.
pub type ColorTable = Arc<[RGB8]>;

/// One image block of a GIF, still LZW-compressed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// Horizontal offset of the frame on the canvas.
    pub left: u16,
    /// Vertical offset of the frame on the canvas.
    pub top: u16,
    /// Frame width in pixels.
    pub width: u16,
    /// Frame height in pixels.
    pub height: u16,
    /// The frame's local color table, or the global one when it has none.
    pub color_table: ColorTable,
    /// LZW minimum code size.
    pub min_code_size: u8,
    /// Concatenated LZW sub-block payloads.
    pub data: Vec<u8>,
    /// Display duration in milliseconds, never zero.
    pub delay_ms: u32,
    /// What happens to the canvas after this frame.
    pub disposal: DisposalMethod,
    /// Color index rendered as fully transparent.
    pub transparent_index: Option<u8>,
    /// Whether rows are stored in interlaced order.
    pub interlaced: bool,
}

impl RawFrame {
    /// Number of pixels in the frame rectangle.
    pub fn pixel_count(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Decompress the frame into color-table indices in raster order.
    ///
    /// The result always holds exactly [`pixel_count`](Self::pixel_count)
    /// entries; a code stream that ends early is padded with index 0.
    pub fn indices(&self) -> Vec<u8> {
        let out = lzw::decompress(self.min_code_size, &self.data, self.pixel_count());
        if !out.is_complete() {
            tracing::debug!(
                produced = out.produced,
                expected = out.pixels.len(),
                "LZW stream exhausted early, zero-padding frame"
            );
        }
        if self.interlaced {
            deinterlace(&out.pixels, self.width.into(), self.height.into())
        } else {
            out.pixels
        }
    }

    /// Decode the frame into an RGBA patch of `width * height * 4` bytes.
    ///
    /// The transparent index yields alpha 0, every other index its table
    /// color (black when the index is past the end of the table) with alpha 255.
    pub fn patch(&self) -> Vec<u8> {
        let indices = self.indices();
        let mut rgba = Vec::with_capacity(indices.len() * 4);
        for index in indices {
            let color = self
                .color_table
                .get(usize::from(index))
                .copied()
                .unwrap_or(RGB8::new(0, 0, 0));
            let alpha = if self.transparent_index == Some(index) {
                0
            } else {
                255
            };
            rgba.extend_from_slice(&[color.r, color.g, color.b, alpha]);
        }
        rgba
    }

    /// Decode the frame into a positioned [`FramePatch`].
    pub fn to_patch(&self) -> FramePatch {
        FramePatch {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            rgba: self.patch(),
            delay_ms: self.delay_ms,
            disposal: self.disposal,
        }
    }
}

/// A decoded frame rectangle, ready to be drawn at its offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePatch {
    /// Horizontal offset of the patch on the canvas.
    pub left: u16,
    /// Vertical offset of the patch on the canvas.
    pub top: u16,
    /// Patch width in pixels.
    pub width: u16,
    /// Patch height in pixels.
    pub height: u16,
    /// RGBA pixel data (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
    /// Display duration in milliseconds.
    pub delay_ms: u32,
    /// What happens to the canvas after this frame.
    pub disposal: DisposalMethod,
}

/// A parsed GIF: logical screen, color tables and still-compressed frames.
///
/// Immutable after parsing; frames are decompressed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct GifDocument {
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) global_color_table: Option<ColorTable>,
    pub(crate) background_index: u8,
    pub(crate) loop_count: Option<LoopCount>,
    pub(crate) frames: Vec<RawFrame>,
}

impl GifDocument {
    /// Logical screen width.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Logical screen height.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Returns `(width, height)` of the logical screen.
    pub fn dimensions(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    /// The global color table, if present.
    pub fn global_color_table(&self) -> Option<&[RGB8]> {
        self.global_color_table.as_deref()
    }

    /// Background color index from the logical screen descriptor.
    pub fn background_index(&self) -> u8 {
        self.background_index
    }

    /// Loop count requested by a `NETSCAPE2.0` application extension.
    pub fn loop_count(&self) -> Option<LoopCount> {
        self.loop_count
    }

    /// All frames in file order.
    pub fn frames(&self) -> &[RawFrame] {
        &self.frames
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` when the document holds more than one frame.
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// Decode a single frame into a positioned RGBA patch.
    pub fn decode_frame(&self, index: usize) -> Option<FramePatch> {
        self.frames.get(index).map(RawFrame::to_patch)
    }

    /// Consume the document, returning its frames.
    pub fn into_frames(self) -> Vec<RawFrame> {
        self.frames
    }
}

/// GIF decoder configuration. Reusable across requests.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DecodeConfig {
    /// Resource limits applied while parsing.
    pub limits: Limits,
}

impl DecodeConfig {
    /// Set the decode limits.
    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

/// Decoding request that borrows configuration and input data.
///
/// # Example
///
/// ```rust,no_run
/// use zengif::{DecodeConfig, DecodeRequest};
///
/// let config = DecodeConfig::default();
/// let gif_data: &[u8] = &[]; // your GIF data
/// let document = DecodeRequest::new(&config, gif_data).decode()?;
/// println!("{} frame(s)", document.frame_count());
/// # Ok::<(), zengif::DecodeError>(())
/// ```
pub struct DecodeRequest<'a> {
    config: &'a DecodeConfig,
    data: &'a [u8],
    stop: Option<&'a dyn enough::Stop>,
}

impl<'a> DecodeRequest<'a> {
    /// Create a new decoding request.
    #[must_use]
    pub fn new(config: &'a DecodeConfig, data: &'a [u8]) -> Self {
        Self {
            config,
            data,
            stop: None,
        }
    }

    /// Set a cooperative cancellation token, checked before every image block.
    #[must_use]
    pub fn stop(mut self, stop: &'a dyn enough::Stop) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Parse the buffer into a [`GifDocument`].
    pub fn decode(self) -> Result<GifDocument, DecodeError> {
        let document = blocks::parse(self.data, &self.config.limits, self.stop)?;
        tracing::debug!(
            width = document.width,
            height = document.height,
            frames = document.frames.len(),
            "parsed GIF document"
        );
        Ok(document)
    }
}

/// Parse a GIF with the default configuration.
pub fn decode(data: &[u8]) -> Result<GifDocument, DecodeError> {
    DecodeRequest::new(&DecodeConfig::default(), data).decode()
}

/// Decode every frame of a document into positioned RGBA patches.
pub fn decode_frames(document: &GifDocument) -> Vec<FramePatch> {
    document.frames.iter().map(RawFrame::to_patch).collect()
}
