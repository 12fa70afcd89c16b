//! Frame compositing onto a persistent RGBA canvas.
//!
//! An [`Animation`] holds frames in one of two shapes: indexed GIF frames
//! that are decoded into patches and drawn at their offsets, or frames that
//! were already composited to full-canvas images by a platform decoder. The
//! [`Compositor`] owns the canvas and applies the disposal rules between
//! frames.
//!
//! # Example
//!
//! ```rust,no_run
//! use zengif::{Animation, Compositor};
//!
//! let gif_data: &[u8] = &[]; // your GIF data
//! let animation = Animation::from_document(zengif::decode(gif_data)?);
//! let mut compositor = Compositor::new(animation.width(), animation.height());
//! for frame in animation.frames() {
//!     compositor.draw(frame);
//!     let _pixels = compositor.canvas();
//! }
//! # Ok::<(), zengif::DecodeError>(())
//! ```

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::decoder::{GifDocument, RawFrame};

/// A full-canvas image produced by an external decoder.
///
/// [`release`](Self::release) is called exactly once, when the owning
/// [`ComposedFrame`] is dropped.
pub trait ComposedImage {
    /// Image width in pixels.
    fn width(&self) -> u32;
    /// Image height in pixels.
    fn height(&self) -> u32;
    /// RGBA pixels, row-major, `width * height * 4` bytes.
    fn rgba(&self) -> &[u8];
    /// Free any resources held outside this value.
    fn release(&mut self) {}
}

/// Plain owned RGBA buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data.
    pub data: Vec<u8>,
}

impl ComposedImage for RgbaImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn rgba(&self) -> &[u8] {
        &self.data
    }
}

/// A pre-composited frame and its display duration.
pub struct ComposedFrame {
    image: Box<dyn ComposedImage>,
    delay_ms: u32,
}

impl ComposedFrame {
    /// Wrap an image shown for `delay_ms` milliseconds.
    pub fn new(image: Box<dyn ComposedImage>, delay_ms: u32) -> Self {
        Self { image, delay_ms }
    }

    /// Wrap an image whose duration is given in microseconds.
    pub fn from_duration_us(image: Box<dyn ComposedImage>, duration_us: u64) -> Self {
        let delay_ms = u32::try_from(duration_us / 1000).unwrap_or(u32::MAX);
        Self::new(image, delay_ms)
    }

    /// The wrapped image.
    pub fn image(&self) -> &dyn ComposedImage {
        self.image.as_ref()
    }

    /// Display duration in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }
}

impl Drop for ComposedFrame {
    fn drop(&mut self) {
        self.image.release();
    }
}

impl fmt::Debug for ComposedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedFrame")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("delay_ms", &self.delay_ms)
            .finish()
    }
}

/// One frame of an [`Animation`].
#[derive(Debug)]
pub enum SourceFrame {
    /// A GIF image block, decoded when drawn.
    Indexed(RawFrame),
    /// A full-canvas image that replaces the canvas when drawn.
    Composed(ComposedFrame),
}

impl SourceFrame {
    /// Display duration in milliseconds as stored in the source.
    pub fn delay_ms(&self) -> u32 {
        match self {
            SourceFrame::Indexed(frame) => frame.delay_ms,
            SourceFrame::Composed(frame) => frame.delay_ms(),
        }
    }
}

/// An ordered list of frames sharing one canvas size.
#[derive(Debug)]
pub struct Animation {
    width: u32,
    height: u32,
    frames: Vec<SourceFrame>,
}

impl Animation {
    /// Build an animation from arbitrary frames.
    pub fn new(width: u32, height: u32, frames: Vec<SourceFrame>) -> Self {
        Self {
            width,
            height,
            frames,
        }
    }

    /// Build an animation from a parsed GIF.
    pub fn from_document(document: GifDocument) -> Self {
        let (width, height) = document.dimensions();
        let frames = document
            .into_frames()
            .into_iter()
            .map(SourceFrame::Indexed)
            .collect();
        Self::new(width, height, frames)
    }

    /// Build an animation from pre-composited frames.
    pub fn from_composed(width: u32, height: u32, frames: Vec<ComposedFrame>) -> Self {
        let frames = frames.into_iter().map(SourceFrame::Composed).collect();
        Self::new(width, height, frames)
    }

    /// Canvas width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All frames in display order.
    pub fn frames(&self) -> &[SourceFrame] {
        &self.frames
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Composite every frame in order, returning a canvas snapshot per frame.
    pub fn composite_all(&self) -> Vec<CompositedFrame> {
        let mut compositor = Compositor::new(self.width, self.height);
        self.frames
            .iter()
            .map(|frame| {
                compositor.draw(frame);
                compositor.snapshot(frame.delay_ms())
            })
            .collect()
    }
}

/// An owned copy of the canvas after drawing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositedFrame {
    /// RGBA pixel data (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Display duration in milliseconds.
    pub delay_ms: u32,
}

/// Persistent RGBA canvas plus the pending-clear flag set by disposal.
#[derive(Clone)]
pub struct Compositor {
    width: u32,
    height: u32,
    canvas: Vec<u8>,
    clear_pending: bool,
}

impl Compositor {
    /// Create a transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            canvas: vec![0u8; width as usize * height as usize * 4],
            clear_pending: false,
        }
    }

    /// Current canvas pixels.
    pub fn canvas(&self) -> &[u8] {
        &self.canvas
    }

    /// Returns `(width, height)` of the canvas.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the canvas will be cleared before the next frame is drawn.
    pub fn clear_pending(&self) -> bool {
        self.clear_pending
    }

    /// Clear the canvas to transparent and drop any pending clear.
    pub fn reset(&mut self) {
        self.canvas.fill(0);
        self.clear_pending = false;
    }

    /// Draw one frame, honoring the previous frame's disposal.
    pub fn draw(&mut self, frame: &SourceFrame) {
        match frame {
            SourceFrame::Indexed(raw) => self.draw_indexed(raw),
            SourceFrame::Composed(composed) => self.draw_composed(composed.image()),
        }
    }

    /// Reset, then draw `frames` in order.
    pub fn replay(&mut self, frames: &[SourceFrame]) {
        self.reset();
        for frame in frames {
            self.draw(frame);
        }
    }

    /// Copy the canvas out.
    pub fn snapshot(&self, delay_ms: u32) -> CompositedFrame {
        CompositedFrame {
            rgba: self.canvas.clone(),
            width: self.width,
            height: self.height,
            delay_ms,
        }
    }

    fn draw_indexed(&mut self, frame: &RawFrame) {
        if self.clear_pending {
            self.canvas.fill(0);
        }

        let patch = frame.patch();
        let patch_width = usize::from(frame.width);
        let canvas_width = self.width as usize;
        let canvas_height = self.height as usize;
        let left = usize::from(frame.left);
        let top = usize::from(frame.top);

        if patch_width > 0 && left < canvas_width {
            let visible = patch_width.min(canvas_width - left);
            for (y, row) in patch.chunks_exact(patch_width * 4).enumerate() {
                let dst_y = top + y;
                if dst_y >= canvas_height {
                    break;
                }
                let dst_start = (dst_y * canvas_width + left) * 4;
                let dst_row = &mut self.canvas[dst_start..dst_start + visible * 4];
                for (dst, src) in dst_row
                    .chunks_exact_mut(4)
                    .zip(row[..visible * 4].chunks_exact(4))
                {
                    // Transparent pixels leave the canvas untouched.
                    if src[3] != 0 {
                        dst.copy_from_slice(src);
                    }
                }
            }
        }

        self.clear_pending = frame.disposal.clears_canvas();
    }

    fn draw_composed(&mut self, image: &dyn ComposedImage) {
        self.canvas.fill(0);
        let canvas_width = self.width as usize;
        let src_width = image.width() as usize;
        let cols = src_width.min(canvas_width);
        let rows = (image.height() as usize).min(self.height as usize);
        let rgba = image.rgba();
        for y in 0..rows {
            let src_start = y * src_width * 4;
            let Some(src) = rgba.get(src_start..src_start + cols * 4) else {
                break;
            };
            let dst_start = y * canvas_width * 4;
            self.canvas[dst_start..dst_start + cols * 4].copy_from_slice(src);
        }
        self.clear_pending = false;
    }
}

impl fmt::Debug for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("clear_pending", &self.clear_pending)
            .finish()
    }
}
