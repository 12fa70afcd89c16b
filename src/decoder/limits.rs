//! Resource caps applied while parsing a GIF.
//!
//! The parser checks the input length before reading the header, the
//! logical screen size once the screen descriptor is read, and the frame
//! count before each image descriptor is accepted. A player allocates one
//! RGBA canvas of the logical screen size, so the screen caps also bound
//! playback memory. The WebP loader applies the same caps to whatever the
//! platform decoder returns.

use super::api::DecodeError;

/// Caps on input size, logical screen size and frame count.
///
/// Each cap is optional and `None` disables it.
///
/// ```rust
/// use zengif::Limits;
///
/// let thumbnails = Limits::default()
///     .max_dimensions(512, 512)
///     .max_frame_count(300);
/// let trusted = Limits::none();
/// assert_ne!(thumbnails, trusted);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Limits {
    /// Largest accepted logical screen width.
    pub max_width: Option<u32>,

    /// Largest accepted logical screen height.
    pub max_height: Option<u32>,

    /// Largest accepted canvas area, `width * height`.
    pub max_total_pixels: Option<u64>,

    /// Most image descriptors accepted in one file.
    pub max_frame_count: Option<u64>,

    /// Largest accepted encoded input, in bytes.
    pub max_file_size: Option<u64>,
}

impl Default for Limits {
    /// Caps for untrusted input: any screen the 16-bit header can describe
    /// up to 100 megapixels, 10 000 frames and 100 MiB of input.
    fn default() -> Self {
        Self {
            max_width: Some(u32::from(u16::MAX)),
            max_height: Some(u32::from(u16::MAX)),
            max_total_pixels: Some(100_000_000),
            max_frame_count: Some(10_000),
            max_file_size: Some(100 * 1024 * 1024),
        }
    }
}

fn exceeded(what: &str, value: u64, max: u64) -> DecodeError {
    DecodeError::LimitExceeded(alloc::format!("{what} {value} exceeds limit {max}"))
}

impl Limits {
    /// No caps at all. Meant for inputs the caller produced itself.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_total_pixels: None,
            max_frame_count: None,
            max_file_size: None,
        }
    }

    /// Cap the logical screen width and height.
    #[must_use]
    pub fn max_dimensions(self, width: u32, height: u32) -> Self {
        Self {
            max_width: Some(width),
            max_height: Some(height),
            ..self
        }
    }

    /// Cap the canvas area.
    #[must_use]
    pub fn max_total_pixels(self, pixels: u64) -> Self {
        Self {
            max_total_pixels: Some(pixels),
            ..self
        }
    }

    /// Cap the number of frames.
    #[must_use]
    pub fn max_frame_count(self, count: u64) -> Self {
        Self {
            max_frame_count: Some(count),
            ..self
        }
    }

    /// Cap the encoded input length.
    #[must_use]
    pub fn max_file_size(self, bytes: u64) -> Self {
        Self {
            max_file_size: Some(bytes),
            ..self
        }
    }

    /// Reject a logical screen that is too wide, too tall or too large.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), DecodeError> {
        if let Some(max) = self.max_width.filter(|&max| width > max) {
            return Err(exceeded("width", width.into(), max.into()));
        }
        if let Some(max) = self.max_height.filter(|&max| height > max) {
            return Err(exceeded("height", height.into(), max.into()));
        }
        let area = u64::from(width) * u64::from(height);
        match self.max_total_pixels {
            Some(max) if area > max => Err(exceeded("canvas area", area, max)),
            _ => Ok(()),
        }
    }

    /// Reject another frame when `decoded` frames have already been accepted.
    pub fn check_frame_count(&self, decoded: usize) -> Result<(), DecodeError> {
        match self.max_frame_count {
            Some(max) if decoded as u64 >= max => {
                Err(exceeded("frame count", (decoded as u64).saturating_add(1), max))
            }
            _ => Ok(()),
        }
    }

    /// Reject an input of `size` bytes.
    pub fn check_file_size(&self, size: u64) -> Result<(), DecodeError> {
        match self.max_file_size {
            Some(max) if size > max => Err(exceeded("input size", size, max)),
            _ => Ok(()),
        }
    }
}
