//! Cheap header check for animated WebP.
//!
//! Only the RIFF/WEBP framing and the `VP8X` flags byte are inspected. A file
//! without a `VP8X` chunk cannot carry animation, so it is reported as static.

use crate::source::ByteSource;

/// Number of leading bytes requested from a source before classifying.
pub const PROBE_LEN: usize = 256;

/// Shortest header that reaches the `VP8X` flags byte.
const MIN_HEADER_LEN: usize = 24;

/// Offset of the `VP8X` flags byte.
const VP8X_FLAGS_OFFSET: usize = 20;

/// Animation bit in the `VP8X` flags byte.
const ANIMATION_FLAG: u8 = 0x02;

/// Whether `header` starts an animated WebP file.
///
/// Never fails: anything short, malformed or static yields `false`.
pub fn classify_animated(header: &[u8]) -> bool {
    if header.len() < MIN_HEADER_LEN {
        return false;
    }
    &header[0..4] == b"RIFF"
        && &header[8..12] == b"WEBP"
        && &header[12..16] == b"VP8X"
        && header[VP8X_FLAGS_OFFSET] & ANIMATION_FLAG != 0
}

/// Fetch the first [`PROBE_LEN`] bytes of `source` and classify them.
///
/// Fetch failures are logged and reported as not animated.
pub fn probe_animated<S: ByteSource + ?Sized>(source: &mut S) -> bool {
    match source.fetch(Some(PROBE_LEN)) {
        Ok(header) => {
            let animated = classify_animated(&header);
            tracing::debug!(len = header.len(), animated, "probed WebP header");
            animated
        }
        Err(err) => {
            tracing::debug!(error = %err, "WebP probe fetch failed, treating as static");
            false
        }
    }
}
