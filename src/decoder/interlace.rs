//! Row reordering for interlaced GIF frames.

use alloc::vec;
use alloc::vec::Vec;

/// The four interlace passes as `(start_row, step)`.
pub const INTERLACE_PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Destination row for each stored row, in storage order.
///
/// For a height of 8 this is `[0, 4, 2, 6, 1, 3, 5, 7]`.
pub fn interlaced_row_order(height: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(height);
    for &(start, step) in &INTERLACE_PASSES {
        order.extend((start..height).step_by(step));
    }
    order
}

/// Reorder interlaced index data into raster order.
///
/// Stored row `k` is written to destination row `interlaced_row_order(height)[k]`.
/// The input is expected to hold `width * height` entries; missing rows stay 0.
pub fn deinterlace(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; width * height];
    if width == 0 {
        return out;
    }
    for (src_row, dst_row) in data
        .chunks_exact(width)
        .zip(interlaced_row_order(height))
    {
        let start = dst_row * width;
        out[start..start + width].copy_from_slice(src_row);
    }
    out
}
