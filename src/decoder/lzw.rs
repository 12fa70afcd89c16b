//! Variable-width LZW decompression for GIF image data.
//!
//! Codes are packed least-significant-bit first. The dictionary is a pair of
//! fixed 4096-entry prefix/suffix tables; strings are expanded through a
//! bounded stack so malformed input can never loop or grow memory.

use alloc::vec;
use alloc::vec::Vec;

/// Maximum code width in bits.
const MAX_CODE_WIDTH: u8 = 12;

/// Dictionary capacity (2^12 codes).
const MAX_CODES: usize = 1 << MAX_CODE_WIDTH;

/// Result of decompressing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzwOutput {
    /// Exactly the requested number of indices; zero past `produced`.
    pub pixels: Vec<u8>,
    /// Number of indices actually decoded from the stream.
    pub produced: usize,
}

impl LzwOutput {
    /// Whether the stream supplied every requested index.
    pub fn is_complete(&self) -> bool {
        self.produced == self.pixels.len()
    }
}

/// Reads LSB-first variable-width codes from a byte slice.
struct CodeReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    bits: u8,
}

impl<'a> CodeReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            acc: 0,
            bits: 0,
        }
    }

    /// Next code of `width` bits, or `None` if fewer bits remain.
    #[inline]
    fn next(&mut self, width: u8) -> Option<u16> {
        while self.bits < width {
            let byte = *self.data.get(self.pos)?;
            self.pos += 1;
            self.acc |= u32::from(byte) << self.bits;
            self.bits += 8;
        }
        let code = (self.acc & ((1 << width) - 1)) as u16;
        self.acc >>= width;
        self.bits -= width;
        Some(code)
    }
}

/// Decompress `data` into exactly `pixel_count` color indices.
///
/// Decoding stops at the end code, when the input runs out, or once
/// `pixel_count` indices are written; any shortfall is zero-padded.
pub fn decompress(min_code_size: u8, data: &[u8], pixel_count: usize) -> LzwOutput {
    let mut pixels = vec![0u8; pixel_count];
    let produced = decompress_into(min_code_size, data, &mut pixels);
    LzwOutput { pixels, produced }
}

/// Decompress into a caller-provided buffer, returning the number of
/// indices written. Entries past the returned count are left untouched.
pub fn decompress_into(min_code_size: u8, data: &[u8], out: &mut [u8]) -> usize {
    let min_code_size = min_code_size.clamp(1, MAX_CODE_WIDTH - 1);
    let clear = 1u16 << min_code_size;
    let end = clear + 1;

    let mut prefix = [0u16; MAX_CODES];
    let mut suffix = [0u8; MAX_CODES];
    for (code, s) in suffix.iter_mut().enumerate().take(usize::from(clear)) {
        *s = code as u8;
    }
    let mut stack: Vec<u8> = Vec::with_capacity(MAX_CODES);

    let mut width = min_code_size + 1;
    let mut next = end + 1;
    let mut prev: Option<u16> = None;
    let mut first: u8 = 0;
    let mut written = 0usize;
    let mut reader = CodeReader::new(data);

    while written < out.len() {
        let Some(code) = reader.next(width) else {
            break;
        };

        if code == clear {
            width = min_code_size + 1;
            next = end + 1;
            prev = None;
            continue;
        }
        if code == end {
            break;
        }

        let Some(prev_code) = prev else {
            first = suffix[usize::from(code)];
            out[written] = first;
            written += 1;
            prev = Some(code);
            continue;
        };

        stack.clear();
        let mut c = code;
        if c >= next {
            // Code not yet in the table: it is prev's string plus its own first byte.
            stack.push(first);
            c = prev_code;
        }
        while c > end && stack.len() < MAX_CODES {
            stack.push(suffix[usize::from(c)]);
            c = prefix[usize::from(c)];
        }
        first = suffix[usize::from(c)];
        stack.push(first);

        for &index in stack.iter().rev() {
            if written == out.len() {
                break;
            }
            out[written] = index;
            written += 1;
        }

        if usize::from(next) < MAX_CODES {
            prefix[usize::from(next)] = prev_code;
            suffix[usize::from(next)] = first;
            next += 1;
            if next == 1 << width && width < MAX_CODE_WIDTH {
                width += 1;
            }
        }
        prev = Some(code);
    }

    written
}

/// Minimal encoder emitting only literal codes, for building fixtures.
#[cfg(test)]
pub(crate) fn encode_literals(min_code_size: u8, indices: &[u8]) -> Vec<u8> {
    let clear = 1u32 << min_code_size;
    let end = clear + 1;
    let mut out = Vec::new();
    let mut acc = 0u32;
    let mut bits = 0u8;
    let mut emit = |code: u32, width: u8, out: &mut Vec<u8>| {
        acc |= code << bits;
        bits += width;
        while bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    };

    let mut width = min_code_size + 1;
    let mut next = end + 1;
    let mut have_prev = false;
    emit(clear, width, &mut out);
    for &index in indices {
        if next as usize >= MAX_CODES {
            emit(clear, width, &mut out);
            width = min_code_size + 1;
            next = end + 1;
            have_prev = false;
        }
        emit(u32::from(index), width, &mut out);
        if have_prev {
            next += 1;
            if next == 1 << width && width < MAX_CODE_WIDTH {
                width += 1;
            }
        }
        have_prev = true;
    }
    emit(end, width, &mut out);
    if bits > 0 {
        out.push(acc as u8);
    }
    out
}
