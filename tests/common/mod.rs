//! Shared fixtures: a tiny GIF writer for building test inputs in memory.

#![allow(dead_code)]

use std::collections::HashMap;

/// Frame description for [`GifBuilder`]. Indices are given in raster order.
#[derive(Clone, Debug)]
pub struct FrameSpec {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub indices: Vec<u8>,
    pub delay_cs: u16,
    pub disposal: u8,
    pub transparent: Option<u8>,
    pub interlaced: bool,
    pub local_palette: Option<Vec<[u8; 3]>>,
    pub graphic_control: bool,
}

impl FrameSpec {
    pub fn new(left: u16, top: u16, width: u16, height: u16, indices: Vec<u8>) -> Self {
        assert_eq!(indices.len(), usize::from(width) * usize::from(height));
        Self {
            left,
            top,
            width,
            height,
            indices,
            delay_cs: 10,
            disposal: 0,
            transparent: None,
            interlaced: false,
            local_palette: None,
            graphic_control: true,
        }
    }

    /// A frame filled with a single index.
    pub fn solid(left: u16, top: u16, width: u16, height: u16, index: u8) -> Self {
        let count = usize::from(width) * usize::from(height);
        Self::new(left, top, width, height, vec![index; count])
    }

    pub fn delay_cs(mut self, delay_cs: u16) -> Self {
        self.delay_cs = delay_cs;
        self
    }

    pub fn disposal(mut self, disposal: u8) -> Self {
        self.disposal = disposal;
        self
    }

    pub fn transparent(mut self, index: u8) -> Self {
        self.transparent = Some(index);
        self
    }

    pub fn interlaced(mut self) -> Self {
        self.interlaced = true;
        self
    }

    pub fn local_palette(mut self, palette: Vec<[u8; 3]>) -> Self {
        self.local_palette = Some(palette);
        self
    }

    pub fn without_graphic_control(mut self) -> Self {
        self.graphic_control = false;
        self
    }
}

/// Writes minimal GIF89a files.
#[derive(Clone, Debug)]
pub struct GifBuilder {
    width: u16,
    height: u16,
    palette: Option<Vec<[u8; 3]>>,
    background: u8,
    loop_count: Option<u16>,
    frames: Vec<FrameSpec>,
    coding: Coding,
}

/// How [`GifBuilder`] compresses frame data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coding {
    /// One literal code per pixel.
    Literal,
    /// Real dictionary compression, see [`encode_lzw`].
    Dictionary { clear_when_full: bool },
}

impl GifBuilder {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            palette: None,
            background: 0,
            loop_count: None,
            frames: Vec::new(),
            coding: Coding::Literal,
        }
    }

    pub fn palette(mut self, palette: Vec<[u8; 3]>) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn background(mut self, index: u8) -> Self {
        self.background = index;
        self
    }

    pub fn loop_count(mut self, count: u16) -> Self {
        self.loop_count = Some(count);
        self
    }

    pub fn coding(mut self, coding: Coding) -> Self {
        self.coding = coding;
        self
    }

    pub fn frame(mut self, frame: FrameSpec) -> Self {
        self.frames.push(frame);
        self
    }

    /// Serialize without a trailer byte.
    pub fn build_without_trailer(&self) -> Vec<u8> {
        let mut out = b"GIF89a".to_vec();
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        match &self.palette {
            Some(palette) => {
                let exp = table_exponent(palette.len());
                out.push(0x80 | exp);
                out.push(self.background);
                out.push(0);
                write_table(&mut out, palette, exp);
            }
            None => {
                out.extend_from_slice(&[0, self.background, 0]);
            }
        }

        if let Some(count) = self.loop_count {
            out.extend_from_slice(&[0x21, 0xFF, 11]);
            out.extend_from_slice(b"NETSCAPE2.0");
            out.extend_from_slice(&[3, 1]);
            out.extend_from_slice(&count.to_le_bytes());
            out.push(0);
        }

        for frame in &self.frames {
            if frame.graphic_control {
                let mut packed = (frame.disposal & 0x07) << 2;
                if frame.transparent.is_some() {
                    packed |= 1;
                }
                out.extend_from_slice(&[0x21, 0xF9, 4, packed]);
                out.extend_from_slice(&frame.delay_cs.to_le_bytes());
                out.push(frame.transparent.unwrap_or(0));
                out.push(0);
            }

            out.push(0x2C);
            out.extend_from_slice(&frame.left.to_le_bytes());
            out.extend_from_slice(&frame.top.to_le_bytes());
            out.extend_from_slice(&frame.width.to_le_bytes());
            out.extend_from_slice(&frame.height.to_le_bytes());

            let mut packed = 0u8;
            if frame.interlaced {
                packed |= 0x40;
            }
            let table_len = match (&frame.local_palette, &self.palette) {
                (Some(local), _) => {
                    let exp = table_exponent(local.len());
                    out.push(packed | 0x80 | exp);
                    write_table(&mut out, local, exp);
                    local.len()
                }
                (None, global) => {
                    out.push(packed);
                    global.as_ref().map_or(4, Vec::len)
                }
            };

            let min_code_size = (table_exponent(table_len) + 1).max(2);
            out.push(min_code_size);

            let stored = if frame.interlaced {
                interlace(&frame.indices, frame.width.into(), frame.height.into())
            } else {
                frame.indices.clone()
            };
            let compressed = match self.coding {
                Coding::Literal => encode_literals(min_code_size, &stored),
                Coding::Dictionary { clear_when_full } => {
                    encode_lzw(min_code_size, &stored, clear_when_full).bytes
                }
            };
            for chunk in compressed.chunks(255) {
                out.push(chunk.len() as u8);
                out.extend_from_slice(chunk);
            }
            out.push(0);
        }
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = self.build_without_trailer();
        out.push(0x3B);
        out
    }
}

/// Smallest `n` such that `2^(n+1) >= len`.
fn table_exponent(len: usize) -> u8 {
    let mut exp = 0u8;
    while (1usize << (exp + 1)) < len && exp < 7 {
        exp += 1;
    }
    exp
}

fn write_table(out: &mut Vec<u8>, palette: &[[u8; 3]], exp: u8) {
    let size = 1usize << (exp + 1);
    for i in 0..size {
        out.extend_from_slice(&palette.get(i).copied().unwrap_or([0, 0, 0]));
    }
}

/// Raster rows to interlaced storage order.
fn interlace(indices: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(indices.len());
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        for row in (start..height).step_by(step) {
            out.extend_from_slice(&indices[row * width..(row + 1) * width]);
        }
    }
    out
}

/// LZW stream made only of literal codes, with clear codes whenever the
/// dictionary fills.
pub fn encode_literals(min_code_size: u8, indices: &[u8]) -> Vec<u8> {
    let clear = 1u32 << min_code_size;
    let end = clear + 1;
    let mut writer = BitWriter::default();

    let mut width = min_code_size + 1;
    let mut next = end + 1;
    let mut have_prev = false;
    writer.write(clear, width);
    for &index in indices {
        if next >= 4096 {
            writer.write(clear, width);
            width = min_code_size + 1;
            next = end + 1;
            have_prev = false;
        }
        writer.write(u32::from(index), width);
        if have_prev {
            next += 1;
            if next == 1 << width && width < 12 {
                width += 1;
            }
        }
        have_prev = true;
    }
    writer.write(end, width);
    writer.finish()
}

/// Output of [`encode_lzw`].
#[derive(Clone, Debug)]
pub struct LzwStream {
    pub bytes: Vec<u8>,
    /// Clear codes written, including the leading one.
    pub clear_codes: usize,
    /// Whether the code table reached 4096 entries at some point.
    pub table_filled: bool,
}

/// Dictionary-building LZW encoder in the style of giflib.
///
/// With `clear_when_full` a clear code is written as soon as the table is
/// full; without it the table is frozen and coding continues at 12 bits.
pub fn encode_lzw(min_code_size: u8, indices: &[u8], clear_when_full: bool) -> LzwStream {
    let clear = 1u16 << min_code_size;
    let end = clear + 1;
    let mut codes = CodeWriter::new(min_code_size);
    let mut table: HashMap<(u16, u8), u16> = HashMap::new();
    let mut next_code = end + 1;
    let mut clear_codes = 1;
    let mut table_filled = false;

    codes.clear();
    if let Some((&head, rest)) = indices.split_first() {
        let mut prefix = u16::from(head);
        for &byte in rest {
            if let Some(&code) = table.get(&(prefix, byte)) {
                prefix = code;
                continue;
            }
            codes.code(prefix);
            if next_code < 4096 {
                table.insert((prefix, byte), next_code);
                next_code += 1;
                table_filled |= next_code == 4096;
            } else if clear_when_full {
                codes.clear();
                clear_codes += 1;
                table.clear();
                next_code = end + 1;
            }
            prefix = u16::from(byte);
        }
        codes.code(prefix);
    }
    codes.end();

    LzwStream {
        bytes: codes.writer.finish(),
        clear_codes,
        table_filled,
    }
}

/// Writes codes at the width a decoder expects. The decoder adds each table
/// entry one code after the encoder does, so its table size is tracked
/// separately from the encoder's.
struct CodeWriter {
    writer: BitWriter,
    min_code_size: u8,
    width: u8,
    reader_next: u16,
    first_after_clear: bool,
}

impl CodeWriter {
    fn new(min_code_size: u8) -> Self {
        Self {
            writer: BitWriter::default(),
            min_code_size,
            width: min_code_size + 1,
            reader_next: (1 << min_code_size) + 2,
            first_after_clear: true,
        }
    }

    fn clear(&mut self) {
        self.writer.write(1 << self.min_code_size, self.width);
        self.width = self.min_code_size + 1;
        self.reader_next = (1 << self.min_code_size) + 2;
        self.first_after_clear = true;
    }

    fn code(&mut self, code: u16) {
        self.writer.write(u32::from(code), self.width);
        if !self.first_after_clear && self.reader_next < 4096 {
            self.reader_next += 1;
            if self.reader_next == 1 << self.width && self.width < 12 {
                self.width += 1;
            }
        }
        self.first_after_clear = false;
    }

    fn end(&mut self) {
        self.writer.write((1 << self.min_code_size) + 1, self.width);
    }
}

/// Pseudo-random indices below `2^bits`, in short runs so that both long
/// and short dictionary strings occur.
pub fn noisy_runs(len: usize, bits: u8, seed: u32) -> Vec<u8> {
    let mut state = seed.max(1);
    let mut step = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };
    let mask = ((1u32 << bits) - 1) as u8;
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let r = step();
        let value = (r as u8) & mask;
        let run = (r >> 8) % 6 + 1;
        for _ in 0..run {
            if out.len() == len {
                break;
            }
            out.push(value);
        }
    }
    out
}

#[derive(Default)]
struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    bits: u8,
}

impl BitWriter {
    fn write(&mut self, code: u32, width: u8) {
        self.acc |= code << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

/// RGBA pixel at `(x, y)` of a canvas `width` pixels wide.
pub fn pixel_at(rgba: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
}

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];
pub const WHITE: [u8; 3] = [255, 255, 255];
