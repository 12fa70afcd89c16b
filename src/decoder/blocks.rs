//! Block-level GIF parser.
//!
//! Walks the header, logical screen descriptor, optional global color table
//! and then the block stream (extensions, image descriptors, trailer),
//! producing a [`GifDocument`] whose frames still hold their LZW payloads.

use alloc::sync::Arc;
use alloc::vec::Vec;

use rgb::RGB8;

use super::api::{
    ColorTable, DecodeError, DisposalMethod, GifDocument, LoopCount, RawFrame,
    DEFAULT_FRAME_DELAY_MS,
};
use super::limits::Limits;
use crate::slice_reader::SliceReader;

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

const LABEL_GRAPHIC_CONTROL: u8 = 0xF9;
const LABEL_APPLICATION: u8 = 0xFF;

const COLOR_TABLE_FLAG: u8 = 0x80;
const INTERLACE_FLAG: u8 = 0x40;
const TRANSPARENCY_FLAG: u8 = 0x01;

/// Largest LZW minimum code size that still leaves room for clear and end codes
/// inside a 12-bit code space.
const MAX_MIN_CODE_SIZE: u8 = 11;

/// Graphic control values waiting for the next image descriptor.
#[derive(Debug, Clone, Copy)]
struct GraphicControl {
    delay_ms: u32,
    disposal: DisposalMethod,
    transparent_index: Option<u8>,
}

impl Default for GraphicControl {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_FRAME_DELAY_MS,
            disposal: DisposalMethod::Unspecified,
            transparent_index: None,
        }
    }
}

/// Read `size` packed RGB triples.
fn read_color_table(reader: &mut SliceReader<'_>, size: usize) -> Result<ColorTable, DecodeError> {
    let bytes = reader.take_slice(size * 3)?;
    let colors: Vec<RGB8> = bytes
        .chunks_exact(3)
        .map(|c| RGB8::new(c[0], c[1], c[2]))
        .collect();
    Ok(Arc::from(colors))
}

/// Color table entry count encoded in the low 3 bits of a packed field.
fn color_table_size(packed: u8) -> usize {
    1 << ((packed & 0x07) + 1)
}

/// Skip data sub-blocks up to and including the zero-length terminator.
fn skip_sub_blocks(reader: &mut SliceReader<'_>) -> Result<(), DecodeError> {
    loop {
        let len = reader.read_u8()?;
        if len == 0 {
            return Ok(());
        }
        reader.take_slice(usize::from(len))?;
    }
}

/// Concatenate data sub-blocks up to and including the terminator.
fn collect_sub_blocks(reader: &mut SliceReader<'_>, out: &mut Vec<u8>) -> Result<(), DecodeError> {
    loop {
        let len = reader.read_u8()?;
        if len == 0 {
            return Ok(());
        }
        out.extend_from_slice(reader.take_slice(usize::from(len))?);
    }
}

fn read_graphic_control(reader: &mut SliceReader<'_>) -> Result<GraphicControl, DecodeError> {
    let size = usize::from(reader.read_u8()?);
    let offset = reader.position();
    let body = reader.take_slice(size)?;
    if body.len() < 4 {
        return Err(DecodeError::Truncated {
            offset,
            needed: 4,
            available: body.len(),
        });
    }
    let packed = body[0];
    let delay_cs = u16::from_le_bytes([body[1], body[2]]);
    let delay_ms = match u32::from(delay_cs) * 10 {
        0 => DEFAULT_FRAME_DELAY_MS,
        ms => ms,
    };
    let control = GraphicControl {
        delay_ms,
        disposal: DisposalMethod::from_bits((packed >> 2) & 0x07),
        transparent_index: (packed & TRANSPARENCY_FLAG != 0).then_some(body[3]),
    };
    skip_sub_blocks(reader)?;
    Ok(control)
}

/// Parse an application extension, returning a loop count when it is a
/// `NETSCAPE2.0` (or `ANIMEXTS1.0`) looping block.
fn read_application(reader: &mut SliceReader<'_>) -> Result<Option<LoopCount>, DecodeError> {
    let size = usize::from(reader.read_u8()?);
    let identifier = reader.take_slice(size)?;
    let looping = identifier == b"NETSCAPE2.0" || identifier == b"ANIMEXTS1.0";

    let mut loop_count = None;
    loop {
        let len = usize::from(reader.read_u8()?);
        if len == 0 {
            break;
        }
        let block = reader.take_slice(len)?;
        if looping && block.len() >= 3 && block[0] == 1 {
            loop_count = Some(LoopCount::from(u16::from_le_bytes([block[1], block[2]])));
        }
    }
    Ok(loop_count)
}

/// Parse a complete GIF byte buffer.
pub(crate) fn parse(
    data: &[u8],
    limits: &Limits,
    stop: Option<&dyn enough::Stop>,
) -> Result<GifDocument, DecodeError> {
    limits.check_file_size(data.len() as u64)?;

    let mut reader = SliceReader::new(data);

    let header = reader.take_slice(6)?;
    if &header[..3] != b"GIF" {
        return Err(DecodeError::InvalidSignature([header[0], header[1], header[2]]));
    }

    let width = reader.read_u16_le()?;
    let height = reader.read_u16_le()?;
    let packed = reader.read_u8()?;
    let background_index = reader.read_u8()?;
    let _aspect = reader.read_u8()?;
    limits.check_dimensions(width.into(), height.into())?;

    let global_color_table = if packed & COLOR_TABLE_FLAG != 0 {
        Some(read_color_table(&mut reader, color_table_size(packed))?)
    } else {
        None
    };

    let mut frames: Vec<RawFrame> = Vec::new();
    let mut loop_count = None;
    let mut pending = GraphicControl::default();

    while !reader.is_exhausted() {
        let offset = reader.position();
        match reader.read_u8()? {
            EXTENSION_INTRODUCER => match reader.read_u8()? {
                LABEL_GRAPHIC_CONTROL => pending = read_graphic_control(&mut reader)?,
                LABEL_APPLICATION => {
                    if let Some(count) = read_application(&mut reader)? {
                        loop_count = Some(count);
                    }
                }
                label => {
                    tracing::trace!(label, offset, "skipping extension");
                    skip_sub_blocks(&mut reader)?;
                }
            },
            IMAGE_SEPARATOR => {
                if let Some(stop) = stop {
                    stop.check()?;
                }
                limits.check_frame_count(frames.len())?;

                let left = reader.read_u16_le()?;
                let top = reader.read_u16_le()?;
                let frame_width = reader.read_u16_le()?;
                let frame_height = reader.read_u16_le()?;
                let image_packed = reader.read_u8()?;

                let index = frames.len();
                if u32::from(left) + u32::from(frame_width) > u32::from(width)
                    || u32::from(top) + u32::from(frame_height) > u32::from(height)
                {
                    return Err(DecodeError::FrameOutsideCanvas {
                        frame: index,
                        left,
                        top,
                        width: frame_width,
                        height: frame_height,
                        canvas_width: width,
                        canvas_height: height,
                    });
                }

                let local = if image_packed & COLOR_TABLE_FLAG != 0 {
                    Some(read_color_table(&mut reader, color_table_size(image_packed))?)
                } else {
                    None
                };
                let color_table = local
                    .or_else(|| global_color_table.clone())
                    .ok_or(DecodeError::MissingColorTable { frame: index })?;

                let min_code_size = reader.read_u8()?;
                if !(1..=MAX_MIN_CODE_SIZE).contains(&min_code_size) {
                    return Err(DecodeError::InvalidCodeSize(min_code_size));
                }

                let mut lzw_data = Vec::new();
                collect_sub_blocks(&mut reader, &mut lzw_data)?;

                tracing::trace!(
                    frame = index,
                    left,
                    top,
                    width = frame_width,
                    height = frame_height,
                    delay_ms = pending.delay_ms,
                    "image descriptor"
                );

                frames.push(RawFrame {
                    left,
                    top,
                    width: frame_width,
                    height: frame_height,
                    color_table,
                    min_code_size,
                    data: lzw_data,
                    delay_ms: pending.delay_ms,
                    disposal: pending.disposal,
                    transparent_index: pending.transparent_index,
                    interlaced: image_packed & INTERLACE_FLAG != 0,
                });
                pending = GraphicControl::default();
            }
            TRAILER => break,
            byte => {
                tracing::trace!(byte, offset, "skipping stray byte in block stream");
            }
        }
    }

    Ok(GifDocument {
        width,
        height,
        global_color_table,
        background_index,
        loop_count,
        frames,
    })
}
