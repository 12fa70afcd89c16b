//! GIF decoder implementation

mod api;
mod blocks;
mod interlace;
mod limits;
mod lzw;

// Re-export public API
pub use api::{
    decode, decode_frames, ColorTable, DecodeConfig, DecodeError, DecodeRequest,
    DisposalMethod, FramePatch, GifDocument, LoopCount, RawFrame, DEFAULT_FRAME_DELAY_MS,
};
pub use interlace::{deinterlace, interlaced_row_order, INTERLACE_PASSES};
pub use limits::Limits;
pub use lzw::{decompress, decompress_into, LzwOutput};

#[cfg(test)]
pub(crate) use lzw::encode_literals;
