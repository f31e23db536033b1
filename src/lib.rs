//! Reading and writing of the WebP RIFF container
//!
//! [`demux`] walks a byte stream into a [`WebPImage`] chunk tree and [`mux`]
//! writes one back. Pixel coding is left to an implementation of [`Codec`].
#![forbid(unsafe_code)]

pub use self::bitstream::{probe, BitstreamInfo};
pub use self::chunk::{
    full_size, Anim, Anmf, BlendMethod, Chunk, ChunkTag, DisposeMethod, Vp8x, ANIM_PAYLOAD_SIZE,
    ANMF_HEADER_SIZE, CHUNK_HEADER_SIZE, VP8X_PAYLOAD_SIZE,
};
pub use self::codec::{Codec, DecodedImage, Encoded, PixelBuffer, PixelLayout};
pub use self::demux::{demux, demux_with_options};
pub use self::error::{Error, Result, Scope};
pub use self::image::WebPImage;
pub use self::mux::mux;
pub use self::options::{DemuxOptions, PLATFORM_MAX_CHUNK_SIZE};

mod bitstream;
mod chunk;
mod codec;
mod demux;
mod error;
mod image;
mod mux;
mod options;
mod reader;
