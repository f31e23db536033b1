// Keyframe header probing for VP8 and VP8L payloads.
use crate::chunk::Chunk;
use crate::error::{Error, Result};

/// What the first bytes of a bitstream say about the picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitstreamInfo {
    pub width: u32,
    pub height: u32,
    pub lossless: bool,
    /// VP8L only: the encoder's hint that some pixels are not opaque.
    pub alpha_hint: bool,
}

// ----------------------------------------------------------------------------
fn read_vp8_header(chunk: &[u8]) -> Result<BitstreamInfo> {
    if chunk.len() < 10 {
        return Err(Error::Truncated {
            offset: chunk.len() as u64,
            wanted: (10 - chunk.len()) as u64,
        });
    }

    if chunk[0] & 1 != 0 {
        return Err(Error::NonKeyframe);
    }

    let tag = [chunk[3], chunk[4], chunk[5]];
    if tag != [0x9d, 0x01, 0x2a] {
        return Err(Error::Vp8MagicInvalid(tag));
    }

    let width = u32::from(u16::from_le_bytes([chunk[6], chunk[7]]) & 0x3fff);
    let height = u32::from(u16::from_le_bytes([chunk[8], chunk[9]]) & 0x3fff);
    if width == 0 || height == 0 {
        return Err(Error::InvalidImageSize);
    }

    Ok(BitstreamInfo {
        width,
        height,
        lossless: false,
        alpha_hint: false,
    })
}

// ----------------------------------------------------------------------------
fn read_vp8l_header(chunk: &[u8]) -> Result<BitstreamInfo> {
    if chunk.len() < 5 {
        return Err(Error::Truncated {
            offset: chunk.len() as u64,
            wanted: (5 - chunk.len()) as u64,
        });
    }

    if chunk[0] != 0x2f {
        return Err(Error::Vp8lSignatureInvalid(chunk[0]));
    }

    let header = u32::from_le_bytes([chunk[1], chunk[2], chunk[3], chunk[4]]);
    let version = (header >> 29) as u8;
    if version != 0 {
        return Err(Error::Vp8lVersionInvalid(version));
    }

    Ok(BitstreamInfo {
        width: (header & 0x3fff) + 1,
        height: ((header >> 14) & 0x3fff) + 1,
        lossless: true,
        alpha_hint: (header >> 28) & 1 != 0,
    })
}

/// Reads the frame header of a `VP8 ` or `VP8L` chunk.
///
/// Only the fixed header is inspected; the compressed data is not validated.
pub fn probe(chunk: &Chunk) -> Result<BitstreamInfo> {
    match chunk {
        Chunk::Vp8(data) => read_vp8_header(data),
        Chunk::Vp8l(data) => read_vp8l_header(data),
        other => Err(Error::NoBitstream(other.fourcc())),
    }
}
