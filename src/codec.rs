//! Contract between the container layer and a pixel codec.
//!
//! The container code never touches pixels. A [`Codec`] turns pixel buffers
//! into bitstream chunks and back; its failures surface as [`Error::Codec`],
//! which callers can tell apart from container errors.
use crate::chunk::Chunk;
use crate::demux::demux;
use crate::error::{Error, Result};

/// Byte order of the samples in a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Rgb,
    Bgr,
    Rgba,
    Bgra,
    Argb,
}

// ----------------------------------------------------------------------------
impl PixelLayout {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb | PixelLayout::Bgr => 3,
            PixelLayout::Rgba | PixelLayout::Bgra | PixelLayout::Argb => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        self.bytes_per_pixel() == 4
    }
}

/// Borrowed pixels handed to [`Codec::encode`].
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    layout: PixelLayout,
}

// ----------------------------------------------------------------------------
impl<'a> PixelBuffer<'a> {
    /// `stride` is the distance between rows in bytes.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidPixelBuffer("zero-sized image"));
        }
        let row = (width as usize)
            .checked_mul(layout.bytes_per_pixel())
            .ok_or(Error::InvalidPixelBuffer("row size overflows"))?;
        if stride < row {
            return Err(Error::InvalidPixelBuffer("stride shorter than a row"));
        }
        let needed = stride
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row))
            .ok_or(Error::InvalidPixelBuffer("buffer size overflows"))?;
        if data.len() < needed {
            return Err(Error::InvalidPixelBuffer("buffer shorter than stride * height"));
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            layout,
        })
    }

    /// A tightly packed buffer.
    pub fn packed(data: &'a [u8], width: u32, height: u32, layout: PixelLayout) -> Result<Self> {
        Self::new(
            data,
            width,
            height,
            width as usize * layout.bytes_per_pixel(),
            layout,
        )
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Row `y` without the stride padding.
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.layout.bytes_per_pixel()]
    }
}

/// Pixels produced by [`Codec::decode`], tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
}

/// Bitstream chunk(s) produced by an encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    /// A `VP8L` payload.
    Lossless(Vec<u8>),
    /// A `VP8 ` payload.
    Lossy(Vec<u8>),
    /// An `ALPH` payload and the `VP8 ` payload it belongs to.
    LossyWithAlpha { alpha: Vec<u8>, lossy: Vec<u8> },
}

// ----------------------------------------------------------------------------
impl Encoded {
    /// Extracts the bitstream chunks from a complete WebP file written by a
    /// codec, ready to be placed into another container.
    pub fn from_container(data: &[u8]) -> Result<Self> {
        let image = demux(data)?;
        let bitstream = image
            .bitstream()
            .ok_or(Error::InvalidLayout("codec output has no bitstream"))?;
        match (bitstream, image.alpha()) {
            (Chunk::Vp8l(data), None) => Ok(Encoded::Lossless(data.clone())),
            (Chunk::Vp8(data), None) => Ok(Encoded::Lossy(data.clone())),
            (Chunk::Vp8(lossy), Some(Chunk::Alph(alpha))) => Ok(Encoded::LossyWithAlpha {
                alpha: alpha.clone(),
                lossy: lossy.clone(),
            }),
            _ => Err(Error::InvalidLayout("ALPH may only accompany a VP8 bitstream")),
        }
    }

    /// The chunks in the order they appear in a file: `ALPH` before `VP8 `.
    pub fn into_chunks(self) -> Vec<Chunk> {
        match self {
            Encoded::Lossless(data) => vec![Chunk::Vp8l(data)],
            Encoded::Lossy(data) => vec![Chunk::Vp8(data)],
            Encoded::LossyWithAlpha { alpha, lossy } => {
                vec![Chunk::Alph(alpha), Chunk::Vp8(lossy)]
            }
        }
    }
}

/// A pixel encoder/decoder for VP8 and VP8L bitstreams.
///
/// Implementations must be safe to call concurrently from independent calls.
pub trait Codec: Send + Sync {
    /// Encodes `pixels`. `quality` selects a lossy encode (0..=100); `None`
    /// selects lossless.
    fn encode(&self, pixels: &PixelBuffer<'_>, quality: Option<f32>) -> Result<Encoded>;

    /// Decodes a `VP8 ` or `VP8L` chunk.
    fn decode(&self, bitstream: &Chunk, layout: PixelLayout) -> Result<DecodedImage>;

    /// Decodes a `VP8 ` chunk together with the `ALPH` chunk that carries its
    /// alpha plane.
    fn decode_with_alpha(
        &self,
        alpha: &Chunk,
        lossy: &Chunk,
        layout: PixelLayout,
    ) -> Result<DecodedImage>;
}
