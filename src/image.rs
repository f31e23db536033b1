//! The root of a chunk tree.
use crate::bitstream::probe;
use crate::chunk::{full_size, Anim, Anmf, Chunk, Vp8x};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Layout {
    Simple(Chunk),
    Extended(Vec<Chunk>),
}

/// A WebP image as a tree of chunks.
///
/// Either a single `VP8 `/`VP8L` bitstream (simple form) or a list of
/// chunks that starts with `VP8X` (extended form). Construction checks
/// these invariants, so every value of this type can be written back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebPImage {
    layout: Layout,
}

// ----------------------------------------------------------------------------
impl WebPImage {
    /// A simple-form image made of one bitstream chunk.
    pub fn simple(bitstream: Chunk) -> Result<Self> {
        if !bitstream.is_bitstream() {
            return Err(Error::NoBitstream(bitstream.fourcc()));
        }
        Ok(Self {
            layout: Layout::Simple(bitstream),
        })
    }

    /// An extended-form image. `chunks[0]` must be the only `VP8X` chunk and
    /// at least one chunk must follow it.
    pub fn extended(chunks: Vec<Chunk>) -> Result<Self> {
        match chunks.first() {
            Some(Chunk::Vp8x(_)) => {}
            _ => return Err(Error::InvalidLayout("extended image must start with VP8X")),
        }
        if chunks.len() == 1 {
            return Err(Error::EmptyExtendedImage);
        }
        if chunks[1..].iter().any(|c| matches!(c, Chunk::Vp8x(_))) {
            return Err(Error::InvalidLayout("VP8X may only appear first"));
        }
        for chunk in &chunks[1..] {
            if let Chunk::Anmf(frame) = chunk {
                if frame
                    .chunks()
                    .iter()
                    .any(|c| matches!(c, Chunk::Vp8x(_) | Chunk::Anim(_) | Chunk::Anmf(_)))
                {
                    return Err(Error::InvalidLayout(
                        "ANMF may only contain VP8, VP8L, ALPH or unknown chunks",
                    ));
                }
            }
        }
        Ok(Self {
            layout: Layout::Extended(chunks),
        })
    }

    /// Wraps a lone bitstream chunk so it can be handed over as a whole file.
    pub fn from_bitstream(bitstream: Chunk) -> Result<Self> {
        Self::simple(bitstream)
    }

    /// Wraps an `ALPH` payload and the `VP8 ` payload it belongs to in a
    /// minimal extended container. The canvas size is taken from the VP8
    /// frame header.
    pub fn from_alpha_and_lossy(alpha: Vec<u8>, lossy: Vec<u8>) -> Result<Self> {
        let lossy = Chunk::Vp8(lossy);
        let info = probe(&lossy)?;
        Self::extended(vec![
            Chunk::Vp8x(Vp8x::new(Vp8x::ALPHA, info.width, info.height)),
            Chunk::Alph(alpha),
            lossy,
        ])
    }

    pub fn is_extended(&self) -> bool {
        matches!(self.layout, Layout::Extended(_))
    }

    /// Top-level chunks in file order.
    pub fn chunks(&self) -> &[Chunk] {
        match &self.layout {
            Layout::Simple(chunk) => std::slice::from_ref(chunk),
            Layout::Extended(chunks) => chunks,
        }
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        match self.layout {
            Layout::Simple(chunk) => vec![chunk],
            Layout::Extended(chunks) => chunks,
        }
    }

    pub fn vp8x(&self) -> Option<&Vp8x> {
        match self.chunks().first() {
            Some(Chunk::Vp8x(vp8x)) => Some(vp8x),
            _ => None,
        }
    }

    pub fn anim(&self) -> Option<&Anim> {
        self.chunks().iter().find_map(|c| match c {
            Chunk::Anim(anim) => Some(anim),
            _ => None,
        })
    }

    /// Animation frames in display order.
    pub fn frames(&self) -> impl Iterator<Item = &Anmf> {
        self.chunks().iter().filter_map(|c| match c {
            Chunk::Anmf(frame) => Some(frame),
            _ => None,
        })
    }

    /// The top-level still-image bitstream, if any.
    pub fn bitstream(&self) -> Option<&Chunk> {
        self.chunks().iter().find(|c| c.is_bitstream())
    }

    /// The top-level `ALPH` chunk, if any.
    pub fn alpha(&self) -> Option<&Chunk> {
        self.chunks().iter().find(|c| matches!(c, Chunk::Alph(_)))
    }

    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.chunks().iter().find_map(|c| match c {
            Chunk::Iccp(data) => Some(data.as_slice()),
            _ => None,
        })
    }

    pub fn exif(&self) -> Option<&[u8]> {
        self.chunks().iter().find_map(|c| match c {
            Chunk::Exif(data) => Some(data.as_slice()),
            _ => None,
        })
    }

    pub fn xmp(&self) -> Option<&[u8]> {
        self.chunks().iter().find_map(|c| match c {
            Chunk::Xmp(data) => Some(data.as_slice()),
            _ => None,
        })
    }

    /// Canvas size for extended images, bitstream size for simple ones.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        match &self.layout {
            Layout::Simple(chunk) => {
                let info = probe(chunk)?;
                Ok((info.width, info.height))
            }
            Layout::Extended(_) => {
                let vp8x = self
                    .vp8x()
                    .ok_or(Error::InvalidLayout("extended image must start with VP8X"))?;
                Ok((vp8x.canvas_width(), vp8x.canvas_height()))
            }
        }
    }

    /// The value of the RIFF size field: `WEBP` plus every chunk on the wire.
    pub fn payload_size(&self) -> u64 {
        4 + self.chunks().iter().map(Chunk::full_size).sum::<u64>()
    }

    /// Size of the serialized file including the `RIFF` header.
    pub fn full_size(&self) -> u64 {
        full_size(self.payload_size())
    }
}
