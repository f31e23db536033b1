//! Chunk data model.
//!
//! Every chunk exposes its tag, its logical payload size, its size on the
//! wire and the exact payload bytes. Structured chunks (`VP8X`, `ANIM`,
//! `ANMF`) keep decoded fields and regenerate their payload on demand.
use std::borrow::Cow;

/// Size of a chunk header: four-character tag plus 32-bit length.
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// Payload size of a `VP8X` chunk.
pub const VP8X_PAYLOAD_SIZE: u64 = 10;

/// Payload size of an `ANIM` chunk.
pub const ANIM_PAYLOAD_SIZE: u64 = 6;

/// Size of the fixed header at the start of an `ANMF` payload.
pub const ANMF_HEADER_SIZE: u64 = 16;

/// Largest value a 24-bit field can hold.
pub(crate) const MAX_U24: u32 = (1 << 24) - 1;

/// Wire size of a chunk carrying `payload_size` bytes.
pub const fn full_size(payload_size: u64) -> u64 {
    payload_size + CHUNK_HEADER_SIZE + (payload_size & 1)
}

/// Four-character identifiers known to the WebP container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkTag {
    Riff,
    Webp,
    Vp8,
    Vp8l,
    Vp8x,
    Anim,
    Anmf,
    Alph,
    Iccp,
    Exif,
    Xmp,
    Unknown([u8; 4]),
}

// ----------------------------------------------------------------------------
impl ChunkTag {
    pub const fn from_fourcc(fourcc: [u8; 4]) -> Self {
        match &fourcc {
            b"RIFF" => Self::Riff,
            b"WEBP" => Self::Webp,
            b"VP8 " => Self::Vp8,
            b"VP8L" => Self::Vp8l,
            b"VP8X" => Self::Vp8x,
            b"ANIM" => Self::Anim,
            b"ANMF" => Self::Anmf,
            b"ALPH" => Self::Alph,
            b"ICCP" => Self::Iccp,
            b"EXIF" => Self::Exif,
            b"XMP " => Self::Xmp,
            _ => Self::Unknown(fourcc),
        }
    }

    pub const fn to_fourcc(self) -> [u8; 4] {
        match self {
            Self::Riff => *b"RIFF",
            Self::Webp => *b"WEBP",
            Self::Vp8 => *b"VP8 ",
            Self::Vp8l => *b"VP8L",
            Self::Vp8x => *b"VP8X",
            Self::Anim => *b"ANIM",
            Self::Anmf => *b"ANMF",
            Self::Alph => *b"ALPH",
            Self::Iccp => *b"ICCP",
            Self::Exif => *b"EXIF",
            Self::Xmp => *b"XMP ",
            Self::Unknown(fourcc) => fourcc,
        }
    }

    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// Restricts a tag to the kinds that may appear inside an `ANMF` frame.
    ///
    /// Anything other than `VP8 `, `VP8L` and `ALPH` is kept as unknown.
    pub const fn within_frame(self) -> Self {
        match self {
            Self::Vp8 | Self::Vp8l | Self::Alph | Self::Unknown(_) => self,
            other => Self::Unknown(other.to_fourcc()),
        }
    }
}

/// Extended format header.
///
/// The flags are kept as the raw 32-bit little-endian value read from the
/// first four payload bytes (one flag byte plus reserved bits), so unknown
/// bits survive a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vp8x {
    flags: u32,
    canvas_width: u32,
    canvas_height: u32,
}

// ----------------------------------------------------------------------------
impl Vp8x {
    pub const ANIMATION: u32 = 1 << 1;
    pub const XMP: u32 = 1 << 2;
    pub const EXIF: u32 = 1 << 3;
    pub const ALPHA: u32 = 1 << 4;
    pub const ICC: u32 = 1 << 5;

    /// Creates a header. Dimensions are actual pixel counts, not `value - 1`.
    pub fn new(flags: u32, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            flags,
            canvas_width,
            canvas_height,
        }
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }

    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }

    pub fn has_icc(&self) -> bool {
        self.flags & Self::ICC != 0
    }

    pub fn has_alpha(&self) -> bool {
        self.flags & Self::ALPHA != 0
    }

    pub fn has_exif(&self) -> bool {
        self.flags & Self::EXIF != 0
    }

    pub fn has_xmp(&self) -> bool {
        self.flags & Self::XMP != 0
    }

    pub fn is_animated(&self) -> bool {
        self.flags & Self::ANIMATION != 0
    }
}

/// Global animation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anim {
    background_color: u32,
    loop_count: u16,
}

// ----------------------------------------------------------------------------
impl Anim {
    pub fn new(background_color: u32, loop_count: u16) -> Self {
        Self {
            background_color,
            loop_count,
        }
    }

    /// Background colour as the little-endian 32-bit value on the wire.
    pub fn background_color(&self) -> u32 {
        self.background_color
    }

    /// Background colour in the on-wire byte order `[blue, green, red, alpha]`.
    pub fn background_color_bgra(&self) -> [u8; 4] {
        self.background_color.to_le_bytes()
    }

    /// Number of times to play the animation; `0` loops forever.
    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }
}

/// What happens to a frame's rectangle after its duration elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposeMethod {
    None,
    Background,
}

/// How a frame is combined with the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMethod {
    AlphaBlend,
    Overwrite,
}

/// One animation frame: a 16-byte header followed by its own sub-chunks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Anmf {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    duration: u32,
    flags: u8,
    chunks: Vec<Chunk>,
}

// ----------------------------------------------------------------------------
impl Anmf {
    /// Creates a frame. `x` and `y` are in the on-wire two-pixel units;
    /// `width` and `height` are actual pixel counts.
    pub fn new(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        duration: u32,
        flags: u8,
        chunks: Vec<Chunk>,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
            duration,
            flags,
            chunks,
        }
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    /// Horizontal offset on the canvas in pixels.
    pub fn x_offset(&self) -> u32 {
        self.x * 2
    }

    /// Vertical offset on the canvas in pixels.
    pub fn y_offset(&self) -> u32 {
        self.y * 2
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Display time in milliseconds.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// The reserved/blend/dispose byte exactly as stored.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn dispose(&self) -> DisposeMethod {
        if self.flags & 1 != 0 {
            DisposeMethod::Background
        } else {
            DisposeMethod::None
        }
    }

    pub fn blend(&self) -> BlendMethod {
        if self.flags & 2 != 0 {
            BlendMethod::Overwrite
        } else {
            BlendMethod::AlphaBlend
        }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The frame's `VP8 ` or `VP8L` sub-chunk.
    pub fn bitstream(&self) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.is_bitstream())
    }

    /// The frame's `ALPH` sub-chunk.
    pub fn alpha(&self) -> Option<&Chunk> {
        self.chunks.iter().find(|c| matches!(c, Chunk::Alph(_)))
    }

    fn encode_header(&self) -> [u8; 16] {
        let mut header = [0; 16];
        header[0..3].copy_from_slice(&self.x.to_le_bytes()[..3]);
        header[3..6].copy_from_slice(&self.y.to_le_bytes()[..3]);
        header[6..9].copy_from_slice(&self.width.saturating_sub(1).to_le_bytes()[..3]);
        header[9..12].copy_from_slice(&self.height.saturating_sub(1).to_le_bytes()[..3]);
        header[12..15].copy_from_slice(&self.duration.to_le_bytes()[..3]);
        header[15] = self.flags;
        header
    }
}

/// A single chunk of a WebP container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Chunk {
    Vp8x(Vp8x),
    Iccp(Vec<u8>),
    Anim(Anim),
    Anmf(Anmf),
    Alph(Vec<u8>),
    Vp8(Vec<u8>),
    Vp8l(Vec<u8>),
    Exif(Vec<u8>),
    Xmp(Vec<u8>),
    Unknown { fourcc: [u8; 4], data: Vec<u8> },
}

// ----------------------------------------------------------------------------
impl Chunk {
    /// Builds the opaque chunk kind named by `tag` around `data`.
    ///
    /// Structured tags (`VP8X`, `ANIM`, `ANMF`) and the framing tags are
    /// kept as [`Chunk::Unknown`], so this is total over all tags.
    pub fn opaque(tag: ChunkTag, data: Vec<u8>) -> Self {
        match tag {
            ChunkTag::Iccp => Chunk::Iccp(data),
            ChunkTag::Alph => Chunk::Alph(data),
            ChunkTag::Vp8 => Chunk::Vp8(data),
            ChunkTag::Vp8l => Chunk::Vp8l(data),
            ChunkTag::Exif => Chunk::Exif(data),
            ChunkTag::Xmp => Chunk::Xmp(data),
            other => Chunk::Unknown {
                fourcc: other.to_fourcc(),
                data,
            },
        }
    }

    pub fn tag(&self) -> ChunkTag {
        match self {
            Chunk::Vp8x(_) => ChunkTag::Vp8x,
            Chunk::Iccp(_) => ChunkTag::Iccp,
            Chunk::Anim(_) => ChunkTag::Anim,
            Chunk::Anmf(_) => ChunkTag::Anmf,
            Chunk::Alph(_) => ChunkTag::Alph,
            Chunk::Vp8(_) => ChunkTag::Vp8,
            Chunk::Vp8l(_) => ChunkTag::Vp8l,
            Chunk::Exif(_) => ChunkTag::Exif,
            Chunk::Xmp(_) => ChunkTag::Xmp,
            Chunk::Unknown { fourcc, .. } => ChunkTag::Unknown(*fourcc),
        }
    }

    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            Chunk::Unknown { fourcc, .. } => *fourcc,
            other => other.tag().to_fourcc(),
        }
    }

    pub fn is_bitstream(&self) -> bool {
        matches!(self, Chunk::Vp8(_) | Chunk::Vp8l(_))
    }

    /// Logical payload length, excluding header and pad byte.
    pub fn payload_size(&self) -> u64 {
        match self {
            Chunk::Vp8x(_) => VP8X_PAYLOAD_SIZE,
            Chunk::Anim(_) => ANIM_PAYLOAD_SIZE,
            Chunk::Anmf(frame) => {
                ANMF_HEADER_SIZE + frame.chunks.iter().map(Chunk::full_size).sum::<u64>()
            }
            Chunk::Iccp(data)
            | Chunk::Alph(data)
            | Chunk::Vp8(data)
            | Chunk::Vp8l(data)
            | Chunk::Exif(data)
            | Chunk::Xmp(data)
            | Chunk::Unknown { data, .. } => data.len() as u64,
        }
    }

    /// Bytes occupied on the wire: header, payload and pad byte if odd.
    pub fn full_size(&self) -> u64 {
        full_size(self.payload_size())
    }

    /// The exact payload bytes, without header or pad.
    ///
    /// Opaque chunks are borrowed; structured chunks are re-encoded. 24-bit
    /// fields are truncated to their low bits here, use [`crate::mux`] for a
    /// checked encoding.
    pub fn raw_data(&self) -> Cow<'_, [u8]> {
        match self {
            Chunk::Vp8x(vp8x) => {
                let mut data = Vec::with_capacity(VP8X_PAYLOAD_SIZE as usize);
                data.extend_from_slice(&vp8x.flags.to_le_bytes());
                data.extend_from_slice(&vp8x.canvas_width.saturating_sub(1).to_le_bytes()[..3]);
                data.extend_from_slice(&vp8x.canvas_height.saturating_sub(1).to_le_bytes()[..3]);
                Cow::Owned(data)
            }
            Chunk::Anim(anim) => {
                let mut data = Vec::with_capacity(ANIM_PAYLOAD_SIZE as usize);
                data.extend_from_slice(&anim.background_color.to_le_bytes());
                data.extend_from_slice(&anim.loop_count.to_le_bytes());
                Cow::Owned(data)
            }
            Chunk::Anmf(frame) => {
                let mut data = Vec::with_capacity(self.payload_size() as usize);
                data.extend_from_slice(&frame.encode_header());
                for chunk in &frame.chunks {
                    data.extend_from_slice(&chunk.fourcc());
                    data.extend_from_slice(&(chunk.payload_size() as u32).to_le_bytes());
                    data.extend_from_slice(&chunk.raw_data());
                    if chunk.payload_size() % 2 == 1 {
                        data.push(0);
                    }
                }
                Cow::Owned(data)
            }
            Chunk::Iccp(data)
            | Chunk::Alph(data)
            | Chunk::Vp8(data)
            | Chunk::Vp8l(data)
            | Chunk::Exif(data)
            | Chunk::Xmp(data)
            | Chunk::Unknown { data, .. } => Cow::Borrowed(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_table_is_symmetric() {
        for fourcc in [
            b"RIFF", b"WEBP", b"VP8 ", b"VP8L", b"VP8X", b"ANIM", b"ANMF", b"ALPH", b"ICCP",
            b"EXIF", b"XMP ", b"BLAH",
        ] {
            assert_eq!(ChunkTag::from_fourcc(*fourcc).to_fourcc(), *fourcc);
        }
        assert!(ChunkTag::from_fourcc(*b"vp8 ").is_unknown());
    }

    #[test]
    fn frame_table_restricts_tags() {
        assert_eq!(ChunkTag::Vp8.within_frame(), ChunkTag::Vp8);
        assert_eq!(ChunkTag::Alph.within_frame(), ChunkTag::Alph);
        assert_eq!(
            ChunkTag::Iccp.within_frame(),
            ChunkTag::Unknown(*b"ICCP")
        );
        assert_eq!(
            ChunkTag::Anmf.within_frame(),
            ChunkTag::Unknown(*b"ANMF")
        );
    }

    #[test]
    fn padding_rule() {
        for len in 0..64u64 {
            assert_eq!(full_size(len), len + 8 + len % 2);
            let chunk = Chunk::Unknown {
                fourcc: *b"BLAH",
                data: vec![0xaa; len as usize],
            };
            assert_eq!(chunk.payload_size(), len);
            assert_eq!(chunk.full_size() % 2, 0);
        }
    }

    #[test]
    fn unknown_chunk_keeps_tag_and_bytes() {
        let chunk = Chunk::opaque(ChunkTag::from_fourcc(*b"BLAH"), vec![1, 2, 3]);
        assert_eq!(chunk.fourcc(), *b"BLAH");
        assert_eq!(chunk.payload_size(), 3);
        assert_eq!(chunk.full_size(), 12);
        assert_eq!(&*chunk.raw_data(), &[1, 2, 3]);
    }

    #[test]
    fn vp8x_payload_layout() {
        let chunk = Chunk::Vp8x(Vp8x::new(Vp8x::ALPHA | Vp8x::ICC, 1, 0x10000));
        assert_eq!(
            &*chunk.raw_data(),
            &[0x30, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0x00]
        );
        assert_eq!(chunk.full_size(), 18);
    }

    #[test]
    fn anmf_size_includes_sub_chunk_padding() {
        let frame = Anmf::new(0, 0, 1, 1, 100, 0, vec![Chunk::Vp8(vec![0; 5])]);
        let chunk = Chunk::Anmf(frame);
        assert_eq!(chunk.payload_size(), 16 + 8 + 5 + 1);
        assert_eq!(chunk.full_size(), 38);
        assert_eq!(chunk.raw_data().len(), 30);
    }

    #[test]
    fn anmf_flag_accessors() {
        let frame = Anmf::new(3, 4, 10, 12, 50, 0b11, Vec::new());
        assert_eq!(frame.x_offset(), 6);
        assert_eq!(frame.y_offset(), 8);
        assert_eq!(frame.dispose(), DisposeMethod::Background);
        assert_eq!(frame.blend(), BlendMethod::Overwrite);
        assert!(frame.bitstream().is_none());
    }
}
