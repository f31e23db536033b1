//! Container demultiplexer.
//!
//! Walks a RIFF/WEBP byte stream from front to back and assembles the chunk
//! tree. RIFF has no end-of-chunk markers, so every declared length is
//! charged against an explicit [`Budget`] for the scope it appears in; the
//! file and each `ANMF` frame get their own budget.
use std::io::Read;

use log::{debug, trace};

use crate::chunk::{
    full_size, Anim, Anmf, Chunk, ChunkTag, Vp8x, ANIM_PAYLOAD_SIZE, ANMF_HEADER_SIZE,
    VP8X_PAYLOAD_SIZE,
};
use crate::error::{Error, Result, Scope};
use crate::image::WebPImage;
use crate::options::DemuxOptions;
use crate::reader::ChunkReader;

/// Bytes a scope has declared but not yet accounted for.
#[derive(Debug, Clone, Copy)]
struct Budget {
    scope: Scope,
    remaining: u64,
}

// ----------------------------------------------------------------------------
impl Budget {
    fn new(scope: Scope, remaining: u64) -> Self {
        Self { scope, remaining }
    }

    fn charge(&mut self, n: u64, offset: u64) -> Result<()> {
        self.remaining = self
            .remaining
            .checked_sub(n)
            .ok_or(Error::MalformedSize {
                scope: self.scope,
                offset,
            })?;
        Ok(())
    }

    fn is_spent(&self) -> bool {
        self.remaining == 0
    }
}

/// A chunk header that has been charged to its scope.
#[derive(Debug, Clone, Copy)]
struct ChunkHeader {
    tag: ChunkTag,
    fourcc: [u8; 4],
    size: u64,
    offset: u64,
}

// ----------------------------------------------------------------------------
impl ChunkHeader {
    fn padded(&self) -> bool {
        self.size % 2 == 1
    }

    fn expect_size(&self, expected: u64) -> Result<()> {
        if self.size != expected {
            return Err(Error::ChunkSizeInvalid {
                tag: self.fourcc,
                size: self.size,
                expected,
            });
        }
        Ok(())
    }
}

struct Demuxer<'o, R> {
    reader: ChunkReader<R>,
    options: &'o DemuxOptions,
    frames: u32,
}

// ----------------------------------------------------------------------------
impl<R: Read> Demuxer<'_, R> {
    /// Reads a tag and length and charges header, payload and pad to `budget`.
    fn read_header(&mut self, budget: &mut Budget) -> Result<ChunkHeader> {
        let offset = self.reader.offset();
        let fourcc = self.reader.read_fourcc()?;
        let size = self.reader.read_uint32()?;
        trace!(
            "chunk {:?} size {} at offset {}",
            String::from_utf8_lossy(&fourcc),
            size,
            offset
        );

        budget.charge(full_size(size), offset)?;

        if size > self.options.get_max_chunk_size() {
            return Err(Error::ChunkTooLarge {
                tag: fourcc,
                size,
                limit: self.options.get_max_chunk_size(),
            });
        }

        Ok(ChunkHeader {
            tag: ChunkTag::from_fourcc(fourcc),
            fourcc,
            size,
            offset,
        })
    }

    fn finish_chunk(&mut self, header: &ChunkHeader) -> Result<()> {
        if header.padded() {
            self.reader.skip_pad_byte()?;
        }
        Ok(())
    }

    fn read_opaque(&mut self, tag: ChunkTag, header: &ChunkHeader) -> Result<Chunk> {
        let data = self.reader.read_n_bytes(header.size)?;
        if tag.is_unknown() {
            debug!(
                "preserving unknown chunk {:?} ({} bytes) at offset {}",
                String::from_utf8_lossy(&header.fourcc),
                header.size,
                header.offset
            );
        }
        Ok(Chunk::opaque(tag, data))
    }

    fn read_vp8x(&mut self, header: &ChunkHeader) -> Result<Vp8x> {
        header.expect_size(VP8X_PAYLOAD_SIZE)?;
        let flags = self.reader.read_int32()? as u32;
        let canvas_width = self.reader.read_one_based()?;
        let canvas_height = self.reader.read_one_based()?;
        Ok(Vp8x::new(flags, canvas_width, canvas_height))
    }

    fn read_anim(&mut self, header: &ChunkHeader) -> Result<Anim> {
        header.expect_size(ANIM_PAYLOAD_SIZE)?;
        let background_color = self.reader.read_uint32()? as u32;
        let loop_count = self.reader.read_uint16()?;
        Ok(Anim::new(background_color, loop_count))
    }

    fn read_anmf(&mut self, header: &ChunkHeader) -> Result<Anmf> {
        if header.size < ANMF_HEADER_SIZE {
            return Err(Error::ChunkSizeInvalid {
                tag: header.fourcc,
                size: header.size,
                expected: ANMF_HEADER_SIZE,
            });
        }
        self.frames += 1;

        let x = self.reader.read_uint24()?;
        let y = self.reader.read_uint24()?;
        let width = self.reader.read_one_based()?;
        let height = self.reader.read_one_based()?;
        let duration = self.reader.read_uint24()?;
        let flags = self.reader.read_int8()? as u8;

        let mut budget = Budget::new(
            Scope::Frame(self.frames),
            header.size - ANMF_HEADER_SIZE,
        );
        let mut chunks = Vec::new();
        while !budget.is_spent() {
            let sub = self.read_header(&mut budget)?;
            chunks.push(self.read_opaque(sub.tag.within_frame(), &sub)?);
            self.finish_chunk(&sub)?;
        }

        Ok(Anmf::new(x, y, width, height, duration, flags, chunks))
    }

    fn read_extended(&mut self, vp8x: Vp8x, budget: &mut Budget) -> Result<Vec<Chunk>> {
        debug!(
            "extended image, canvas {}x{}, flags {:#x}",
            vp8x.canvas_width(),
            vp8x.canvas_height(),
            vp8x.flags()
        );

        let mut chunks = vec![Chunk::Vp8x(vp8x)];
        while !budget.is_spent() {
            let header = self.read_header(budget)?;
            let chunk = match header.tag {
                ChunkTag::Anim => Chunk::Anim(self.read_anim(&header)?),
                ChunkTag::Anmf => Chunk::Anmf(self.read_anmf(&header)?),
                ChunkTag::Iccp
                | ChunkTag::Exif
                | ChunkTag::Xmp
                | ChunkTag::Vp8
                | ChunkTag::Vp8l
                | ChunkTag::Alph => self.read_opaque(header.tag, &header)?,
                _ => self.read_opaque(ChunkTag::Unknown(header.fourcc), &header)?,
            };
            self.finish_chunk(&header)?;
            chunks.push(chunk);
        }

        Ok(chunks)
    }

    fn read_image(&mut self) -> Result<WebPImage> {
        let riff = self.reader.read_fourcc()?;
        if ChunkTag::from_fourcc(riff) != ChunkTag::Riff {
            return Err(Error::RiffSignatureInvalid(riff));
        }
        let file_size = self.reader.read_uint32()?;
        let webp = self.reader.read_fourcc()?;
        if ChunkTag::from_fourcc(webp) != ChunkTag::Webp {
            return Err(Error::WebpSignatureInvalid(webp));
        }

        let file_pad = file_size % 2 == 1;
        let mut budget = Budget::new(Scope::File, file_size - file_size % 2);
        budget.charge(4, 8)?;

        let first = self.read_header(&mut budget)?;
        let chunks = match first.tag {
            ChunkTag::Vp8x => {
                let vp8x = self.read_vp8x(&first)?;
                self.finish_chunk(&first)?;
                self.read_extended(vp8x, &mut budget)?
            }
            ChunkTag::Vp8 | ChunkTag::Vp8l => {
                debug!("simple image, {} bytes of bitstream", first.size);
                let chunk = self.read_opaque(first.tag, &first)?;
                self.finish_chunk(&first)?;
                if !budget.is_spent() {
                    return Err(Error::MalformedSize {
                        scope: Scope::File,
                        offset: self.reader.offset(),
                    });
                }
                vec![chunk]
            }
            _ => return Err(Error::NoBitstream(first.fourcc)),
        };

        if file_pad {
            self.reader.skip_pad_byte()?;
        }

        // Content beyond the declared size means the RIFF size under-declares it.
        if self.options.get_reject_trailing_data() && !self.reader.at_end()? {
            return Err(Error::MalformedSize {
                scope: Scope::File,
                offset: self.reader.offset(),
            });
        }

        if first.tag == ChunkTag::Vp8x {
            WebPImage::extended(chunks)
        } else {
            let bitstream = chunks
                .into_iter()
                .next()
                .ok_or(Error::NoBitstream(first.fourcc))?;
            WebPImage::simple(bitstream)
        }
    }
}

/// Reads a complete WebP container from `reader` with default options.
pub fn demux<R: Read>(reader: R) -> Result<WebPImage> {
    demux_with_options(reader, &DemuxOptions::default())
}

/// Reads a complete WebP container from `reader`.
///
/// The walk is all-or-nothing: any framing, size or truncation problem
/// fails the call and no partial tree is returned.
pub fn demux_with_options<R: Read>(reader: R, options: &DemuxOptions) -> Result<WebPImage> {
    let mut demuxer = Demuxer {
        reader: ChunkReader::new(reader),
        options,
        frames: 0,
    };
    demuxer.read_image()
}
