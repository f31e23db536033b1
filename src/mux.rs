//! Serializes a chunk tree back into a RIFF/WEBP byte stream.
use std::io::Write;

use byteorder_lite::{LittleEndian, WriteBytesExt};
use log::trace;

use crate::chunk::{Anmf, Chunk, ChunkTag, Vp8x, MAX_U24};
use crate::error::{Error, Result};
use crate::image::WebPImage;

fn check_u24(field: &'static str, value: u32) -> Result<u32> {
    if value > MAX_U24 {
        return Err(Error::FieldOverflow {
            field,
            value: u64::from(value),
        });
    }
    Ok(value)
}

fn check_one_based(field: &'static str, value: u32) -> Result<u32> {
    if value == 0 || value - 1 > MAX_U24 {
        return Err(Error::FieldOverflow {
            field,
            value: u64::from(value),
        });
    }
    Ok(value - 1)
}

fn check_u32(size: u64) -> Result<u32> {
    u32::try_from(size).map_err(|_| Error::ImageTooLarge)
}

// ----------------------------------------------------------------------------
fn write_vp8x<W: Write>(w: &mut W, vp8x: &Vp8x) -> Result<()> {
    let width = check_one_based("canvas width", vp8x.canvas_width())?;
    let height = check_one_based("canvas height", vp8x.canvas_height())?;
    w.write_u32::<LittleEndian>(vp8x.flags())?;
    w.write_u24::<LittleEndian>(width)?;
    w.write_u24::<LittleEndian>(height)?;
    Ok(())
}

// ----------------------------------------------------------------------------
fn write_anmf<W: Write>(w: &mut W, frame: &Anmf) -> Result<()> {
    w.write_u24::<LittleEndian>(check_u24("frame x", frame.x())?)?;
    w.write_u24::<LittleEndian>(check_u24("frame y", frame.y())?)?;
    w.write_u24::<LittleEndian>(check_one_based("frame width", frame.width())?)?;
    w.write_u24::<LittleEndian>(check_one_based("frame height", frame.height())?)?;
    w.write_u24::<LittleEndian>(check_u24("frame duration", frame.duration())?)?;
    w.write_u8(frame.flags())?;
    for chunk in frame.chunks() {
        write_chunk(w, chunk)?;
    }
    Ok(())
}

/// Writes one chunk: tag, payload length, payload and a zero pad byte if the
/// length is odd.
pub(crate) fn write_chunk<W: Write>(w: &mut W, chunk: &Chunk) -> Result<()> {
    let size = check_u32(chunk.payload_size())?;
    w.write_all(&chunk.fourcc())?;
    w.write_u32::<LittleEndian>(size)?;

    match chunk {
        Chunk::Vp8x(vp8x) => write_vp8x(w, vp8x)?,
        Chunk::Anim(anim) => {
            w.write_u32::<LittleEndian>(anim.background_color())?;
            w.write_u16::<LittleEndian>(anim.loop_count())?;
        }
        Chunk::Anmf(frame) => write_anmf(w, frame)?,
        other => w.write_all(&other.raw_data())?,
    }

    if size % 2 == 1 {
        w.write_u8(0)?;
    }
    Ok(())
}

/// Writes `image` as a complete WebP file.
pub fn mux<W: Write>(image: &WebPImage, mut writer: W) -> Result<()> {
    let size = check_u32(image.payload_size())?;
    trace!("writing {} chunk(s), RIFF size {}", image.chunks().len(), size);

    writer.write_all(&ChunkTag::Riff.to_fourcc())?;
    writer.write_u32::<LittleEndian>(size)?;
    writer.write_all(&ChunkTag::Webp.to_fourcc())?;
    for chunk in image.chunks() {
        write_chunk(&mut writer, chunk)?;
    }
    Ok(())
}

// ----------------------------------------------------------------------------
impl WebPImage {
    /// Serializes the image into a new buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.full_size().min(1 << 20) as usize);
        mux(self, &mut out)?;
        Ok(out)
    }
}
