use std::fmt;
use std::io;

use quick_error::quick_error;

/// Region whose declared size is being accounted while walking the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Everything covered by the RIFF size field.
    File,
    /// The sub-chunk region of the n-th `ANMF` chunk (1-based).
    Frame(u32),
}

// ----------------------------------------------------------------------------
impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scope::File => f.write_str("file"),
            Scope::Frame(n) => write!(f, "frame {}", n),
        }
    }
}

quick_error! {
    /// Errors raised while reading, writing or probing a WebP container.
    #[derive(Debug)]
    #[non_exhaustive]
    pub enum Error {
        /// The underlying source or sink failed.
        Io(err: io::Error) {
            from()
            display("IO error: {}", err)
            source(err)
        }
        /// The first four bytes are not `RIFF`.
        RiffSignatureInvalid(found: [u8; 4]) {
            display("Invalid RIFF signature: {:x?}", found)
        }
        /// The RIFF form type is not `WEBP`.
        WebpSignatureInvalid(found: [u8; 4]) {
            display("Invalid WEBP signature: {:x?}", found)
        }
        /// The source ended before a declared length was satisfied.
        Truncated { offset: u64, wanted: u64 } {
            display("Stream truncated at offset {}: {} more byte(s) expected", offset, wanted)
        }
        /// A declared chunk length is larger than can be held in memory.
        ChunkTooLarge { tag: [u8; 4], size: u64, limit: u64 } {
            display("Chunk {:?} declares {} bytes, limit is {}", String::from_utf8_lossy(tag), size, limit)
        }
        /// Declared sizes disagree with the content of a scope.
        MalformedSize { scope: Scope, offset: u64 } {
            display("Declared {} size is inconsistent with its content at offset {}", scope, offset)
        }
        /// A fixed-layout chunk declares the wrong payload length.
        ChunkSizeInvalid { tag: [u8; 4], size: u64, expected: u64 } {
            display("Chunk {:?} has size {}, expected {}", String::from_utf8_lossy(tag), size, expected)
        }
        /// A simple-form container does not start with `VP8 ` or `VP8L`.
        NoBitstream(found: [u8; 4]) {
            display("No VP8 data found, first chunk is {:x?}", found)
        }
        /// A `VP8X` header is not followed by any chunk.
        EmptyExtendedImage {
            display("Extended image has no chunks after VP8X")
        }
        /// A chunk list violates the simple or extended layout rules.
        InvalidLayout(reason: &'static str) {
            display("Invalid chunk layout: {}", reason)
        }
        /// The serialized container would not fit the 32-bit RIFF size.
        ImageTooLarge {
            display("Image does not fit into a RIFF container")
        }
        /// A field does not fit its on-wire width.
        FieldOverflow { field: &'static str, value: u64 } {
            display("Value {} does not fit field {}", value, field)
        }
        /// The VP8 frame is not a keyframe.
        NonKeyframe {
            display("VP8 frame is not a keyframe")
        }
        /// The VP8 start code is wrong.
        Vp8MagicInvalid(found: [u8; 3]) {
            display("Invalid VP8 magic: {:x?}", found)
        }
        /// The VP8L signature byte is wrong.
        Vp8lSignatureInvalid(found: u8) {
            display("Invalid VP8L signature: {:#04x}", found)
        }
        /// The VP8L version field is not zero.
        Vp8lVersionInvalid(found: u8) {
            display("Invalid VP8L version: {}", found)
        }
        /// A bitstream header declares a zero-sized image.
        InvalidImageSize {
            display("Invalid image size")
        }
        /// A pixel buffer handed to the codec is inconsistent.
        InvalidPixelBuffer(reason: &'static str) {
            display("Invalid pixel buffer: {}", reason)
        }
        /// The codec rejected the picture data.
        Codec(err: Box<dyn std::error::Error + Send + Sync>) {
            display("Codec error: {}", err)
            source(&**err)
        }
    }
}

// ----------------------------------------------------------------------------
impl Error {
    /// Wraps a codec-originated failure.
    pub fn codec<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Codec(err.into())
    }

    /// Returns `true` for failures that come from the codec rather than the container.
    pub fn is_codec(&self) -> bool {
        matches!(self, Error::Codec(_))
    }
}

// ----------------------------------------------------------------------------
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_scope_and_tag() {
        let err = Error::MalformedSize {
            scope: Scope::Frame(2),
            offset: 40,
        };
        assert_eq!(
            err.to_string(),
            "Declared frame 2 size is inconsistent with its content at offset 40"
        );

        let err = Error::ChunkSizeInvalid {
            tag: *b"ANIM",
            size: 5,
            expected: 6,
        };
        assert_eq!(err.to_string(), "Chunk \"ANIM\" has size 5, expected 6");
    }

    #[test]
    fn codec_errors_are_distinguishable() {
        let err = Error::codec("broken partition");
        assert!(err.is_codec());
        assert!(std::error::Error::source(&err).is_some());
        assert!(!Error::InvalidImageSize.is_codec());
    }
}
