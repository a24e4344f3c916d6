use bytes::{Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::format::FrameFormat;

/// One rendered instant: a raw, headerless pixel buffer of a known format.
///
/// Frames are immutable once built. The pixel data is reference counted, so
/// handing a frame to a writer does not copy the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    format: FrameFormat,
    data: Bytes,
}

impl Frame {
    /// Wrap a pixel buffer, checking that its length matches `format`.
    pub fn new(format: FrameFormat, data: impl Into<Bytes>) -> Result<Self> {
        format.validate()?;
        let data = data.into();
        let expected = format.frame_len();
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { format, data })
    }

    /// A frame filled with a single byte value.
    pub fn filled(format: FrameFormat, value: u8) -> Result<Self> {
        format.validate()?;
        Self::new(format, vec![value; format.frame_len()])
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the frame and return the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Return a copy with the row order reversed.
    ///
    /// GL read-backs deliver the bottom row first; encoders expect the top row first.
    pub fn flip_vertical(&self) -> Self {
        let row_len = self.format.row_len();
        let mut flipped = BytesMut::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_len).rev() {
            flipped.extend_from_slice(row);
        }
        Self {
            format: self.format,
            data: flipped.freeze(),
        }
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;

    fn tiny() -> FrameFormat {
        FrameFormat::new(2, 3, PixelFormat::Rgb24).unwrap()
    }

    #[test]
    fn accepts_exact_buffer() {
        let frame = Frame::new(tiny(), vec![0u8; 18]).unwrap();
        assert_eq!(frame.len(), 18);
        assert_eq!(frame.format(), tiny());
    }

    #[test]
    fn rejects_short_buffer() {
        let err = Frame::new(tiny(), vec![0u8; 17]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::SizeMismatch {
                expected: 18,
                actual: 17
            }
        ));
    }

    #[test]
    fn flip_vertical_reverses_rows() {
        let data: Vec<u8> = (0u8..18).collect();
        let frame = Frame::new(tiny(), data).unwrap();
        let flipped = frame.flip_vertical();

        assert_eq!(&flipped.as_bytes()[0..6], &[12, 13, 14, 15, 16, 17]);
        assert_eq!(&flipped.as_bytes()[6..12], &[6, 7, 8, 9, 10, 11]);
        assert_eq!(&flipped.as_bytes()[12..18], &[0, 1, 2, 3, 4, 5]);
        assert_eq!(flipped.flip_vertical(), frame);
    }

    #[test]
    fn filled_frame_has_format_length() {
        let frame = Frame::filled(tiny(), 0xAB).unwrap();
        assert!(frame.as_bytes().iter().all(|b| *b == 0xAB));
        assert_eq!(frame.into_bytes().len(), 18);
    }
}
