use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

/// Default frame width in pixels.
pub const DEFAULT_WIDTH: u32 = 640;

/// Default frame height in pixels.
pub const DEFAULT_HEIGHT: u32 = 480;

/// Interleaved 8-bit pixel layouts understood by raw-video encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Red, green, blue; 3 bytes per pixel.
    #[default]
    #[serde(rename = "rgb24")]
    Rgb24,
    /// Blue, green, red; 3 bytes per pixel.
    #[serde(rename = "bgr24")]
    Bgr24,
    /// Red, green, blue, alpha; 4 bytes per pixel.
    #[serde(rename = "rgba")]
    Rgba,
    /// Blue, green, red, alpha; 4 bytes per pixel.
    #[serde(rename = "bgra")]
    Bgra,
    /// Single luma channel; 1 byte per pixel.
    #[serde(rename = "gray")]
    Gray8,
}

impl PixelFormat {
    /// Number of bytes used by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 3,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
            PixelFormat::Gray8 => 1,
        }
    }

    /// The `-pixel_format` name used by ffmpeg's rawvideo demuxer.
    pub const fn ffmpeg_name(self) -> &'static str {
        match self {
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Bgr24 => "bgr24",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Bgra => "bgra",
            PixelFormat::Gray8 => "gray",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

impl FromStr for PixelFormat {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb24" | "rgb" => Ok(PixelFormat::Rgb24),
            "bgr24" | "bgr" => Ok(PixelFormat::Bgr24),
            "rgba" => Ok(PixelFormat::Rgba),
            "bgra" => Ok(PixelFormat::Bgra),
            "gray" | "gray8" => Ok(PixelFormat::Gray8),
            other => Err(FrameError::InvalidFormat(format!(
                "unknown pixel format `{other}`"
            ))),
        }
    }
}

/// Dimensions and layout shared by every frame of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameFormat {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub pixel_format: PixelFormat,
}

impl FrameFormat {
    /// Create a validated frame format.
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Result<Self> {
        let format = Self {
            width,
            height,
            pixel_format,
        };
        format.validate()?;
        Ok(format)
    }

    /// Check that the format describes a non-empty, addressable buffer.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::InvalidFormat(format!(
                "dimensions must be non-zero (got {}x{})",
                self.width, self.height
            )));
        }
        self.checked_len().map(|_| ())
    }

    /// Bytes in one row of pixels.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.pixel_format.bytes_per_pixel()
    }

    /// Bytes in one whole frame.
    pub fn frame_len(&self) -> usize {
        self.row_len() * self.height as usize
    }

    fn checked_len(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|px| px.checked_mul(self.pixel_format.bytes_per_pixel()))
            .ok_or_else(|| {
                FrameError::InvalidFormat(format!(
                    "{}x{} {} overflows the address space",
                    self.width, self.height, self.pixel_format
                ))
            })
    }

    /// The `-video_size` argument (`WxH`).
    pub fn video_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            pixel_format: PixelFormat::default(),
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_vga_rgb() {
        let format = FrameFormat::default();
        assert_eq!(format.video_size(), "640x480");
        assert_eq!(format.frame_len(), 640 * 480 * 3);
        assert_eq!(format.to_string(), "640x480 rgb24");
    }

    #[test]
    fn rejects_zero_dimensions() {
        let err = FrameFormat::new(0, 480, PixelFormat::Rgb24).unwrap_err();
        assert!(matches!(err, FrameError::InvalidFormat(_)));
    }

    #[test]
    fn bytes_per_pixel_drives_lengths() {
        let rgba = FrameFormat::new(4, 2, PixelFormat::Rgba).unwrap();
        assert_eq!(rgba.row_len(), 16);
        assert_eq!(rgba.frame_len(), 32);

        let gray = FrameFormat::new(4, 2, PixelFormat::Gray8).unwrap();
        assert_eq!(gray.frame_len(), 8);
    }

    #[test]
    fn parses_pixel_format_names() {
        assert_eq!("rgb24".parse::<PixelFormat>().unwrap(), PixelFormat::Rgb24);
        assert_eq!("GRAY".parse::<PixelFormat>().unwrap(), PixelFormat::Gray8);
        assert!("yuv420p".parse::<PixelFormat>().is_err());
    }

    #[test]
    fn deserializes_with_default_pixel_format() {
        let format: FrameFormat = serde_json::from_str(r#"{"width":32,"height":24}"#).unwrap();
        assert_eq!(format.pixel_format, PixelFormat::Rgb24);

        let format: FrameFormat =
            serde_json::from_str(r#"{"width":32,"height":24,"pixel_format":"bgra"}"#).unwrap();
        assert_eq!(format.pixel_format, PixelFormat::Bgra);
    }
}
