use simcast_frame::{Frame, FrameFormat, PixelFormat};
use simcast_pipeline::{FrameSource, RenderError};

use super::sim::SimState;

const PALETTE: [[u8; 3]; 6] = [
    [230, 80, 60],
    [60, 170, 90],
    [70, 120, 230],
    [240, 190, 50],
    [170, 90, 200],
    [60, 200, 210],
];

/// Software rasterizer drawing each body as a filled disc.
#[derive(Debug, Clone)]
pub struct DiscRenderer {
    format: FrameFormat,
    background: [u8; 3],
    radius: Option<u32>,
}

impl DiscRenderer {
    pub fn new(format: FrameFormat) -> Self {
        Self {
            format,
            background: [16, 18, 24],
            radius: None,
        }
    }

    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    /// Fixed disc radius in pixels. By default it scales with frame width and body count.
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = Some(radius);
        self
    }

    fn radius_for(&self, bodies: usize) -> u32 {
        self.radius.unwrap_or_else(|| {
            let slot = self.format.width / bodies.max(1) as u32;
            (slot / 3).clamp(1, self.format.height / 4 + 1)
        })
    }
}

impl FrameSource<SimState> for DiscRenderer {
    fn format(&self) -> FrameFormat {
        self.format
    }

    fn capture(&mut self, state: &SimState) -> Result<Frame, RenderError> {
        self.format.validate()?;
        let mut canvas = Canvas {
            format: self.format,
            pixels: vec![0; self.format.frame_len()],
        };
        canvas.fill(self.background);

        let radius = self.radius_for(state.bodies.len());
        let width = f64::from(self.format.width);
        let height = f64::from(self.format.height);
        let world = if state.world_height > 0.0 {
            state.world_height
        } else {
            1.0
        };
        for (i, body) in state.bodies.iter().enumerate() {
            let cx = (body.x * width) as i64;
            // World y grows upward, rows grow downward.
            let cy = ((1.0 - body.y / world) * height) as i64;
            canvas.disc(cx, cy, i64::from(radius), PALETTE[i % PALETTE.len()]);
        }

        Ok(Frame::new(self.format, canvas.pixels)?)
    }
}

struct Canvas {
    format: FrameFormat,
    pixels: Vec<u8>,
}

impl Canvas {
    fn fill(&mut self, rgb: [u8; 3]) {
        let encoded = encode(self.format.pixel_format, rgb);
        for pixel in self.pixels.chunks_exact_mut(encoded.len()) {
            pixel.copy_from_slice(&encoded);
        }
    }

    fn disc(&mut self, cx: i64, cy: i64, radius: i64, rgb: [u8; 3]) {
        let encoded = encode(self.format.pixel_format, rgb);
        let bpp = encoded.len();
        let width = i64::from(self.format.width);
        let height = i64::from(self.format.height);

        let y0 = (cy - radius).max(0);
        let y1 = (cy + radius).min(height - 1);
        let x0 = (cx - radius).max(0);
        let x1 = (cx + radius).min(width - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let offset = ((y * width + x) as usize) * bpp;
                self.pixels[offset..offset + bpp].copy_from_slice(&encoded);
            }
        }
    }
}

fn encode(pixel_format: PixelFormat, [r, g, b]: [u8; 3]) -> Vec<u8> {
    match pixel_format {
        PixelFormat::Rgb24 => vec![r, g, b],
        PixelFormat::Bgr24 => vec![b, g, r],
        PixelFormat::Rgba => vec![r, g, b, 255],
        PixelFormat::Bgra => vec![b, g, r, 255],
        PixelFormat::Gray8 => {
            let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
            vec![luma as u8]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::sim::Body;

    fn state(bodies: Vec<Body>) -> SimState {
        SimState {
            step: 1,
            time: 0.0,
            world_height: 2.0,
            bodies,
        }
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> &[u8] {
        let format = frame.format();
        let bpp = format.pixel_format.bytes_per_pixel();
        let offset = ((y * format.width + x) as usize) * bpp;
        &frame.as_bytes()[offset..offset + bpp]
    }

    #[test]
    fn empty_scene_is_background() {
        let format = FrameFormat::new(8, 6, PixelFormat::Rgb24).unwrap();
        let mut renderer = DiscRenderer::new(format).with_background([1, 2, 3]);

        let frame = renderer.capture(&state(Vec::new())).unwrap();

        assert_eq!(frame.len(), 8 * 6 * 3);
        assert!(frame.as_bytes().chunks(3).all(|px| px == [1, 2, 3]));
    }

    #[test]
    fn body_is_drawn_at_its_position() {
        let format = FrameFormat::new(20, 20, PixelFormat::Rgb24).unwrap();
        let mut renderer = DiscRenderer::new(format)
            .with_background([0, 0, 0])
            .with_radius(2);

        let frame = renderer
            .capture(&state(vec![Body {
                x: 0.5,
                y: 1.0,
                vy: 0.0,
            }]))
            .unwrap();

        assert_eq!(pixel(&frame, 10, 10), PALETTE[0]);
        assert_eq!(pixel(&frame, 0, 0), [0, 0, 0]);
        assert_eq!(pixel(&frame, 10, 13), [0, 0, 0]);
    }

    #[test]
    fn discs_near_the_edge_are_clipped() {
        let format = FrameFormat::new(10, 10, PixelFormat::Rgb24).unwrap();
        let mut renderer = DiscRenderer::new(format).with_radius(4);

        let frame = renderer
            .capture(&state(vec![Body {
                x: 0.0,
                y: 0.0,
                vy: 0.0,
            }]))
            .unwrap();

        assert_eq!(pixel(&frame, 0, 9), PALETTE[0]);
    }

    #[test]
    fn channel_order_follows_pixel_format() {
        let format = FrameFormat::new(4, 4, PixelFormat::Bgra).unwrap();
        let mut renderer = DiscRenderer::new(format).with_background([10, 20, 30]);

        let frame = renderer.capture(&state(Vec::new())).unwrap();

        assert_eq!(frame.len(), 4 * 4 * 4);
        assert_eq!(pixel(&frame, 0, 0), [30, 20, 10, 255]);
    }

    #[test]
    fn gray_frames_use_one_byte_per_pixel() {
        let format = FrameFormat::new(4, 2, PixelFormat::Gray8).unwrap();
        let mut renderer = DiscRenderer::new(format).with_background([255, 255, 255]);

        let frame = renderer.capture(&state(Vec::new())).unwrap();

        assert_eq!(frame.as_bytes(), &[255; 8]);
    }
}
