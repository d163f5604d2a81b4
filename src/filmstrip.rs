//! Filmstrip composition and preview encoding.
//!
//! Composites an ordered sequence of frames into one fixed-geometry strip:
//! each frame is cover-fit scaled, center-cropped to its cell, and drawn at a
//! fixed slot with a fixed gap between cells. Normal output is a lossy JPEG
//! data URL; the error placeholder is a lossless PNG data URL with the same
//! cell geometry so a failed file still renders as a visible tile.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::config::Config;
use crate::error::{Error, Result};

/// Strip background and cell fill for undersized frames.
const BACKGROUND: Rgba<u8> = Rgba([24, 24, 24, 255]);

/// Glyph color on the error placeholder.
const GLYPH: Rgba<u8> = Rgba([200, 200, 200, 255]);

/// Fixed-geometry filmstrip compositor.
pub struct FilmstripCompositor {
    cell_width: u32,
    cell_height: u32,
    gap: u32,
    jpeg_quality: u8,
}

impl FilmstripCompositor {
    /// Create a compositor from the pipeline configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            cell_width: config.cell_width,
            cell_height: config.cell_height,
            gap: config.frame_gap,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Canvas width for a strip of `k` cells: `k * cell + (k - 1) * gap`.
    pub fn strip_width(&self, k: usize) -> u32 {
        let k = k as u32;
        k * self.cell_width + k.saturating_sub(1) * self.gap
    }

    /// Composite `frames` into a strip and encode it as a JPEG data URL.
    ///
    /// A single frame produces a strip of length 1, i.e. a plain thumbnail.
    pub fn compose(&self, frames: &[RgbaImage]) -> Result<String> {
        let canvas = self.render_canvas(frames)?;
        self.encode_jpeg(&canvas)
    }

    fn render_canvas(&self, frames: &[RgbaImage]) -> Result<RgbaImage> {
        if frames.is_empty() {
            return Err(Error::invalid_input("cannot compose an empty filmstrip"));
        }

        let width = self.strip_width(frames.len());
        let mut canvas = RgbaImage::from_pixel(width, self.cell_height, BACKGROUND);

        for (i, frame) in frames.iter().enumerate() {
            let x = i as u32 * (self.cell_width + self.gap);
            // Cropping to the cell before drawing clips the frame strictly to
            // its slot; an oversized dimension cannot bleed into the gap.
            let cell = cover_fit(frame, self.cell_width, self.cell_height);
            image::imageops::overlay(&mut canvas, &cell, i64::from(x), 0);
        }

        Ok(canvas)
    }

    /// Fixed-size error placeholder: dark cell with a centered glyph,
    /// losslessly encoded as a PNG data URL.
    pub fn placeholder(&self) -> Result<String> {
        let mut canvas = RgbaImage::from_pixel(self.cell_width, self.cell_height, BACKGROUND);

        // Exclamation mark drawn as two rectangles, proportional to the cell.
        let bar_w = (self.cell_width / 20).max(2);
        let cx = self.cell_width / 2;
        let bar_top = self.cell_height / 5;
        let bar_bottom = self.cell_height * 3 / 5;
        let dot_top = self.cell_height * 7 / 10;
        let dot_bottom = (dot_top + bar_w).min(self.cell_height);

        fill_rect(&mut canvas, cx - bar_w / 2, bar_top, bar_w, bar_bottom - bar_top, GLYPH);
        fill_rect(&mut canvas, cx - bar_w / 2, dot_top, bar_w, dot_bottom - dot_top, GLYPH);

        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(canvas)
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| Error::decode(format!("failed to encode placeholder: {}", e)))?;

        Ok(format!(
            "data:image/png;base64,{}",
            BASE64.encode(buf.into_inner())
        ))
    }

    fn encode_jpeg(&self, canvas: &RgbaImage) -> Result<String> {
        // JPEG has no alpha channel.
        let rgb = image::DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();

        let mut buf = Cursor::new(Vec::new());
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| Error::decode(format!("failed to encode filmstrip: {}", e)))?;

        Ok(format!(
            "data:image/jpeg;base64,{}",
            BASE64.encode(buf.into_inner())
        ))
    }
}

/// Scale a frame so it fully covers the cell while preserving aspect ratio,
/// then center-crop the overflow.
pub fn cover_fit(frame: &RgbaImage, cell_width: u32, cell_height: u32) -> RgbaImage {
    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return RgbaImage::from_pixel(cell_width, cell_height, BACKGROUND);
    }

    let scale = f64::max(
        f64::from(cell_width) / f64::from(w),
        f64::from(cell_height) / f64::from(h),
    );
    let scaled_w = ((f64::from(w) * scale).ceil() as u32).max(cell_width);
    let scaled_h = ((f64::from(h) * scale).ceil() as u32).max(cell_height);

    let resized = image::imageops::resize(frame, scaled_w, scaled_h, FilterType::Triangle);
    let x = (scaled_w - cell_width) / 2;
    let y = (scaled_h - cell_height) / 2;
    image::imageops::crop_imm(&resized, x, y, cell_width, cell_height).to_image()
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    for py in y..(y + h).min(canvas.height()) {
        for px in x..(x + w).min(canvas.width()) {
            canvas.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    fn compositor() -> FilmstripCompositor {
        FilmstripCompositor::new(&Config::default())
    }

    fn solid_frame(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([120, 40, 40, 255]))
    }

    fn decode_data_url(url: &str) -> image::DynamicImage {
        let b64 = url.split(',').nth(1).unwrap();
        let bytes = BASE64.decode(b64).unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn test_strip_width_formula() {
        let c = compositor();
        for k in 1..=5usize {
            assert_eq!(c.strip_width(k), 80 * k as u32 + 2 * (k as u32 - 1));
        }
    }

    #[test]
    fn test_compose_geometry_for_all_strip_lengths() {
        let c = compositor();
        for k in 1..=5usize {
            let frames = vec![solid_frame(640, 480); k];
            let url = c.compose(&frames).unwrap();
            assert!(url.starts_with("data:image/jpeg;base64,"));

            let img = decode_data_url(&url);
            assert_eq!(img.width(), 80 * k as u32 + 2 * (k as u32 - 1));
            assert_eq!(img.height(), 48);
        }
    }

    #[test]
    fn test_compose_empty_is_invalid() {
        assert!(compositor().compose(&[]).is_err());
    }

    #[test]
    fn test_oversized_frame_does_not_bleed_into_gap() {
        let c = compositor();
        // Extreme aspect ratios: cover-fit overflows heavily after scaling,
        // but the drawn cell must stay exactly 80 wide.
        let frames = vec![solid_frame(10, 1000), solid_frame(1000, 10)];
        let canvas = c.render_canvas(&frames).unwrap();

        // Both gap columns between the two cells keep the background color.
        for x in [80u32, 81] {
            for y in 0..48 {
                assert_eq!(*canvas.get_pixel(x, y), BACKGROUND, "bleed at ({x},{y})");
            }
        }
    }

    #[test]
    fn test_placeholder_is_lossless_cell() {
        let url = compositor().placeholder().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let img = decode_data_url(&url);
        assert_eq!(img.width(), 80);
        assert_eq!(img.height(), 48);
    }

    #[test]
    fn test_cover_fit_dimensions() {
        let cell = cover_fit(&solid_frame(1920, 1080), 80, 48);
        assert_eq!(cell.dimensions(), (80, 48));

        let cell = cover_fit(&solid_frame(48, 200), 80, 48);
        assert_eq!(cell.dimensions(), (80, 48));
    }
}
