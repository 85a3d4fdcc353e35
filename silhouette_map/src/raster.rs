//! Rendering arbitrary silhouettes onto the fixed-size sampling canvas.
//!
//! Generated images come in whatever size and pixel format the source
//! chose.  Before sampling they are drawn onto an opaque white S×S canvas,
//! the same way a browser canvas would show them: scaled to fit, with any
//! transparency composited over white.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::Result;

/// Side length of the sampling canvas, in pixels.
pub const DEFAULT_SIDE: u32 = 500;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Draw `img` onto a fresh white `side`×`side` canvas.
///
/// The source image is never modified.
pub fn render_square(img: &DynamicImage, side: u32) -> RgbaImage {
    let rgba = img.to_rgba8();
    let scaled = if rgba.dimensions() == (side, side) {
        rgba
    } else {
        imageops::resize(&rgba, side, side, FilterType::Triangle)
    };

    let mut canvas = RgbaImage::from_pixel(side, side, WHITE);
    imageops::overlay(&mut canvas, &scaled, 0, 0);
    canvas
}

/// Open an image file and render it to the canvas.
pub fn load_square(path: &Path, side: u32) -> Result<RgbaImage> {
    let img = image::open(path)?;
    Ok(render_square(&img, side))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resizes_to_canvas() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 255])));
        let canvas = render_square(&img, 100);
        assert_eq!(canvas.dimensions(), (100, 100));
        assert_eq!(canvas.get_pixel(50, 50), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn transparency_becomes_white() {
        let mut src = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        src.put_pixel(3, 3, Rgba([10, 20, 30, 255]));
        let canvas = render_square(&DynamicImage::ImageRgba8(src), 10);
        assert_eq!(canvas.get_pixel(0, 0), &WHITE);
        assert_eq!(canvas.get_pixel(3, 3), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn source_is_untouched() {
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));
        let before = src.clone();
        let _ = render_square(&src, 16);
        assert_eq!(src, before);
    }

    #[test]
    fn load_reads_png_and_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("shape.png");
        RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255])).save(&png).unwrap();
        let canvas = load_square(&png, 50).unwrap();
        assert_eq!(canvas.dimensions(), (50, 50));
        assert_eq!(canvas.get_pixel(25, 25), &Rgba([0, 0, 0, 255]));

        let junk = dir.path().join("junk.png");
        std::fs::write(&junk, b"definitely not a png").unwrap();
        assert!(matches!(load_square(&junk, 50), Err(crate::MapError::Decode(_))));
    }
}
