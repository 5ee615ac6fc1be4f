//! Encoded image fixtures.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use crate::rng::Xorshift64;

fn gradient(width: u32, height: u32) -> RgbImage {
    let mut rng = Xorshift64::new(u64::from(width) << 32 | u64::from(height));
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, rng.next_u8() / 4])
    })
}

/// JPEG-encoded gradient of the given size.
pub fn jpeg_fixture(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

/// PNG-encoded gradient of the given size.
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
