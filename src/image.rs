//! Loading common image formats into textures.
//!
//! Decoding normalizes everything to tightly packed RGBA8. File formats
//! store rows top-down while texture space grows bottom-up, so decoding
//! flips rows by default.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

use crate::driver::Driver;
use crate::error::GraphicsError;
use crate::resources::texture::Texture;
use crate::types::{
    max_mip_levels, Extent3d, InternalFormat, TextureStorage, TextureTarget,
};

/// A decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, bottom-up.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Decode any supported container format. With `flip_vertical` the row
    /// order is reversed during decode.
    pub fn decode(bytes: &[u8], flip_vertical: bool) -> Result<Self, GraphicsError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|err| GraphicsError::UnsupportedFormat(err.to_string()))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        let mut pixels = decoded.into_raw();
        if flip_vertical {
            flip_rows(&mut pixels, width, height, 4);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Encode to PNG. The rows are flipped back to the top-down order the
    /// container expects.
    pub fn encode_png(&self) -> Result<Vec<u8>, GraphicsError> {
        let mut pixels = self.pixels.clone();
        flip_rows(&mut pixels, self.width, self.height, 4);
        let mut out = Vec::new();
        PngEncoder::new(Cursor::new(&mut out))
            .write_image(&pixels, self.width, self.height, ColorType::Rgba8)
            .map_err(|err| GraphicsError::UnsupportedFormat(err.to_string()))?;
        Ok(out)
    }

    /// Allocate a 2D texture with a full mip chain, upload level 0 and
    /// populate the remaining levels.
    pub fn into_texture(self, driver: &mut dyn Driver) -> Result<Texture, GraphicsError> {
        let levels = max_mip_levels(self.width, self.height, 1);
        let mut texture = Texture::new(driver, TextureTarget::Two);
        texture.storage(
            driver,
            TextureStorage::new(
                InternalFormat::Rgba8,
                Extent3d::new_2d(self.width, self.height),
                levels,
            ),
        )?;
        texture.image_data(driver, 0, &self.pixels)?;
        texture.build_mipmaps(driver);
        Ok(texture)
    }
}

/// A pluggable image container codec. The resource layer only ever sees
/// [`DecodedImage`], never codec internals.
pub trait ImageCodec {
    /// Decode a container into RGBA8.
    fn decode(&self, bytes: &[u8], flip_vertical: bool) -> Result<DecodedImage, GraphicsError>;

    /// Encode RGBA8 into a container.
    fn encode(&self, image: &DecodedImage) -> Result<Vec<u8>, GraphicsError>;
}

/// The built-in codec for PNG, JPEG, BMP, GIF, HDR and TGA containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCodec;

impl ImageCodec for StandardCodec {
    fn decode(&self, bytes: &[u8], flip_vertical: bool) -> Result<DecodedImage, GraphicsError> {
        DecodedImage::decode(bytes, flip_vertical)
    }

    fn encode(&self, image: &DecodedImage) -> Result<Vec<u8>, GraphicsError> {
        image.encode_png()
    }
}

/// Reverse the row order of a tightly packed pixel buffer in place.
pub fn flip_rows(pixels: &mut [u8], width: u32, height: u32, bytes_per_pixel: usize) {
    let row = width as usize * bytes_per_pixel;
    if row == 0 {
        return;
    }
    let (mut top, mut bottom) = (0, (height as usize).saturating_sub(1));
    while top < bottom {
        let (a, b) = pixels.split_at_mut(bottom * row);
        a[top * row..top * row + row].swap_with_slice(&mut b[..row]);
        top += 1;
        bottom -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NullDriver;

    fn gradient(width: u32, height: u32) -> DecodedImage {
        let pixels = (0..width * height * 4).map(|i| i as u8).collect();
        DecodedImage {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_flip_rows() {
        let mut pixels = vec![
            1, 1, 1, 1, 2, 2, 2, 2, // row 0
            3, 3, 3, 3, 4, 4, 4, 4, // row 1
        ];
        flip_rows(&mut pixels, 2, 2, 4);
        assert_eq!(
            pixels,
            vec![3, 3, 3, 3, 4, 4, 4, 4, 1, 1, 1, 1, 2, 2, 2, 2]
        );
    }

    #[test]
    fn test_flip_rows_odd_height_keeps_middle() {
        let mut pixels = vec![1, 2, 3];
        flip_rows(&mut pixels, 1, 3, 1);
        assert_eq!(pixels, vec![3, 2, 1]);
    }

    #[test]
    fn test_png_round_trip() {
        let original = gradient(4, 2);
        let encoded = original.encode_png().unwrap();
        let decoded = DecodedImage::decode(&encoded, true).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(matches!(
            DecodedImage::decode(&[0u8; 16], true),
            Err(GraphicsError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_into_texture_uploads_level_zero() {
        let mut driver = NullDriver::new();
        let image = gradient(4, 4);
        let pixels = image.pixels.clone();
        let texture = image.into_texture(&mut driver).unwrap();

        assert_eq!(texture.allocation().unwrap().levels, 3);
        assert_eq!(texture.read_level(&mut driver, 0).unwrap(), pixels);
    }
}
