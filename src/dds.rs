//! DDS container parsing for pre-compressed textures.
//!
//! Only the DXT1/DXT3/DXT5 fourCC payloads are supported; the mip chain is
//! stored contiguously after the header, largest level first.

use crate::driver::Driver;
use crate::error::GraphicsError;
use crate::resources::texture::Texture;
use crate::types::{max_mip_levels, CompressedFormat, Extent3d, TextureStorage, TextureTarget};

const MAGIC: &[u8; 4] = b"DDS ";
const HEADER_SIZE: usize = 124;
const DATA_OFFSET: usize = 4 + HEADER_SIZE;

/// A parsed DDS file borrowing its mip payloads from the input.
pub struct DdsFile<'a> {
    format: CompressedFormat,
    width: u32,
    height: u32,
    levels: Vec<&'a [u8]>,
}

fn header_u32(header: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        header[offset],
        header[offset + 1],
        header[offset + 2],
        header[offset + 3],
    ])
}

impl<'a> DdsFile<'a> {
    /// Parse the header and slice out every mip level.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, GraphicsError> {
        if bytes.len() < DATA_OFFSET || &bytes[..4] != MAGIC {
            return Err(GraphicsError::UnsupportedFormat(
                "not a DDS container".to_string(),
            ));
        }
        let header = &bytes[4..DATA_OFFSET];
        if header_u32(header, 0) as usize != HEADER_SIZE {
            return Err(GraphicsError::UnsupportedFormat(
                "bad DDS header size".to_string(),
            ));
        }
        let height = header_u32(header, 8);
        let width = header_u32(header, 12);
        // Writers that omit the mip count leave it zero. The count is
        // untrusted input; more levels than the extent can halve down to is
        // a malformed file, not a chain to allocate.
        let mip_count = header_u32(header, 24).max(1);
        let max_levels = max_mip_levels(width, height, 1);
        if mip_count > max_levels {
            return Err(GraphicsError::UnsupportedFormat(format!(
                "mip count {mip_count} exceeds {max_levels} for {width}x{height}"
            )));
        }
        let four_cc = &header[80..84];
        let format = match four_cc {
            b"DXT1" => CompressedFormat::Dxt1,
            b"DXT3" => CompressedFormat::Dxt3,
            b"DXT5" => CompressedFormat::Dxt5,
            other => {
                return Err(GraphicsError::UnsupportedFormat(format!(
                    "fourCC {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };

        let mut levels = Vec::with_capacity(mip_count as usize);
        let mut offset = DATA_OFFSET;
        let (mut level_width, mut level_height) = (width, height);
        for _ in 0..mip_count {
            let size = format.level_size(level_width, level_height);
            let end = offset + size;
            if end > bytes.len() {
                return Err(GraphicsError::UnsupportedFormat(
                    "truncated DDS payload".to_string(),
                ));
            }
            levels.push(&bytes[offset..end]);
            offset = end;
            level_width = (level_width / 2).max(1);
            level_height = (level_height / 2).max(1);
        }
        Ok(Self {
            format,
            width,
            height,
            levels,
        })
    }

    /// Compressed payload format.
    pub fn format(&self) -> CompressedFormat {
        self.format
    }

    /// Level 0 size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of stored mip levels.
    pub fn mip_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Payload of one mip level.
    pub fn level_data(&self, level: u32) -> Result<&'a [u8], GraphicsError> {
        self.levels
            .get(level as usize)
            .copied()
            .ok_or(GraphicsError::IndexOutOfRange {
                index: level as usize,
                count: self.levels.len(),
            })
    }

    /// Allocate a 2D texture for the whole chain and upload every stored
    /// level.
    pub fn load_texture(&self, driver: &mut dyn Driver) -> Result<Texture, GraphicsError> {
        let mut texture = Texture::new(driver, TextureTarget::Two);
        texture.storage(
            driver,
            TextureStorage::new(
                self.format.into(),
                Extent3d::new_2d(self.width, self.height),
                self.mip_count(),
            ),
        )?;
        for (level, data) in self.levels.iter().enumerate() {
            texture.image_data(driver, level as u32, data)?;
        }
        Ok(texture)
    }
}

/// Parse and upload in one step.
pub fn load_dds(driver: &mut dyn Driver, bytes: &[u8]) -> Result<Texture, GraphicsError> {
    DdsFile::parse(bytes)?.load_texture(driver)
}
