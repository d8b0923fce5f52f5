//! Texture targets, dimensionality and storage descriptors.

use super::format::InternalFormat;
use super::Extent3d;

/// Number of storage axes a texture target allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    One,
    Two,
    Three,
}

/// View kind of a texture, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    /// 1D texture.
    One,
    /// 2D texture.
    Two,
    /// 3D (volume) texture.
    Three,
    /// 1D array; layers stored along the height axis.
    OneArray,
    /// 2D array; layers stored along the depth axis.
    TwoArray,
    /// Cubemap; six faces stored along the depth axis.
    CubeMap,
    /// Cubemap array.
    CubeMapArray,
    /// Unnormalized-coordinate rectangle texture. Never mip-filtered.
    Rectangle,
    /// 2D multisample texture. Cannot be sampled directly.
    TwoMultisample,
}

impl TextureTarget {
    /// Storage dimensionality used for allocation and transfer dispatch.
    pub fn dimension(self) -> Dimension {
        match self {
            Self::One => Dimension::One,
            Self::Two | Self::OneArray | Self::Rectangle | Self::TwoMultisample => Dimension::Two,
            Self::Three | Self::TwoArray | Self::CubeMap | Self::CubeMapArray => Dimension::Three,
        }
    }

    /// Returns true if mip-implying filters can ever apply to this target.
    pub fn supports_mip_filtering(self) -> bool {
        !matches!(self, Self::Rectangle | Self::TwoMultisample)
    }

    /// Returns true if attachments of this target address individual layers.
    pub fn is_layered(self) -> bool {
        matches!(
            self,
            Self::OneArray | Self::TwoArray | Self::CubeMap | Self::CubeMapArray
        )
    }
}

/// Requested texture storage. Equality against the recorded allocation drives
/// the idempotent-allocation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureStorage {
    /// Device-side format.
    pub format: InternalFormat,
    /// Storage extent; axes beyond the target's dimension must be 1.
    pub extent: Extent3d,
    /// Mip level count (>= 1). Always 1 for multisample storage.
    pub levels: u32,
    /// Sample count (>= 1). Only meaningful for multisample storage.
    pub samples: u32,
    /// Whether sample locations are identical across all pixels.
    pub fixed_sample_locations: bool,
}

impl TextureStorage {
    /// Single-sample storage with the given mip count.
    pub fn new(format: InternalFormat, extent: Extent3d, levels: u32) -> Self {
        Self {
            format,
            extent,
            levels,
            samples: 1,
            fixed_sample_locations: true,
        }
    }

    /// Multisample 2D storage.
    pub fn multisample(
        format: InternalFormat,
        width: u32,
        height: u32,
        samples: u32,
        fixed_sample_locations: bool,
    ) -> Self {
        Self {
            format,
            extent: Extent3d::new_2d(width, height),
            levels: 1,
            samples,
            fixed_sample_locations,
        }
    }

    /// Byte size of one uncompressed mip level.
    pub fn level_byte_size(&self, level: u32) -> usize {
        let extent = self.extent.mip_level(level);
        match self.format.compressed() {
            Some(compressed) => {
                compressed.level_size(extent.width, extent.height) * extent.depth as usize
            }
            None => extent.pixel_count() * self.format.bytes_per_pixel(),
        }
    }
}
