//! Pixel format and type descriptor tables.
//!
//! These fixed lookup tables size host-side transfer buffers without a driver
//! round-trip: a [`PixelType`] knows its bytes per component, a
//! [`PixelFormat`] knows its component count, and an [`InternalFormat`] knows
//! its preferred transfer pair and bytes per pixel.

/// Component layout of pixel data in client memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single red channel.
    Red,
    /// Red/green channels.
    Rg,
    /// Red/green/blue channels.
    Rgb,
    /// Blue/green/red channels.
    Bgr,
    /// Red/green/blue/alpha channels.
    Rgba,
    /// Blue/green/red/alpha channels.
    Bgra,
    /// Single depth component.
    DepthComponent,
    /// Interleaved depth and stencil.
    DepthStencil,
}

impl PixelFormat {
    /// Number of components per pixel.
    pub fn components(self) -> usize {
        match self {
            Self::Red | Self::DepthComponent => 1,
            Self::Rg | Self::DepthStencil => 2,
            Self::Rgb | Self::Bgr => 3,
            Self::Rgba | Self::Bgra => 4,
        }
    }
}

/// Scalar type of each pixel component in client memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F16,
    F32,
}

impl PixelType {
    /// Size in bytes of one component.
    pub fn bytes(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
        }
    }
}

/// Byte size of one pixel for a transfer described by `(format, pixel_type)`.
pub fn transfer_pixel_size(format: PixelFormat, pixel_type: PixelType) -> usize {
    format.components() * pixel_type.bytes()
}

/// Block-compressed texture formats (S3TC family).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedFormat {
    /// DXT1 / BC1: 8 bytes per 4x4 block.
    Dxt1,
    /// DXT3 / BC2: 16 bytes per 4x4 block.
    Dxt3,
    /// DXT5 / BC3: 16 bytes per 4x4 block.
    Dxt5,
}

impl CompressedFormat {
    /// Bytes per 4x4 compressed block.
    pub fn block_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 | Self::Dxt5 => 16,
        }
    }

    /// Compressed byte size of a `width x height` mip level.
    pub fn level_size(self, width: u32, height: u32) -> usize {
        let blocks_w = width.div_ceil(4) as usize;
        let blocks_h = height.div_ceil(4) as usize;
        blocks_w * blocks_h * self.block_size()
    }
}

/// Device-side storage format of a texture or renderbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum InternalFormat {
    R8,
    Rg8,
    Rgb8,
    #[default]
    Rgba8,
    Srgb8Alpha8,
    R16F,
    Rg16F,
    Rgba16F,
    R32F,
    Rg32F,
    Rgba32F,
    R32UI,
    Depth24Stencil8,
    Depth32F,
    /// Compressed RGBA, DXT1 blocks.
    CompressedDxt1,
    /// Compressed RGBA, DXT3 blocks.
    CompressedDxt3,
    /// Compressed RGBA, DXT5 blocks.
    CompressedDxt5,
}

impl InternalFormat {
    /// Preferred client pixel format for transfers to/from this storage.
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            Self::R8 | Self::R16F | Self::R32F => PixelFormat::Red,
            Self::R32UI => PixelFormat::Red,
            Self::Rg8 | Self::Rg16F | Self::Rg32F => PixelFormat::Rg,
            Self::Rgb8 => PixelFormat::Rgb,
            Self::Rgba8
            | Self::Srgb8Alpha8
            | Self::Rgba16F
            | Self::Rgba32F
            | Self::CompressedDxt1
            | Self::CompressedDxt3
            | Self::CompressedDxt5 => PixelFormat::Rgba,
            Self::Depth24Stencil8 => PixelFormat::DepthStencil,
            Self::Depth32F => PixelFormat::DepthComponent,
        }
    }

    /// Preferred client pixel type for transfers to/from this storage.
    pub fn pixel_type(self) -> PixelType {
        match self {
            Self::R8 | Self::Rg8 | Self::Rgb8 | Self::Rgba8 | Self::Srgb8Alpha8 => PixelType::U8,
            Self::CompressedDxt1 | Self::CompressedDxt3 | Self::CompressedDxt5 => PixelType::U8,
            Self::R16F | Self::Rg16F | Self::Rgba16F => PixelType::F16,
            Self::R32F | Self::Rg32F | Self::Rgba32F | Self::Depth32F => PixelType::F32,
            Self::R32UI | Self::Depth24Stencil8 => PixelType::U32,
        }
    }

    /// Bytes per pixel for uncompressed formats, bytes per block for
    /// compressed formats.
    pub fn bytes_per_pixel(self) -> usize {
        match self.compressed() {
            Some(compressed) => compressed.block_size(),
            None => match self {
                Self::Depth24Stencil8 => 4,
                _ => transfer_pixel_size(self.pixel_format(), self.pixel_type()),
            },
        }
    }

    /// The compressed block layout, if this is a compressed format.
    pub fn compressed(self) -> Option<CompressedFormat> {
        match self {
            Self::CompressedDxt1 => Some(CompressedFormat::Dxt1),
            Self::CompressedDxt3 => Some(CompressedFormat::Dxt3),
            Self::CompressedDxt5 => Some(CompressedFormat::Dxt5),
            _ => None,
        }
    }

    /// Returns true if this storage holds depth or depth/stencil data.
    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth24Stencil8 | Self::Depth32F)
    }
}

impl From<CompressedFormat> for InternalFormat {
    fn from(format: CompressedFormat) -> Self {
        match format {
            CompressedFormat::Dxt1 => Self::CompressedDxt1,
            CompressedFormat::Dxt3 => Self::CompressedDxt3,
            CompressedFormat::Dxt5 => Self::CompressedDxt5,
        }
    }
}

/// Full mip chain length for the given storage dimensions:
/// `floor(log2(max(width, height, depth))) + 1`.
pub fn max_mip_levels(width: u32, height: u32, depth: u32) -> u32 {
    let largest = width.max(height).max(depth).max(1);
    32 - largest.leading_zeros()
}
