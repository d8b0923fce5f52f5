//! Shared descriptor types, flags and lookup tables.

mod buffer;
mod common;
mod format;
mod sampler;
mod texture;

pub use buffer::{MapFlags, StorageFlags, UsageHint};
pub use common::{
    AttachmentSlot, BarrierFlags, BlitFilter, BlitMask, Extent3d, FramebufferStatus, ImageAccess,
    Offset3d, Region, ShaderStage,
};
pub use format::{
    max_mip_levels, transfer_pixel_size, CompressedFormat, InternalFormat, PixelFormat, PixelType,
};
pub use sampler::{CompareFunc, MagFilter, MinFilter, SamplingParameter, WrapMode};
pub use texture::{Dimension, TextureStorage, TextureTarget};
