//! # Vermilion Graphics
//!
//! Typed GPU resource management over a stateless, handle-based driver.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Driver`] - Trait for graphics driver implementations
//! - [`resources`] - Typed buffers, textures, samplers and framebuffers
//! - [`Residency`] - Bindless handle residency tracking
//! - `NullDriver` - In-memory driver for tests (feature `null-driver`)
//!
//! ## Example
//!
//! ```ignore
//! use vermilion_graphics::{Driver, MutableBuffer, UsageHint};
//!
//! let mut buffer = MutableBuffer::<u32>::new(driver, UsageHint::DynamicDraw);
//! buffer.reserve(driver, 1024)?;
//! buffer.write(driver, 0, &data)?;
//! ```

pub mod dds;
pub mod driver;
pub mod error;
pub mod handle;
pub mod image;
pub mod residency;
pub mod resources;
pub mod shader;
pub mod state;
pub mod types;

// Re-export main types for convenience
pub use dds::{load_dds, DdsFile};
pub use driver::Driver;
#[cfg(feature = "null-driver")]
pub use driver::NullDriver;
pub use error::GraphicsError;
pub use handle::{Dispose, GpuResource, RawHandle};
pub use image::{DecodedImage, ImageCodec, StandardCodec};
pub use residency::Residency;
pub use resources::{
    BufferRead, BufferWrite, Framebuffer, GrowthBuffer, ImmutableBuffer, MutableBuffer,
    PersistentBuffer, RenderTarget, Renderbuffer, Sampler, Texture,
};
pub use shader::{expand_includes, Program};
pub use state::RenderState;
pub use types::{
    AttachmentSlot, BlitFilter, BlitMask, CompressedFormat, Extent3d, FramebufferStatus,
    InternalFormat, Offset3d, PixelFormat, PixelType, Region, TextureStorage, TextureTarget,
    UsageHint,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("Vermilion Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[cfg(feature = "null-driver")]
    #[test]
    fn test_null_driver() {
        let driver = NullDriver::new();
        assert_eq!(driver.name(), "Null Driver");
    }
}
