//! Framebuffer composition over texture and renderbuffer attachments.

use std::collections::BTreeMap;

use crate::driver::Driver;
use crate::error::GraphicsError;
use crate::handle::{Dispose, GpuResource, RawHandle};
use crate::resources::texture::Texture;
use crate::types::{
    AttachmentSlot, BlitFilter, BlitMask, Extent3d, FramebufferStatus, InternalFormat, Region,
    TextureStorage, TextureTarget,
};

/// An off-screen render surface with no sampling capability.
pub struct Renderbuffer {
    handle: RawHandle,
    storage: Option<RenderbufferStorage>,
}

/// Recorded renderbuffer allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderbufferStorage {
    pub format: InternalFormat,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

impl Renderbuffer {
    /// Create an unallocated renderbuffer object.
    pub fn new(driver: &mut dyn Driver) -> Self {
        Self {
            handle: driver.create_renderbuffer(),
            storage: None,
        }
    }

    /// Allocate storage. `samples == 1` selects single-sample storage.
    pub fn storage(
        &mut self,
        driver: &mut dyn Driver,
        format: InternalFormat,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Result<(), GraphicsError> {
        driver.renderbuffer_storage(self.handle, samples, format, width, height)?;
        self.storage = Some(RenderbufferStorage {
            format,
            width,
            height,
            samples,
        });
        Ok(())
    }

    /// Recorded allocation, if any.
    pub fn allocation(&self) -> Option<&RenderbufferStorage> {
        self.storage.as_ref()
    }
}

impl GpuResource for Renderbuffer {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

impl Dispose for Renderbuffer {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        if self.handle.is_valid() {
            driver.delete_renderbuffer(self.handle);
            self.handle = RawHandle::NONE;
            self.storage = None;
        }
    }
}

/// Host-side record of one attachment, kept for size and format queries.
#[derive(Debug, Clone, Copy)]
struct Attachment {
    format: InternalFormat,
    width: u32,
    height: u32,
}

/// A framebuffer object composed from texture levels, texture layers and
/// renderbuffers.
///
/// The last write to a slot wins; re-attaching over a populated slot simply
/// replaces it.
pub struct Framebuffer {
    handle: RawHandle,
    attachments: BTreeMap<AttachmentSlot, Attachment>,
}

impl Framebuffer {
    /// Create an empty framebuffer object.
    pub fn new(driver: &mut dyn Driver) -> Self {
        Self {
            handle: driver.create_framebuffer(),
            attachments: BTreeMap::new(),
        }
    }

    /// Attach a mip level of a texture. The texture must be allocated so the
    /// attachment's size and format can be recorded.
    pub fn set_texture(
        &mut self,
        driver: &mut dyn Driver,
        slot: AttachmentSlot,
        texture: &Texture,
        level: u32,
    ) -> Result<(), GraphicsError> {
        let storage = texture.allocation().copied().ok_or_else(|| {
            GraphicsError::Unallocated(format!("texture {}", texture.raw_handle()))
        })?;
        driver.framebuffer_texture(self.handle, slot, texture.raw_handle(), level);
        self.record(slot, &storage, level);
        Ok(())
    }

    /// Attach one layer of a layered texture's mip level.
    pub fn set_texture_layer(
        &mut self,
        driver: &mut dyn Driver,
        slot: AttachmentSlot,
        texture: &Texture,
        level: u32,
        layer: u32,
    ) -> Result<(), GraphicsError> {
        let storage = texture.allocation().copied().ok_or_else(|| {
            GraphicsError::Unallocated(format!("texture {}", texture.raw_handle()))
        })?;
        driver.framebuffer_texture_layer(self.handle, slot, texture.raw_handle(), level, layer);
        self.record(slot, &storage, level);
        Ok(())
    }

    /// Attach a renderbuffer.
    pub fn set_renderbuffer(
        &mut self,
        driver: &mut dyn Driver,
        slot: AttachmentSlot,
        renderbuffer: &Renderbuffer,
    ) -> Result<(), GraphicsError> {
        let storage = renderbuffer.allocation().copied().ok_or_else(|| {
            GraphicsError::Unallocated(format!("renderbuffer {}", renderbuffer.raw_handle()))
        })?;
        driver.framebuffer_renderbuffer(self.handle, slot, renderbuffer.raw_handle());
        self.attachments.insert(
            slot,
            Attachment {
                format: storage.format,
                width: storage.width,
                height: storage.height,
            },
        );
        Ok(())
    }

    fn record(&mut self, slot: AttachmentSlot, storage: &TextureStorage, level: u32) {
        let extent = storage.extent.mip_level(level);
        self.attachments.insert(
            slot,
            Attachment {
                format: storage.format,
                width: extent.width,
                height: extent.height,
            },
        );
    }

    /// Query the completeness verdict.
    pub fn status(&self, driver: &mut dyn Driver) -> FramebufferStatus {
        driver.framebuffer_status(self.handle)
    }

    /// Clear the selected aspects with the driver's current clear values.
    pub fn clear(&self, driver: &mut dyn Driver, mask: BlitMask) {
        driver.clear(self.handle, mask);
    }

    /// Copy a region into another framebuffer.
    pub fn blit_to(
        &self,
        driver: &mut dyn Driver,
        dst: &Framebuffer,
        src_region: Region,
        dst_region: Region,
        mask: BlitMask,
        filter: BlitFilter,
    ) {
        driver.blit_framebuffer(self.handle, dst.handle, src_region, dst_region, mask, filter);
    }

    /// Copy a color attachment into a freshly allocated single-sample 2D
    /// texture. Also the resolve path for multisample sources, since the
    /// destination is always single-sample.
    pub fn extract_color(
        &self,
        driver: &mut dyn Driver,
        index: u32,
    ) -> Result<Texture, GraphicsError> {
        let slot = AttachmentSlot::Color(index);
        let attachment = *self.attachments.get(&slot).ok_or_else(|| {
            GraphicsError::Unallocated(format!("framebuffer {} color {index}", self.handle))
        })?;

        let mut texture = Texture::new(driver, TextureTarget::Two);
        texture.storage(
            driver,
            TextureStorage::new(
                attachment.format,
                Extent3d::new_2d(attachment.width, attachment.height),
                1,
            ),
        )?;

        let mut resolve = Framebuffer::new(driver);
        resolve.set_texture(driver, AttachmentSlot::Color(0), &texture, 0)?;
        let region = Region {
            x: 0,
            y: 0,
            width: attachment.width,
            height: attachment.height,
        };
        driver.blit_framebuffer(
            self.handle,
            resolve.handle,
            region,
            region,
            BlitMask::COLOR,
            BlitFilter::Nearest,
        );
        resolve.dispose(driver);
        Ok(texture)
    }

    /// Recorded size of an attachment, if the slot is populated.
    pub fn attachment_size(&self, slot: AttachmentSlot) -> Option<(u32, u32)> {
        self.attachments.get(&slot).map(|a| (a.width, a.height))
    }

    /// Recorded format of an attachment, if the slot is populated.
    pub fn attachment_format(&self, slot: AttachmentSlot) -> Option<InternalFormat> {
        self.attachments.get(&slot).map(|a| a.format)
    }

    /// Number of populated attachment slots.
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }
}

impl GpuResource for Framebuffer {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

impl Dispose for Framebuffer {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        if self.handle.is_valid() {
            driver.delete_framebuffer(self.handle);
            self.handle = RawHandle::NONE;
            self.attachments.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NullDriver;

    fn color_texture(driver: &mut NullDriver, width: u32, height: u32) -> Texture {
        let mut texture = Texture::new(driver, TextureTarget::Two);
        texture
            .storage(
                driver,
                TextureStorage::new(InternalFormat::Rgba8, Extent3d::new_2d(width, height), 1),
            )
            .unwrap();
        texture
    }

    #[test]
    fn test_empty_framebuffer_is_incomplete() {
        let mut driver = NullDriver::new();
        let framebuffer = Framebuffer::new(&mut driver);
        assert_eq!(
            framebuffer.status(&mut driver),
            FramebufferStatus::IncompleteMissingAttachment
        );
    }

    #[test]
    fn test_complete_with_color_attachment() {
        let mut driver = NullDriver::new();
        let texture = color_texture(&mut driver, 8, 8);
        let mut framebuffer = Framebuffer::new(&mut driver);
        framebuffer
            .set_texture(&mut driver, AttachmentSlot::Color(0), &texture, 0)
            .unwrap();
        assert!(framebuffer.status(&mut driver).is_complete());
        assert_eq!(
            framebuffer.attachment_size(AttachmentSlot::Color(0)),
            Some((8, 8))
        );
    }

    #[test]
    fn test_unallocated_attachment_is_rejected() {
        let mut driver = NullDriver::new();
        let texture = Texture::new(&mut driver, TextureTarget::Two);
        let mut framebuffer = Framebuffer::new(&mut driver);
        assert!(matches!(
            framebuffer.set_texture(&mut driver, AttachmentSlot::Color(0), &texture, 0),
            Err(GraphicsError::Unallocated(_))
        ));
    }

    #[test]
    fn test_last_attachment_wins() {
        let mut driver = NullDriver::new();
        let small = color_texture(&mut driver, 4, 4);
        let large = color_texture(&mut driver, 16, 16);
        let mut framebuffer = Framebuffer::new(&mut driver);

        framebuffer
            .set_texture(&mut driver, AttachmentSlot::Color(0), &small, 0)
            .unwrap();
        framebuffer
            .set_texture(&mut driver, AttachmentSlot::Color(0), &large, 0)
            .unwrap();
        assert_eq!(framebuffer.attachment_count(), 1);
        assert_eq!(
            framebuffer.attachment_size(AttachmentSlot::Color(0)),
            Some((16, 16))
        );
    }

    #[test]
    fn test_renderbuffer_depth_attachment() {
        let mut driver = NullDriver::new();
        let texture = color_texture(&mut driver, 8, 8);
        let mut depth = Renderbuffer::new(&mut driver);
        depth
            .storage(&mut driver, InternalFormat::Depth24Stencil8, 8, 8, 1)
            .unwrap();

        let mut framebuffer = Framebuffer::new(&mut driver);
        framebuffer
            .set_texture(&mut driver, AttachmentSlot::Color(0), &texture, 0)
            .unwrap();
        framebuffer
            .set_renderbuffer(&mut driver, AttachmentSlot::DepthStencil, &depth)
            .unwrap();
        assert!(framebuffer.status(&mut driver).is_complete());
        assert_eq!(
            framebuffer.attachment_format(AttachmentSlot::DepthStencil),
            Some(InternalFormat::Depth24Stencil8)
        );
    }

    #[test]
    fn test_extract_color_copies_pixels() {
        let mut driver = NullDriver::new();
        let mut texture = color_texture(&mut driver, 2, 2);
        let pixels: Vec<u8> = (40u8..56).collect();
        texture.image_data(&mut driver, 0, &pixels).unwrap();

        let mut framebuffer = Framebuffer::new(&mut driver);
        framebuffer
            .set_texture(&mut driver, AttachmentSlot::Color(0), &texture, 0)
            .unwrap();

        let extracted = framebuffer.extract_color(&mut driver, 0).unwrap();
        assert_eq!(extracted.read_level(&mut driver, 0).unwrap(), pixels);
        assert!(matches!(
            framebuffer.extract_color(&mut driver, 1),
            Err(GraphicsError::Unallocated(_))
        ));
    }

    #[test]
    fn test_clear_fills_color_attachment() {
        let mut driver = NullDriver::new();
        let texture = color_texture(&mut driver, 2, 2);
        let mut framebuffer = Framebuffer::new(&mut driver);
        framebuffer
            .set_texture(&mut driver, AttachmentSlot::Color(0), &texture, 0)
            .unwrap();

        driver.set_clear_color([1.0, 0.0, 0.0, 1.0]);
        framebuffer.clear(&mut driver, BlitMask::COLOR);
        let pixels = texture.read_level(&mut driver, 0).unwrap();
        assert_eq!(&pixels[..4], &[255, 0, 0, 255]);
    }
}
