//! Multisample render target with resolve-on-read semantics.

use crate::driver::Driver;
use crate::error::GraphicsError;
use crate::handle::Dispose;
use crate::resources::framebuffer::{Framebuffer, Renderbuffer};
use crate::resources::texture::Texture;
use crate::types::{
    AttachmentSlot, BlitFilter, BlitMask, Extent3d, FramebufferStatus, InternalFormat, Region,
    TextureStorage, TextureTarget,
};

/// An off-screen multisample surface paired with a single-sample resolve
/// texture.
///
/// Rendering goes to the multisample framebuffer; [`RenderTarget::frame_result`]
/// resolves into the sampleable texture on demand, at most once per frame.
pub struct RenderTarget {
    width: u32,
    height: u32,
    samples: u32,
    color_format: InternalFormat,
    framebuffer: Framebuffer,
    color: Texture,
    depth: Renderbuffer,
    resolve_framebuffer: Framebuffer,
    resolve_color: Texture,
    resolved: bool,
}

impl RenderTarget {
    /// Build the full attachment set. The sample count is clamped to the
    /// driver's maximum.
    pub fn new(
        driver: &mut dyn Driver,
        width: u32,
        height: u32,
        samples: u32,
        color_format: InternalFormat,
    ) -> Result<Self, GraphicsError> {
        let mut color = Texture::new(driver, TextureTarget::TwoMultisample);
        color.storage_multisample(driver, color_format, width, height, samples, true)?;
        let samples = color.allocation().map_or(samples, |s| s.samples);

        let mut depth = Renderbuffer::new(driver);
        depth.storage(driver, InternalFormat::Depth24Stencil8, width, height, samples)?;

        let mut framebuffer = Framebuffer::new(driver);
        framebuffer.set_texture(driver, AttachmentSlot::Color(0), &color, 0)?;
        framebuffer.set_renderbuffer(driver, AttachmentSlot::DepthStencil, &depth)?;

        let mut resolve_color = Texture::new(driver, TextureTarget::Two);
        resolve_color.storage(
            driver,
            TextureStorage::new(color_format, Extent3d::new_2d(width, height), 1),
        )?;
        let mut resolve_framebuffer = Framebuffer::new(driver);
        resolve_framebuffer.set_texture(driver, AttachmentSlot::Color(0), &resolve_color, 0)?;

        Ok(Self {
            width,
            height,
            samples,
            color_format,
            framebuffer,
            color,
            depth,
            resolve_framebuffer,
            resolve_color,
            resolved: false,
        })
    }

    /// The framebuffer rendering should target.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Completeness verdict of the multisample framebuffer.
    pub fn status(&self, driver: &mut dyn Driver) -> FramebufferStatus {
        self.framebuffer.status(driver)
    }

    /// Start a frame: the previous resolve result is stale from here on.
    pub fn new_frame(&mut self) {
        self.resolved = false;
    }

    /// Clear color and depth of the multisample surface with the driver's
    /// current clear values.
    pub fn clear(&mut self, driver: &mut dyn Driver) {
        self.framebuffer
            .clear(driver, BlitMask::COLOR | BlitMask::DEPTH | BlitMask::STENCIL);
        self.resolved = false;
    }

    /// Resolve the multisample color into the sampleable texture if this
    /// frame has not been resolved yet, and return it.
    pub fn frame_result(&mut self, driver: &mut dyn Driver) -> &Texture {
        if !self.resolved {
            let region = Region {
                x: 0,
                y: 0,
                width: self.width,
                height: self.height,
            };
            self.framebuffer.blit_to(
                driver,
                &self.resolve_framebuffer,
                region,
                region,
                BlitMask::COLOR,
                BlitFilter::Nearest,
            );
            self.resolved = true;
        }
        &self.resolve_color
    }

    /// Reallocate every attachment for a new size, dropping prior contents.
    pub fn resize(
        &mut self,
        driver: &mut dyn Driver,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicsError> {
        if width == self.width && height == self.height {
            return Ok(());
        }
        self.width = width;
        self.height = height;
        self.color
            .storage_multisample(driver, self.color_format, width, height, self.samples, true)?;
        self.depth
            .storage(driver, InternalFormat::Depth24Stencil8, width, height, self.samples)?;
        self.framebuffer
            .set_texture(driver, AttachmentSlot::Color(0), &self.color, 0)?;
        self.framebuffer
            .set_renderbuffer(driver, AttachmentSlot::DepthStencil, &self.depth)?;

        self.resolve_color.storage(
            driver,
            TextureStorage::new(self.color_format, Extent3d::new_2d(width, height), 1),
        )?;
        self.resolve_framebuffer
            .set_texture(driver, AttachmentSlot::Color(0), &self.resolve_color, 0)?;
        self.resolved = false;
        Ok(())
    }

    /// Surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Effective sample count after clamping.
    pub fn samples(&self) -> u32 {
        self.samples
    }
}

impl Dispose for RenderTarget {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        self.resolve_framebuffer.dispose(driver);
        self.resolve_color.dispose(driver);
        self.framebuffer.dispose(driver);
        self.depth.dispose(driver);
        self.color.dispose(driver);
        self.resolved = false;
    }
}
