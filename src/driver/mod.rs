//! Driver abstraction layer.
//!
//! The resource layer never talks to a graphics API directly; it issues calls
//! through the [`Driver`] trait, a thin mirror of a stateless, handle-based
//! immediate-mode driver. Handles are opaque [`RawHandle`] values owned by
//! the resource wrappers; the driver holds no object state beyond what the
//! API itself records.
//!
//! # Available drivers
//!
//! - [`NullDriver`] (feature `null-driver`, default): software driver with
//!   byte-accurate buffer and texture storage, used by the test suite and as
//!   a reference for driver semantics.
//!
//! # Threading contract
//!
//! Every method assumes it runs on the one thread that owns the active
//! driver context. There is no internal locking, and all calls are
//! synchronous round-trips; the driver may queue device work asynchronously
//! but this layer neither exposes nor awaits it.

#[cfg(feature = "null-driver")]
mod null;

#[cfg(feature = "null-driver")]
pub use null::NullDriver;

use crate::error::GraphicsError;
use crate::handle::RawHandle;
use crate::types::{
    AttachmentSlot, BarrierFlags, BlitFilter, BlitMask, CompressedFormat, Extent3d,
    FramebufferStatus, ImageAccess, InternalFormat, MapFlags, Offset3d, PixelFormat, PixelType,
    Region, SamplingParameter, ShaderStage, StorageFlags, TextureTarget, UsageHint,
};

/// Handle-based immediate-mode driver interface.
///
/// Creation calls return fresh non-zero handles; deletion calls on
/// `RawHandle::NONE` or already-deleted handles are silently ignored,
/// matching the underlying API. Storage calls may fail with a
/// driver-reported allocation error; everything else is fire-and-forget.
pub trait Driver {
    /// Driver name for diagnostics.
    fn name(&self) -> &'static str;

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    /// Create a buffer object.
    fn create_buffer(&mut self) -> RawHandle;

    /// Delete a buffer object.
    fn delete_buffer(&mut self, buffer: RawHandle);

    /// Allocate immutable storage. The backing size is fixed for the
    /// handle's lifetime; a second call on the same handle fails.
    fn buffer_storage(
        &mut self,
        buffer: RawHandle,
        size: usize,
        data: Option<&[u8]>,
        flags: StorageFlags,
    ) -> Result<(), GraphicsError>;

    /// Allocate (or re-allocate, discarding contents) mutable storage.
    fn buffer_data(
        &mut self,
        buffer: RawHandle,
        size: usize,
        data: Option<&[u8]>,
        usage: UsageHint,
    ) -> Result<(), GraphicsError>;

    /// Replace a byte range of a buffer.
    fn buffer_sub_data(&mut self, buffer: RawHandle, offset: usize, data: &[u8]);

    /// Read a byte range of a buffer back to the host.
    fn read_buffer_sub_data(&mut self, buffer: RawHandle, offset: usize, size: usize) -> Vec<u8>;

    /// Zero-fill a byte range of a buffer device-side.
    fn clear_buffer_sub_data(&mut self, buffer: RawHandle, offset: usize, size: usize);

    /// Device-side copy between two buffers.
    fn copy_buffer_sub_data(
        &mut self,
        src: RawHandle,
        dst: RawHandle,
        src_offset: usize,
        dst_offset: usize,
        size: usize,
    );

    /// Map a byte range into host-visible memory. With
    /// [`MapFlags::PERSISTENT`] the pointer stays valid until
    /// [`Driver::unmap_buffer`].
    fn map_buffer_range(
        &mut self,
        buffer: RawHandle,
        offset: usize,
        size: usize,
        flags: MapFlags,
    ) -> Result<*mut u8, GraphicsError>;

    /// Release a mapping established by [`Driver::map_buffer_range`].
    fn unmap_buffer(&mut self, buffer: RawHandle);

    /// Make host writes through a mapped range visible to the device.
    /// Offsets are relative to the start of the mapping.
    fn flush_mapped_range(&mut self, buffer: RawHandle, offset: usize, size: usize);

    /// Discard device-side contents without a transfer.
    fn invalidate_buffer_data(&mut self, buffer: RawHandle);

    // ------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------

    /// Create a texture object of the given target.
    fn create_texture(&mut self, target: TextureTarget) -> RawHandle;

    /// Delete a texture object.
    fn delete_texture(&mut self, texture: RawHandle);

    /// Allocate immutable 1D storage.
    fn texture_storage_1d(
        &mut self,
        texture: RawHandle,
        levels: u32,
        format: InternalFormat,
        width: u32,
    ) -> Result<(), GraphicsError>;

    /// Allocate immutable 2D storage.
    fn texture_storage_2d(
        &mut self,
        texture: RawHandle,
        levels: u32,
        format: InternalFormat,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicsError>;

    /// Allocate immutable 3D storage.
    fn texture_storage_3d(
        &mut self,
        texture: RawHandle,
        levels: u32,
        format: InternalFormat,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<(), GraphicsError>;

    /// Allocate immutable 2D multisample storage.
    fn texture_storage_2d_multisample(
        &mut self,
        texture: RawHandle,
        samples: u32,
        format: InternalFormat,
        width: u32,
        height: u32,
        fixed_sample_locations: bool,
    ) -> Result<(), GraphicsError>;

    /// Upload a 1D sub-region.
    fn texture_sub_image_1d(
        &mut self,
        texture: RawHandle,
        level: u32,
        x: u32,
        width: u32,
        format: PixelFormat,
        pixel_type: PixelType,
        data: &[u8],
    );

    /// Upload a 2D sub-region.
    #[allow(clippy::too_many_arguments)]
    fn texture_sub_image_2d(
        &mut self,
        texture: RawHandle,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixel_type: PixelType,
        data: &[u8],
    );

    /// Upload a 3D sub-region.
    #[allow(clippy::too_many_arguments)]
    fn texture_sub_image_3d(
        &mut self,
        texture: RawHandle,
        level: u32,
        offset: Offset3d,
        extent: Extent3d,
        format: PixelFormat,
        pixel_type: PixelType,
        data: &[u8],
    );

    /// Upload a pre-compressed 2D sub-region. `data` carries an explicit
    /// byte size; the driver does not derive it from the dimensions.
    #[allow(clippy::too_many_arguments)]
    fn compressed_texture_sub_image_2d(
        &mut self,
        texture: RawHandle,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: CompressedFormat,
        data: &[u8],
    );

    /// Read a full mip level back to the host. `size` is the expected byte
    /// length, computed host-side from the format tables.
    fn read_texture_image(
        &mut self,
        texture: RawHandle,
        level: u32,
        format: PixelFormat,
        pixel_type: PixelType,
        size: usize,
    ) -> Vec<u8>;

    /// Device-side copy of a (possibly volumetric) region between two
    /// allocated textures.
    #[allow(clippy::too_many_arguments)]
    fn copy_image_sub_data(
        &mut self,
        src: RawHandle,
        src_level: u32,
        src_offset: Offset3d,
        dst: RawHandle,
        dst_level: u32,
        dst_offset: Offset3d,
        extent: Extent3d,
    );

    /// Populate levels `1..levels` from level 0.
    fn generate_mipmaps(&mut self, texture: RawHandle);

    /// Write one texture-level sampling parameter.
    fn set_texture_parameter(&mut self, texture: RawHandle, parameter: SamplingParameter);

    /// Bind a texture level for incoherent image load/store access.
    fn bind_image_texture(
        &mut self,
        unit: u32,
        texture: RawHandle,
        level: u32,
        access: ImageAccess,
        format: InternalFormat,
    );

    /// Issue a memory barrier for the given access classes.
    fn memory_barrier(&mut self, barriers: BarrierFlags);

    /// Driver-reported maximum color sample count.
    fn max_samples(&self) -> u32;

    // ------------------------------------------------------------------
    // Samplers
    // ------------------------------------------------------------------

    /// Create a sampler object.
    fn create_sampler(&mut self) -> RawHandle;

    /// Delete a sampler object.
    fn delete_sampler(&mut self, sampler: RawHandle);

    /// Write one sampler parameter.
    fn set_sampler_parameter(&mut self, sampler: RawHandle, parameter: SamplingParameter);

    // ------------------------------------------------------------------
    // Bindless residency
    // ------------------------------------------------------------------

    /// Derive the 64-bit bindless handle of a texture. Repeated calls return
    /// the same value for the same texture.
    fn texture_handle(&mut self, texture: RawHandle) -> u64;

    /// Derive the combined bindless handle of a texture/sampler pair.
    fn texture_sampler_handle(&mut self, texture: RawHandle, sampler: RawHandle) -> u64;

    /// Mark a bindless handle resident. Must not already be resident.
    fn make_handle_resident(&mut self, handle: u64);

    /// Mark a bindless handle non-resident. Must currently be resident.
    fn make_handle_non_resident(&mut self, handle: u64);

    // ------------------------------------------------------------------
    // Renderbuffers
    // ------------------------------------------------------------------

    /// Create a renderbuffer object.
    fn create_renderbuffer(&mut self) -> RawHandle;

    /// Delete a renderbuffer object.
    fn delete_renderbuffer(&mut self, renderbuffer: RawHandle);

    /// Allocate renderbuffer storage. `samples == 1` selects single-sample
    /// storage.
    fn renderbuffer_storage(
        &mut self,
        renderbuffer: RawHandle,
        samples: u32,
        format: InternalFormat,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicsError>;

    // ------------------------------------------------------------------
    // Framebuffers
    // ------------------------------------------------------------------

    /// Create a framebuffer object.
    fn create_framebuffer(&mut self) -> RawHandle;

    /// Delete a framebuffer object.
    fn delete_framebuffer(&mut self, framebuffer: RawHandle);

    /// Attach a texture mip level to an attachment slot.
    fn framebuffer_texture(
        &mut self,
        framebuffer: RawHandle,
        slot: AttachmentSlot,
        texture: RawHandle,
        level: u32,
    );

    /// Attach one layer of a layered texture to an attachment slot.
    fn framebuffer_texture_layer(
        &mut self,
        framebuffer: RawHandle,
        slot: AttachmentSlot,
        texture: RawHandle,
        level: u32,
        layer: u32,
    );

    /// Attach a renderbuffer to an attachment slot.
    fn framebuffer_renderbuffer(
        &mut self,
        framebuffer: RawHandle,
        slot: AttachmentSlot,
        renderbuffer: RawHandle,
    );

    /// Query the completeness verdict.
    fn framebuffer_status(&mut self, framebuffer: RawHandle) -> FramebufferStatus;

    /// Copy a rectangular region between two framebuffers.
    #[allow(clippy::too_many_arguments)]
    fn blit_framebuffer(
        &mut self,
        src: RawHandle,
        dst: RawHandle,
        src_region: Region,
        dst_region: Region,
        mask: BlitMask,
        filter: BlitFilter,
    );

    /// Set the clear color applied by subsequent clears.
    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Set the clear depth applied by subsequent clears.
    fn set_clear_depth(&mut self, depth: f32);

    /// Set the clear stencil applied by subsequent clears.
    fn set_clear_stencil(&mut self, stencil: i32);

    /// Clear the selected aspects of a framebuffer with the current clear
    /// values. `RawHandle::NONE` selects the default framebuffer.
    fn clear(&mut self, framebuffer: RawHandle, mask: BlitMask);

    // ------------------------------------------------------------------
    // Shaders
    // ------------------------------------------------------------------

    /// Create a shader object for the given stage.
    fn create_shader(&mut self, stage: ShaderStage) -> RawHandle;

    /// Delete a shader object.
    fn delete_shader(&mut self, shader: RawHandle);

    /// Compile a shader from source. On failure, returns the driver's
    /// diagnostic log.
    fn compile_shader(&mut self, shader: RawHandle, source: &str) -> Result<(), String>;

    /// Create a program object.
    fn create_program(&mut self) -> RawHandle;

    /// Delete a program object.
    fn delete_program(&mut self, program: RawHandle);

    /// Attach a compiled shader to a program.
    fn attach_shader(&mut self, program: RawHandle, shader: RawHandle);

    /// Link a program. On failure, returns the driver's diagnostic log.
    fn link_program(&mut self, program: RawHandle) -> Result<(), String>;
}
