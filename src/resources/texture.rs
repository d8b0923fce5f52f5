//! Dimension-polymorphic texture storage with mips, multisample storage,
//! compressed uploads and bindless residency.

use log::warn;

use crate::driver::Driver;
use crate::error::GraphicsError;
use crate::handle::{Dispose, GpuResource, RawHandle};
use crate::residency::Residency;
use crate::resources::sampler::Sampler;
use crate::types::{
    BarrierFlags, CompressedFormat, CompareFunc, Dimension, Extent3d, ImageAccess, InternalFormat,
    MagFilter, MinFilter, Offset3d, PixelFormat, PixelType, SamplingParameter, TextureStorage,
    TextureTarget, WrapMode,
};

/// A texture object whose storage, sampling state and bindless residency are
/// tracked host-side.
///
/// The target is fixed at construction; storage is allocated by
/// [`Texture::storage`] and may be replaced later, which silently recreates
/// the underlying driver object (bindless handles are immutable once derived,
/// so a live handle is released first).
pub struct Texture {
    handle: RawHandle,
    target: TextureTarget,
    allocation: Option<TextureStorage>,
    min_filter: MinFilter,
    mag_filter: MagFilter,
    wrap: [WrapMode; 3],
    compare: Option<CompareFunc>,
    residency: Residency,
    sampler_residency: Vec<(RawHandle, Residency)>,
}

impl Texture {
    /// Create an unallocated texture of the given target.
    pub fn new(driver: &mut dyn Driver, target: TextureTarget) -> Self {
        Self {
            handle: driver.create_texture(target),
            target,
            allocation: None,
            min_filter: MinFilter::NearestMipmapLinear,
            mag_filter: MagFilter::Linear,
            wrap: [WrapMode::Repeat; 3],
            compare: None,
            residency: Residency::new(),
            sampler_residency: Vec::new(),
        }
    }

    /// Allocate storage. Re-requesting the recorded storage is a no-op;
    /// requesting different storage recreates the driver object in place,
    /// releasing any live bindless handles first.
    pub fn storage(
        &mut self,
        driver: &mut dyn Driver,
        storage: TextureStorage,
    ) -> Result<(), GraphicsError> {
        match self.allocation {
            Some(current) if current == storage => return Ok(()),
            Some(_) => self.recreate(driver),
            None => {}
        }
        let extent = storage.extent;
        match self.target.dimension() {
            Dimension::One => {
                driver.texture_storage_1d(self.handle, storage.levels, storage.format, extent.width)?
            }
            Dimension::Two if storage.samples > 1 => driver.texture_storage_2d_multisample(
                self.handle,
                storage.samples,
                storage.format,
                extent.width,
                extent.height,
                storage.fixed_sample_locations,
            )?,
            Dimension::Two => driver.texture_storage_2d(
                self.handle,
                storage.levels,
                storage.format,
                extent.width,
                extent.height,
            )?,
            Dimension::Three => driver.texture_storage_3d(
                self.handle,
                storage.levels,
                storage.format,
                extent.width,
                extent.height,
                extent.depth,
            )?,
        }
        self.allocation = Some(storage);
        Ok(())
    }

    /// Allocate multisample storage, clamping the requested sample count to
    /// the driver's reported maximum.
    pub fn storage_multisample(
        &mut self,
        driver: &mut dyn Driver,
        format: InternalFormat,
        width: u32,
        height: u32,
        samples: u32,
        fixed_sample_locations: bool,
    ) -> Result<(), GraphicsError> {
        let max = driver.max_samples();
        let samples = if samples > max {
            warn!("texture {}: {samples} samples clamped to {max}", self.handle);
            max
        } else {
            samples
        };
        self.storage(
            driver,
            TextureStorage::multisample(format, width, height, samples, fixed_sample_locations),
        )
    }

    fn recreate(&mut self, driver: &mut dyn Driver) {
        self.release_residency(driver);
        driver.delete_texture(self.handle);
        self.handle = driver.create_texture(self.target);
        self.allocation = None;
        // Sampling state is host-cached, so replay it onto the new object.
        driver.set_texture_parameter(self.handle, SamplingParameter::MinFilter(self.min_filter));
        driver.set_texture_parameter(self.handle, SamplingParameter::MagFilter(self.mag_filter));
        driver.set_texture_parameter(self.handle, SamplingParameter::WrapS(self.wrap[0]));
        driver.set_texture_parameter(self.handle, SamplingParameter::WrapT(self.wrap[1]));
        driver.set_texture_parameter(self.handle, SamplingParameter::WrapR(self.wrap[2]));
        driver.set_texture_parameter(self.handle, SamplingParameter::Compare(self.compare));
    }

    fn allocation_checked(&self) -> Result<&TextureStorage, GraphicsError> {
        self.allocation
            .as_ref()
            .ok_or_else(|| GraphicsError::Unallocated(format!("texture {}", self.handle)))
    }

    fn level_checked(&self, level: u32) -> Result<&TextureStorage, GraphicsError> {
        let storage = self.allocation_checked()?;
        if level >= storage.levels {
            return Err(GraphicsError::IndexOutOfRange {
                index: level as usize,
                count: storage.levels as usize,
            });
        }
        Ok(storage)
    }

    /// Upload a sub-region of one mip level, dispatched on the target's
    /// dimensionality.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        driver: &mut dyn Driver,
        level: u32,
        offset: Offset3d,
        extent: Extent3d,
        format: PixelFormat,
        pixel_type: PixelType,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        self.level_checked(level)?;
        match self.target.dimension() {
            Dimension::One => driver.texture_sub_image_1d(
                self.handle,
                level,
                offset.x,
                extent.width,
                format,
                pixel_type,
                data,
            ),
            Dimension::Two => driver.texture_sub_image_2d(
                self.handle,
                level,
                offset.x,
                offset.y,
                extent.width,
                extent.height,
                format,
                pixel_type,
                data,
            ),
            Dimension::Three => {
                driver.texture_sub_image_3d(self.handle, level, offset, extent, format, pixel_type, data)
            }
        }
        Ok(())
    }

    /// Upload a pre-compressed sub-region of one mip level.
    #[allow(clippy::too_many_arguments)]
    pub fn update_compressed(
        &mut self,
        driver: &mut dyn Driver,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: CompressedFormat,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        self.level_checked(level)?;
        driver.compressed_texture_sub_image_2d(self.handle, level, x, y, width, height, format, data);
        Ok(())
    }

    /// Upload one whole mip level using the allocation's transfer format.
    pub fn image_data(
        &mut self,
        driver: &mut dyn Driver,
        level: u32,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let storage = *self.level_checked(level)?;
        let extent = storage.extent.mip_level(level);
        match storage.format.compressed() {
            Some(compressed) => self.update_compressed(
                driver,
                level,
                0,
                0,
                extent.width,
                extent.height,
                compressed,
                data,
            ),
            None => self.update(
                driver,
                level,
                Offset3d::ZERO,
                extent,
                storage.format.pixel_format(),
                storage.format.pixel_type(),
                data,
            ),
        }
    }

    /// Read one whole mip level back to the host.
    pub fn read_level(
        &self,
        driver: &mut dyn Driver,
        level: u32,
    ) -> Result<Vec<u8>, GraphicsError> {
        let storage = self.level_checked(level)?;
        Ok(driver.read_texture_image(
            self.handle,
            level,
            storage.format.pixel_format(),
            storage.format.pixel_type(),
            storage.level_byte_size(level),
        ))
    }

    /// Populate the mip chain from level 0. Warns and does nothing on
    /// targets or allocations with no mip chain.
    pub fn build_mipmaps(&mut self, driver: &mut dyn Driver) {
        let levels = self.allocation.map_or(0, |s| s.levels);
        if !self.target.supports_mip_filtering() || levels <= 1 {
            warn!("texture {}: no mip chain to generate", self.handle);
            return;
        }
        driver.generate_mipmaps(self.handle);
    }

    /// Device-side region copy into another allocated texture. Returns false
    /// without touching the driver if either side is unallocated.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_to(
        &self,
        driver: &mut dyn Driver,
        src_level: u32,
        src_offset: Offset3d,
        dst: &Texture,
        dst_level: u32,
        dst_offset: Offset3d,
        extent: Extent3d,
    ) -> bool {
        if self.allocation.is_none() || dst.allocation.is_none() {
            return false;
        }
        driver.copy_image_sub_data(
            self.handle,
            src_level,
            src_offset,
            dst.handle,
            dst_level,
            dst_offset,
            extent,
        );
        true
    }

    /// Allocate a new texture with identical storage and copy every mip
    /// level into it device-side.
    pub fn duplicate(&self, driver: &mut dyn Driver) -> Result<Texture, GraphicsError> {
        let storage = *self.allocation_checked()?;
        let mut copy = Texture::new(driver, self.target);
        copy.storage(driver, storage)?;
        for level in 0..storage.levels {
            driver.copy_image_sub_data(
                self.handle,
                level,
                Offset3d::ZERO,
                copy.handle,
                level,
                Offset3d::ZERO,
                storage.extent.mip_level(level),
            );
        }
        Ok(copy)
    }

    /// Set the minification filter. Mip-implying filters are ignored with a
    /// warning on targets or allocations that cannot be mip-filtered.
    pub fn set_min_filter(&mut self, driver: &mut dyn Driver, filter: MinFilter) {
        if filter.uses_mipmaps() {
            let mippable =
                self.target.supports_mip_filtering() && self.allocation.map_or(true, |s| s.levels > 1);
            if !mippable {
                warn!(
                    "texture {}: mip filter {filter:?} ignored, no mip chain",
                    self.handle
                );
                return;
            }
        }
        self.min_filter = filter;
        driver.set_texture_parameter(self.handle, SamplingParameter::MinFilter(filter));
    }

    /// Set the magnification filter.
    pub fn set_mag_filter(&mut self, driver: &mut dyn Driver, filter: MagFilter) {
        self.mag_filter = filter;
        driver.set_texture_parameter(self.handle, SamplingParameter::MagFilter(filter));
    }

    /// Set the wrap mode of one axis (0 = S, 1 = T, 2 = R).
    pub fn set_wrap(&mut self, driver: &mut dyn Driver, axis: usize, mode: WrapMode) {
        self.wrap[axis] = mode;
        let parameter = match axis {
            0 => SamplingParameter::WrapS(mode),
            1 => SamplingParameter::WrapT(mode),
            _ => SamplingParameter::WrapR(mode),
        };
        driver.set_texture_parameter(self.handle, parameter);
    }

    /// Enable or disable depth comparison sampling.
    pub fn set_compare(&mut self, driver: &mut dyn Driver, compare: Option<CompareFunc>) {
        self.compare = compare;
        driver.set_texture_parameter(self.handle, SamplingParameter::Compare(compare));
    }

    /// Cached minification filter.
    pub fn min_filter(&self) -> MinFilter {
        self.min_filter
    }

    /// Cached magnification filter.
    pub fn mag_filter(&self) -> MagFilter {
        self.mag_filter
    }

    /// Derive the texture's bindless handle and make it resident. Cached
    /// after the first call.
    pub fn bindless_handle(&mut self, driver: &mut dyn Driver) -> Result<u64, GraphicsError> {
        self.allocation_checked()?;
        let texture = self.handle;
        Ok(self
            .residency
            .acquire(driver, |driver| driver.texture_handle(texture)))
    }

    /// Derive the combined bindless handle for this texture and an external
    /// sampler's state, and make it resident. One residency record is kept
    /// per sampler.
    pub fn bindless_handle_with(
        &mut self,
        driver: &mut dyn Driver,
        sampler: &Sampler,
    ) -> Result<u64, GraphicsError> {
        self.allocation_checked()?;
        let texture = self.handle;
        let sampler_handle = sampler.raw_handle();
        let entry = match self
            .sampler_residency
            .iter_mut()
            .position(|(handle, _)| *handle == sampler_handle)
        {
            Some(index) => &mut self.sampler_residency[index].1,
            None => {
                self.sampler_residency.push((sampler_handle, Residency::new()));
                &mut self.sampler_residency.last_mut().unwrap().1
            }
        };
        Ok(entry.acquire(driver, |driver| {
            driver.texture_sampler_handle(texture, sampler_handle)
        }))
    }

    /// Release every bindless handle derived from this texture. Idempotent.
    pub fn release_residency(&mut self, driver: &mut dyn Driver) {
        self.residency.release(driver);
        for (_, residency) in &mut self.sampler_residency {
            residency.release(driver);
        }
        self.sampler_residency.clear();
    }

    /// Returns true if the texture's own bindless handle is resident.
    pub fn is_resident(&self) -> bool {
        self.residency.is_acquired()
    }

    /// Bind one mip level to an image unit for load/store access. Writable
    /// bindings are fenced so earlier image writes are visible to later
    /// fetches and image reads.
    pub fn bind_image(
        &self,
        driver: &mut dyn Driver,
        unit: u32,
        level: u32,
        access: ImageAccess,
    ) -> Result<(), GraphicsError> {
        let storage = self.level_checked(level)?;
        driver.bind_image_texture(unit, self.handle, level, access, storage.format);
        if access != ImageAccess::ReadOnly {
            driver.memory_barrier(BarrierFlags::SHADER_IMAGE_ACCESS | BarrierFlags::TEXTURE_FETCH);
        }
        Ok(())
    }

    /// Fixed view kind.
    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// Recorded storage, if allocated.
    pub fn allocation(&self) -> Option<&TextureStorage> {
        self.allocation.as_ref()
    }

    /// Returns true once storage has been allocated.
    pub fn is_allocated(&self) -> bool {
        self.allocation.is_some()
    }

    /// Storage extent of level 0. Zero extent if unallocated.
    pub fn extent(&self) -> Extent3d {
        self.allocation
            .map_or(Extent3d::new_3d(0, 0, 0), |s| s.extent)
    }
}

impl GpuResource for Texture {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

impl Dispose for Texture {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        if self.handle.is_valid() {
            self.release_residency(driver);
            driver.delete_texture(self.handle);
            self.handle = RawHandle::NONE;
            self.allocation = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NullDriver;

    fn rgba_storage(width: u32, height: u32, levels: u32) -> TextureStorage {
        TextureStorage::new(InternalFormat::Rgba8, Extent3d::new_2d(width, height), levels)
    }

    #[test]
    fn test_storage_is_idempotent() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Two);
        texture.storage(&mut driver, rgba_storage(8, 8, 1)).unwrap();
        let handle = texture.raw_handle();

        texture.storage(&mut driver, rgba_storage(8, 8, 1)).unwrap();
        assert_eq!(texture.raw_handle(), handle);
        assert_eq!(driver.texture_count(), 1);
    }

    #[test]
    fn test_different_storage_recreates_handle() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Two);
        texture.storage(&mut driver, rgba_storage(8, 8, 1)).unwrap();
        let first = texture.raw_handle();

        texture.storage(&mut driver, rgba_storage(16, 16, 2)).unwrap();
        assert_ne!(texture.raw_handle(), first);
        assert_eq!(driver.texture_count(), 1);
        assert_eq!(texture.extent(), Extent3d::new_2d(16, 16));
    }

    #[test]
    fn test_recreate_releases_residency_first() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Two);
        texture.storage(&mut driver, rgba_storage(8, 8, 1)).unwrap();
        texture.bindless_handle(&mut driver).unwrap();
        assert_eq!(driver.resident_count(), 1);

        texture.storage(&mut driver, rgba_storage(4, 4, 1)).unwrap();
        assert_eq!(driver.resident_count(), 0);
        assert_eq!(driver.residency_violations(), 0);
        assert!(!texture.is_resident());
    }

    #[test]
    fn test_bindless_handle_is_cached() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Two);
        texture.storage(&mut driver, rgba_storage(4, 4, 1)).unwrap();

        let a = texture.bindless_handle(&mut driver).unwrap();
        let b = texture.bindless_handle(&mut driver).unwrap();
        assert_eq!(a, b);
        assert_eq!(driver.resident_count(), 1);
    }

    #[test]
    fn test_sampler_combo_residency() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Two);
        texture.storage(&mut driver, rgba_storage(4, 4, 1)).unwrap();
        let sampler = Sampler::new(&mut driver);

        let plain = texture.bindless_handle(&mut driver).unwrap();
        let combined = texture.bindless_handle_with(&mut driver, &sampler).unwrap();
        assert_ne!(plain, combined);
        assert_eq!(driver.resident_count(), 2);

        texture.release_residency(&mut driver);
        assert_eq!(driver.resident_count(), 0);
        assert_eq!(driver.residency_violations(), 0);
    }

    #[test]
    fn test_upload_and_read_back() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Two);
        texture.storage(&mut driver, rgba_storage(2, 2, 1)).unwrap();

        let pixels: Vec<u8> = (0u8..16).collect();
        texture.image_data(&mut driver, 0, &pixels).unwrap();
        assert_eq!(texture.read_level(&mut driver, 0).unwrap(), pixels);
    }

    #[test]
    fn test_level_out_of_range() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Two);
        texture.storage(&mut driver, rgba_storage(4, 4, 2)).unwrap();
        assert!(matches!(
            texture.image_data(&mut driver, 2, &[]),
            Err(GraphicsError::IndexOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_mip_filter_ignored_on_rectangle() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Rectangle);
        texture.storage(&mut driver, rgba_storage(4, 4, 1)).unwrap();

        texture.set_min_filter(&mut driver, MinFilter::LinearMipmapLinear);
        assert_ne!(texture.min_filter(), MinFilter::LinearMipmapLinear);

        texture.set_min_filter(&mut driver, MinFilter::Nearest);
        assert_eq!(texture.min_filter(), MinFilter::Nearest);
    }

    #[test]
    fn test_sample_count_clamped() {
        let mut driver = NullDriver::new();
        driver.set_max_samples(4);
        let mut texture = Texture::new(&mut driver, TextureTarget::TwoMultisample);
        texture
            .storage_multisample(&mut driver, InternalFormat::Rgba8, 8, 8, 16, true)
            .unwrap();
        assert_eq!(texture.allocation().unwrap().samples, 4);
    }

    #[test]
    fn test_duplicate_copies_levels() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Two);
        texture.storage(&mut driver, rgba_storage(2, 2, 2)).unwrap();
        let pixels: Vec<u8> = (100u8..116).collect();
        texture.image_data(&mut driver, 0, &pixels).unwrap();

        let copy = texture.duplicate(&mut driver).unwrap();
        assert_ne!(copy.raw_handle(), texture.raw_handle());
        assert_eq!(copy.read_level(&mut driver, 0).unwrap(), pixels);
    }

    #[test]
    fn test_copy_to_unallocated_is_rejected() {
        let mut driver = NullDriver::new();
        let mut src = Texture::new(&mut driver, TextureTarget::Two);
        src.storage(&mut driver, rgba_storage(2, 2, 1)).unwrap();
        let dst = Texture::new(&mut driver, TextureTarget::Two);

        let copied = src.copy_to(
            &mut driver,
            0,
            Offset3d::ZERO,
            &dst,
            0,
            Offset3d::ZERO,
            Extent3d::new_2d(2, 2),
        );
        assert!(!copied);
    }

    #[test]
    fn test_dispose_releases_residency() {
        let mut driver = NullDriver::new();
        let mut texture = Texture::new(&mut driver, TextureTarget::Two);
        texture.storage(&mut driver, rgba_storage(2, 2, 1)).unwrap();
        texture.bindless_handle(&mut driver).unwrap();

        texture.dispose(&mut driver);
        assert_eq!(driver.resident_count(), 0);
        assert_eq!(driver.texture_count(), 0);
        texture.dispose(&mut driver);
        assert_eq!(driver.residency_violations(), 0);
    }
}
