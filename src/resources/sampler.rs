//! Standalone sampler object.

use crate::driver::Driver;
use crate::handle::{Dispose, GpuResource, RawHandle};
use crate::types::{CompareFunc, MagFilter, MinFilter, SamplingParameter, WrapMode};

/// A sampler object independent of any texture.
///
/// Sampling parameters are cached wrapper-side and written through to the
/// driver immediately on set, so reads never need a driver round-trip. A
/// sampler may be attached to a texture to produce a combined bindless
/// handle; see [`Texture::bindless_handle_with`].
///
/// [`Texture::bindless_handle_with`]: crate::resources::Texture::bindless_handle_with
#[derive(Debug)]
pub struct Sampler {
    handle: RawHandle,
    min_filter: MinFilter,
    mag_filter: MagFilter,
    wrap: [WrapMode; 3],
    compare: Option<CompareFunc>,
    max_anisotropy: f32,
}

impl Sampler {
    /// Create a sampler object with default parameters.
    pub fn new(driver: &mut dyn Driver) -> Self {
        Self {
            handle: driver.create_sampler(),
            min_filter: MinFilter::default(),
            mag_filter: MagFilter::default(),
            wrap: [WrapMode::default(); 3],
            compare: None,
            max_anisotropy: 1.0,
        }
    }

    /// Set the minification filter.
    pub fn set_min_filter(&mut self, driver: &mut dyn Driver, filter: MinFilter) {
        self.min_filter = filter;
        driver.set_sampler_parameter(self.handle, SamplingParameter::MinFilter(filter));
    }

    /// Set the magnification filter.
    pub fn set_mag_filter(&mut self, driver: &mut dyn Driver, filter: MagFilter) {
        self.mag_filter = filter;
        driver.set_sampler_parameter(self.handle, SamplingParameter::MagFilter(filter));
    }

    /// Set the wrap mode for all three coordinates.
    pub fn set_wrap(&mut self, driver: &mut dyn Driver, mode: WrapMode) {
        self.wrap = [mode; 3];
        driver.set_sampler_parameter(self.handle, SamplingParameter::WrapS(mode));
        driver.set_sampler_parameter(self.handle, SamplingParameter::WrapT(mode));
        driver.set_sampler_parameter(self.handle, SamplingParameter::WrapR(mode));
    }

    /// Set or disable the depth comparison function.
    pub fn set_compare(&mut self, driver: &mut dyn Driver, compare: Option<CompareFunc>) {
        self.compare = compare;
        driver.set_sampler_parameter(self.handle, SamplingParameter::Compare(compare));
    }

    /// Set the maximum anisotropy level.
    pub fn set_max_anisotropy(&mut self, driver: &mut dyn Driver, level: f32) {
        self.max_anisotropy = level.max(1.0);
        driver.set_sampler_parameter(
            self.handle,
            SamplingParameter::MaxAnisotropy(self.max_anisotropy),
        );
    }

    /// Cached minification filter.
    pub fn min_filter(&self) -> MinFilter {
        self.min_filter
    }

    /// Cached magnification filter.
    pub fn mag_filter(&self) -> MagFilter {
        self.mag_filter
    }

    /// Cached wrap modes (S, T, R).
    pub fn wrap(&self) -> [WrapMode; 3] {
        self.wrap
    }

    /// Cached comparison function.
    pub fn compare(&self) -> Option<CompareFunc> {
        self.compare
    }
}

impl GpuResource for Sampler {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

impl Dispose for Sampler {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        if self.handle.is_valid() {
            driver.delete_sampler(self.handle);
            self.handle = RawHandle::NONE;
        }
    }
}
