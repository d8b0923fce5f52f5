//! Mutable and immutable typed buffer storage.
//!
//! Both variants share one contract: element-indexed sub-range operations
//! validated against the recorded capacity with the clamp policy of
//! [`clamp_range`]. They differ only in their allocation discipline:
//! [`MutableBuffer::reserve`] may be called repeatedly, discarding prior
//! contents, while [`ImmutableBuffer`] allocates at most once for the
//! handle's lifetime.

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::driver::Driver;
use crate::error::GraphicsError;
use crate::handle::{Dispose, GpuResource, RawHandle};
use crate::types::{StorageFlags, UsageHint};

/// Shared bounds validation for element sub-ranges.
///
/// `index` must lie in `[0, count)`; an overlong `size` is truncated to the
/// remaining capacity rather than rejected. Callers (notably the growth
/// buffer) rely on the truncation-not-error policy; do not tighten it.
pub fn clamp_range(index: usize, size: usize, count: usize) -> Result<usize, GraphicsError> {
    if index >= count {
        return Err(GraphicsError::IndexOutOfRange { index, count });
    }
    Ok(if index + size >= count {
        count - index
    } else {
        size
    })
}

/// Read access to an element range of an allocated buffer.
pub trait BufferRead<T: Pod> {
    /// Read `count` elements starting at `index`, clamped to capacity.
    fn read(
        &self,
        driver: &mut dyn Driver,
        index: usize,
        count: usize,
    ) -> Result<Vec<T>, GraphicsError>;
}

/// Write access to an element range of an allocated buffer.
pub trait BufferWrite<T: Pod> {
    /// Replace elements starting at `index`, clamped to capacity. Returns
    /// the number of elements actually written.
    fn write(
        &mut self,
        driver: &mut dyn Driver,
        index: usize,
        data: &[T],
    ) -> Result<usize, GraphicsError>;
}

/// State and sub-range plumbing shared by the buffer variants.
struct BufferState<T> {
    handle: RawHandle,
    count: usize,
    allocated: bool,
    _marker: PhantomData<T>,
}

impl<T: Pod> BufferState<T> {
    const STRIDE: usize = std::mem::size_of::<T>();

    fn new(driver: &mut dyn Driver) -> Self {
        Self {
            handle: driver.create_buffer(),
            count: 0,
            allocated: false,
            _marker: PhantomData,
        }
    }

    fn ensure_allocated(&self) -> Result<(), GraphicsError> {
        if self.allocated {
            Ok(())
        } else {
            Err(GraphicsError::Unallocated(format!("buffer {}", self.handle)))
        }
    }

    fn write(
        &mut self,
        driver: &mut dyn Driver,
        index: usize,
        data: &[T],
    ) -> Result<usize, GraphicsError> {
        self.ensure_allocated()?;
        let effective = clamp_range(index, data.len(), self.count)?;
        let bytes: &[u8] = bytemuck::cast_slice(&data[..effective]);
        driver.buffer_sub_data(self.handle, index * Self::STRIDE, bytes);
        Ok(effective)
    }

    fn read(
        &self,
        driver: &mut dyn Driver,
        index: usize,
        count: usize,
    ) -> Result<Vec<T>, GraphicsError> {
        self.ensure_allocated()?;
        let effective = clamp_range(index, count, self.count)?;
        let bytes =
            driver.read_buffer_sub_data(self.handle, index * Self::STRIDE, effective * Self::STRIDE);
        let mut out = vec![T::zeroed(); effective];
        bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(&bytes);
        Ok(out)
    }

    fn clear_region(
        &mut self,
        driver: &mut dyn Driver,
        index: usize,
        count: usize,
    ) -> Result<usize, GraphicsError> {
        self.ensure_allocated()?;
        let effective = clamp_range(index, count, self.count)?;
        driver.clear_buffer_sub_data(self.handle, index * Self::STRIDE, effective * Self::STRIDE);
        Ok(effective)
    }

    fn dispose(&mut self, driver: &mut dyn Driver) {
        if self.handle.is_valid() {
            driver.delete_buffer(self.handle);
            self.handle = RawHandle::NONE;
            self.count = 0;
            self.allocated = false;
        }
    }
}

// ============================================================================
// MutableBuffer
// ============================================================================

/// A buffer with re-reservable storage.
///
/// Each `reserve*` call replaces prior storage and contents.
pub struct MutableBuffer<T: Pod> {
    state: BufferState<T>,
    usage: UsageHint,
}

impl<T: Pod> MutableBuffer<T> {
    /// Create an unallocated buffer object.
    pub fn new(driver: &mut dyn Driver, usage: UsageHint) -> Self {
        Self {
            state: BufferState::new(driver),
            usage,
        }
    }

    /// Allocate storage for `count` elements, discarding prior contents.
    pub fn reserve(&mut self, driver: &mut dyn Driver, count: usize) -> Result<(), GraphicsError> {
        if count < 1 {
            return Err(GraphicsError::EmptyAllocation(format!(
                "{count} elements requested"
            )));
        }
        driver.buffer_data(
            self.state.handle,
            count * BufferState::<T>::STRIDE,
            None,
            self.usage,
        )?;
        self.state.count = count;
        self.state.allocated = true;
        Ok(())
    }

    /// Allocate storage sized and filled from `data`.
    pub fn reserve_with_data(
        &mut self,
        driver: &mut dyn Driver,
        data: &[T],
    ) -> Result<(), GraphicsError> {
        if data.is_empty() {
            return Err(GraphicsError::EmptyAllocation("empty data slice".to_string()));
        }
        driver.buffer_data(
            self.state.handle,
            std::mem::size_of_val(data),
            Some(bytemuck::cast_slice(data)),
            self.usage,
        )?;
        self.state.count = data.len();
        self.state.allocated = true;
        Ok(())
    }

    /// Zero-fill an element range device-side, clamped to capacity.
    pub fn clear_region(
        &mut self,
        driver: &mut dyn Driver,
        index: usize,
        count: usize,
    ) -> Result<usize, GraphicsError> {
        self.state.clear_region(driver, index, count)
    }

    /// Element size in bytes.
    pub fn stride(&self) -> usize {
        BufferState::<T>::STRIDE
    }

    /// Allocated element count.
    pub fn count(&self) -> usize {
        self.state.count
    }

    /// Allocated size in bytes.
    pub fn memory_size(&self) -> usize {
        self.state.count * BufferState::<T>::STRIDE
    }

    /// Returns true once storage has been reserved.
    pub fn is_allocated(&self) -> bool {
        self.state.allocated
    }
}

impl<T: Pod> BufferWrite<T> for MutableBuffer<T> {
    fn write(
        &mut self,
        driver: &mut dyn Driver,
        index: usize,
        data: &[T],
    ) -> Result<usize, GraphicsError> {
        self.state.write(driver, index, data)
    }
}

impl<T: Pod> BufferRead<T> for MutableBuffer<T> {
    fn read(
        &self,
        driver: &mut dyn Driver,
        index: usize,
        count: usize,
    ) -> Result<Vec<T>, GraphicsError> {
        self.state.read(driver, index, count)
    }
}

impl<T: Pod> GpuResource for MutableBuffer<T> {
    fn raw_handle(&self) -> RawHandle {
        self.state.handle
    }
}

impl<T: Pod> Dispose for MutableBuffer<T> {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        self.state.dispose(driver);
    }
}

// ============================================================================
// ImmutableBuffer
// ============================================================================

/// A buffer whose backing store is allocated at most once.
///
/// Designed for fixed-size GPU resources (vertex and index data) where the
/// backing memory must never move. A second `reserve*` call fails with
/// [`GraphicsError::StaticReallocation`] regardless of the requested size.
pub struct ImmutableBuffer<T: Pod> {
    state: BufferState<T>,
    flags: StorageFlags,
}

impl<T: Pod> ImmutableBuffer<T> {
    /// Create an unallocated buffer object with
    /// [`StorageFlags::DYNAMIC_STORAGE`] (sub-range updates stay legal).
    pub fn new(driver: &mut dyn Driver) -> Self {
        Self::with_flags(driver, StorageFlags::DYNAMIC_STORAGE)
    }

    /// Create an unallocated buffer object with explicit storage flags.
    pub fn with_flags(driver: &mut dyn Driver, flags: StorageFlags) -> Self {
        Self {
            state: BufferState::new(driver),
            flags,
        }
    }

    /// Allocate fixed storage for `count` elements. At most one `reserve*`
    /// call may ever succeed on the same buffer.
    pub fn reserve(&mut self, driver: &mut dyn Driver, count: usize) -> Result<(), GraphicsError> {
        self.reserve_inner(driver, count, None)
    }

    /// Allocate fixed storage sized and filled from `data`.
    pub fn reserve_with_data(
        &mut self,
        driver: &mut dyn Driver,
        data: &[T],
    ) -> Result<(), GraphicsError> {
        self.reserve_inner(driver, data.len(), Some(bytemuck::cast_slice(data)))
    }

    fn reserve_inner(
        &mut self,
        driver: &mut dyn Driver,
        count: usize,
        data: Option<&[u8]>,
    ) -> Result<(), GraphicsError> {
        if self.state.allocated {
            return Err(GraphicsError::StaticReallocation);
        }
        if count < 1 {
            return Err(GraphicsError::EmptyAllocation(format!(
                "{count} elements requested"
            )));
        }
        driver.buffer_storage(
            self.state.handle,
            count * BufferState::<T>::STRIDE,
            data,
            self.flags,
        )?;
        self.state.count = count;
        self.state.allocated = true;
        Ok(())
    }

    /// Zero-fill an element range device-side, clamped to capacity.
    pub fn clear_region(
        &mut self,
        driver: &mut dyn Driver,
        index: usize,
        count: usize,
    ) -> Result<usize, GraphicsError> {
        self.state.clear_region(driver, index, count)
    }

    /// Element size in bytes.
    pub fn stride(&self) -> usize {
        BufferState::<T>::STRIDE
    }

    /// Allocated element count.
    pub fn count(&self) -> usize {
        self.state.count
    }

    /// Allocated size in bytes.
    pub fn memory_size(&self) -> usize {
        self.state.count * BufferState::<T>::STRIDE
    }

    /// Returns true once storage has been reserved.
    pub fn is_allocated(&self) -> bool {
        self.state.allocated
    }
}

impl<T: Pod> BufferWrite<T> for ImmutableBuffer<T> {
    fn write(
        &mut self,
        driver: &mut dyn Driver,
        index: usize,
        data: &[T],
    ) -> Result<usize, GraphicsError> {
        self.state.write(driver, index, data)
    }
}

impl<T: Pod> BufferRead<T> for ImmutableBuffer<T> {
    fn read(
        &self,
        driver: &mut dyn Driver,
        index: usize,
        count: usize,
    ) -> Result<Vec<T>, GraphicsError> {
        self.state.read(driver, index, count)
    }
}

impl<T: Pod> GpuResource for ImmutableBuffer<T> {
    fn raw_handle(&self) -> RawHandle {
        self.state.handle
    }
}

impl<T: Pod> Dispose for ImmutableBuffer<T> {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        self.state.dispose(driver);
    }
}
