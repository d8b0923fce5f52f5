//! Persistently mapped buffer storage.
//!
//! The buffer is allocated and mapped once at construction and stays mapped
//! until [`Dispose::dispose`]. Host writes go through the mapping pointer
//! and become device-visible only after an explicit [`PersistentBuffer::flush_range`]
//! or [`PersistentBuffer::force_sync`]; the mapping is established with
//! [`MapFlags::FLUSH_EXPLICIT`], not coherent.

use std::marker::PhantomData;

use bytemuck::Pod;
use static_assertions::assert_not_impl_any;

use crate::driver::Driver;
use crate::error::GraphicsError;
use crate::handle::{Dispose, GpuResource, RawHandle};
use crate::resources::buffer::clamp_range;
use crate::types::{BarrierFlags, MapFlags, StorageFlags};

/// A typed buffer mapped into host memory for its whole lifetime.
pub struct PersistentBuffer<T: Pod> {
    handle: RawHandle,
    mapping: *mut u8,
    count: usize,
    _marker: PhantomData<T>,
}

// The mapping pointer is only valid on the thread that owns the driver.
assert_not_impl_any!(PersistentBuffer<u8>: Send, Sync);

impl<T: Pod> PersistentBuffer<T> {
    const STRIDE: usize = std::mem::size_of::<T>();

    const STORAGE_FLAGS: StorageFlags = StorageFlags::MAP_READ
        .union(StorageFlags::MAP_WRITE)
        .union(StorageFlags::MAP_PERSISTENT);

    const MAP_FLAGS: MapFlags = MapFlags::READ
        .union(MapFlags::WRITE)
        .union(MapFlags::PERSISTENT)
        .union(MapFlags::FLUSH_EXPLICIT);

    /// Allocate and map storage for `count` elements.
    pub fn new(driver: &mut dyn Driver, count: usize) -> Result<Self, GraphicsError> {
        if count < 1 {
            return Err(GraphicsError::EmptyAllocation(format!(
                "{count} elements requested"
            )));
        }
        let handle = driver.create_buffer();
        let byte_size = count * Self::STRIDE;
        driver.buffer_storage(handle, byte_size, None, Self::STORAGE_FLAGS)?;
        let mapping = driver.map_buffer_range(handle, 0, byte_size, Self::MAP_FLAGS)?;
        Ok(Self {
            handle,
            mapping,
            count,
            _marker: PhantomData,
        })
    }

    /// Copy elements into the mapping starting at `index`, clamped to
    /// capacity. Not device-visible until flushed.
    pub fn write(&mut self, index: usize, data: &[T]) -> Result<usize, GraphicsError> {
        let effective = clamp_range(index, data.len(), self.count)?;
        let bytes: &[u8] = bytemuck::cast_slice(&data[..effective]);
        // Range is inside the mapping by the clamp above.
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                self.mapping.add(index * Self::STRIDE),
                bytes.len(),
            );
        }
        Ok(effective)
    }

    /// Copy elements out of the mapping starting at `index`, clamped to
    /// capacity. Reflects host writes, not necessarily device writes.
    pub fn read(&self, index: usize, count: usize) -> Result<Vec<T>, GraphicsError> {
        let effective = clamp_range(index, count, self.count)?;
        let mut out = vec![T::zeroed(); effective];
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut out);
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.mapping.add(index * Self::STRIDE),
                bytes.as_mut_ptr(),
                bytes.len(),
            );
        }
        Ok(out)
    }

    /// Write a single element.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), GraphicsError> {
        self.write(index, std::slice::from_ref(&value)).map(|_| ())
    }

    /// Read a single element.
    pub fn get(&self, index: usize) -> Result<T, GraphicsError> {
        self.read(index, 1).map(|v| v[0])
    }

    /// Make host writes in an element range device-visible, clamped to
    /// capacity.
    pub fn flush_range(
        &mut self,
        driver: &mut dyn Driver,
        index: usize,
        count: usize,
    ) -> Result<usize, GraphicsError> {
        let effective = clamp_range(index, count, self.count)?;
        driver.flush_mapped_range(self.handle, index * Self::STRIDE, effective * Self::STRIDE);
        Ok(effective)
    }

    /// Flush the whole mapping and fence subsequent device reads of
    /// client-mapped memory.
    pub fn force_sync(&mut self, driver: &mut dyn Driver) {
        driver.flush_mapped_range(self.handle, 0, self.count * Self::STRIDE);
        driver.memory_barrier(BarrierFlags::CLIENT_MAPPED_BUFFER);
    }

    /// Discard device-side contents without a transfer.
    pub fn invalidate(&mut self, driver: &mut dyn Driver) {
        driver.invalidate_buffer_data(self.handle);
    }

    /// Element size in bytes.
    pub fn stride(&self) -> usize {
        Self::STRIDE
    }

    /// Allocated element count.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Allocated size in bytes.
    pub fn memory_size(&self) -> usize {
        self.count * Self::STRIDE
    }
}

impl<T: Pod> GpuResource for PersistentBuffer<T> {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

impl<T: Pod> Dispose for PersistentBuffer<T> {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        if self.handle.is_valid() {
            driver.unmap_buffer(self.handle);
            driver.delete_buffer(self.handle);
            self.handle = RawHandle::NONE;
            self.mapping = std::ptr::null_mut();
            self.count = 0;
        }
    }
}
