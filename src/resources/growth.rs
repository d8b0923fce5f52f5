//! Append-oriented buffer that regrows between frames.
//!
//! Intended for per-frame streams (draw parameters, transient vertex data)
//! whose size is discovered while recording. Elements are appended with
//! [`GrowthBuffer::push`]; [`GrowthBuffer::new_frame`] rewinds the cursor
//! and regrows the storage if the previous frame filled it exactly.

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::driver::Driver;
use crate::error::GraphicsError;
use crate::handle::{Dispose, GpuResource, RawHandle};
use crate::types::UsageHint;

/// A typed append buffer with geometric regrowth.
pub struct GrowthBuffer<T: Pod> {
    handle: RawHandle,
    capacity: usize,
    cursor: usize,
    usage: UsageHint,
    _marker: PhantomData<T>,
}

impl<T: Pod> GrowthBuffer<T> {
    const STRIDE: usize = std::mem::size_of::<T>();

    /// Allocate with an initial element capacity.
    pub fn new(
        driver: &mut dyn Driver,
        capacity: usize,
        usage: UsageHint,
    ) -> Result<Self, GraphicsError> {
        if capacity < 1 {
            return Err(GraphicsError::EmptyAllocation(format!(
                "{capacity} elements requested"
            )));
        }
        let handle = driver.create_buffer();
        driver.buffer_data(handle, capacity * Self::STRIDE, None, usage)?;
        Ok(Self {
            handle,
            capacity,
            cursor: 0,
            usage,
            _marker: PhantomData,
        })
    }

    /// Append one element, growing the storage first if it is full.
    /// Returns the element's index.
    pub fn push(&mut self, driver: &mut dyn Driver, value: T) -> Result<usize, GraphicsError> {
        if self.cursor == self.capacity {
            self.grow(driver)?;
        }
        let index = self.cursor;
        driver.buffer_sub_data(
            self.handle,
            index * Self::STRIDE,
            bytemuck::bytes_of(&value),
        );
        self.cursor += 1;
        Ok(index)
    }

    /// Rewind the cursor for a new frame. If the previous frame filled the
    /// buffer exactly, grow now so the first pushes of the next frame do
    /// not stall on a reallocation.
    pub fn new_frame(&mut self, driver: &mut dyn Driver) -> Result<(), GraphicsError> {
        if self.cursor == self.capacity {
            self.grow(driver)?;
        }
        self.cursor = 0;
        Ok(())
    }

    /// Grow capacity by half, preserving contents up to the cursor.
    fn grow(&mut self, driver: &mut dyn Driver) -> Result<(), GraphicsError> {
        let new_capacity = (self.capacity * 3 / 2).max(self.capacity + 1);
        log::trace!(
            "growth buffer {}: capacity {} -> {}",
            self.handle,
            self.capacity,
            new_capacity
        );
        let new_handle = driver.create_buffer();
        driver.buffer_data(new_handle, new_capacity * Self::STRIDE, None, self.usage)?;
        if self.cursor > 0 {
            driver.copy_buffer_sub_data(self.handle, new_handle, 0, 0, self.cursor * Self::STRIDE);
        }
        driver.delete_buffer(self.handle);
        self.handle = new_handle;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Read back the elements pushed so far this frame.
    pub fn read(&self, driver: &mut dyn Driver) -> Vec<T> {
        let bytes = driver.read_buffer_sub_data(self.handle, 0, self.cursor * Self::STRIDE);
        let mut out = vec![T::zeroed(); self.cursor];
        bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(&bytes);
        out
    }

    /// Elements pushed since the last [`GrowthBuffer::new_frame`].
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Returns true if nothing has been pushed this frame.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Current element capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocated size in bytes.
    pub fn memory_size(&self) -> usize {
        self.capacity * Self::STRIDE
    }
}

impl<T: Pod> GpuResource for GrowthBuffer<T> {
    fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

impl<T: Pod> Dispose for GrowthBuffer<T> {
    fn dispose(&mut self, driver: &mut dyn Driver) {
        if self.handle.is_valid() {
            driver.delete_buffer(self.handle);
            self.handle = RawHandle::NONE;
            self.capacity = 0;
            self.cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NullDriver;

    #[test]
    fn test_push_grows_and_preserves() {
        let mut driver = NullDriver::new();
        let mut buffer =
            GrowthBuffer::<u32>::new(&mut driver, 4, UsageHint::DynamicDraw).unwrap();

        for v in [10u32, 20, 30, 40, 50] {
            buffer.push(&mut driver, v).unwrap();
        }
        // 4 * 3 / 2
        assert_eq!(buffer.capacity(), 6);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.read(&mut driver), [10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_new_frame_rewinds() {
        let mut driver = NullDriver::new();
        let mut buffer =
            GrowthBuffer::<u32>::new(&mut driver, 4, UsageHint::StreamDraw).unwrap();

        buffer.push(&mut driver, 1).unwrap();
        buffer.push(&mut driver, 2).unwrap();
        buffer.new_frame(&mut driver).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);

        assert_eq!(buffer.push(&mut driver, 3).unwrap(), 0);
    }

    #[test]
    fn test_new_frame_grows_when_exactly_full() {
        let mut driver = NullDriver::new();
        let mut buffer =
            GrowthBuffer::<u8>::new(&mut driver, 2, UsageHint::StreamDraw).unwrap();

        buffer.push(&mut driver, 1).unwrap();
        buffer.push(&mut driver, 2).unwrap();
        buffer.new_frame(&mut driver).unwrap();
        assert_eq!(buffer.capacity(), 3);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_tiny_capacity_still_grows() {
        let mut driver = NullDriver::new();
        let mut buffer =
            GrowthBuffer::<u8>::new(&mut driver, 1, UsageHint::StreamDraw).unwrap();

        // 1 * 3 / 2 rounds down to 1; growth must still make progress.
        buffer.push(&mut driver, 1).unwrap();
        buffer.push(&mut driver, 2).unwrap();
        assert_eq!(buffer.capacity(), 2);
        assert_eq!(buffer.read(&mut driver), [1, 2]);
    }

    #[test]
    fn test_old_handle_is_deleted_on_growth() {
        let mut driver = NullDriver::new();
        let mut buffer =
            GrowthBuffer::<u32>::new(&mut driver, 2, UsageHint::DynamicDraw).unwrap();
        let first = buffer.raw_handle();

        buffer.push(&mut driver, 1).unwrap();
        buffer.push(&mut driver, 2).unwrap();
        buffer.push(&mut driver, 3).unwrap();
        assert_ne!(buffer.raw_handle(), first);
        assert_eq!(driver.buffer_count(), 1);
    }
}
