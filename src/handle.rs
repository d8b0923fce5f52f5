//! Opaque driver handles and resource capability traits.
//!
//! Every driver-side object is identified by a [`RawHandle`], an opaque
//! non-negative integer where `0` is reserved as the invalid handle. Each
//! resource wrapper owns exactly one handle; handles are never shared or
//! reference-counted, and each is destroyed exactly once through an explicit
//! [`Dispose::dispose`] call.

use crate::driver::Driver;

/// Opaque identifier for a driver-side object.
///
/// `RawHandle::NONE` (value `0`) is the reserved invalid handle. A wrapper
/// whose handle is `NONE` has either not been constructed against a driver
/// or has already been disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawHandle(u32);

impl RawHandle {
    /// The reserved invalid handle.
    pub const NONE: RawHandle = RawHandle(0);

    /// Wrap a raw driver value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw driver value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns true if this handle refers to a driver object.
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for RawHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A wrapper that owns a driver-side object.
pub trait GpuResource {
    /// The underlying driver handle. `RawHandle::NONE` after dispose.
    fn raw_handle(&self) -> RawHandle;
}

/// Deterministic, idempotent release of a driver-side object.
///
/// `dispose` releases any residency the resource holds, deletes the handle,
/// and zeroes cached state. Calling it a second time is a no-op. No resource
/// in this crate relies on `Drop` for driver-side cleanup: the driver
/// reference is only available at explicit call sites.
pub trait Dispose {
    fn dispose(&mut self, driver: &mut dyn Driver);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_invalid() {
        assert!(!RawHandle::NONE.is_valid());
        assert_eq!(RawHandle::NONE.get(), 0);
    }

    #[test]
    fn test_valid_handle() {
        let handle = RawHandle::new(42);
        assert!(handle.is_valid());
        assert_eq!(handle.get(), 42);
        assert_eq!(handle.to_string(), "#42");
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(RawHandle::default(), RawHandle::NONE);
    }
}
