//! Host-side cache of clear state.
//!
//! Clear values are latched driver-side; the cache skips redundant writes
//! and lets callers query the current values without a driver round trip.

use crate::driver::Driver;

/// Cached clear values.
pub struct RenderState {
    clear_color: [f32; 4],
    clear_depth: f32,
    clear_stencil: i32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

impl RenderState {
    /// Cache seeded with the driver's initial clear values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clear color, skipping the driver call if unchanged.
    pub fn set_clear_color(&mut self, driver: &mut dyn Driver, color: [f32; 4]) {
        if self.clear_color != color {
            self.clear_color = color;
            driver.set_clear_color(color);
        }
    }

    /// Set the clear depth, skipping the driver call if unchanged.
    pub fn set_clear_depth(&mut self, driver: &mut dyn Driver, depth: f32) {
        if self.clear_depth != depth {
            self.clear_depth = depth;
            driver.set_clear_depth(depth);
        }
    }

    /// Set the clear stencil, skipping the driver call if unchanged.
    pub fn set_clear_stencil(&mut self, driver: &mut dyn Driver, stencil: i32) {
        if self.clear_stencil != stencil {
            self.clear_stencil = stencil;
            driver.set_clear_stencil(stencil);
        }
    }

    /// Cached clear color.
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Cached clear depth.
    pub fn clear_depth(&self) -> f32 {
        self.clear_depth
    }

    /// Cached clear stencil.
    pub fn clear_stencil(&self) -> i32 {
        self.clear_stencil
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NullDriver;

    #[test]
    fn test_setters_update_cache() {
        let mut driver = NullDriver::new();
        let mut state = RenderState::new();

        state.set_clear_color(&mut driver, [0.2, 0.4, 0.6, 1.0]);
        state.set_clear_depth(&mut driver, 0.5);
        state.set_clear_stencil(&mut driver, 3);

        assert_eq!(state.clear_color(), [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(state.clear_depth(), 0.5);
        assert_eq!(state.clear_stencil(), 3);
    }

    #[test]
    fn test_redundant_writes_are_skipped() {
        let mut driver = NullDriver::new();
        let mut state = RenderState::new();

        state.set_clear_color(&mut driver, [1.0, 0.0, 0.0, 1.0]);
        // A redundant write must not disturb the cached value.
        state.set_clear_color(&mut driver, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(state.clear_color(), [1.0, 0.0, 0.0, 1.0]);
    }
}
