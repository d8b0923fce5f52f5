//! Common types shared across the resource layer.

use bitflags::bitflags;

// ============================================================================
// Extents and offsets
// ============================================================================

/// 3D extent for texture storage and region operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth in pixels (1 for 1D/2D textures).
    pub depth: u32,
}

impl Extent3d {
    /// Create a new 1D extent.
    pub fn new_1d(width: u32) -> Self {
        Self {
            width,
            height: 1,
            depth: 1,
        }
    }

    /// Create a new 2D extent.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
        }
    }

    /// Create a new 3D extent.
    pub fn new_3d(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Extent of the given mip level, halving each axis and clamping at 1.
    /// Levels beyond the chain of any `u32` extent saturate at 1x1x1.
    pub fn mip_level(self, level: u32) -> Self {
        let shift = level.min(31);
        Self {
            width: (self.width >> shift).max(1),
            height: (self.height >> shift).max(1),
            depth: (self.depth >> shift).max(1),
        }
    }

    /// Total number of pixels.
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }
}

/// 3D offset into a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Offset3d {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Offset3d {
    pub const ZERO: Offset3d = Offset3d { x: 0, y: 0, z: 0 };

    /// Create a new offset.
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Rectangular region of a framebuffer, used by blit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    /// X coordinate of the lower-left corner.
    pub x: u32,
    /// Y coordinate of the lower-left corner.
    pub y: u32,
    /// Width of the region.
    pub width: u32,
    /// Height of the region.
    pub height: u32,
}

impl Region {
    /// Create a new region.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a region from dimensions with origin at (0, 0).
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
}

// ============================================================================
// Framebuffer attachments
// ============================================================================

/// An attachment point of a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttachmentSlot {
    /// Numbered color attachment.
    Color(u32),
    /// Depth attachment.
    Depth,
    /// Stencil attachment.
    Stencil,
    /// Combined depth/stencil attachment.
    DepthStencil,
}

/// Completeness verdict reported by the driver for a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    /// The framebuffer is complete and can be rendered to.
    Complete,
    /// The framebuffer has no attachments.
    IncompleteMissingAttachment,
    /// An attachment is in an unusable state.
    IncompleteAttachment,
    /// The attachment combination is unsupported by the driver.
    Unsupported,
    /// Attachments disagree on sample counts.
    IncompleteMultisample,
}

impl FramebufferStatus {
    /// Returns true if the framebuffer can be rendered to.
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

bitflags! {
    /// Buffer mask selecting which framebuffer aspects a blit or clear touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlitMask: u32 {
        /// Color buffers.
        const COLOR = 1 << 0;
        /// Depth buffer.
        const DEPTH = 1 << 1;
        /// Stencil buffer.
        const STENCIL = 1 << 2;
    }
}

/// Filtering applied when a blit scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlitFilter {
    /// Nearest-pixel sampling. Required for depth/stencil blits.
    #[default]
    Nearest,
    /// Linear interpolation.
    Linear,
}

bitflags! {
    /// Memory barrier bits issued after incoherent access.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BarrierFlags: u32 {
        /// Texture fetches after image stores.
        const TEXTURE_FETCH = 1 << 0;
        /// Image load/store accesses.
        const SHADER_IMAGE_ACCESS = 1 << 1;
        /// Persistent-mapped client buffer writes.
        const CLIENT_MAPPED_BUFFER = 1 << 2;
        /// Buffer reads through vertex/index/uniform bindings.
        const BUFFER_UPDATE = 1 << 3;
    }
}

/// Access mode for image (incoherent read/write) texture bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

// ============================================================================
// Shader stages
// ============================================================================

/// Pipeline stage of a shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
    Compute,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
            Self::TessControl => "tessellation control",
            Self::TessEvaluation => "tessellation evaluation",
            Self::Compute => "compute",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_mip_level() {
        let extent = Extent3d::new_3d(256, 128, 4);
        assert_eq!(extent.mip_level(0), extent);
        assert_eq!(extent.mip_level(1), Extent3d::new_3d(128, 64, 2));
        // Axes clamp at 1 independently
        assert_eq!(extent.mip_level(4), Extent3d::new_3d(16, 8, 1));
        assert_eq!(extent.mip_level(9), Extent3d::new_3d(1, 1, 1));
        // Levels past any representable chain saturate instead of overflowing
        // the shift.
        assert_eq!(extent.mip_level(40), Extent3d::new_3d(1, 1, 1));
    }

    #[test]
    fn test_extent_pixel_count() {
        assert_eq!(Extent3d::new_2d(4, 4).pixel_count(), 16);
        assert_eq!(Extent3d::new_3d(4, 4, 2).pixel_count(), 32);
    }

    #[test]
    fn test_attachment_slot_ordering() {
        // Color slots sort before depth/stencil, which the attachment map
        // relies on for stable iteration.
        assert!(AttachmentSlot::Color(0) < AttachmentSlot::Color(1));
        assert!(AttachmentSlot::Color(7) < AttachmentSlot::Depth);
    }

    #[test]
    fn test_framebuffer_status() {
        assert!(FramebufferStatus::Complete.is_complete());
        assert!(!FramebufferStatus::Unsupported.is_complete());
    }
}
