//! Filtering, wrapping and comparison state shared by textures and samplers.

/// Minification filter. The mipmap variants require more than one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MinFilter {
    Nearest,
    #[default]
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    /// Trilinear filtering.
    LinearMipmapLinear,
}

impl MinFilter {
    /// Returns true if this filter samples across mip levels.
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }
}

/// Magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MagFilter {
    Nearest,
    #[default]
    Linear,
}

/// Texture coordinate wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    #[default]
    ClampToEdge,
    ClampToBorder,
}

/// Comparison function for depth-compare sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// A single sampling parameter write, shared by texture-level and
/// sampler-object state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingParameter {
    MinFilter(MinFilter),
    MagFilter(MagFilter),
    WrapS(WrapMode),
    WrapT(WrapMode),
    WrapR(WrapMode),
    /// `None` disables depth comparison.
    Compare(Option<CompareFunc>),
    MaxAnisotropy(f32),
    BorderColor([f32; 4]),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mipmap_filters() {
        assert!(MinFilter::LinearMipmapLinear.uses_mipmaps());
        assert!(MinFilter::NearestMipmapNearest.uses_mipmaps());
        assert!(!MinFilter::Linear.uses_mipmaps());
        assert!(!MinFilter::Nearest.uses_mipmaps());
    }
}
