//! Typed wrappers over raw driver objects.

pub mod buffer;
pub mod framebuffer;
pub mod growth;
pub mod persistent;
pub mod sampler;
pub mod target;
pub mod texture;

pub use buffer::{clamp_range, BufferRead, BufferWrite, ImmutableBuffer, MutableBuffer};
pub use framebuffer::{Framebuffer, Renderbuffer, RenderbufferStorage};
pub use growth::GrowthBuffer;
pub use persistent::PersistentBuffer;
pub use sampler::Sampler;
pub use target::RenderTarget;
pub use texture::Texture;
