//! Graphics error types.

use std::fmt;

use crate::types::ShaderStage;

/// Errors raised by the resource layer.
///
/// All variants are raised synchronously at the call site that detects them,
/// before any driver call with inconsistent arguments is issued. None are
/// caught or retried internally; callers should treat them as precondition
/// violations rather than recoverable runtime conditions. Conditions with a
/// safe fallback (excess sample counts, mip filtering on targets that cannot
/// support it) are clamped or ignored with a diagnostic instead of raised.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsError {
    /// Re-allocation of a buffer with immutable (static) storage.
    StaticReallocation,
    /// An operation required an allocated resource.
    Unallocated(String),
    /// A sub-range index outside the valid `[0, count)` range.
    IndexOutOfRange {
        /// The requested element index.
        index: usize,
        /// The allocated element count.
        count: usize,
    },
    /// An allocation request for fewer than one element or pixel.
    EmptyAllocation(String),
    /// An enum value with no driver equivalent.
    UnmappedEnum(String),
    /// A shader stage failed to compile; carries the driver's log.
    ShaderCompilation {
        /// The stage that failed.
        stage: ShaderStage,
        /// Driver diagnostic log.
        log: String,
    },
    /// A program failed to link; carries the driver's log.
    ProgramLink(String),
    /// Unrecognized or unsupported file signature or compression code.
    UnsupportedFormat(String),
    /// A shader `#include` path could not be resolved.
    IncludeNotFound(String),
    /// The driver reported an allocation failure.
    ResourceCreationFailed(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticReallocation => write!(f, "static buffer re-allocation"),
            Self::Unallocated(what) => write!(f, "use of unallocated resource: {what}"),
            Self::IndexOutOfRange { index, count } => {
                write!(f, "index {index} out of range for {count} elements")
            }
            Self::EmptyAllocation(what) => write!(f, "empty allocation request: {what}"),
            Self::UnmappedEnum(what) => write!(f, "no driver equivalent for {what}"),
            Self::ShaderCompilation { stage, log } => {
                write!(f, "{stage} shader compilation failed: {log}")
            }
            Self::ProgramLink(log) => write!(f, "program link failed: {log}"),
            Self::UnsupportedFormat(what) => write!(f, "unsupported format: {what}"),
            Self::IncludeNotFound(path) => write!(f, "shader include not found: {path}"),
            Self::ResourceCreationFailed(what) => write!(f, "resource creation failed: {what}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

static_assertions::assert_impl_all!(GraphicsError: Send, Sync);
