//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The top-level error type [`EngineError`] wraps the subsystem errors:
//! - [`AnimationError`]: authoring mistakes in animation setup (unknown states,
//!   malformed keyframe tracks). These are programmer errors and are never
//!   swallowed; they propagate out of the frame loop.
//! - [`AssetError`]: model/texture import failures (bad binary envelope,
//!   invalid documents, accessors that overrun their buffers).
//! - [`GpuError`]: fatal backend construction failures.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, EngineError>`.
//!
//! ```rust,ignore
//! use arbor::errors::Result;
//!
//! fn load_level() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Animation setup or playback error.
    #[error(transparent)]
    Animation(#[from] AnimationError),

    /// Asset import error.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// GPU backend error.
    #[error(transparent)]
    Gpu(#[from] GpuError),

    // ========================================================================
    // I/O & Decoding Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecode(String),
}

impl From<image::ImageError> for EngineError {
    fn from(err: image::ImageError) -> Self {
        EngineError::ImageDecode(err.to_string())
    }
}

/// Errors raised by the animation subsystem.
///
/// Every variant indicates a bug in scene setup rather than a runtime
/// condition, so callers are expected to surface them, not retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A state name was referenced that was never registered.
    #[error("Animation state not registered: {0}")]
    UnknownState(String),

    /// A keyframe track was built with differing keyframe and value counts.
    #[error("Keyframe track has {keyframes} keyframes but {values} values")]
    MismatchedKeyframes {
        /// Number of keyframe times
        keyframes: usize,
        /// Number of keyframe values
        values: usize,
    },

    /// A keyframe track was built without any keyframes.
    #[error("Keyframe track is empty")]
    EmptyTrack,
}

/// Errors raised while importing model documents and their payloads.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    /// The binary envelope does not start with the expected magic number.
    #[error("Invalid binary container magic: {0:#010x}")]
    InvalidMagic(u32),

    /// The binary envelope declares a version other than the supported one.
    #[error("Unsupported binary container version {0}, only version 2 is supported")]
    UnsupportedVersion(u32),

    /// The binary envelope has no JSON chunk.
    #[error("Invalid binary container, no JSON chunk found")]
    MissingJsonChunk,

    /// Data ended before a declared structure was complete.
    #[error("Truncated data while reading {0}")]
    Truncated(String),

    /// An index into a document array was out of bounds.
    #[error("Asset index out of bounds: {context} (index: {index})")]
    IndexOutOfBounds {
        /// Description of what was being accessed
        context: String,
        /// The invalid index
        index: usize,
    },

    /// A buffer has no URI and no binary payload was supplied for it.
    #[error("Missing binary payload for buffer {0}")]
    MissingBinaryPayload(usize),

    /// A skin's inverse-bind matrix count differs from its joint count.
    #[error("Skin has {joints} joints but {inverse_bind_matrices} inverse bind matrices")]
    SkinMismatch {
        /// Number of joints
        joints: usize,
        /// Number of inverse bind matrices
        inverse_bind_matrices: usize,
    },

    /// A `data:` URI could not be parsed.
    #[error("Data URI error: {0}")]
    InvalidDataUri(String),

    /// An external resource was referenced without a base directory to resolve it.
    #[error("Cannot resolve external resource without a base path: {0}")]
    UnresolvedUri(String),

    /// The document failed to parse or validate.
    #[error("glTF error: {0}")]
    Gltf(String),
}

impl From<gltf::Error> for EngineError {
    fn from(err: gltf::Error) -> Self {
        use gltf::binary::Error as GlbError;

        let asset = match err {
            gltf::Error::Binary(GlbError::Magic(magic)) => AssetError::InvalidMagic(u32::from_le_bytes(magic)),
            gltf::Error::Binary(GlbError::Version(version)) => AssetError::UnsupportedVersion(version),
            gltf::Error::Binary(GlbError::ChunkType(_)) => AssetError::MissingJsonChunk,
            other => AssetError::Gltf(other.to_string()),
        };
        EngineError::Asset(asset)
    }
}

/// Errors raised by a GPU backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GpuError {
    /// No rendering context could be created.
    #[error("GPU context unavailable: {0}")]
    ContextUnavailable(String),

    /// A shader program failed to compile or link.
    #[error("Failed to create program '{program}': {reason}")]
    ProgramCreation {
        /// Program name
        program: String,
        /// Backend diagnostic
        reason: String,
    },
}

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;
