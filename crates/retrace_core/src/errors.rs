//! Error Types
//!
//! This module defines the error types used throughout retrace.
//!
//! # Overview
//!
//! The main error type [`RetraceError`] covers the fatal failure modes:
//! - Native render status codes surfaced by batch renders
//! - Scene resources that are missing at render time
//! - Output construction and scene export failures
//!
//! Compilation failures and incompatible attribute edits are *not* errors.
//! They are logged and reported through empty handles or `false` returns.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, RetraceError>`.

use thiserror::Error;

/// The main error type for retrace.
#[derive(Error, Debug)]
pub enum RetraceError {
    // ========================================================================
    // Native Render Status
    // ========================================================================
    /// The render was aborted by the native renderer.
    #[error("Render aborted")]
    RenderAborted,

    /// No render camera was bound on the options node.
    #[error("Camera not defined")]
    NoCamera,

    /// The render camera is malformed.
    #[error("Bad camera")]
    BadCamera,

    /// The native renderer rejected its license or usage validation.
    #[error("Usage not validated")]
    ValidationFailed,

    /// The render region lies outside the image.
    #[error("Invalid render region")]
    InvalidRenderRegion,

    /// The render was interrupted from another thread.
    #[error("Render interrupted by user")]
    Interrupted,

    /// There were no outputs to render to.
    #[error("No outputs")]
    NoOutputs,

    /// Any other failure reported by the native renderer.
    #[error("Generic native renderer error")]
    Native,

    // ========================================================================
    // Missing Scene Resources
    // ========================================================================
    /// A camera names a mesh that is neither a polymesh nor an instance of one.
    #[error("Unable to find mesh \"{mesh}\" for camera \"{camera}\"")]
    MissingCameraMesh {
        /// Camera node name
        camera: String,
        /// Mesh location requested by the camera
        mesh: String,
    },

    /// Light filters are linked to a light that was never created.
    #[error("Light filters linked to unknown light \"{0}\"")]
    MissingLight(String),

    /// A registered light filter has no compiled shader.
    #[error("Light filter \"{0}\" has no shader")]
    MissingLightFilter(String),

    // ========================================================================
    // Outputs & Export
    // ========================================================================
    /// The output driver type could not be instantiated.
    #[error("Unable to create output driver of type \"{0}\"")]
    OutputDriver(String),

    /// The output filter type could not be instantiated.
    #[error("Unable to create filter of type \"{0}\"")]
    OutputFilter(String),

    /// Writing a scene description failed.
    #[error("Scene export failed: {0}")]
    SceneExport(String),

    // ========================================================================
    // Motion
    // ========================================================================
    /// Motion samples must be evenly spaced in time.
    #[error("Motion sample times are not uniformly spaced")]
    NonUniformTimeSamples,

    /// Each motion sample needs exactly one sample time.
    #[error("Got {samples} motion samples but {times} sample times")]
    MismatchedTimeSamples {
        /// Number of samples
        samples: usize,
        /// Number of sample times
        times: usize,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Alias for `Result<T, RetraceError>`.
pub type Result<T> = std::result::Result<T, RetraceError>;
