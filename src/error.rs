//! Surface Error Types
//!
//! One error enum for the whole surface: shared-memory setup, the service
//! channel, and surface lifecycle misuse all funnel through it so the
//! hosting library sees a single failure type per callback.

use thiserror::Error;

/// Result type for surface operations
pub type Result<T> = std::result::Result<T, SurfaceError>;

/// Surface error types
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// IO error on the service socket
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shared-memory operation failed
    #[error("Shared memory {op} failed: {source}")]
    Shm {
        /// The operation that failed (open, truncate, map, unlink)
        op: &'static str,
        /// The underlying errno
        source: nix::Error,
    },

    /// Initialise called with a buffer already installed
    #[error("Framebuffer already has a backing store")]
    AlreadyInitialised,

    /// Malformed message on the service channel
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SurfaceError {
    /// Wrap a nix errno with the shared-memory operation that produced it
    pub fn shm(op: &'static str, source: nix::Error) -> Self {
        SurfaceError::Shm { op, source }
    }
}
