//! # freerds-surface
//!
//! FreeRDS shared-framebuffer surface backend for session-hosted framebuffer
//! libraries.
//!
//! The crate renders nothing itself. It owns the plumbing between a hosting
//! framebuffer library and a FreeRDS session service: a POSIX shared-memory
//! segment the host draws into, a Unix-socket service channel that announces
//! the segment and carries damage notifications out and input in, and a
//! translation layer that turns wire input messages into typed events.
//!
//! # Architecture
//!
//! ```text
//! freerds-surface
//!   ├─> Surface trait (lifecycle callbacks the host invokes)
//!   │     └─> FreerdsSurface (the one real backend)
//!   ├─> Framebuffer + shm (pixels live in /dev/shm, shared with the service)
//!   ├─> Service channel (socket codec + reader thread)
//!   └─> Input translation (scancodes/pointer flags → Key/Event)
//! ```
//!
//! # Data Flow
//!
//! **Output Path:** host draws into shm → `update(region)` → BeginUpdate /
//! PaintRect / EndUpdate on the socket → service blits from shm
//!
//! **Input Path:** service → socket → reader thread → event queue → `input()`

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Surface, session and logging configuration
pub mod config;

/// Error types shared across the crate
pub mod error;

/// Framebuffer descriptor and backing-store trait
pub mod framebuffer;

/// Integer rectangles, tile alignment and clamping
pub mod geometry;

/// Typed input events, the event queue and wire-to-event translation
pub mod input;

/// Service channel: socket path, wire codec, reader thread
pub mod service;

/// POSIX shared-memory segments for the framebuffer store
pub mod shm;

/// The `Surface` trait and the FreeRDS implementation
pub mod surface;

/// Startup banner and user-facing error formatting
pub mod utils;

pub use error::{Result, SurfaceError};
pub use framebuffer::{Framebuffer, PixelFormat};
pub use geometry::Region;
pub use input::{ControlEvent, Event, Key};
pub use surface::{CursorShape, FreerdsSurface, Surface};
