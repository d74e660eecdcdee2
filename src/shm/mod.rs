//! POSIX Shared-Memory Segments
//!
//! The framebuffer handed to the session service lives in a named POSIX
//! shared-memory object. This side creates and truncates the object, maps it
//! writable, and announces the name over the service channel; the service
//! opens the same name read-only and blits from it.
//!
//! A name left over from a crashed predecessor is unlinked and recreated
//! once, so a restart does not wedge on `EEXIST`.

use std::fs::File;

use memmap2::{MmapMut, MmapOptions};
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use nix::unistd::ftruncate;
use tracing::{debug, warn};

use crate::error::{Result, SurfaceError};
use crate::framebuffer::BackingStore;

/// Build the segment name for a session and endpoint.
///
/// The leading slash is required for portable `shm_open` names; the rest
/// mirrors the service pipe naming so a session's artifacts group together.
pub fn segment_name(session_id: u32, endpoint: &str) -> String {
    format!("/freerds-shm.{session_id}.{endpoint}")
}

/// Remove a named segment, treating an already-absent name as success.
pub fn unlink(name: &str) -> Result<()> {
    match shm_unlink(name) {
        Ok(()) => {
            debug!("Unlinked shared segment {name}");
            Ok(())
        }
        Err(nix::Error::ENOENT) => Ok(()),
        Err(e) => Err(SurfaceError::shm("unlink", e)),
    }
}

/// A created-and-mapped POSIX shared-memory segment.
///
/// Dropping the segment unmaps it. The name registered with the OS outlives
/// the mapping on purpose; the surface unlinks it explicitly when the
/// framebuffer is finalised or resized.
pub struct ShmSegment {
    name: String,
    map: MmapMut,
}

impl ShmSegment {
    /// Create a segment of `len` bytes under `name` and map it writable.
    ///
    /// The object is created exclusively with mode 0600. If the name already
    /// exists it is assumed stale, unlinked, and created once more; a second
    /// `EEXIST` is reported as-is.
    pub fn create(name: &str, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(SurfaceError::InvalidConfig(
                "shared segment length must be non-zero".into(),
            ));
        }

        let oflag = OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR;
        let mode = Mode::S_IRUSR | Mode::S_IWUSR;

        let fd = match shm_open(name, oflag, mode) {
            Ok(fd) => fd,
            Err(nix::Error::EEXIST) => {
                warn!("Shared segment {name} already exists, unlinking stale object");
                shm_unlink(name).map_err(|e| SurfaceError::shm("unlink", e))?;
                shm_open(name, oflag, mode).map_err(|e| SurfaceError::shm("open", e))?
            }
            Err(e) => return Err(SurfaceError::shm("open", e)),
        };

        ftruncate(&fd, len as nix::libc::off_t).map_err(|e| {
            // The name exists at this point; do not leave it behind.
            let _ = shm_unlink(name);
            SurfaceError::shm("truncate", e)
        })?;

        let file = File::from(fd);
        // Safety: the object was just created and sized by this process and
        // is not truncated again while the mapping lives.
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file) }.map_err(|e| {
            let _ = shm_unlink(name);
            SurfaceError::Io(e)
        })?;

        debug!("Created shared segment {name} ({len} bytes)");

        Ok(Self {
            name: name.to_string(),
            map,
        })
    }

    /// The segment's registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mapped length in bytes
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True for a zero-length mapping (never produced by `create`)
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The mapped bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }

    /// The mapped bytes, writable
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.map
    }
}

impl BackingStore for ShmSegment {
    fn len(&self) -> usize {
        ShmSegment::len(self)
    }

    fn as_slice(&self) -> &[u8] {
        ShmSegment::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        ShmSegment::as_mut_slice(self)
    }
}

impl std::fmt::Debug for ShmSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShmSegment")
            .field("name", &self.name)
            .field("len", &self.map.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
