//! FreeRDS Surface Binding
//!
//! Displays the framebuffer through a FreeRDS session service. The backing
//! store is a POSIX shared-memory segment both sides map, so `update` only
//! relays dirty rectangles, tile-aligned, and input comes back over the
//! same channel.
//!
//! The binding owns three resources after `initialise`: the shared segment
//! (installed in the framebuffer), the service channel with its reader
//! thread, and the consumer half of the input queue. `finalise` undoes all
//! three and is safe to call at any point.

use std::time::Duration;

use tracing::{debug, error, info, trace};

use crate::config::SessionConfig;
use crate::error::{Result, SurfaceError};
use crate::framebuffer::{Framebuffer, PixelFormat};
use crate::geometry::Region;
use crate::input::{event_queue, Event, EventReceiver};
use crate::service::messages::fb_flags;
use crate::service::{pipe_path, ServerMessage, ServiceChannel};
use crate::shm::{self, ShmSegment};
use crate::surface::{CursorShape, Surface};

/// Default framebuffer width before the host overrides it
pub const DEFAULT_WIDTH: u32 = 1024;
/// Default framebuffer height before the host overrides it
pub const DEFAULT_HEIGHT: u32 = 768;
/// Default pixel format before the host overrides it
pub const DEFAULT_FORMAT: PixelFormat = PixelFormat::Abgr8888;

/// The FreeRDS display surface
pub struct FreerdsSurface {
    session: SessionConfig,
    queue_depth: usize,
    segment_name: String,
    channel: Option<ServiceChannel>,
    receiver: Option<EventReceiver>,
    /// Damage accumulated while the remote peer has output suppressed
    pending: Region,
}

impl FreerdsSurface {
    /// Create a surface bound to one session and endpoint.
    ///
    /// Nothing is allocated or connected until `initialise`.
    pub fn new(session: SessionConfig, queue_depth: usize) -> Self {
        let segment_name = shm::segment_name(session.id, &session.endpoint);
        Self {
            session,
            queue_depth,
            segment_name,
            channel: None,
            receiver: None,
            pending: Region::EMPTY,
        }
    }

    fn attach_message(fb: &Framebuffer, name: &str) -> ServerMessage {
        ServerMessage::SharedFramebuffer {
            flags: fb_flags::SHARED_FB_ATTACH,
            width: fb.width as i32,
            height: fb.height as i32,
            scanline: fb.stride_bytes() as u32,
            bits_per_pixel: fb.format.bits_per_pixel(),
            bytes_per_pixel: fb.format.bytes_per_pixel(),
            name: name.to_string(),
        }
    }

    fn detach_message(fb: &Framebuffer, name: &str) -> ServerMessage {
        ServerMessage::SharedFramebuffer {
            flags: 0,
            width: fb.width as i32,
            height: fb.height as i32,
            scanline: fb.stride_bytes() as u32,
            bits_per_pixel: fb.format.bits_per_pixel(),
            bytes_per_pixel: fb.format.bytes_per_pixel(),
            name: name.to_string(),
        }
    }
}

impl Surface for FreerdsSurface {
    fn defaults(&mut self, fb: &mut Framebuffer) {
        fb.width = DEFAULT_WIDTH;
        fb.height = DEFAULT_HEIGHT;
        fb.format = DEFAULT_FORMAT;
    }

    fn initialise(&mut self, fb: &mut Framebuffer) -> Result<()> {
        if fb.has_store() || self.channel.is_some() {
            error!("Initialise called on a surface that already has a buffer");
            return Err(SurfaceError::AlreadyInitialised);
        }

        let segment = match ShmSegment::create(&self.segment_name, fb.buffer_len()) {
            Ok(segment) => segment,
            Err(e) => {
                error!("Shared framebuffer allocation failed: {e}");
                return Err(e);
            }
        };

        let (sender, receiver) = event_queue(self.queue_depth);
        let socket = pipe_path(
            &self.session.pipe_dir,
            self.session.id,
            &self.session.endpoint,
        );
        let channel = match ServiceChannel::connect(&socket, sender) {
            Ok(channel) => channel,
            Err(e) => {
                error!(
                    "Session service unreachable at {}: {e}",
                    socket.display()
                );
                drop(segment);
                let _ = shm::unlink(&self.segment_name);
                return Err(e);
            }
        };

        if let Err(e) = channel.send(&Self::attach_message(fb, &self.segment_name)) {
            error!("Shared framebuffer attach failed: {e}");
            drop(channel);
            drop(segment);
            let _ = shm::unlink(&self.segment_name);
            return Err(e);
        }

        fb.install_store(Box::new(segment));
        self.channel = Some(channel);
        self.receiver = Some(receiver);
        self.pending = Region::EMPTY;

        info!(
            "FreeRDS surface up: {}x{} {} in {}",
            fb.width, fb.height, fb.format, self.segment_name
        );
        Ok(())
    }

    fn finalise(&mut self, fb: &mut Framebuffer) {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.send(&Self::detach_message(fb, &self.segment_name)) {
                debug!("Detach message not delivered: {e}");
            }
            channel.shutdown();
        }
        self.receiver = None;
        self.pending = Region::EMPTY;

        if fb.take_store().is_some() {
            if let Err(e) = shm::unlink(&self.segment_name) {
                debug!("Shared segment cleanup: {e}");
            }
            info!("FreeRDS surface down");
        }
    }

    fn input(&mut self, timeout: Option<Duration>) -> Option<Event> {
        self.receiver.as_mut()?.poll(timeout)
    }

    fn claim(&mut self, _fb: &mut Framebuffer, region: &Region) -> Result<()> {
        trace!("Claim {region:?}");
        Ok(())
    }

    fn update(&mut self, fb: &mut Framebuffer, region: &Region) -> Result<()> {
        let Some(channel) = self.channel.as_ref() else {
            debug!("Update before initialise, ignoring {region:?}");
            return Ok(());
        };

        if channel.is_suppressed() {
            self.pending = self.pending.union(region);
            trace!("Output suppressed, deferring {region:?}");
            return Ok(());
        }

        let mut dirty = *region;
        if channel.take_restore_pending() {
            dirty = dirty.union(&self.pending);
            self.pending = Region::EMPTY;
            debug!("Output restored, repainting deferred damage");
        }

        let dirty = dirty.align_to_tiles().clamp_to(fb.width, fb.height);
        if dirty.is_empty() {
            trace!("Nothing visible in {region:?}, skipping paint");
            return Ok(());
        }

        for msg in [
            ServerMessage::BeginUpdate,
            ServerMessage::paint_rect(&dirty),
            ServerMessage::EndUpdate,
        ] {
            if let Err(e) = channel.send(&msg) {
                error!("Paint of {dirty:?} failed: {e}");
                return Err(e);
            }
        }

        trace!("Painted {dirty:?}");
        Ok(())
    }

    fn cursor(&mut self, _fb: &Framebuffer, cursor: &CursorShape) -> Result<()> {
        // Cursor imagery stays host-side; the remote pointer is the
        // service's business.
        trace!("Cursor {}x{} ignored", cursor.width, cursor.height);
        Ok(())
    }

    fn set_geometry(
        &mut self,
        fb: &mut Framebuffer,
        width: u32,
        height: u32,
        format: Option<PixelFormat>,
    ) -> Result<()> {
        let start_len = fb.buffer_len();

        if width > 0 {
            fb.width = width;
        }
        if height > 0 {
            fb.height = height;
        }
        if let Some(format) = format {
            fb.format = format;
        }

        let end_len = fb.buffer_len();

        if !fb.has_store() {
            debug!(
                "Geometry now {}x{} {}, surface not initialised",
                fb.width, fb.height, fb.format
            );
            return Ok(());
        }

        if end_len != start_len {
            drop(fb.take_store());
            if let Err(e) = shm::unlink(&self.segment_name) {
                error!("Stale segment removal failed during resize: {e}");
                return Err(e);
            }
            let segment = match ShmSegment::create(&self.segment_name, end_len) {
                Ok(segment) => segment,
                Err(e) => {
                    error!("Shared framebuffer reallocation failed: {e}");
                    return Err(e);
                }
            };
            fb.install_store(Box::new(segment));
            info!(
                "Shared framebuffer resized to {}x{} {} ({end_len} bytes)",
                fb.width, fb.height, fb.format
            );
        }

        // The service learns the new layout from a fresh attach, even when
        // the byte length did not change.
        if let Some(channel) = self.channel.as_ref() {
            if let Err(e) = channel.send(&Self::attach_message(fb, &self.segment_name)) {
                error!("Shared framebuffer re-attach failed: {e}");
                return Err(e);
            }
        }

        Ok(())
    }
}

impl Drop for FreerdsSurface {
    fn drop(&mut self) {
        // The framebuffer is gone by now; release what the surface itself
        // still holds. A live channel means initialise ran and finalise did
        // not, so the segment name is ours to remove.
        if let Some(mut channel) = self.channel.take() {
            channel.shutdown();
            if let Err(e) = shm::unlink(&self.segment_name) {
                debug!("Shared segment cleanup on drop: {e}");
            }
        }
    }
}

impl std::fmt::Debug for FreerdsSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreerdsSurface")
            .field("session", &self.session.id)
            .field("endpoint", &self.session.endpoint)
            .field("initialised", &self.channel.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
