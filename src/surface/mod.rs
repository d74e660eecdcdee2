//! Display Surface Contract
//!
//! The callback table a framebuffer host drives, expressed as a trait. The
//! hosting library owns the call order: `defaults` before anything, then
//! `initialise`, then any mix of `claim`/`update`/`input`/`cursor`/
//! `set_geometry`, then `finalise`. All calls arrive on whichever thread
//! the host schedules them from, one at a time.
//!
//! ```text
//! defaults ─> initialise ─> { claim / update / input / cursor / set_geometry }* ─> finalise
//! ```
//!
//! The one implementation here is [`FreerdsSurface`], which displays the
//! framebuffer through a FreeRDS session service. The trait exists so hosts
//! and tests can hold surfaces behind one seam rather than for plugging in
//! alternative backends at runtime.

use std::time::Duration;

use crate::error::Result;
use crate::framebuffer::{Framebuffer, PixelFormat};
use crate::geometry::Region;
use crate::input::Event;

mod freerds;

pub use freerds::FreerdsSurface;

/// A cursor image the host wants shown.
///
/// Pixels are in the framebuffer's format, `width * height` of them, with
/// the hotspot relative to the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorShape {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Hotspot offset from the left edge
    pub hot_x: i32,
    /// Hotspot offset from the top edge
    pub hot_y: i32,
    /// Pixel data, row-major
    pub pixels: Vec<u8>,
}

/// The surface callback table
pub trait Surface {
    /// Install the surface's preferred geometry and format into a fresh
    /// descriptor, before initialisation.
    fn defaults(&mut self, fb: &mut Framebuffer);

    /// Allocate the backing store and bring up the display target.
    ///
    /// The descriptor must not already carry a store; a host that hands one
    /// in gets an error and the surface stays down.
    fn initialise(&mut self, fb: &mut Framebuffer) -> Result<()>;

    /// Release the backing store and every resource behind the surface.
    /// Safe to call repeatedly or without a prior `initialise`.
    fn finalise(&mut self, fb: &mut Framebuffer);

    /// Poll one input event.
    ///
    /// `None` timeout means do not block; `Some(d)` waits up to `d`.
    /// Returns `None` when no event arrived in time.
    fn input(&mut self, timeout: Option<Duration>) -> Option<Event>;

    /// The host is about to plot inside `region`.
    fn claim(&mut self, fb: &mut Framebuffer, region: &Region) -> Result<()>;

    /// The host finished plotting `region`; make it visible.
    fn update(&mut self, fb: &mut Framebuffer, region: &Region) -> Result<()>;

    /// The cursor image changed.
    fn cursor(&mut self, fb: &Framebuffer, cursor: &CursorShape) -> Result<()>;

    /// Change the framebuffer geometry or format.
    ///
    /// A zero `width` or `height` keeps the current value; `None` format
    /// keeps the current format. Before `initialise` this only rewrites the
    /// descriptor.
    fn set_geometry(
        &mut self,
        fb: &mut Framebuffer,
        width: u32,
        height: u32,
        format: Option<PixelFormat>,
    ) -> Result<()>;
}
