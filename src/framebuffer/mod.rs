//! Framebuffer Descriptor and Pixel Formats
//!
//! The descriptor side of the surface contract: geometry, pixel format, and
//! the backing store a surface installs at initialise time. The hosting
//! library's plotters write straight into [`Framebuffer::data_mut`]; for the
//! FreeRDS surface that memory is a POSIX shared segment, so every plot is
//! immediately visible to the session service without a copy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Pixel formats
// =============================================================================

/// Pixel layouts the surface contract understands.
///
/// Names read in memory order on a little-endian machine, the way the
/// hosting library names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 32bpp, alpha in the high byte, blue lowest
    Abgr8888,
    /// 32bpp, high byte unused, blue lowest
    Xbgr8888,
    /// 32bpp, alpha in the high byte, red lowest
    Argb8888,
    /// 32bpp, high byte unused, red lowest
    Xrgb8888,
    /// 24bpp packed RGB
    Rgb888,
    /// 16bpp, 5-6-5
    Rgb565,
    /// 16bpp, 1-5-5-5
    Argb1555,
}

impl PixelFormat {
    /// Bits per pixel for this format
    #[inline]
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Abgr8888
            | PixelFormat::Xbgr8888
            | PixelFormat::Argb8888
            | PixelFormat::Xrgb8888 => 32,
            PixelFormat::Rgb888 => 24,
            PixelFormat::Rgb565 | PixelFormat::Argb1555 => 16,
        }
    }

    /// Bytes per pixel for this format
    #[inline]
    pub fn bytes_per_pixel(&self) -> u32 {
        self.bits_per_pixel() / 8
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Abgr8888 => "abgr8888",
            PixelFormat::Xbgr8888 => "xbgr8888",
            PixelFormat::Argb8888 => "argb8888",
            PixelFormat::Xrgb8888 => "xrgb8888",
            PixelFormat::Rgb888 => "rgb888",
            PixelFormat::Rgb565 => "rgb565",
            PixelFormat::Argb1555 => "argb1555",
        };
        f.write_str(name)
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abgr8888" => Ok(PixelFormat::Abgr8888),
            "xbgr8888" => Ok(PixelFormat::Xbgr8888),
            "argb8888" => Ok(PixelFormat::Argb8888),
            "xrgb8888" => Ok(PixelFormat::Xrgb8888),
            "rgb888" => Ok(PixelFormat::Rgb888),
            "rgb565" => Ok(PixelFormat::Rgb565),
            "argb1555" => Ok(PixelFormat::Argb1555),
            other => Err(format!("unknown pixel format: {other}")),
        }
    }
}

// =============================================================================
// Backing store
// =============================================================================

/// Memory a surface installs behind a framebuffer.
///
/// The FreeRDS surface installs a shared-memory mapping; tests install plain
/// heap buffers. Dropping the store releases the memory but not any name
/// registered with the OS, which stays the owning surface's job.
pub trait BackingStore: Send {
    /// Length of the store in bytes
    fn len(&self) -> usize;

    /// True when the store has zero length
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The pixel bytes
    fn as_slice(&self) -> &[u8];

    /// The pixel bytes, writable
    fn as_mut_slice(&mut self) -> &mut [u8];
}

impl BackingStore for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }
}

// =============================================================================
// Framebuffer descriptor
// =============================================================================

/// The framebuffer a surface displays.
///
/// Width, height and format are the descriptor the hosting library reads and
/// the surface adjusts through `defaults` and `set_geometry`. The backing
/// store is absent until a surface initialises.
pub struct Framebuffer {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: PixelFormat,
    store: Option<Box<dyn BackingStore>>,
}

impl Framebuffer {
    /// Create a descriptor with no backing store
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            store: None,
        }
    }

    /// Bytes per scanline
    #[inline]
    pub fn stride_bytes(&self) -> usize {
        (self.width * self.format.bytes_per_pixel()) as usize
    }

    /// Total size of the pixel buffer in bytes
    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.stride_bytes() * self.height as usize
    }

    /// True once a surface has installed memory behind the descriptor
    #[inline]
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Install the backing store (replacing any previous one)
    pub fn install_store(&mut self, store: Box<dyn BackingStore>) {
        self.store = Some(store);
    }

    /// Remove and return the backing store
    pub fn take_store(&mut self) -> Option<Box<dyn BackingStore>> {
        self.store.take()
    }

    /// The pixel bytes, if a store is installed
    pub fn data(&self) -> Option<&[u8]> {
        self.store.as_ref().map(|s| s.as_slice())
    }

    /// The pixel bytes for plotting, if a store is installed
    pub fn data_mut(&mut self) -> Option<&mut [u8]> {
        self.store.as_mut().map(|s| s.as_mut_slice())
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framebuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("store", &self.store.as_ref().map(|s| s.len()))
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sizes() {
        assert_eq!(PixelFormat::Abgr8888.bits_per_pixel(), 32);
        assert_eq!(PixelFormat::Abgr8888.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::Rgb888.bits_per_pixel(), 24);
        assert_eq!(PixelFormat::Rgb565.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::Argb1555.bytes_per_pixel(), 2);
    }

    #[test]
    fn test_format_parse_round_trip() {
        for format in [
            PixelFormat::Abgr8888,
            PixelFormat::Xbgr8888,
            PixelFormat::Argb8888,
            PixelFormat::Xrgb8888,
            PixelFormat::Rgb888,
            PixelFormat::Rgb565,
            PixelFormat::Argb1555,
        ] {
            assert_eq!(format.to_string().parse::<PixelFormat>(), Ok(format));
        }
        assert!("bgra".parse::<PixelFormat>().is_err());
    }

    #[test]
    fn test_stride_and_buffer_len() {
        let fb = Framebuffer::new(1024, 768, PixelFormat::Abgr8888);
        assert_eq!(fb.stride_bytes(), 4096);
        assert_eq!(fb.buffer_len(), 4096 * 768);

        let fb = Framebuffer::new(800, 600, PixelFormat::Rgb565);
        assert_eq!(fb.stride_bytes(), 1600);
        assert_eq!(fb.buffer_len(), 1600 * 600);
    }

    #[test]
    fn test_store_install_and_take() {
        let mut fb = Framebuffer::new(4, 4, PixelFormat::Xrgb8888);
        assert!(!fb.has_store());
        assert!(fb.data().is_none());

        fb.install_store(Box::new(vec![0u8; fb.buffer_len()]));
        assert!(fb.has_store());
        assert_eq!(fb.data().map(|d| d.len()), Some(64));

        if let Some(data) = fb.data_mut() {
            data[0] = 0xff;
        }
        assert_eq!(fb.data().map(|d| d[0]), Some(0xff));

        let store = fb.take_store();
        assert!(store.is_some());
        assert!(!fb.has_store());
    }
}
