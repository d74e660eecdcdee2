//! Service Channel Messages
//!
//! Message and flag definitions for the FreeRDS backend channel. The session
//! service and its backends exchange length-prefixed little-endian messages
//! over a Unix socket: the backend (this side, acting as the session's
//! display server) sends update and framebuffer messages, the service
//! forwards the remote user's keyboard and mouse events back.
//!
//! Numbering and flag bits follow the service's wire contract; keyboard and
//! pointer flags use the standard remote-desktop input conventions.

use crate::geometry::Region;

/// Message type identifiers on the service channel
pub mod msg_type {
    /// Start of an update batch (server to service)
    pub const BEGIN_UPDATE: u32 = 1;
    /// End of an update batch (server to service)
    pub const END_UPDATE: u32 = 2;
    /// One dirty rectangle of the shared framebuffer (server to service)
    pub const PAINT_RECT: u32 = 3;
    /// Shared framebuffer attach or detach (server to service)
    pub const SHARED_FRAMEBUFFER: u32 = 4;

    /// Keyboard toggle-key state (service to server)
    pub const SYNCHRONIZE_KEYBOARD: u32 = 100;
    /// Keyboard scancode event (service to server)
    pub const SCANCODE_KEYBOARD: u32 = 101;
    /// Keyboard virtual-key event (service to server)
    pub const VIRTUAL_KEYBOARD: u32 = 102;
    /// Keyboard unicode event (service to server)
    pub const UNICODE_KEYBOARD: u32 = 103;
    /// Pointer event (service to server)
    pub const MOUSE: u32 = 104;
    /// Extended pointer event, buttons 4 and 5 (service to server)
    pub const EXTENDED_MOUSE: u32 = 105;
    /// Output suppression toggle (service to server)
    pub const SUPPRESS_OUTPUT: u32 = 106;
}

/// Keyboard event flag bits
pub mod kbd_flags {
    /// Scancode is from the extended plane (0xE0 prefix)
    pub const KBD_FLAGS_EXTENDED: u32 = 0x0100;
    /// Key was down before this event
    pub const KBD_FLAGS_DOWN: u32 = 0x4000;
    /// Key transition is a release
    pub const KBD_FLAGS_RELEASE: u32 = 0x8000;
}

/// Pointer event flag bits
pub mod ptr_flags {
    /// Wheel rotation amount, two's complement within the mask
    pub const WHEEL_ROTATION_MASK: u32 = 0x01FF;
    /// Wheel rotation is negative (toward the user)
    pub const PTR_FLAGS_WHEEL_NEGATIVE: u32 = 0x0100;
    /// Event is a vertical wheel rotation
    pub const PTR_FLAGS_WHEEL: u32 = 0x0200;
    /// Event is a horizontal wheel rotation
    pub const PTR_FLAGS_HWHEEL: u32 = 0x0400;
    /// Event carries a pointer move
    pub const PTR_FLAGS_MOVE: u32 = 0x0800;
    /// Button transition is a press (absence means release)
    pub const PTR_FLAGS_DOWN: u32 = 0x8000;
    /// Left button
    pub const PTR_FLAGS_BUTTON1: u32 = 0x1000;
    /// Right button
    pub const PTR_FLAGS_BUTTON2: u32 = 0x2000;
    /// Middle button
    pub const PTR_FLAGS_BUTTON3: u32 = 0x4000;

    /// Extended button transition is a press
    pub const PTR_XFLAGS_DOWN: u32 = 0x8000;
    /// Extended button 4
    pub const PTR_XFLAGS_BUTTON1: u32 = 0x0001;
    /// Extended button 5
    pub const PTR_XFLAGS_BUTTON2: u32 = 0x0002;
}

/// Shared-framebuffer message flag bits
pub mod fb_flags {
    /// Segment is being attached (absence means detach)
    pub const SHARED_FB_ATTACH: u32 = 0x0001;
}

// =============================================================================
// Server messages (this side to the service)
// =============================================================================

/// A message sent by the backend to the session service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Open an update batch
    BeginUpdate,
    /// Close an update batch
    EndUpdate,
    /// One dirty rectangle, tile-aligned and clamped by the sender
    PaintRect {
        /// Left edge in pixels
        x: i32,
        /// Top edge in pixels
        y: i32,
        /// Width in pixels
        width: i32,
        /// Height in pixels
        height: i32,
    },
    /// Attach or detach the shared framebuffer segment
    SharedFramebuffer {
        /// `fb_flags` bits
        flags: u32,
        /// Framebuffer width in pixels
        width: i32,
        /// Framebuffer height in pixels
        height: i32,
        /// Bytes per scanline
        scanline: u32,
        /// Bits per pixel
        bits_per_pixel: u32,
        /// Bytes per pixel
        bytes_per_pixel: u32,
        /// POSIX shared-memory object name
        name: String,
    },
}

impl ServerMessage {
    /// Build a paint-rect message from a region
    pub fn paint_rect(region: &Region) -> Self {
        ServerMessage::PaintRect {
            x: region.x0,
            y: region.y0,
            width: region.width() as i32,
            height: region.height() as i32,
        }
    }

    /// The wire type identifier for this message
    pub fn msg_type(&self) -> u32 {
        match self {
            ServerMessage::BeginUpdate => msg_type::BEGIN_UPDATE,
            ServerMessage::EndUpdate => msg_type::END_UPDATE,
            ServerMessage::PaintRect { .. } => msg_type::PAINT_RECT,
            ServerMessage::SharedFramebuffer { .. } => msg_type::SHARED_FRAMEBUFFER,
        }
    }
}

// =============================================================================
// Client messages (the service to this side)
// =============================================================================

/// A message received from the session service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Toggle-key (caps/num/scroll lock) state snapshot
    SynchronizeKeyboard {
        /// Toggle-key state bits
        flags: u32,
    },
    /// Keyboard event as a set-1 scancode
    ScancodeKeyboard {
        /// `kbd_flags` bits
        flags: u32,
        /// Scancode within its plane
        code: u32,
        /// Keyboard type reported by the remote peer
        keyboard_type: u32,
    },
    /// Keyboard event as a virtual key code
    VirtualKeyboard {
        /// `kbd_flags` bits
        flags: u32,
        /// Virtual key code
        code: u32,
    },
    /// Keyboard event as a unicode code point
    UnicodeKeyboard {
        /// `kbd_flags` bits
        flags: u32,
        /// Code point
        code: u32,
    },
    /// Pointer motion, button or wheel event
    Mouse {
        /// `ptr_flags` bits
        flags: u32,
        /// X position in pixels
        x: u32,
        /// Y position in pixels
        y: u32,
    },
    /// Pointer event for extended buttons 4 and 5
    ExtendedMouse {
        /// `ptr_flags` extended bits
        flags: u32,
        /// X position in pixels
        x: u32,
        /// Y position in pixels
        y: u32,
    },
    /// Remote peer suppressed or restored display output
    SuppressOutput {
        /// Zero suppresses output, non-zero restores it
        activate: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_rect_from_region() {
        let region = Region::new(16, 32, 128, 96);
        let msg = ServerMessage::paint_rect(&region);
        assert_eq!(
            msg,
            ServerMessage::PaintRect {
                x: 16,
                y: 32,
                width: 112,
                height: 64,
            }
        );
        assert_eq!(msg.msg_type(), msg_type::PAINT_RECT);
    }
}
