//! Scancode Mapping Table
//!
//! Set-1 keyboard scancodes to host key codes, best effort for a US layout.
//! The remote peer's layout is not negotiated on this channel, so keys
//! outside the shared physical core are simply absent from the table and
//! their events are dropped by the caller.

use std::collections::HashMap;

use crate::input::Key;

/// Scancode lookup for the primary and extended (0xE0) planes
pub struct ScancodeMap {
    primary: HashMap<u32, Key>,
    extended: HashMap<u32, Key>,
}

impl ScancodeMap {
    /// Build the table
    pub fn new() -> Self {
        let primary = PRIMARY.iter().copied().collect();
        let extended = EXTENDED.iter().copied().collect();
        Self { primary, extended }
    }

    /// Look up a scancode in its plane
    pub fn lookup(&self, code: u32, extended: bool) -> Option<Key> {
        if extended {
            self.extended.get(&code).copied()
        } else {
            self.primary.get(&code).copied()
        }
    }

    /// Number of mapped scancodes across both planes
    pub fn len(&self) -> usize {
        self.primary.len() + self.extended.len()
    }

    /// Always false; the built-in table is never empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ScancodeMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Primary plane (no prefix)
const PRIMARY: &[(u32, Key)] = &[
    (0x01, Key::Escape),
    (0x02, Key::Digit1),
    (0x03, Key::Digit2),
    (0x04, Key::Digit3),
    (0x05, Key::Digit4),
    (0x06, Key::Digit5),
    (0x07, Key::Digit6),
    (0x08, Key::Digit7),
    (0x09, Key::Digit8),
    (0x0A, Key::Digit9),
    (0x0B, Key::Digit0),
    (0x0C, Key::Minus),
    (0x0D, Key::Equals),
    (0x0E, Key::Backspace),
    (0x0F, Key::Tab),
    (0x10, Key::Q),
    (0x11, Key::W),
    (0x12, Key::E),
    (0x13, Key::R),
    (0x14, Key::T),
    (0x15, Key::Y),
    (0x16, Key::U),
    (0x17, Key::I),
    (0x18, Key::O),
    (0x19, Key::P),
    (0x1A, Key::LeftBracket),
    (0x1B, Key::RightBracket),
    (0x1C, Key::Return),
    (0x1D, Key::LeftCtrl),
    (0x1E, Key::A),
    (0x1F, Key::S),
    (0x20, Key::D),
    (0x21, Key::F),
    (0x22, Key::G),
    (0x23, Key::H),
    (0x24, Key::J),
    (0x25, Key::K),
    (0x26, Key::L),
    (0x27, Key::Semicolon),
    (0x28, Key::Apostrophe),
    (0x29, Key::Grave),
    (0x2A, Key::LeftShift),
    (0x2B, Key::Backslash),
    (0x2C, Key::Z),
    (0x2D, Key::X),
    (0x2E, Key::C),
    (0x2F, Key::V),
    (0x30, Key::B),
    (0x31, Key::N),
    (0x32, Key::M),
    (0x33, Key::Comma),
    (0x34, Key::Period),
    (0x35, Key::Slash),
    (0x36, Key::RightShift),
    (0x37, Key::KpMultiply),
    (0x38, Key::LeftAlt),
    (0x39, Key::Space),
    (0x3A, Key::CapsLock),
    (0x3B, Key::F1),
    (0x3C, Key::F2),
    (0x3D, Key::F3),
    (0x3E, Key::F4),
    (0x3F, Key::F5),
    (0x40, Key::F6),
    (0x41, Key::F7),
    (0x42, Key::F8),
    (0x43, Key::F9),
    (0x44, Key::F10),
    (0x45, Key::NumLock),
    (0x46, Key::ScrollLock),
    (0x47, Key::Kp7),
    (0x48, Key::Kp8),
    (0x49, Key::Kp9),
    (0x4A, Key::KpMinus),
    (0x4B, Key::Kp4),
    (0x4C, Key::Kp5),
    (0x4D, Key::Kp6),
    (0x4E, Key::KpPlus),
    (0x4F, Key::Kp1),
    (0x50, Key::Kp2),
    (0x51, Key::Kp3),
    (0x52, Key::Kp0),
    (0x53, Key::KpDecimal),
    (0x57, Key::F11),
    (0x58, Key::F12),
];

/// Extended plane (0xE0 prefix)
const EXTENDED: &[(u32, Key)] = &[
    (0x1C, Key::KpEnter),
    (0x1D, Key::RightCtrl),
    (0x35, Key::KpDivide),
    (0x37, Key::PrintScreen),
    (0x38, Key::RightAlt),
    (0x46, Key::Pause),
    (0x47, Key::Home),
    (0x48, Key::Up),
    (0x49, Key::PageUp),
    (0x4B, Key::Left),
    (0x4D, Key::Right),
    (0x4F, Key::End),
    (0x50, Key::Down),
    (0x51, Key::PageDown),
    (0x52, Key::Insert),
    (0x53, Key::Delete),
    (0x5B, Key::LeftMeta),
    (0x5C, Key::RightMeta),
    (0x5D, Key::Menu),
];

// =============================================================================
// Tests
// =============================================================================
