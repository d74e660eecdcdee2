//! Input Event Translation and Queueing
//!
//! Turns the session service's keyboard and mouse messages into the events
//! the hosting library polls for, and carries them across the thread
//! boundary between the service reader and the host's `input` calls.
//!
//! # Architecture
//!
//! ```text
//! Service socket → reader thread → EventTranslator → EventSender
//!                                                        │ bounded SPSC
//! Host input() poll ←──────────────────────────── EventReceiver
//! ```
//!
//! The queue is bounded and lossy: when the host stops polling, newest
//! events are dropped with a warning rather than stalling the reader. The
//! service retransmits nothing, so there is no point buffering without
//! bound.
//!
//! The disconnect notice is exempt from that loss. It rides a sticky flag
//! beside the queue, and `poll` reports it exactly once after the queued
//! events drain: a full queue can cost input events, never the terminal
//! notice.
//!
//! Translation is best-effort by contract. Scancodes outside the table and
//! key events in virtual or unicode form are logged and dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, trace, warn};

use crate::service::messages::{kbd_flags, ClientMessage};

pub mod keymap;
pub mod pointer;

pub use keymap::ScancodeMap;

// =============================================================================
// Events
// =============================================================================

/// Key codes the hosting library understands.
///
/// `Mouse1` through `Mouse5` are the pointer buttons: left, middle, right,
/// and the two wheel directions. Wheel rotation arrives as press/release
/// pairs of `Mouse4` (away from the user) and `Mouse5` (toward the user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Key {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    // Digit row
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,
    // Punctuation
    Minus, Equals, LeftBracket, RightBracket, Backslash,
    Semicolon, Apostrophe, Grave, Comma, Period, Slash,
    // Controls
    Escape, Backspace, Tab, Return, Space, CapsLock,
    NumLock, ScrollLock, PrintScreen, Pause, Menu,
    // Modifiers
    LeftShift, RightShift, LeftCtrl, RightCtrl,
    LeftAlt, RightAlt, LeftMeta, RightMeta,
    // Navigation
    Insert, Delete, Home, End, PageUp, PageDown,
    Up, Down, Left, Right,
    // Function row
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    // Keypad
    Kp0, Kp1, Kp2, Kp3, Kp4, Kp5, Kp6, Kp7, Kp8, Kp9,
    KpDecimal, KpDivide, KpMultiply, KpMinus, KpPlus, KpEnter,
    // Pointer buttons
    Mouse1, Mouse2, Mouse3, Mouse4, Mouse5,
}

/// Out-of-band conditions reported through the event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// The service channel went away; no further events will arrive
    Disconnected,
}

/// An input event as the hosting library consumes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Key or pointer button pressed
    KeyDown(Key),
    /// Key or pointer button released
    KeyUp(Key),
    /// Absolute pointer position; `z` is reserved and stays zero
    MoveAbsolute {
        /// X position in pixels
        x: i32,
        /// Y position in pixels
        y: i32,
        /// Third axis, unused by pointer motion
        z: i32,
    },
    /// Out-of-band condition
    Control(ControlEvent),
}

// =============================================================================
// Queue
// =============================================================================

/// How often dropped-event warnings are emitted once the queue overflows
const DROP_WARN_INTERVAL: u64 = 100;

/// Producer half of the input queue, owned by the service reader thread
pub struct EventSender {
    tx: Sender<Event>,
    disconnected: Arc<AtomicBool>,
    dropped: u64,
}

impl EventSender {
    /// Push an event, dropping it if the host has fallen behind
    pub fn push(&mut self, event: Event) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped += 1;
                if self.dropped == 1 || self.dropped % DROP_WARN_INTERVAL == 0 {
                    warn!(
                        "Input queue full, dropped {:?} ({} dropped so far)",
                        event, self.dropped
                    );
                }
            }
            // The receiving side is being finalised; nothing left to do.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Mark the event stream as ended.
    ///
    /// The notice travels beside the bounded queue rather than through it;
    /// `poll` reports a single [`ControlEvent::Disconnected`] once the
    /// remaining events drain.
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    /// Events dropped because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Consumer half of the input queue, polled by the host
pub struct EventReceiver {
    rx: Receiver<Event>,
    disconnected: Arc<AtomicBool>,
    disconnect_reported: bool,
}

impl EventReceiver {
    /// Pop one event.
    ///
    /// `None` timeout polls without blocking; `Some(d)` waits up to `d`.
    /// Returns `None` when nothing arrived in time. Once the producer has
    /// disconnected and the queue is drained, yields a single
    /// [`Control(Disconnected)`](Event::Control) and then `None` forever.
    pub fn poll(&mut self, timeout: Option<Duration>) -> Option<Event> {
        let event = match timeout {
            None => self.rx.try_recv().ok(),
            Some(d) => self.rx.recv_timeout(d).ok(),
        };
        if event.is_some() {
            return event;
        }
        if !self.disconnect_reported && self.disconnected.load(Ordering::SeqCst) {
            self.disconnect_reported = true;
            return Some(Event::Control(ControlEvent::Disconnected));
        }
        None
    }
}

/// Create the bounded queue connecting the reader thread to the host
pub fn event_queue(depth: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = bounded(depth);
    let disconnected = Arc::new(AtomicBool::new(false));
    (
        EventSender {
            tx,
            disconnected: Arc::clone(&disconnected),
            dropped: 0,
        },
        EventReceiver {
            rx,
            disconnected,
            disconnect_reported: false,
        },
    )
}

// =============================================================================
// Translation
// =============================================================================

/// Translates service messages into host events
pub struct EventTranslator {
    map: ScancodeMap,
}

impl EventTranslator {
    /// Create a translator with the built-in scancode table
    pub fn new() -> Self {
        Self {
            map: ScancodeMap::new(),
        }
    }

    /// Expand one service message into zero or more host events.
    ///
    /// Suppress-output is not an input message and must be handled before
    /// calling this; it translates to nothing here.
    pub fn translate(&self, msg: &ClientMessage) -> Vec<Event> {
        match msg {
            ClientMessage::ScancodeKeyboard { flags, code, .. } => {
                let extended = flags & kbd_flags::KBD_FLAGS_EXTENDED != 0;
                let Some(key) = self.map.lookup(*code, extended) else {
                    debug!("Dropping unmapped scancode 0x{code:02X} (extended: {extended})");
                    return Vec::new();
                };
                if flags & kbd_flags::KBD_FLAGS_RELEASE != 0 {
                    vec![Event::KeyUp(key)]
                } else {
                    vec![Event::KeyDown(key)]
                }
            }
            ClientMessage::VirtualKeyboard { flags, code } => {
                debug!("Dropping virtual-key event 0x{code:04X} (flags 0x{flags:04X})");
                Vec::new()
            }
            ClientMessage::UnicodeKeyboard { flags, code } => {
                debug!("Dropping unicode key event U+{code:04X} (flags 0x{flags:04X})");
                Vec::new()
            }
            ClientMessage::SynchronizeKeyboard { flags } => {
                trace!("Keyboard toggle state synchronized: 0x{flags:04X}");
                Vec::new()
            }
            ClientMessage::Mouse { flags, x, y } => pointer::mouse_events(*flags, *x, *y),
            ClientMessage::ExtendedMouse { flags, x, y } => {
                pointer::extended_mouse_events(*flags, *x, *y)
            }
            ClientMessage::SuppressOutput { .. } => Vec::new(),
        }
    }
}

impl Default for EventTranslator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Queue behavior
    // -------------------------------------------------------------------------

    #[test]
    fn test_queue_delivers_in_order() {
        let (mut tx, mut rx) = event_queue(8);
        tx.push(Event::KeyDown(Key::A));
        tx.push(Event::KeyUp(Key::A));

        assert_eq!(rx.poll(None), Some(Event::KeyDown(Key::A)));
        assert_eq!(rx.poll(None), Some(Event::KeyUp(Key::A)));
        assert_eq!(rx.poll(None), None);
    }

    #[test]
    fn test_queue_drops_when_full() {
        let (mut tx, mut rx) = event_queue(2);
        tx.push(Event::KeyDown(Key::A));
        tx.push(Event::KeyDown(Key::B));
        tx.push(Event::KeyDown(Key::C));

        assert_eq!(tx.dropped(), 1);
        assert_eq!(rx.poll(None), Some(Event::KeyDown(Key::A)));
        assert_eq!(rx.poll(None), Some(Event::KeyDown(Key::B)));
        assert_eq!(rx.poll(None), None);
    }

    #[test]
    fn test_queue_timeout_poll() {
        let (_tx, mut rx) = event_queue(2);
        let start = std::time::Instant::now();
        assert_eq!(rx.poll(Some(Duration::from_millis(20))), None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_push_after_receiver_dropped_is_quiet() {
        let (mut tx, rx) = event_queue(2);
        drop(rx);
        tx.push(Event::KeyDown(Key::A));
        assert_eq!(tx.dropped(), 0);
    }

    #[test]
    fn test_disconnect_notice_survives_full_queue() {
        let (mut tx, mut rx) = event_queue(1);
        tx.push(Event::KeyDown(Key::A));
        tx.push(Event::KeyUp(Key::A));
        assert_eq!(tx.dropped(), 1);
        tx.disconnect();
        drop(tx);

        // Queued events first, then the notice, then silence.
        assert_eq!(rx.poll(None), Some(Event::KeyDown(Key::A)));
        assert_eq!(
            rx.poll(None),
            Some(Event::Control(ControlEvent::Disconnected))
        );
        assert_eq!(rx.poll(None), None);
        assert_eq!(rx.poll(Some(Duration::from_millis(10))), None);
    }

    #[test]
    fn test_disconnect_reported_once_on_empty_queue() {
        let (tx, mut rx) = event_queue(4);
        tx.disconnect();
        drop(tx);

        assert_eq!(
            rx.poll(Some(Duration::from_secs(1))),
            Some(Event::Control(ControlEvent::Disconnected))
        );
        assert_eq!(rx.poll(None), None);
    }

    // -------------------------------------------------------------------------
    // Translation
    // -------------------------------------------------------------------------

    #[test]
    fn test_translate_scancode_press_release() {
        let translator = EventTranslator::new();

        let press = ClientMessage::ScancodeKeyboard {
            flags: 0,
            code: 0x1E,
            keyboard_type: 4,
        };
        assert_eq!(translator.translate(&press), vec![Event::KeyDown(Key::A)]);

        let release = ClientMessage::ScancodeKeyboard {
            flags: kbd_flags::KBD_FLAGS_RELEASE,
            code: 0x1E,
            keyboard_type: 4,
        };
        assert_eq!(translator.translate(&release), vec![Event::KeyUp(Key::A)]);
    }

    #[test]
    fn test_translate_extended_scancode() {
        let translator = EventTranslator::new();
        let press = ClientMessage::ScancodeKeyboard {
            flags: kbd_flags::KBD_FLAGS_EXTENDED,
            code: 0x48,
            keyboard_type: 4,
        };
        assert_eq!(translator.translate(&press), vec![Event::KeyDown(Key::Up)]);
    }

    #[test]
    fn test_translate_unknown_scancode_drops() {
        let translator = EventTranslator::new();
        let press = ClientMessage::ScancodeKeyboard {
            flags: 0,
            code: 0x7F,
            keyboard_type: 4,
        };
        assert!(translator.translate(&press).is_empty());
    }

    #[test]
    fn test_translate_virtual_and_unicode_drop() {
        let translator = EventTranslator::new();
        assert!(translator
            .translate(&ClientMessage::VirtualKeyboard { flags: 0, code: 65 })
            .is_empty());
        assert!(translator
            .translate(&ClientMessage::UnicodeKeyboard {
                flags: 0,
                code: 0x20AC,
            })
            .is_empty());
    }
}
