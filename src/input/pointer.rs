//! Pointer Message Expansion
//!
//! One pointer message from the service can carry motion, a button
//! transition, or wheel rotation. The hosting library consumes those as
//! separate events, with wheel steps expressed as press/release pairs of
//! the wheel pseudo-buttons, so a single message expands to a short event
//! sequence. Motion is emitted first so button transitions land at the
//! already-updated position.

use tracing::debug;

use crate::input::{Event, Key};
use crate::service::messages::ptr_flags::{
    PTR_FLAGS_BUTTON1, PTR_FLAGS_BUTTON2, PTR_FLAGS_BUTTON3, PTR_FLAGS_DOWN, PTR_FLAGS_HWHEEL,
    PTR_FLAGS_MOVE, PTR_FLAGS_WHEEL, PTR_FLAGS_WHEEL_NEGATIVE, PTR_XFLAGS_BUTTON1,
    PTR_XFLAGS_BUTTON2, PTR_XFLAGS_DOWN,
};

/// Expand a pointer message into host events.
///
/// Wheel messages carry no usable position, so they produce only the
/// press/release pair: `Mouse4` for rotation away from the user, `Mouse5`
/// for rotation toward the user.
pub fn mouse_events(flags: u32, x: u32, y: u32) -> Vec<Event> {
    let mut events = Vec::with_capacity(3);

    if flags & PTR_FLAGS_WHEEL != 0 {
        let key = if flags & PTR_FLAGS_WHEEL_NEGATIVE != 0 {
            Key::Mouse5
        } else {
            Key::Mouse4
        };
        events.push(Event::KeyDown(key));
        events.push(Event::KeyUp(key));
        return events;
    }

    if flags & PTR_FLAGS_HWHEEL != 0 {
        // The host has no horizontal wheel codes.
        debug!("Dropping horizontal wheel event (flags 0x{flags:04X})");
        return events;
    }

    let buttons = flags & (PTR_FLAGS_BUTTON1 | PTR_FLAGS_BUTTON2 | PTR_FLAGS_BUTTON3);

    // Button transitions carry the pointer position too.
    if flags & PTR_FLAGS_MOVE != 0 || buttons != 0 {
        events.push(Event::MoveAbsolute {
            x: x as i32,
            y: y as i32,
            z: 0,
        });
    }

    let down = flags & PTR_FLAGS_DOWN != 0;
    for (bit, key) in [
        (PTR_FLAGS_BUTTON1, Key::Mouse1),
        (PTR_FLAGS_BUTTON2, Key::Mouse3),
        (PTR_FLAGS_BUTTON3, Key::Mouse2),
    ] {
        if buttons & bit != 0 {
            events.push(if down {
                Event::KeyDown(key)
            } else {
                Event::KeyUp(key)
            });
        }
    }

    events
}

/// Expand an extended pointer message.
///
/// Buttons 4 and 5 have no host key codes beyond the wheel aliases, so
/// their transitions are logged and dropped; the position still counts.
pub fn extended_mouse_events(flags: u32, x: u32, y: u32) -> Vec<Event> {
    let mut events = Vec::with_capacity(1);

    events.push(Event::MoveAbsolute {
        x: x as i32,
        y: y as i32,
        z: 0,
    });

    let buttons = flags & (PTR_XFLAGS_BUTTON1 | PTR_XFLAGS_BUTTON2);
    if buttons != 0 {
        let down = flags & PTR_XFLAGS_DOWN != 0;
        debug!("Dropping extended button transition 0x{buttons:02X} (down: {down})");
    }

    events
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_motion() {
        let events = mouse_events(PTR_FLAGS_MOVE, 320, 240);
        assert_eq!(
            events,
            vec![Event::MoveAbsolute {
                x: 320,
                y: 240,
                z: 0
            }]
        );
    }

    #[test]
    fn test_left_press_carries_position() {
        let events = mouse_events(PTR_FLAGS_DOWN | PTR_FLAGS_BUTTON1, 10, 20);
        assert_eq!(
            events,
            vec![
                Event::MoveAbsolute { x: 10, y: 20, z: 0 },
                Event::KeyDown(Key::Mouse1),
            ]
        );
    }

    #[test]
    fn test_left_release() {
        let events = mouse_events(PTR_FLAGS_BUTTON1, 10, 20);
        assert_eq!(
            events,
            vec![
                Event::MoveAbsolute { x: 10, y: 20, z: 0 },
                Event::KeyUp(Key::Mouse1),
            ]
        );
    }

    #[test]
    fn test_button_mapping_right_and_middle() {
        // Wire button 2 is the right button, which the host calls Mouse3.
        let events = mouse_events(PTR_FLAGS_DOWN | PTR_FLAGS_BUTTON2, 0, 0);
        assert_eq!(events[1], Event::KeyDown(Key::Mouse3));

        // Wire button 3 is the middle button, host Mouse2.
        let events = mouse_events(PTR_FLAGS_DOWN | PTR_FLAGS_BUTTON3, 0, 0);
        assert_eq!(events[1], Event::KeyDown(Key::Mouse2));
    }

    #[test]
    fn test_wheel_up_and_down() {
        let events = mouse_events(PTR_FLAGS_WHEEL | 0x0078, 999, 999);
        assert_eq!(
            events,
            vec![Event::KeyDown(Key::Mouse4), Event::KeyUp(Key::Mouse4)]
        );

        let events = mouse_events(PTR_FLAGS_WHEEL | PTR_FLAGS_WHEEL_NEGATIVE | 0x0088, 0, 0);
        assert_eq!(
            events,
            vec![Event::KeyDown(Key::Mouse5), Event::KeyUp(Key::Mouse5)]
        );
    }

    #[test]
    fn test_horizontal_wheel_dropped() {
        assert!(mouse_events(PTR_FLAGS_HWHEEL | 0x0010, 0, 0).is_empty());
    }

    #[test]
    fn test_extended_button_drops_but_moves() {
        let events = extended_mouse_events(PTR_XFLAGS_DOWN | PTR_XFLAGS_BUTTON1, 50, 60);
        assert_eq!(
            events,
            vec![Event::MoveAbsolute { x: 50, y: 60, z: 0 }]
        );
    }
}
