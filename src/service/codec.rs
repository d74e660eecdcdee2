//! Service Channel Wire Codec
//!
//! Every message on the channel is framed as an 8-byte little-endian header
//! (`type: u32`, `length: u32`) followed by the payload, where `length`
//! counts the whole message including the header. The encoder writes server
//! messages into a caller-owned buffer; the decoder consumes a byte stream
//! incrementally so socket reads can land on any boundary.

use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::error::{Result, SurfaceError};
use crate::service::messages::{msg_type, ClientMessage, ServerMessage};

/// Bytes in the message header
pub const HEADER_LEN: usize = 8;

/// Upper bound on a single message, header included.
///
/// The largest legitimate message is a shared-framebuffer attach carrying a
/// segment name; anything near this bound is a corrupt stream.
pub const MAX_MESSAGE_LEN: usize = 64 * 1024;

// =============================================================================
// Encoding
// =============================================================================

/// Append the wire form of a server message to `buf`
pub fn encode_server(msg: &ServerMessage, buf: &mut BytesMut) {
    match msg {
        ServerMessage::BeginUpdate | ServerMessage::EndUpdate => {
            buf.put_u32_le(msg.msg_type());
            buf.put_u32_le(HEADER_LEN as u32);
        }
        ServerMessage::PaintRect {
            x,
            y,
            width,
            height,
        } => {
            buf.put_u32_le(msg_type::PAINT_RECT);
            buf.put_u32_le((HEADER_LEN + 16) as u32);
            buf.put_i32_le(*x);
            buf.put_i32_le(*y);
            buf.put_i32_le(*width);
            buf.put_i32_le(*height);
        }
        ServerMessage::SharedFramebuffer {
            flags,
            width,
            height,
            scanline,
            bits_per_pixel,
            bytes_per_pixel,
            name,
        } => {
            let payload_len = 28 + name.len();
            buf.put_u32_le(msg_type::SHARED_FRAMEBUFFER);
            buf.put_u32_le((HEADER_LEN + payload_len) as u32);
            buf.put_u32_le(*flags);
            buf.put_i32_le(*width);
            buf.put_i32_le(*height);
            buf.put_u32_le(*scanline);
            buf.put_u32_le(*bits_per_pixel);
            buf.put_u32_le(*bytes_per_pixel);
            buf.put_u32_le(name.len() as u32);
            buf.put_slice(name.as_bytes());
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Incremental decoder for client messages.
///
/// Feed raw socket bytes with [`extend`](MessageDecoder::extend), then drain
/// complete messages with [`next_message`](MessageDecoder::next_message).
/// Unknown message types are skipped so a newer service does not kill the
/// channel; malformed framing does.
#[derive(Debug, Default)]
pub struct MessageDecoder {
    buf: BytesMut,
}

impl MessageDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Append raw bytes read from the socket
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Extract the next complete message, or `None` when more bytes are
    /// needed
    pub fn next_message(&mut self) -> Result<Option<ClientMessage>> {
        loop {
            if self.buf.len() < HEADER_LEN {
                return Ok(None);
            }

            let msg_ty = u32::from_le_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]);
            let len =
                u32::from_le_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]) as usize;

            if len < HEADER_LEN {
                return Err(SurfaceError::Protocol(format!(
                    "message length {len} is smaller than the header"
                )));
            }
            if len > MAX_MESSAGE_LEN {
                return Err(SurfaceError::Protocol(format!(
                    "message length {len} exceeds the {MAX_MESSAGE_LEN} byte limit"
                )));
            }
            if self.buf.len() < len {
                return Ok(None);
            }

            let frame = self.buf.split_to(len);
            let payload = &frame[HEADER_LEN..];

            match parse_client(msg_ty, payload)? {
                Some(msg) => return Ok(Some(msg)),
                // Unknown type, already logged; try the next frame.
                None => continue,
            }
        }
    }
}

fn parse_client(msg_ty: u32, payload: &[u8]) -> Result<Option<ClientMessage>> {
    let msg = match msg_ty {
        msg_type::SYNCHRONIZE_KEYBOARD => ClientMessage::SynchronizeKeyboard {
            flags: read_u32_le(payload, 0)?,
        },
        msg_type::SCANCODE_KEYBOARD => ClientMessage::ScancodeKeyboard {
            flags: read_u32_le(payload, 0)?,
            code: read_u32_le(payload, 4)?,
            keyboard_type: read_u32_le(payload, 8)?,
        },
        msg_type::VIRTUAL_KEYBOARD => ClientMessage::VirtualKeyboard {
            flags: read_u32_le(payload, 0)?,
            code: read_u32_le(payload, 4)?,
        },
        msg_type::UNICODE_KEYBOARD => ClientMessage::UnicodeKeyboard {
            flags: read_u32_le(payload, 0)?,
            code: read_u32_le(payload, 4)?,
        },
        msg_type::MOUSE => ClientMessage::Mouse {
            flags: read_u32_le(payload, 0)?,
            x: read_u32_le(payload, 4)?,
            y: read_u32_le(payload, 8)?,
        },
        msg_type::EXTENDED_MOUSE => ClientMessage::ExtendedMouse {
            flags: read_u32_le(payload, 0)?,
            x: read_u32_le(payload, 4)?,
            y: read_u32_le(payload, 8)?,
        },
        msg_type::SUPPRESS_OUTPUT => ClientMessage::SuppressOutput {
            activate: read_u32_le(payload, 0)?,
        },
        other => {
            debug!("Skipping unknown service message type {other} ({} byte payload)", payload.len());
            return Ok(None);
        }
    };
    Ok(Some(msg))
}

fn read_u32_le(payload: &[u8], offset: usize) -> Result<u32> {
    let end = offset + 4;
    if payload.len() < end {
        return Err(SurfaceError::Protocol(format!(
            "payload too short: {} bytes, field needs {end}",
            payload.len()
        )));
    }
    Ok(u32::from_le_bytes([
        payload[offset],
        payload[offset + 1],
        payload[offset + 2],
        payload[offset + 3],
    ]))
}

// =============================================================================
// Tests
// =============================================================================
