//! FreeRDS Session Service Channel
//!
//! The session service owns the remote-desktop connection; backends like
//! this surface attach to it over a Unix socket named after the session and
//! endpoint. This module owns that socket: it connects, serializes outgoing
//! update and framebuffer messages, and runs the reader thread that turns
//! incoming keyboard and mouse messages into host input events.
//!
//! # Architecture
//!
//! ```text
//!                    ┌────────────────────────────┐
//! surface calls ───> │ ServiceChannel::send       │ ──> Unix socket ──┐
//!                    │   (writer under a mutex)   │                   │
//!                    └────────────────────────────┘             session service
//!                    ┌────────────────────────────┐                   │
//! EventReceiver <─── │ freerds-recv reader thread │ <── Unix socket ──┘
//!                    │   decode → translate → push│
//!                    └────────────────────────────┘
//! ```
//!
//! Suppress-output messages never reach the event queue; they flip shared
//! flags the surface consults on its update path.
//!
//! The channel reports loss of the service exactly once: the reader marks
//! the queue disconnected on its way out, and the host's poll yields a
//! final [`ControlEvent::Disconnected`](crate::input::ControlEvent) after
//! the queued events drain.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use bytes::BytesMut;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::input::{EventSender, EventTranslator};

pub mod codec;
pub mod messages;

pub use messages::{ClientMessage, ServerMessage};

use codec::{encode_server, MessageDecoder};

/// Socket read buffer size for the reader thread
const READ_BUF_LEN: usize = 4096;

/// Path of the service's listening socket for a session and endpoint
pub fn pipe_path(pipe_dir: &Path, session_id: u32, endpoint: &str) -> PathBuf {
    pipe_dir.join(format!("FreeRDS_{session_id}_{endpoint}"))
}

/// A connected channel to the session service
pub struct ServiceChannel {
    writer: Mutex<UnixStream>,
    suppressed: Arc<AtomicBool>,
    restore_pending: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl ServiceChannel {
    /// Connect to the service socket and start the reader thread.
    ///
    /// `events` becomes the producer side of the input queue; everything
    /// the service sends from here on is translated and pushed into it.
    pub fn connect(path: &Path, events: EventSender) -> Result<Self> {
        let stream = UnixStream::connect(path)?;
        info!("Connected to session service at {}", path.display());

        let suppressed = Arc::new(AtomicBool::new(false));
        let restore_pending = Arc::new(AtomicBool::new(false));

        let reader_stream = stream.try_clone()?;
        let reader_suppressed = Arc::clone(&suppressed);
        let reader_restore = Arc::clone(&restore_pending);
        let reader = std::thread::Builder::new()
            .name("freerds-recv".to_string())
            .spawn(move || {
                reader_loop(reader_stream, events, reader_suppressed, reader_restore);
            })?;

        Ok(Self {
            writer: Mutex::new(stream),
            suppressed,
            restore_pending,
            reader: Some(reader),
        })
    }

    /// Serialize and send one message to the service
    pub fn send(&self, msg: &ServerMessage) -> Result<()> {
        let mut buf = BytesMut::with_capacity(64);
        encode_server(msg, &mut buf);

        let mut writer = self.writer.lock();
        writer.write_all(&buf)?;
        Ok(())
    }

    /// True while the remote peer has suppressed display output
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    /// Consume the restored-output edge.
    ///
    /// Returns true exactly once after a suppress/restore cycle; the caller
    /// owes the service a repaint of whatever changed in between.
    pub fn take_restore_pending(&self) -> bool {
        self.restore_pending.swap(false, Ordering::SeqCst)
    }

    /// Close the socket and join the reader thread.
    ///
    /// Idempotent; the reader marks the queue disconnected on its way out,
    /// so a drained poll still reports the notice.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.reader.take() {
            if let Err(e) = self.writer.lock().shutdown(Shutdown::Both) {
                debug!("Socket shutdown: {e}");
            }
            if handle.join().is_err() {
                warn!("Service reader thread panicked");
            }
        }
    }
}

impl Drop for ServiceChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ServiceChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceChannel")
            .field("suppressed", &self.is_suppressed())
            .field("reader_running", &self.reader.is_some())
            .finish()
    }
}

// =============================================================================
// Reader thread
// =============================================================================

fn reader_loop(
    mut stream: UnixStream,
    mut events: EventSender,
    suppressed: Arc<AtomicBool>,
    restore_pending: Arc<AtomicBool>,
) {
    let translator = EventTranslator::new();
    let mut decoder = MessageDecoder::new();
    let mut buf = [0u8; READ_BUF_LEN];

    'read: loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => {
                info!("Session service closed the channel");
                break 'read;
            }
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Service channel read failed: {e}");
                break 'read;
            }
        };

        decoder.extend(&buf[..n]);
        loop {
            match decoder.next_message() {
                Ok(Some(ClientMessage::SuppressOutput { activate })) => {
                    if activate == 0 {
                        suppressed.store(true, Ordering::SeqCst);
                        debug!("Remote peer suppressed output");
                    } else if suppressed.swap(false, Ordering::SeqCst) {
                        restore_pending.store(true, Ordering::SeqCst);
                        debug!("Remote peer restored output");
                    }
                }
                Ok(Some(msg)) => {
                    for event in translator.translate(&msg) {
                        events.push(event);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Service channel corrupt: {e}");
                    break 'read;
                }
            }
        }
    }

    events.disconnect();
}

// =============================================================================
// Tests
// =============================================================================
