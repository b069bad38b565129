//! Per-connection session: handshake, client message pump and the
//! paced frame-streaming loop.
//!
//! A session runs in three phases on one stream:
//!
//! 1. [`handshake`](ClientSession::run) — the RFB 3.8 version /
//!    security / init exchange, each step an exact-byte read or write.
//! 2. Idle gate — until the viewer sends its first
//!    FramebufferUpdateRequest, the session only pumps client
//!    messages in short windows and transmits nothing.
//! 3. Streaming — one full-screen RAW update per iteration, with the
//!    pacing sleep doubling as the message-pump window so decoding
//!    never stalls frame delivery.
//!
//! Every error is terminal for the session (socket dropped, no retry,
//! nothing sent to the peer) and recoverable for the server: the
//! listener accepts the next viewer.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::VncError;
use crate::framebuffer::Framebuffer;
use crate::protocol::{
    self, ClientMessage, RectangleHeader, ServerInit, UpdateHeader,
};

// ── Pacing constants ─────────────────────────────────────────────

/// Lower bound of the frame-rate clamp.
pub const MIN_FPS: u8 = 1;

/// Upper bound of the frame-rate clamp. Capped low to stay
/// resource-safe on embedded devices whose UI shares the CPU.
pub const MAX_FPS: u8 = 15;

/// Message-pump window while the viewer has not yet requested an
/// update. Keeps the idle duty cycle low without delaying the first
/// frame noticeably.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ── ClientSession ────────────────────────────────────────────────

/// State for a single viewer connection.
///
/// Exactly one session exists at a time — enforced structurally by
/// the server's serial accept/serve/close loop, not tracked here.
/// The framebuffer is shared read-only across successive sessions.
pub struct ClientSession<S> {
    stream: S,
    framebuffer: Arc<Framebuffer>,
    frame_interval: Duration,
    /// Set by the first FramebufferUpdateRequest. Never cleared for
    /// the life of the session.
    ready: bool,
    /// Scratch buffer for one scanline of pixel data (width × 4).
    line_buf: Vec<u8>,
}

impl<S> ClientSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a session over an accepted stream. `fps` is clamped to
    /// [`MIN_FPS`]..=[`MAX_FPS`].
    pub fn new(stream: S, framebuffer: Arc<Framebuffer>, fps: u8) -> Self {
        let fps = fps.clamp(MIN_FPS, MAX_FPS);
        let row_bytes = framebuffer.geometry().row_bytes();
        Self {
            stream,
            framebuffer,
            frame_interval: Duration::from_millis(1000 / u64::from(fps)),
            ready: false,
            line_buf: vec![0u8; row_bytes],
        }
    }

    /// Serve the connection to completion: handshake, then stream
    /// until the peer disconnects or violates the protocol.
    pub async fn run(&mut self) -> Result<(), VncError> {
        self.handshake().await?;
        self.stream_frames().await
    }

    // ── Handshake ────────────────────────────────────────────────

    /// Drive the RFB 3.8 connection setup.
    ///
    /// 1. Send the 12-byte version string.
    /// 2. Read the client's 12-byte version. Accepted unconditionally;
    ///    no downgrade happens for older clients.
    /// 3. Offer exactly one security type: None.
    /// 4. Read the client's choice; anything else is a violation and
    ///    the connection drops with no result sent.
    /// 5. Send SecurityResult OK — the only reachable outcome.
    /// 6. Read the ClientInit shared flag and ignore it; exclusivity
    ///    comes from serial accept, not from this flag.
    /// 7. Send ServerInit with the device geometry.
    async fn handshake(&mut self) -> Result<(), VncError> {
        self.stream.write_all(protocol::PROTOCOL_VERSION).await?;

        let mut client_version = [0u8; 12];
        self.stream.read_exact(&mut client_version).await?;

        self.stream
            .write_all(&[1, protocol::SECURITY_TYPE_NONE])
            .await?;

        let chosen = self.stream.read_u8().await?;
        if chosen != protocol::SECURITY_TYPE_NONE {
            return Err(VncError::SecurityTypeMismatch { chosen });
        }

        self.stream
            .write_all(&protocol::SECURITY_RESULT_OK.to_be_bytes())
            .await?;

        let _shared = self.stream.read_u8().await?;

        let init = ServerInit::new(self.framebuffer.geometry());
        self.stream.write_all(&init.encode()).await?;
        self.stream.flush().await?;

        debug!(
            width = init.width,
            height = init.height,
            "handshake complete"
        );
        Ok(())
    }

    // ── Streaming loop ───────────────────────────────────────────

    async fn stream_frames(&mut self) -> Result<(), VncError> {
        loop {
            if !self.ready {
                // Gate: no frame data before the viewer's first
                // update request. A viewer that never asks is held
                // indefinitely at this low duty cycle.
                self.pump_messages(IDLE_POLL_INTERVAL).await?;
                continue;
            }

            self.send_frame().await?;
            self.pump_messages(self.frame_interval).await?;
        }
    }

    /// Decode client messages until `window` elapses.
    ///
    /// The window doubles as the pacing sleep: fixed-interval timing
    /// that messages can be handled inside of, but never extend.
    /// Only the type byte is read inside the `select!`; a one-byte
    /// read either completes or consumes nothing, so hitting the
    /// deadline cannot split a message. Payloads are then consumed
    /// with plain awaits.
    async fn pump_messages(&mut self, window: Duration) -> Result<(), VncError> {
        let deadline = Instant::now() + window;
        loop {
            tokio::select! {
                read = self.stream.read_u8() => {
                    let msg_type = read?;
                    self.handle_message(msg_type).await?;
                }
                _ = tokio::time::sleep_until(deadline) => return Ok(()),
            }
        }
    }

    async fn handle_message(&mut self, msg_type: u8) -> Result<(), VncError> {
        let msg = ClientMessage::read_body(msg_type, &mut self.stream).await?;
        trace!(?msg, "client message");
        if msg.is_ready_signal() {
            self.ready = true;
        }
        Ok(())
    }

    /// Transmit one full-screen RAW FramebufferUpdate.
    ///
    /// Header, full-screen rectangle descriptor, then `width × 4`
    /// bytes per scanline copied from `row × stride` — stride padding
    /// is never copied or sent. A write failure anywhere aborts the
    /// session; a partially sent frame is not resumable.
    async fn send_frame(&mut self) -> Result<(), VncError> {
        let geometry = self.framebuffer.geometry();

        let header = UpdateHeader { rectangle_count: 1 };
        self.stream.write_all(&header.encode()).await?;

        let rect = RectangleHeader::full_screen(geometry);
        self.stream.write_all(&rect.encode()).await?;

        for row in 0..geometry.height as usize {
            self.framebuffer.copy_scanline(row, &mut self.line_buf);
            self.stream.write_all(&self.line_buf).await?;
        }
        self.stream.flush().await?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::ScreenGeometry;

    fn tiny_framebuffer() -> Arc<Framebuffer> {
        let geometry = ScreenGeometry {
            width: 2,
            height: 2,
            bits_per_pixel: 32,
            stride: 8,
        };
        Arc::new(Framebuffer::from_frame(geometry, vec![0u8; 16]).unwrap())
    }

    #[test]
    fn fps_clamped_into_range() {
        let (stream, _peer) = tokio::io::duplex(64);
        let session = ClientSession::new(stream, tiny_framebuffer(), 0);
        assert_eq!(session.frame_interval, Duration::from_millis(1000));

        let (stream, _peer) = tokio::io::duplex(64);
        let session = ClientSession::new(stream, tiny_framebuffer(), 100);
        assert_eq!(session.frame_interval, Duration::from_millis(1000 / 15));
    }

    #[test]
    fn line_buffer_sized_to_row() {
        let (stream, _peer) = tokio::io::duplex(64);
        let session = ClientSession::new(stream, tiny_framebuffer(), 3);
        assert_eq!(session.line_buf.len(), 8);
    }
}
