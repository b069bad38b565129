//! The accept-loop service: one viewer at a time.
//!
//! Binds the listen socket with backlog 1 and serves connections
//! strictly serially — a session runs to completion (handshake
//! through streaming) before the next `accept`, which is what
//! enforces the single-viewer rule. No session registry exists or is
//! needed. The framebuffer mapping is established once and shared
//! read-only across every successive session.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket};
use tracing::info;

use fbvnc_core::framebuffer::Framebuffer;
use fbvnc_core::session::ClientSession;
use fbvnc_core::VncError;

use crate::config::ServerConfig;

// ── Listener ─────────────────────────────────────────────────────

/// Bind 0.0.0.0:`port` with SO_REUSEADDR and a listen backlog of 1.
///
/// The backlog of 1 means a second connection attempt queues at the
/// OS and is only accepted after the active session's socket closes.
pub fn bind_listener(port: u16) -> Result<TcpListener, VncError> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(SocketAddr::from(([0, 0, 0, 0], port)))?;
    Ok(socket.listen(1)?)
}

// ── FbVncService ─────────────────────────────────────────────────

/// The top-level server: framebuffer setup plus the serial accept
/// loop.
pub struct FbVncService {
    config: ServerConfig,
    running: Arc<AtomicBool>,
}

impl FbVncService {
    /// Create a new service with the given config.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle that can stop the accept loop from another task.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Signal the service to stop after the current session ends.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the service is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Open the framebuffer, bind the listener and serve until
    /// stopped.
    ///
    /// Errors returned here are fatal: device open/query/mapping
    /// failure, unsupported bit depth, or bind/listen failure leave
    /// the server fundamentally non-functional.
    pub async fn run(&self) -> Result<(), VncError> {
        let framebuffer = Framebuffer::open(&self.config.device.path)?;
        let listener = bind_listener(self.config.network.port)?;
        self.serve_on(listener, framebuffer).await
    }

    /// Serve an already-bound listener with an already-opened
    /// framebuffer. Split out from [`run`](Self::run) so tests can
    /// inject an ephemeral port and a synthetic frame source.
    pub async fn serve_on(
        &self,
        listener: TcpListener,
        framebuffer: Framebuffer,
    ) -> Result<(), VncError> {
        self.running.store(true, Ordering::SeqCst);

        let framebuffer = Arc::new(framebuffer);
        let geometry = framebuffer.geometry();
        let fps = self.config.stream.clamped_fps();
        info!(
            "listening on {}, fb {}x{}@32bpp stride={} fps={}",
            listener.local_addr()?,
            geometry.width,
            geometry.height,
            geometry.stride,
            fps,
        );

        while self.running.load(Ordering::SeqCst) {
            let accept = tokio::select! {
                result = listener.accept() => result,
                _ = Self::wait_for_stop(&self.running) => break,
            };

            let (stream, peer) = match accept {
                Ok(pair) => pair,
                // A signal-interrupted accept is transient; anything
                // else leaves the listener with no recovery path.
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            info!("viewer connected from {peer}");

            // Serve this session to completion before the next
            // accept — this is the single-viewer enforcement.
            let mut session = ClientSession::new(stream, Arc::clone(&framebuffer), fps);
            match session.run().await {
                Ok(()) => info!("viewer {peer} disconnected"),
                Err(e) => info!("viewer {peer} disconnected: {e}"),
            }
            // Session state (scanline buffer included) is dropped
            // here, before the listener re-enters the accept wait.
        }

        info!("fbvnc service stopped");
        Ok(())
    }

    /// Async helper: resolves when `running` becomes false.
    async fn wait_for_stop(running: &Arc<AtomicBool>) {
        loop {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_creates_with_defaults() {
        let svc = FbVncService::new(ServerConfig::default());
        assert!(!svc.is_running());
    }

    #[test]
    fn stop_handle_flips_running() {
        let svc = FbVncService::new(ServerConfig::default());
        let handle = svc.stop_handle();
        handle.store(true, Ordering::SeqCst);
        assert!(svc.is_running());
        svc.stop();
        assert!(!svc.is_running());
    }

    #[tokio::test]
    async fn listener_binds_ephemeral_port() {
        let listener = bind_listener(0).unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }
}
