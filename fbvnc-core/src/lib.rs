//! # fbvnc-core
//!
//! Core library for the fbvnc server: serves a device's raw
//! framebuffer to a single VNC viewer over RFB 3.8, read-only.
//!
//! This crate contains:
//! - **Framebuffer**: read-only device open, geometry query and
//!   shared memory mapping (`framebuffer`)
//! - **Protocol**: the RFB 3.8 wire subset as explicit byte-layout
//!   encode/decode routines (`protocol`)
//! - **Session**: the per-connection handshake state machine and the
//!   gated, paced frame-streaming loop (`session`)
//! - **Error**: `VncError` — typed, `thiserror`-based error hierarchy
//!
//! What it deliberately does not do: authentication or encryption,
//! more than one simultaneous viewer, input injection, incremental
//! updates, or any encoding other than RAW.

pub mod error;
pub mod framebuffer;
pub mod protocol;
pub mod session;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use error::VncError;
pub use framebuffer::{Framebuffer, ScreenGeometry};
pub use protocol::{ClientMessage, PixelFormat, RectangleHeader, ServerInit, UpdateHeader};
pub use session::{ClientSession, MAX_FPS, MIN_FPS};
