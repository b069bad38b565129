//! # fbvnc — framebuffer VNC server
//!
//! Serves a Linux framebuffer device (`/dev/fb0` by default) to a
//! single VNC viewer over RFB 3.8. The device is opened read-only and
//! memory-mapped once at startup; connections are served strictly one
//! at a time, full-frame RAW updates at a capped frame rate.
//!
//! Deliberate limitations, inherited from the deployment target (an
//! embedded device whose UI draws straight into the framebuffer):
//! no authentication, no input injection, no incremental updates, no
//! encodings beyond RAW.

pub mod config;
pub mod service;
