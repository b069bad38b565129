//! Serial-accept behavior over real TCP on localhost: a second
//! viewer must not be served while a session is active.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use fbvnc_core::framebuffer::{Framebuffer, ScreenGeometry};
use fbvnc_server::config::ServerConfig;
use fbvnc_server::service::{bind_listener, FbVncService};

fn synthetic_framebuffer() -> Framebuffer {
    let geometry = ScreenGeometry {
        width: 8,
        height: 8,
        bits_per_pixel: 32,
        stride: 32,
    };
    Framebuffer::from_frame(geometry, vec![0u8; geometry.frame_bytes()]).unwrap()
}

#[tokio::test]
async fn second_connection_waits_for_first_to_close() {
    let listener = bind_listener(0).unwrap();
    let addr = listener.local_addr().unwrap();

    let service = Arc::new(FbVncService::new(ServerConfig::default()));
    let server = Arc::clone(&service);
    tokio::spawn(async move {
        server.serve_on(listener, synthetic_framebuffer()).await
    });

    // First viewer is accepted and greeted.
    let mut first = TcpStream::connect(addr).await.unwrap();
    let mut version = [0u8; 12];
    tokio::time::timeout(Duration::from_secs(5), first.read_exact(&mut version))
        .await
        .expect("first viewer must be greeted")
        .unwrap();
    assert_eq!(&version, b"RFB 003.008\n");

    // A second connection completes at the TCP level (it sits in the
    // backlog) but is not served while the first session is active.
    let mut second = TcpStream::connect(addr).await.unwrap();
    let mut buf = [0u8; 12];
    let waited =
        tokio::time::timeout(Duration::from_millis(500), second.read_exact(&mut buf)).await;
    assert!(
        waited.is_err(),
        "second viewer was served while the first was still connected"
    );

    // Once the first viewer disconnects, the second is picked up.
    drop(first);
    tokio::time::timeout(Duration::from_secs(5), second.read_exact(&mut buf))
        .await
        .expect("second viewer must be served after the first closes")
        .unwrap();
    assert_eq!(&buf, b"RFB 003.008\n");

    service.stop();
}
