//! fbvnc — entry point.
//!
//! ```text
//! fbvnc                        Serve /dev/fb0 on port 5900 at 3 fps
//! fbvnc -f /dev/fb1            Use a different framebuffer device
//! fbvnc -p 5901 --fps 5        Override port and frame rate
//! fbvnc --config <path>        Load a config TOML
//! fbvnc --gen-config           Write the default config to stdout
//! ```
//!
//! CLI flags override values from the config file.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fbvnc_server::config::ServerConfig;
use fbvnc_server::service::FbVncService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fbvnc", about = "Read-only framebuffer VNC server")]
struct Cli {
    /// Framebuffer device path.
    #[arg(short = 'f', long)]
    device: Option<PathBuf>,

    /// TCP port to listen on.
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Frames per second (clamped to 1..=15).
    #[arg(long)]
    fps: Option<u8>,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "fbvnc.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ServerConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config, then apply CLI overrides.
    let mut config = ServerConfig::load(&cli.config);
    if let Some(device) = cli.device {
        config.device.path = device;
    }
    if let Some(port) = cli.port {
        config.network.port = port;
    }
    if let Some(fps) = cli.fps {
        config.stream.fps = fps;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("fbvnc v{}", env!("CARGO_PKG_VERSION"));
    info!("device: {}", config.device.path.display());
    info!("port: {}", config.network.port);
    info!("target fps: {}", config.stream.clamped_fps());

    let service = FbVncService::new(config);
    let stop = service.stop_handle();

    // Ctrl-C handler: let the current session wind down, then exit 0.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        stop.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    // Fatal setup failures (device, geometry, bind) surface here and
    // exit non-zero.
    service.run().await?;

    Ok(())
}
