//! freerds-surface-demo - Standalone surface exerciser
//!
//! Runs the host loop a framebuffer library would run against the surface:
//! connect to a FreeRDS session service, paint a moving test bar into the
//! shared framebuffer, report damage, and log the input events the service
//! sends back. Useful for poking at a session service without a full host.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use freerds_surface::config::Config;
use freerds_surface::geometry::Region;
use freerds_surface::{
    service, utils, ControlEvent, Event, Framebuffer, FreerdsSurface, Surface,
};

/// Command-line arguments for freerds-surface-demo
#[derive(Parser, Debug)]
#[command(name = "freerds-surface-demo")]
#[command(version, about = "FreeRDS shared-framebuffer surface demo", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/freerds-surface/config.toml")]
    pub config: String,

    /// Session id the service socket is registered under
    #[arg(short, long, env = "FREERDS_SURFACE_SESSION_ID")]
    pub session_id: Option<u32>,

    /// Endpoint name within the session
    #[arg(short, long, env = "FREERDS_SURFACE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Directory holding the service sockets
    #[arg(long)]
    pub pipe_dir: Option<std::path::PathBuf>,

    /// Number of frames to paint before exiting
    #[arg(long, default_value = "300")]
    pub frames: u32,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration before logging init so its level can apply, but keep
    // the load error around until there is a subscriber to report it to.
    let (config, load_err) = match Config::load(&args.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let config = config.with_overrides(
        args.session_id,
        args.endpoint.clone(),
        args.pipe_dir.clone(),
    );

    let _guard = init_logging(&args, &config.logging.level)?;

    utils::log_startup_info();

    if let Some(e) = load_err {
        tracing::warn!("Failed to load config: {:#}, using defaults", e);
    }
    if let Err(e) = config.validate().context("validating configuration") {
        eprintln!("{}", utils::format_user_error(&e));
        return Err(e);
    }

    info!("Configuration loaded successfully");
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = run_demo(&config, args.frames) {
        eprintln!("{}", utils::format_user_error(&e));
        return Err(e);
    }

    info!("Demo shut down");
    Ok(())
}

/// The host loop a framebuffer library would drive
fn run_demo(config: &Config, frames: u32) -> Result<()> {
    let socket = service::pipe_path(
        &config.session.pipe_dir,
        config.session.id,
        &config.session.endpoint,
    );
    info!("Session service socket: {}", socket.display());

    let mut surface = FreerdsSurface::new(config.session.clone(), config.input.queue_depth);

    let mut fb = Framebuffer::new(0, 0, config.display.format);
    surface.defaults(&mut fb);
    fb.width = config.display.width;
    fb.height = config.display.height;
    fb.format = config.display.format;

    surface
        .initialise(&mut fb)
        .with_context(|| format!("initialising surface (service socket {})", socket.display()))?;

    info!(
        "Surface up: {}x{} {} ({} frames)",
        fb.width, fb.height, fb.format, frames
    );

    let mut disconnected = false;
    'frames: for frame in 0..frames {
        let dirty = draw_test_bar(&mut fb, frame);
        surface
            .update(&mut fb, &dirty)
            .with_context(|| format!("painting frame {frame}"))?;

        // Drain input for one frame interval. The blocking poll doubles as
        // the frame clock.
        let deadline = Instant::now() + Duration::from_millis(16);
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if timeout.is_zero() {
                break;
            }
            match surface.input(Some(timeout)) {
                Some(Event::Control(ControlEvent::Disconnected)) => {
                    info!("Session service disconnected");
                    disconnected = true;
                    break 'frames;
                }
                Some(event) => debug!("Input event: {:?}", event),
                None => break,
            }
        }
    }

    surface.finalise(&mut fb);
    if !disconnected {
        info!("Painted {} frames", frames);
    }
    Ok(())
}

/// Paint one frame of the demo animation and return the damaged region
///
/// A white bar sweeps left to right over a gray background. Only the two
/// bar positions (old and new) are touched, so the damage regions stay
/// small and exercise the tile alignment in `update`.
fn draw_test_bar(fb: &mut Framebuffer, frame: u32) -> Region {
    let width = fb.width;
    let height = fb.height;
    let stride = fb.stride_bytes();
    let bpp = fb.format.bytes_per_pixel() as usize;

    let bar = 64.min(width);
    let step = 8;
    let travel = width - bar + 1;
    let x_new = (frame * step) % travel;
    let x_old = (frame.saturating_sub(1) * step) % travel;

    let Some(data) = fb.data_mut() else {
        return Region::EMPTY;
    };

    let mut fill = |x0: u32, byte: u8| {
        for y in 0..height as usize {
            let start = y * stride + x0 as usize * bpp;
            data[start..start + bar as usize * bpp].fill(byte);
        }
    };
    fill(x_old, 0x20);
    fill(x_new, 0xff);

    Region::from_size(x_old as i32, 0, bar, height)
        .union(&Region::from_size(x_new as i32, 0, bar, height))
}

fn init_logging(
    args: &Args,
    config_level: &str,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => config_level,
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "freerds_surface={level},freerds_surface_demo={level},warn",
            level = log_level
        ))
    });

    // If log file is specified, write to both stderr and file. Console
    // output stays on stderr so failures land there and stdout stays clean.
    if let Some(log_file_path) = &args.log_file {
        let file = File::create(log_file_path)?;
        let (writer, guard) = tracing_appender::non_blocking(file);

        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path);
        Ok(Some(guard))
    } else {
        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
        }
        Ok(None)
    }
}
