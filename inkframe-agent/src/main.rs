use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

pub mod identity;
pub mod input;
pub mod presenter;

use api_client::{ClientConfig, InkframeClient};
use identity::MachineIdProvider;
use inkframe_state::{
    DeviceIdProvider, DisplayGeometry, DisplayLoop, FramePresenter, LoggingMode, LoopOptions,
    StaticDeviceId,
};
use presenter::{LogPresenter, PbmPresenter};

/// InkFrame display agent
///
/// Runs the device control loop on a host machine: polls the server,
/// downloads frames and writes each committed frame to disk. Type `t` and
/// Enter to toggle between dashboard and photos, `n` for the next photo.
#[derive(Parser, Debug)]
#[command(name = "inkframe-agent")]
#[command(about = "InkFrame display agent - poll, fetch and present frames")]
#[command(version)]
pub struct Args {
    /// Server base URL
    #[arg(short, long, env = "INKFRAME_SERVER", default_value = "https://www.eink-luvia.com")]
    pub server: String,

    /// Device id; derived from /etc/machine-id when not set
    #[arg(short, long, env = "INKFRAME_DEVICE_ID")]
    pub device_id: Option<String>,

    /// Panel width in pixels
    #[arg(long, default_value = "200")]
    pub width: u32,

    /// Panel height in pixels
    #[arg(long, default_value = "200")]
    pub height: u32,

    /// Panel identifier reported at registration
    #[arg(long, default_value = "154_BW")]
    pub display_type: String,

    /// Write each committed frame to this PBM file; frames are only logged
    /// when unset
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Control loop tick in milliseconds
    #[arg(long, default_value = "50")]
    pub tick_ms: u64,

    /// Connect timeout in seconds
    #[arg(long, default_value = "15")]
    pub connect_timeout: u64,

    /// Deadline for receiving a whole bitmap, in seconds
    #[arg(long, default_value = "10")]
    pub read_deadline: u64,

    /// Skip health check and registration at startup
    #[arg(long)]
    pub no_register: bool,

    /// Log mode (silent, development, debug, json)
    #[arg(long, env = "INKFRAME_LOG_MODE", default_value = "development")]
    pub log_mode: String,
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        if !self.server.starts_with("http://") && !self.server.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "Server URL must start with http:// or https://, got '{}'",
                self.server
            ));
        }

        if self.width == 0 || self.height == 0 {
            return Err(anyhow::anyhow!(
                "Invalid panel size {}x{}",
                self.width,
                self.height
            ));
        }

        if self.tick_ms == 0 {
            return Err(anyhow::anyhow!("Tick interval must be positive"));
        }

        if self.connect_timeout == 0 || self.read_deadline == 0 {
            return Err(anyhow::anyhow!("Timeouts must be positive"));
        }

        if let Some(id) = &self.device_id {
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(anyhow::anyhow!(
                    "Device id must be a hexadecimal string, got '{}'",
                    id
                ));
            }
        }

        match self.log_mode.to_lowercase().as_str() {
            "silent" | "development" | "debug" | "json" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log mode '{}'. Valid modes: silent, development, debug, json",
                    self.log_mode
                ));
            }
        }

        Ok(())
    }
}

/// How log output is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Mode(LoggingMode),
    Json,
}

/// Configuration derived from command line arguments and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    pub device_id: Option<String>,
    pub options: LoopOptions,
    pub output: Option<PathBuf>,
    pub tick: Duration,
    pub log_output: LogOutput,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let client = ClientConfig::new(args.server)
            .with_connect_timeout(Duration::from_secs(args.connect_timeout))
            .with_bitmap_read_deadline(Duration::from_secs(args.read_deadline));

        let log_output = match args.log_mode.to_lowercase().as_str() {
            "json" => LogOutput::Json,
            name => LogOutput::Mode(inkframe_state::logging::mode_from_name(name)),
        };

        Self {
            client,
            device_id: args.device_id,
            options: LoopOptions {
                geometry: DisplayGeometry::new(args.width, args.height),
                display_type: args.display_type,
                register_on_startup: !args.no_register,
                ..Default::default()
            },
            output: args.output,
            tick: Duration::from_millis(args.tick_ms),
            log_output,
        }
    }
}

impl Config {
    /// Create configuration from command line arguments and environment variables
    pub fn from_env() -> Result<Self> {
        let args = Args::parse();
        args.validate()?;
        let config = Config::from(args);
        config
            .client
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid client configuration: {}", e))?;
        Ok(config)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        info!("Configuration:");
        info!("  Server: {}", self.client.base_url);
        info!(
            "  Panel: {}x{} ({})",
            self.options.geometry.width, self.options.geometry.height, self.options.display_type
        );
        info!("  Register on startup: {}", self.options.register_on_startup);
        match &self.output {
            Some(path) => info!("  Frame output: {}", path.display()),
            None => info!("  Frame output: log only"),
        }
        info!("  Tick: {}ms", self.tick.as_millis());
    }
}

/// Initialize tracing for the selected output
///
/// A no-op when a global subscriber is already installed.
fn init_tracing(output: LogOutput) -> Result<()> {
    if inkframe_state::is_initialized() {
        return Ok(());
    }

    match output {
        LogOutput::Mode(mode) => {
            inkframe_state::init_logging(mode).context("Failed to initialize logging")
        }
        LogOutput::Json => {
            let filter = std::env::var("INKFRAME_LOG_LEVEL")
                .map(tracing_subscriber::EnvFilter::new)
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
        }
    }
}

/// Run the display loop until `running` is cleared
fn run<P: FramePresenter>(config: Config, presenter: P, running: Arc<AtomicBool>) -> Result<()> {
    let identity: Box<dyn DeviceIdProvider> = match &config.device_id {
        Some(id) => Box::new(StaticDeviceId(id.clone())),
        None => Box::new(MachineIdProvider::default()),
    };
    let device_id = identity.device_id();
    info!(device_id = %device_id, "starting display agent");

    let client = InkframeClient::new(config.client.clone(), device_id);
    let mut display = DisplayLoop::new(client, presenter, identity.as_ref(), config.options);

    let events = input::spawn_stdin_reader().context("Failed to start input reader")?;

    display.startup(Instant::now());

    while running.load(Ordering::SeqCst) {
        let report = display.tick(Instant::now(), events.try_recv().ok());
        if report.presented {
            let generation = display.machine().frame().generation();
            let mode = display.machine().state().mode.as_wire();
            info!(
                generation = generation,
                mode = mode,
                "frame presented"
            );
        }
        std::thread::sleep(config.tick);
    }

    info!("shutting down");
    Ok(())
}

fn main() -> Result<()> {
    // Parse configuration from command line and environment
    let config = Config::from_env().context("Failed to parse configuration")?;

    init_tracing(config.log_output)?;
    config.print_summary();

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    let result = match config.output.clone() {
        Some(path) => run(config, PbmPresenter::new(path), running),
        None => run(config, LogPresenter::default(), running),
    };

    if let Err(e) = &result {
        error!("Display agent failed: {:#}", e);
    }
    result
}
