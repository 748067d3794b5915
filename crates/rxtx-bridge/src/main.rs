//! RXTX bridge: host entry point.
//!
//! Runs the device firmware's boot sequence on a development host: the
//! EEPROM is a file, the operator console is this terminal, the network link
//! is a bindable TCP port and the serial side is a device file such as
//! `/dev/ttyUSB0`.
//!
//! # Usage
//!
//! ```text
//! rxtx-bridge [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Runtime config file [default: platform config dir]
//!   --eeprom <PATH>   EEPROM image file (overrides [storage] eeprom_path)
//!   --serial <PATH>   Serial device (overrides [bridge] serial_path)
//!   --no-gpio         Do not touch sysfs GPIO even if the config enables it
//!   --write-config    Write the effective config to the config path and exit
//! ```
//!
//! | Variable        | Flag         |
//! |-----------------|--------------|
//! | `RXTX_CONFIG`   | `--config`   |
//! | `RXTX_EEPROM`   | `--eeprom`   |
//! | `RXTX_SERIAL`   | `--serial`   |
//!
//! Logs go to stderr; stdout belongs to the operator console.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rxtx_core::SettingsRecord;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rxtx_bridge::application::boot::{await_restart, BootOptions, BootOutcome, BootSequence, RESTART_POLL_INTERVAL_MS};
use rxtx_bridge::application::menu::DeviceProfile;
use rxtx_bridge::application::ports::{Gpio, Peripherals};
use rxtx_bridge::infrastructure::console::{StdioConsole, ThreadDelay};
use rxtx_bridge::infrastructure::gpio::{sysfs::SysfsGpio, NullGpio};
use rxtx_bridge::infrastructure::network::{
    bridge::TcpSerialBridge, link::HostNetworkLink, publisher::LogPublisher,
};
use rxtx_bridge::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};
use rxtx_bridge::infrastructure::storage::eeprom::FileEeprom;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Network-to-serial bridge with a terminal configuration menu.
#[derive(Debug, Parser)]
#[command(
    name = "rxtx-bridge",
    about = "TCP-to-serial bridge with checksummed settings and a configuration menu",
    version
)]
struct Cli {
    /// Runtime configuration file.
    #[arg(long, env = "RXTX_CONFIG")]
    config: Option<PathBuf>,

    /// EEPROM image file holding the device settings.
    #[arg(long, env = "RXTX_EEPROM")]
    eeprom: Option<PathBuf>,

    /// Serial device the TCP stream is forwarded to.
    #[arg(long, env = "RXTX_SERIAL")]
    serial: Option<PathBuf>,

    /// Never touch GPIO, whatever the config file says.
    #[arg(long)]
    no_gpio: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("resolving the default config path"),
        }
    }

    /// Applies the command-line overrides on top of the file.
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(eeprom) = &self.eeprom {
            config.storage.eeprom_path = eeprom.clone();
        }
        if let Some(serial) = &self.serial {
            config.bridge.serial_path = Some(serial.clone());
        }
        if self.no_gpio {
            config.gpio.enabled = false;
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path()?;
    let config = load_config_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let config = cli.apply(config);

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the config file's level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.device.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.write_config {
        save_config_to(&config_path, &config)
            .with_context(|| format!("writing config to {}", config_path.display()))?;
        info!(path = %config_path.display(), "configuration written");
        return Ok(());
    }

    info!(
        eeprom = %config.storage.eeprom_path.display(),
        serial = ?config.bridge.serial_path,
        access_point = config.device.access_point,
        "RXTX bridge starting"
    );

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                running_clone.store(false, Ordering::SeqCst);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // The device loop is blocking and poll-driven.
    let outcome = tokio::task::spawn_blocking(move || run_device(&config, running))
        .await
        .context("device task panicked")??;

    info!(?outcome, "RXTX bridge stopped");
    Ok(())
}

/// Builds the host adapters and runs one power-on of the device.
fn run_device(config: &AppConfig, running: Arc<AtomicBool>) -> anyhow::Result<BootOutcome> {
    let bind_address: IpAddr = config
        .network
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.network.bind_address))?;

    let mut console = StdioConsole::spawn(Arc::clone(&running)).context("starting the console reader")?;
    let mut delay = ThreadDelay;
    let mut storage = FileEeprom::new(&config.storage.eeprom_path);
    let mut link = HostNetworkLink::new(
        bind_address,
        config.network.bring_up_attempts,
        Duration::from_millis(config.network.bring_up_interval_ms),
    );
    let mut publisher = LogPublisher::new();
    let mut bridge = TcpSerialBridge::new(bind_address, config.bridge.serial_path.clone());
    let mut gpio: Box<dyn Gpio> = if config.gpio.enabled {
        Box::new(SysfsGpio::new(&config.gpio.sysfs_root))
    } else {
        Box::new(NullGpio)
    };

    let mut io = Peripherals {
        console: &mut console,
        delay: &mut delay,
        storage: &mut storage,
        link: &mut link,
        publisher: &mut publisher,
        gpio: gpio.as_mut(),
        bridge: &mut bridge,
    };
    let options = BootOptions {
        profile: DeviceProfile {
            access_point: config.device.access_point,
        },
        console_poll_interval_ms: config.console.poll_interval_ms,
        idle_interval_ms: config.bridge.idle_interval_ms,
    };

    let mut record = SettingsRecord::default();
    let outcome = BootSequence::new(&mut io, options, Arc::clone(&running)).run(&mut record);

    if let BootOutcome::AwaitRestart { reason, .. } = outcome {
        info!(?reason, "waiting for restart (Ctrl+C to exit)");
        await_restart(&mut *io.delay, &running, RESTART_POLL_INTERVAL_MS);
    }
    Ok(outcome)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
