// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod decoder_process;
mod scanner_process;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use sonde_app::init_logging;
use sonde_core::device::{Device, DeviceRegistry};
use sonde_core::scan::{Detection, ScanResultChannel};
use sonde_core::scheduler::{Scheduler, SchedulerState};
use sonde_reporting::ExporterSink;

use config::AutoRxConfig;
use decoder_process::ProcessDecoder;
use scanner_process::ProcessScanner;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - radiosonde reception daemon");
/// Grace period after broadcasting shutdown before aborting any task that
/// hasn't wound down on its own, matching `trx-server`'s shutdown sequence.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(400);

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Decode only this frequency (MHz), skipping the scan sweep
    #[arg(long = "frequency", short = 'f', value_name = "MHZ")]
    frequency: Option<f64>,
    /// RS92 ephemeris file, forwarded to the decoder
    #[arg(long = "ephemeris", short = 'e', value_name = "FILE")]
    ephemeris: Option<PathBuf>,
}

fn build_registry(cfg: &AutoRxConfig) -> Result<DeviceRegistry, String> {
    if cfg.sdr_settings.is_empty() {
        return Err("no SDR devices configured; add at least one [sdr_settings.<id>] section".to_string());
    }
    let mut device_ids: Vec<&String> = cfg.sdr_settings.keys().collect();
    device_ids.sort();

    let mut registry = DeviceRegistry::new();
    for device_id in device_ids {
        let settings = &cfg.sdr_settings[device_id];
        registry.add(Device::new(
            device_id.clone(),
            settings.bias,
            settings.ppm,
            settings.gain,
        ));
    }
    Ok(registry)
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let (mut cfg, config_path) =
        AutoRxConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;

    if let Some(freq) = cli.frequency {
        cfg.scan.whitelist = vec![freq];
    }
    let ephemeris = cli
        .ephemeris
        .map(|p| p.display().to_string())
        .or_else(|| cfg.general.rs92_ephemeris.clone());

    cfg.validate()
        .map_err(|e| format!("invalid configuration: {e}"))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("loaded configuration from {}", path.display());
    }

    let registry = build_registry(&cfg)?;
    info!(devices = registry.len(), "SDR devices registered");

    std::fs::create_dir_all(&cfg.general.logging_path)
        .map_err(|e| format!("failed to create logging directory: {e}"))?;
    let logging_dir = PathBuf::from(&cfg.general.logging_path);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    runtime.block_on(async_main(cli.frequency, cfg, ephemeris, registry, logging_dir))
}

async fn async_main(
    frequency_override: Option<f64>,
    cfg: AutoRxConfig,
    ephemeris: Option<String>,
    registry: DeviceRegistry,
    logging_dir: PathBuf,
) -> Result<(), String> {
    let (scan_tx, scan_rx) = ScanResultChannel::new();
    let mut state = SchedulerState::new(registry, scan_rx);

    let scanner = ProcessScanner::new(
        cfg.general.rs_path.clone(),
        cfg.scan.clone(),
        cfg.sdr_settings.clone(),
        scan_tx.clone(),
    );

    let shared_sinks: Arc<Vec<Box<dyn ExporterSink>>> = Arc::new(Vec::new());
    let per_sonde_log_dir = cfg.decode.per_sonde_log.then(|| logging_dir.clone());
    let decoder = ProcessDecoder::new(
        cfg.general.rs_path.clone(),
        Duration::from_secs(cfg.decode.rx_timeout),
        ephemeris,
        cfg.sdr_settings.clone(),
        shared_sinks,
        per_sonde_log_dir,
    );

    // `--frequency` forces immediate decode-only operation: inject a single
    // detection up front rather than waiting for the scanner to find it.
    if let Some(freq) = frequency_override {
        let _ = scan_tx.send(vec![Detection {
            frequency_mhz: freq,
            sonde_type: "UNKNOWN".to_string(),
        }]);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new();

    let scheduler_handle = tokio::spawn(async move {
        let mut state = state;
        scheduler.run(&mut state, &scanner, &decoder, shutdown_rx).await;
    });

    info!("sonde-server running, press Ctrl+C to stop");
    if let Err(e) = signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
    } else {
        info!("Ctrl+C received, shutting down");
    }
    let _ = shutdown_tx.send(true);

    tokio::time::sleep(SHUTDOWN_GRACE).await;
    if !scheduler_handle.is_finished() {
        scheduler_handle.abort();
    }
    let _ = scheduler_handle.await;

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sonde-server: {e}");
            ExitCode::FAILURE
        }
    }
}
