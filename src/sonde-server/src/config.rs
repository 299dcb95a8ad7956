// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for the `sonde-server` daemon.
//!
//! Config is loaded from `auto-rx.toml`. Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./auto-rx.toml`
//! 3. `$XDG_CONFIG_HOME/auto-rx/auto-rx.toml`
//! 4. `/etc/auto-rx/auto-rx.toml`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sonde_app::{ConfigError, ConfigFile};

/// Top-level configuration for the `sonde-server` daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRxConfig {
    pub general: GeneralConfig,
    pub scan: ScanConfig,
    pub decode: DecodeConfig,
    /// One entry per configured SDR device, keyed by device id.
    pub sdr_settings: HashMap<String, SdrDeviceConfig>,
}

/// General daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub callsign: Option<String>,
    pub log_level: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Directory per-sonde CSV logs are written to.
    pub logging_path: String,
    /// Path to the external scanner/decoder binary (`rs_path`).
    pub rs_path: String,
    /// Optional RS92 ephemeris file, forwarded to decoders.
    pub rs92_ephemeris: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            callsign: None,
            log_level: None,
            latitude: None,
            longitude: None,
            logging_path: "./log".to_string(),
            rs_path: "./rs_utils".to_string(),
            rs92_ephemeris: None,
        }
    }
}

/// Scanner sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Sweep lower bound, MHz.
    pub min_freq: f64,
    /// Sweep upper bound, MHz.
    pub max_freq: f64,
    /// Search step, Hz.
    pub search_step: f64,
    /// Frequencies (MHz) always treated as in-scope detections.
    pub whitelist: Vec<f64>,
    /// Frequencies (MHz) given priority but not auto-detected.
    pub greylist: Vec<f64>,
    /// Frequencies (MHz) never dispatched to a decoder.
    pub blacklist: Vec<f64>,
    pub snr_threshold: f64,
    /// Minimum frequency separation (Hz) between distinct detections.
    pub min_distance: f64,
    /// Frequency quantization step (Hz) applied to scan bins.
    pub quantization: f64,
    pub scan_dwell_time: u64,
    pub detect_dwell_time: u64,
    pub max_peaks: u32,
    pub sdr_power: f64,
    pub sdr_fm: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_freq: 400.0,
            max_freq: 406.0,
            search_step: 800.0,
            whitelist: Vec::new(),
            greylist: Vec::new(),
            blacklist: Vec::new(),
            snr_threshold: 10.0,
            min_distance: 1000.0,
            quantization: 1000.0,
            scan_dwell_time: 20,
            detect_dwell_time: 5,
            max_peaks: 10,
            sdr_power: -10.0,
            sdr_fm: false,
        }
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Seconds of no valid frame before a decoder self-terminates.
    pub rx_timeout: u64,
    /// Whether the per-sonde CSV log sink is enabled.
    pub per_sonde_log: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            rx_timeout: 180,
            per_sonde_log: true,
        }
    }
}

/// Static per-device SDR settings (`[sdr_settings.<device_id>]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SdrDeviceConfig {
    pub bias: bool,
    pub ppm: i32,
    /// Gain in dB; -1 selects hardware AGC.
    pub gain: f64,
}

impl AutoRxConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;
        validate_coordinates(self.general.latitude, self.general.longitude)?;

        if self.general.logging_path.trim().is_empty() {
            return Err("[general].logging_path must not be empty".to_string());
        }
        if self.general.rs_path.trim().is_empty() {
            return Err("[general].rs_path must not be empty".to_string());
        }

        if self.scan.min_freq <= 0.0 || self.scan.max_freq <= 0.0 {
            return Err("[scan].min_freq and max_freq must be > 0".to_string());
        }
        if self.scan.min_freq >= self.scan.max_freq {
            return Err("[scan].min_freq must be less than max_freq".to_string());
        }
        if self.scan.search_step <= 0.0 {
            return Err("[scan].search_step must be > 0".to_string());
        }
        if self.scan.max_peaks == 0 {
            return Err("[scan].max_peaks must be > 0".to_string());
        }

        if self.decode.rx_timeout == 0 {
            return Err("[decode].rx_timeout must be > 0".to_string());
        }

        for (device_id, settings) in &self.sdr_settings {
            if settings.gain < -1.0 {
                return Err(format!(
                    "[sdr_settings.{device_id}].gain must be >= -1 (-1 selects AGC)"
                ));
            }
        }

        Ok(())
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{level}' is invalid (expected one of: trace, debug, info, warn, error)"
                ))
            }
        }
    }
    Ok(())
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), String> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err("[general].latitude must be in range -90..=90".to_string());
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err("[general].longitude must be in range -180..=180".to_string());
            }
            Ok(())
        }
        (None, None) => Ok(()),
        _ => Err(
            "[general].latitude and [general].longitude must be set together or both omitted"
                .to_string(),
        ),
    }
}

impl ConfigFile for AutoRxConfig {
    fn config_filename() -> &'static str {
        "auto-rx.toml"
    }
}

impl AutoRxConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        <Self as ConfigFile>::load_from_file(path)
    }

    pub fn load(explicit_path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        <Self as ConfigFile>::load(explicit_path)
    }
}
