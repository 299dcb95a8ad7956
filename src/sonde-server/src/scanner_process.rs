// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The scanner task adapter: spawns `rs_path`'s scan subcommand as a child
//! process bound to one SDR and forwards its newline-delimited JSON detection
//! batches into the scheduler's scan-result channel.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

use sonde_core::scan::{Detection, ScanResultSender};
use sonde_core::scheduler::ScannerFactory;
use sonde_core::task::{TaskError, TaskHandle};

use crate::config::{ScanConfig, SdrDeviceConfig};

/// Builds [`ScannerTask`]s bound to a single `rs_path` binary and sweep
/// configuration, shared by every device the scheduler starts a scanner on.
pub struct ProcessScanner {
    rs_path: String,
    config: ScanConfig,
    device_settings: HashMap<String, SdrDeviceConfig>,
    results: ScanResultSender,
}

impl ProcessScanner {
    pub fn new(
        rs_path: impl Into<String>,
        config: ScanConfig,
        device_settings: HashMap<String, SdrDeviceConfig>,
        results: ScanResultSender,
    ) -> Self {
        Self {
            rs_path: rs_path.into(),
            config,
            device_settings,
            results,
        }
    }

    fn command(&self, device_id: &str) -> Command {
        let mut cmd = Command::new(&self.rs_path);
        cmd.arg("scan")
            .arg("--device")
            .arg(device_id)
            .arg("--min-freq")
            .arg(self.config.min_freq.to_string())
            .arg("--max-freq")
            .arg(self.config.max_freq.to_string())
            .arg("--search-step")
            .arg(self.config.search_step.to_string())
            .arg("--snr-threshold")
            .arg(self.config.snr_threshold.to_string())
            .arg("--min-distance")
            .arg(self.config.min_distance.to_string())
            .arg("--quantization")
            .arg(self.config.quantization.to_string())
            .arg("--dwell-time")
            .arg(self.config.scan_dwell_time.to_string())
            .arg("--detect-dwell-time")
            .arg(self.config.detect_dwell_time.to_string())
            .arg("--max-peaks")
            .arg(self.config.max_peaks.to_string())
            .arg("--sdr-power")
            .arg(self.config.sdr_power.to_string());
        if self.config.sdr_fm {
            cmd.arg("--fm");
        }
        if let Some(settings) = self.device_settings.get(device_id) {
            cmd.arg("--gain").arg(settings.gain.to_string());
            cmd.arg("--ppm").arg(settings.ppm.to_string());
            if settings.bias {
                cmd.arg("--bias");
            }
        }
        for freq in &self.config.whitelist {
            cmd.arg("--whitelist").arg(freq.to_string());
        }
        for freq in &self.config.greylist {
            cmd.arg("--greylist").arg(freq.to_string());
        }
        for freq in &self.config.blacklist {
            cmd.arg("--blacklist").arg(freq.to_string());
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::null());
        cmd
    }
}

impl ScannerFactory for ProcessScanner {
    fn start(&self, device_id: &str) -> Box<dyn TaskHandle> {
        let device_id = device_id.to_string();
        match self.command(&device_id).spawn() {
            Ok(child) => Box::new(ScannerTask::spawn(child, self.results.clone())),
            Err(e) => {
                tracing::error!(device_id, error = %e, "failed to spawn scanner process");
                Box::new(DeadTask)
            }
        }
    }
}

/// A running scanner child process plus the thread reading its stdout.
struct ScannerTask {
    child: Child,
    reader: Option<JoinHandle<()>>,
}

impl ScannerTask {
    fn spawn(mut child: Child, results: ScanResultSender) -> Self {
        let stdout = child.stdout.take().expect("stdout is piped");
        let reader = std::thread::spawn(move || {
            let lines = BufReader::new(stdout).lines();
            for line in lines.map_while(Result::ok) {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Vec<Detection>>(&line) {
                    Ok(batch) if !batch.is_empty() => {
                        if results.send(batch).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, line, "malformed scan result line, skipped")
                    }
                }
            }
        });
        Self {
            child,
            reader: Some(reader),
        }
    }
}

impl TaskHandle for ScannerTask {
    fn is_running(&mut self) -> Result<bool, TaskError> {
        match self.child.try_wait() {
            Ok(Some(_status)) => Ok(false),
            Ok(None) => Ok(true),
            Err(e) => Err(e.to_string().into()),
        }
    }

    fn stop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

/// Stand-in handle for a scanner that failed to spawn: reports dead on the
/// first liveness check so the scheduler retries next tick.
struct DeadTask;

impl TaskHandle for DeadTask {
    fn is_running(&mut self) -> Result<bool, TaskError> {
        Ok(false)
    }
    fn stop(&mut self) {}
}
