// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The decoder task adapter: spawns `rs_path`'s decode subcommand bound to a
//! detected frequency, parses its newline-delimited JSON frames, and fans
//! each accepted frame out to the configured exporter sinks. Self-terminates
//! once `rx_timeout` elapses without a valid frame.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use sonde_core::scan::Detection;
use sonde_core::scheduler::DecoderFactory;
use sonde_core::task::{TaskError, TaskHandle};
use sonde_log::{LogRecord, PerSondeLogWriter};
use sonde_reporting::{ExporterSink, PerSondeLogSink};

use crate::config::SdrDeviceConfig;

/// One decoded telemetry frame as emitted by `rs_path`'s decode subcommand.
#[derive(Debug, Deserialize)]
struct DecodedFrameJson {
    datetime: String,
    serial: String,
    frame: String,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    vel_v: f64,
    vel_h: f64,
    heading: f64,
    temp: f64,
    humidity: f64,
    pressure: Option<f64>,
    sonde_type: String,
    freq_mhz: f64,
    snr: Option<f64>,
    f_error_hz: Option<f64>,
    sats: Option<f64>,
    batt_v: Option<f64>,
    burst_timer: Option<f64>,
    aux_data: Option<String>,
}

impl DecodedFrameJson {
    fn into_record(self) -> Option<LogRecord> {
        let datetime: DateTime<Utc> = DateTime::parse_from_rfc3339(&self.datetime)
            .ok()?
            .with_timezone(&Utc);
        Some(LogRecord {
            datetime,
            serial: self.serial,
            frame: self.frame,
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            vel_v: self.vel_v,
            vel_h: self.vel_h,
            heading: self.heading,
            temp: self.temp,
            humidity: self.humidity,
            pressure: self.pressure,
            sonde_type: self.sonde_type,
            freq_mhz: self.freq_mhz,
            snr: self.snr,
            f_error_hz: self.f_error_hz,
            sats: self.sats,
            batt_v: self.batt_v,
            burst_timer: self.burst_timer,
            aux_data: self.aux_data,
        })
    }
}

/// Accepts every frame that parses. A placeholder for future telemetry
/// sanity checks (e.g. altitude jump rejection); the contract point exists
/// now so sinks don't need to change when a real filter lands.
fn telem_filter(_record: &LogRecord) -> bool {
    true
}

/// Builds [`DecoderTask`]s bound to a single `rs_path` binary, a receive
/// timeout, the shared (network) exporter sinks every decode fans out to,
/// and the per-sonde log directory each decode additionally gets a private
/// sink for (one file per flight, so it cannot be a shared sink).
pub struct ProcessDecoder {
    rs_path: String,
    rx_timeout: Duration,
    ephemeris: Option<String>,
    device_settings: HashMap<String, SdrDeviceConfig>,
    shared_sinks: Arc<Vec<Box<dyn ExporterSink>>>,
    per_sonde_log_dir: Option<PathBuf>,
}

impl ProcessDecoder {
    pub fn new(
        rs_path: impl Into<String>,
        rx_timeout: Duration,
        ephemeris: Option<String>,
        device_settings: HashMap<String, SdrDeviceConfig>,
        shared_sinks: Arc<Vec<Box<dyn ExporterSink>>>,
        per_sonde_log_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            rs_path: rs_path.into(),
            rx_timeout,
            ephemeris,
            device_settings,
            shared_sinks,
            per_sonde_log_dir,
        }
    }

    fn command(&self, device_id: &str, detection: &Detection) -> Command {
        let mut cmd = Command::new(&self.rs_path);
        cmd.arg("decode")
            .arg("--device")
            .arg(device_id)
            .arg("--frequency")
            .arg(detection.frequency_mhz.to_string())
            .arg("--sonde-type")
            .arg(&detection.sonde_type);
        if let Some(ephemeris) = &self.ephemeris {
            cmd.arg("--ephemeris").arg(ephemeris);
        }
        if let Some(settings) = self.device_settings.get(device_id) {
            cmd.arg("--gain").arg(settings.gain.to_string());
            cmd.arg("--ppm").arg(settings.ppm.to_string());
            if settings.bias {
                cmd.arg("--bias");
            }
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::null());
        cmd
    }
}

impl DecoderFactory for ProcessDecoder {
    fn start(&self, device_id: &str, detection: &Detection) -> Box<dyn TaskHandle> {
        let device_id_owned = device_id.to_string();
        match self.command(device_id, detection).spawn() {
            Ok(child) => Box::new(DecoderTask::spawn(
                child,
                self.rx_timeout,
                self.shared_sinks.clone(),
                self.per_sonde_log_dir.clone(),
            )),
            Err(e) => {
                tracing::error!(device_id = device_id_owned, error = %e, "failed to spawn decoder process");
                Box::new(DeadTask)
            }
        }
    }
}

/// A running decoder child process, its reader thread, and the shared
/// last-valid-frame clock the liveness check uses to enforce `rx_timeout`.
struct DecoderTask {
    child: Child,
    reader: Option<JoinHandle<()>>,
    last_frame: Arc<Mutex<Instant>>,
    rx_timeout: Duration,
    timed_out: Arc<AtomicBool>,
}

impl DecoderTask {
    fn spawn(
        mut child: Child,
        rx_timeout: Duration,
        shared_sinks: Arc<Vec<Box<dyn ExporterSink>>>,
        per_sonde_log_dir: Option<PathBuf>,
    ) -> Self {
        let stdout = child.stdout.take().expect("stdout is piped");
        let last_frame = Arc::new(Mutex::new(Instant::now()));
        let reader_last_frame = last_frame.clone();
        let timed_out = Arc::new(AtomicBool::new(false));

        let reader = std::thread::spawn(move || {
            let lines = BufReader::new(stdout).lines();
            let mut per_sonde_sink: Option<PerSondeLogSink> = None;
            for line in lines.map_while(Result::ok) {
                if line.trim().is_empty() {
                    continue;
                }
                let parsed: Result<DecodedFrameJson, _> = serde_json::from_str(&line);
                let record = match parsed {
                    Ok(frame) => frame.into_record(),
                    Err(e) => {
                        tracing::warn!(error = %e, line, "malformed decoded frame, skipped");
                        continue;
                    }
                };
                let Some(record) = record else {
                    tracing::warn!(line, "unparseable timestamp in decoded frame, skipped");
                    continue;
                };
                if !telem_filter(&record) {
                    continue;
                }
                *reader_last_frame.lock().expect("lock poisoned") = Instant::now();

                if per_sonde_sink.is_none() {
                    if let Some(dir) = &per_sonde_log_dir {
                        let freq_khz = (record.freq_mhz * 1000.0).round() as u64;
                        match PerSondeLogWriter::create(
                            dir,
                            record.datetime,
                            &record.serial,
                            &record.sonde_type,
                            freq_khz,
                        ) {
                            Ok(writer) => per_sonde_sink = Some(PerSondeLogSink::new(writer)),
                            Err(e) => {
                                tracing::error!(error = %e, "failed to open per-sonde log file")
                            }
                        }
                    }
                }

                if let Some(sink) = &per_sonde_sink {
                    if let Err(e) = sink.accept(&record) {
                        tracing::warn!(error = %e, "per-sonde log sink rejected frame");
                    }
                }
                sonde_reporting::dispatch(&shared_sinks, &record);
            }
        });

        Self {
            child,
            reader: Some(reader),
            last_frame,
            rx_timeout,
            timed_out,
        }
    }

    fn elapsed_since_last_frame(&self) -> Duration {
        self.last_frame.lock().expect("lock poisoned").elapsed()
    }
}

impl TaskHandle for DecoderTask {
    fn is_running(&mut self) -> Result<bool, TaskError> {
        if self.timed_out.load(Ordering::SeqCst) {
            return Ok(false);
        }
        match self.child.try_wait() {
            Ok(Some(_status)) => Ok(false),
            Ok(None) => {
                if self.elapsed_since_last_frame() >= self.rx_timeout {
                    tracing::warn!(timeout_secs = self.rx_timeout.as_secs(), "decoder receive timeout, stopping");
                    self.timed_out.store(true, Ordering::SeqCst);
                    self.stop();
                    Ok(false)
                } else {
                    Ok(true)
                }
            }
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

struct DeadTask;

impl TaskHandle for DeadTask {
    fn is_running(&mut self) -> Result<bool, TaskError> {
        Ok(false)
    }
    fn stop(&mut self) {}
}
