// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-sonde CSV log writer: the concrete exporter sink that produces the
//! files [`crate::filename`] and [`crate::flight`] later read.
//!
//! Grounded in the teacher's decoder file logger: a mutex-guarded buffered
//! writer, opened once per flight rather than rotated, since one file covers
//! exactly one flight from first frame to last.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::record::{LogRecord, NEW_HEADER};

/// Opens (create, truncate) the canonical per-sonde log path and appends one
/// CSV row per accepted telemetry frame.
///
/// `write_frame` takes `&self`, not `&mut self`: exporter sinks are shared
/// across a decoder's frame-handling calls and must be internally
/// synchronized, per the scheduler's shared-resource policy.
pub struct PerSondeLogWriter {
    path: PathBuf,
    inner: Mutex<BufWriter<File>>,
}

impl PerSondeLogWriter {
    /// Build the canonical log filename for a flight and open it for
    /// writing, emitting the header row immediately.
    pub fn create(
        logging_dir: &Path,
        start_time: chrono::DateTime<chrono::Utc>,
        serial: &str,
        sonde_type: &str,
        freq_khz: u64,
    ) -> io::Result<Self> {
        let filename = format!(
            "{}_{serial}_{sonde_type}_{freq_khz}_sonde.log",
            start_time.format("%Y%m%d-%H%M%S"),
        );
        let path = logging_dir.join(filename);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{NEW_HEADER}")?;
        writer.flush()?;

        Ok(Self {
            path,
            inner: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one frame as a CSV row and flush immediately — a log reader
    /// (e.g. a live map) may be tailing this file mid-flight.
    pub fn write_frame(&self, record: &LogRecord) -> io::Result<()> {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let line = record.to_csv_fields().join(",");
        writeln!(guard, "{line}")?;
        guard.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::read_log;
    use chrono::{TimeZone, Utc};

    fn sample_record(datetime: chrono::DateTime<Utc>) -> LogRecord {
        LogRecord {
            datetime,
            serial: "R1234567".into(),
            frame: "1".into(),
            latitude: 52.0,
            longitude: 21.0,
            altitude: 1000.0,
            vel_v: 5.0,
            vel_h: 2.0,
            heading: 90.0,
            temp: 10.0,
            humidity: 50.0,
            pressure: Some(900.0),
            sonde_type: "RS41".into(),
            freq_mhz: 402.5,
            snr: Some(5.0),
            f_error_hz: Some(0.0),
            sats: Some(9.0),
            batt_v: Some(2.7),
            burst_timer: Some(0.0),
            aux_data: None,
        }
    }

    #[test]
    fn writes_header_once_then_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let start = Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap();
        let writer =
            PerSondeLogWriter::create(dir.path(), start, "R1234567", "RS41", 402500).unwrap();

        for i in 0..12 {
            writer
                .write_frame(&sample_record(start + chrono::Duration::seconds(i)))
                .unwrap();
        }

        let contents = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(contents.lines().next().unwrap(), NEW_HEADER);
        assert_eq!(contents.lines().count(), 13);
    }

    #[test]
    fn written_log_round_trips_through_the_reader() {
        let dir = tempfile::tempdir().unwrap();
        let start = Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap();
        let writer =
            PerSondeLogWriter::create(dir.path(), start, "R1234567", "RS41", 402500).unwrap();

        for i in 0..12 {
            writer
                .write_frame(&sample_record(start + chrono::Duration::seconds(i)))
                .unwrap();
        }

        let summary = read_log(writer.path(), 2).unwrap();
        assert_eq!(summary.serial, "R1234567");
    }
}
