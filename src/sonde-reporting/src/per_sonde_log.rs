// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The one in-scope concrete sink: the per-sonde CSV log file.

use sonde_log::{LogRecord, PerSondeLogWriter};

use crate::error::ExporterError;
use crate::ExporterSink;

/// Wraps a [`PerSondeLogWriter`] as an [`ExporterSink`].
pub struct PerSondeLogSink {
    writer: PerSondeLogWriter,
}

impl PerSondeLogSink {
    pub fn new(writer: PerSondeLogWriter) -> Self {
        Self { writer }
    }
}

impl ExporterSink for PerSondeLogSink {
    fn accept(&self, frame: &LogRecord) -> Result<(), ExporterError> {
        self.writer.write_frame(frame)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn accept_appends_a_row_to_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let start = Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap();
        let writer =
            PerSondeLogWriter::create(dir.path(), start, "R1234567", "RS41", 402500).unwrap();
        let path = writer.path().to_path_buf();
        let sink = PerSondeLogSink::new(writer);

        let frame = LogRecord {
            datetime: start,
            serial: "R1234567".into(),
            frame: "1".into(),
            latitude: 52.0,
            longitude: 21.0,
            altitude: 1000.0,
            vel_v: 0.0,
            vel_h: 0.0,
            heading: 0.0,
            temp: 10.0,
            humidity: 50.0,
            pressure: Some(900.0),
            sonde_type: "RS41".into(),
            freq_mhz: 402.5,
            snr: None,
            f_error_hz: None,
            sats: None,
            batt_v: None,
            burst_timer: None,
            aux_data: None,
        };

        sink.accept(&frame).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2); // header + one row
    }
}
