// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Reads a per-sonde CSV log into a [`FlightSummary`], including the derived
//! Skew-T series.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::LogError;
use crate::filename::strip_sonde_serial;
use crate::record::{self, LogRecord};
use crate::skewt::{build_skewt, SkewTSample};

pub type PathPoint = (f64, f64, f64);

/// Summary of a full flight reconstructed from its log.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSummary {
    pub serial: String,
    pub path: Vec<PathPoint>,
    pub first: PathPoint,
    pub first_time: DateTime<Utc>,
    pub last: PathPoint,
    pub last_time: DateTime<Utc>,
    pub burst: PathPoint,
    pub burst_time: DateTime<Utc>,
    pub skewt: Vec<SkewTSample>,
}

fn read_records(path: &Path) -> Result<Vec<LogRecord>, LogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let header = reader.headers()?.iter().collect::<Vec<_>>().join(",");
    let schema = record::detect_schema(&header);

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        let fields: Vec<String> = row.iter().map(String::from).collect();
        records.push(record::parse_row(&fields, schema, idx + 2)?);
    }
    Ok(records)
}

/// Read a per-sonde log and build its [`FlightSummary`], including the
/// Skew-T series via [`build_skewt`].
pub fn read_log(path: &Path, skewt_decimation: usize) -> Result<FlightSummary, LogError> {
    let records = read_records(path)?;
    if records.is_empty() {
        return Err(LogError::EmptyFile);
    }

    let serial = strip_sonde_serial(&records[0].serial).to_string();
    let path_points: Vec<PathPoint> = records
        .iter()
        .map(|r| (r.latitude, r.longitude, r.altitude))
        .collect();

    let first = path_points[0];
    let first_time = records[0].datetime;
    let last = *path_points.last().expect("non-empty");
    let last_time = records.last().expect("non-empty").datetime;

    let burst_idx = records
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.altitude.total_cmp(&b.altitude))
        .map(|(i, _)| i)
        .expect("non-empty");
    let burst = path_points[burst_idx];
    let burst_time = records[burst_idx].datetime;

    let skewt = build_skewt(&records, skewt_decimation);

    Ok(FlightSummary {
        serial,
        path: path_points,
        first,
        first_time,
        last,
        last_time,
        burst,
        burst_time,
        skewt,
    })
}

/// Find and read the first log file matching `serial`, or `None` on no
/// match or a read error — a content error here is deliberately swallowed,
/// since this is a best-effort lookup by serial rather than a direct read
/// of a known path.
pub fn read_log_by_serial(
    dir: &Path,
    serial: &str,
    skewt_decimation: usize,
) -> Option<FlightSummary> {
    let pattern = dir.join(format!("*_*{serial}_*_sonde.log"));
    let pattern_str = pattern.to_string_lossy().into_owned();

    let mut matches: Vec<_> = glob::glob(&pattern_str).ok()?.filter_map(Result::ok).collect();
    matches.sort();
    let first = matches.into_iter().next()?;

    match read_log(&first, skewt_decimation) {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::warn!(path = %first.display(), error = %e, "error reading log by serial");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_new_schema_with_pressure() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = String::from(
            "timestamp,serial,frame,lat,lon,alt,vel_v,vel_h,heading,temp,humidity,pressure,type,freq_mhz,snr,f_error_hz,sats,batt_v,burst_timer,aux_data\n",
        );
        for i in 0..15 {
            let alt = if i < 10 { i as f64 * 1000.0 } else { (14 - i) as f64 * 1000.0 };
            body.push_str(&format!(
                "2021-05-01T00:0{}:00.000Z,R1234567,{},52.{i:02},21.{i:02},{alt},5.0,2.0,90.0,10.0,50.0,{},RS41,402.500,5.0,0.0,9,2.7,0,\n",
                i.min(9),
                i,
                900.0 - i as f64 * 10.0,
            ));
        }
        let path = write_log(dir.path(), "20210501-000000_R1234567_RS41_402500_sonde.log", &body);

        let summary = read_log(&path, 2).unwrap();
        assert_eq!(summary.serial, "R1234567");
        assert!(summary.burst.2 >= summary.first.2);
        assert!(summary.skewt.iter().all(|s| s.press_hpa >= 100.0 - 1e-6 || s.press_hpa < 100.0));
    }

    #[test]
    fn reads_old_schema_with_variable_trailing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = String::from(
            "timestamp,serial,frame,lat,lon,alt,vel_v,vel_h,heading,temp,humidity,type,freq,other\n",
        );
        for i in 0..15u32 {
            let alt = if i < 10 { i as f64 * 1000.0 } else { (14 - i) as f64 * 1000.0 };
            body.push_str(&format!(
                "2020-06-06T00:{:02}:09.001Z,R3670268,{},-31.2,137.6,{alt},5.9,2.1,44.5,10.0,50.0,RS41,401.501,SNR 5.4,FERROR -187,SATS 9,BATT 2.7\n",
                i, i
            ));
        }
        let path = write_log(dir.path(), "20200606-005809_R3670268_RS41_401501_sonde.log", &body);

        let summary = read_log(&path, 2).unwrap();
        assert_eq!(summary.serial, "R3670268");
        assert!(!summary.skewt.is_empty());
    }

    #[test]
    fn empty_file_is_a_content_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), "empty_sonde.log", "");
        assert!(read_log(&path, 2).is_err());
    }

    #[test]
    fn type_prefixed_serial_is_stripped_like_the_filename() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = String::from(
            "timestamp,serial,frame,lat,lon,alt,vel_v,vel_h,heading,temp,humidity,pressure,type,freq_mhz,snr,f_error_hz,sats,batt_v,burst_timer,aux_data\n",
        );
        for i in 0..15 {
            let alt = if i < 10 { i as f64 * 1000.0 } else { (14 - i) as f64 * 1000.0 };
            body.push_str(&format!(
                "2021-05-01T00:0{}:00.000Z,IMET-89F2720A,{},52.{i:02},21.{i:02},{alt},5.0,2.0,90.0,10.0,50.0,{},IMET,401.999,5.0,0.0,9,2.7,0,\n",
                i.min(9),
                i,
                900.0 - i as f64 * 10.0,
            ));
        }
        let path = write_log(
            dir.path(),
            "20210501-000000_IMET-89F2720A_IMET_401999_sonde.log",
            &body,
        );

        let summary = read_log(&path, 2).unwrap();
        assert_eq!(summary.serial, "89F2720A");
    }
}
