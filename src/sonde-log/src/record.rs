// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! CSV record schema: the two log formats the reader must understand, and
//! the one format the writer produces.

use chrono::{DateTime, Utc};

use crate::error::LogError;

/// The current (new-style) header, written verbatim by
/// [`crate::writer::PerSondeLogWriter`] and recognized by the reader.
pub const NEW_HEADER: &str = "timestamp,serial,frame,lat,lon,alt,vel_v,vel_h,heading,temp,humidity,pressure,type,freq_mhz,snr,f_error_hz,sats,batt_v,burst_timer,aux_data";

/// One telemetry frame, in the union of both schemas' fields. Old-schema
/// rows leave the fields they don't carry as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub datetime: DateTime<Utc>,
    pub serial: String,
    pub frame: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub vel_v: f64,
    pub vel_h: f64,
    pub heading: f64,
    /// Sentinel: <= -260.0 means invalid.
    pub temp: f64,
    /// Sentinel: < 0.0 means invalid.
    pub humidity: f64,
    /// hPa. `None` (old schema, or missing) falls back to standard atmosphere.
    pub pressure: Option<f64>,
    pub sonde_type: String,
    pub freq_mhz: f64,
    pub snr: Option<f64>,
    pub f_error_hz: Option<f64>,
    pub sats: Option<f64>,
    pub batt_v: Option<f64>,
    pub burst_timer: Option<f64>,
    pub aux_data: Option<String>,
}

impl LogRecord {
    /// Serialize in new-header column order, for [`crate::writer::PerSondeLogWriter`].
    pub fn to_csv_fields(&self) -> Vec<String> {
        vec![
            self.datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            self.serial.clone(),
            self.frame.clone(),
            self.latitude.to_string(),
            self.longitude.to_string(),
            self.altitude.to_string(),
            self.vel_v.to_string(),
            self.vel_h.to_string(),
            self.heading.to_string(),
            self.temp.to_string(),
            self.humidity.to_string(),
            self.pressure.map(|p| p.to_string()).unwrap_or_default(),
            self.sonde_type.clone(),
            self.freq_mhz.to_string(),
            self.snr.map(|v| v.to_string()).unwrap_or_default(),
            self.f_error_hz.map(|v| v.to_string()).unwrap_or_default(),
            self.sats.map(|v| v.to_string()).unwrap_or_default(),
            self.batt_v.map(|v| v.to_string()).unwrap_or_default(),
            self.burst_timer.map(|v| v.to_string()).unwrap_or_default(),
            self.aux_data.clone().unwrap_or_default(),
        ]
    }
}

fn parse_datetime(s: &str, line: usize) -> Result<DateTime<Utc>, LogError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LogError::InvalidRow {
            line,
            reason: format!("bad datetime {s:?}: {e}"),
        })
}

fn parse_f64(s: &str, field: &str, line: usize) -> Result<f64, LogError> {
    s.trim().parse().map_err(|_| LogError::InvalidRow {
        line,
        reason: format!("bad {field} value {s:?}"),
    })
}

/// Which on-disk header was present: selects the column layout below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Header does not contain the substring `"other"`.
    New,
    /// Header contains `"other"`; only the first 13 columns are read.
    Old,
}

pub fn detect_schema(header: &str) -> Schema {
    if header.contains("other") {
        Schema::Old
    } else {
        Schema::New
    }
}

/// Parse one CSV row according to `schema`. `line` is 1-based for error
/// messages (the header is line 1).
pub fn parse_row(fields: &[String], schema: Schema, line: usize) -> Result<LogRecord, LogError> {
    match schema {
        Schema::New => parse_new_row(fields, line),
        Schema::Old => parse_old_row(fields, line),
    }
}

fn parse_new_row(f: &[String], line: usize) -> Result<LogRecord, LogError> {
    if f.len() < 20 {
        return Err(LogError::InvalidRow {
            line,
            reason: format!("expected 20 columns, got {}", f.len()),
        });
    }
    Ok(LogRecord {
        datetime: parse_datetime(&f[0], line)?,
        serial: f[1].clone(),
        frame: f[2].clone(),
        latitude: parse_f64(&f[3], "lat", line)?,
        longitude: parse_f64(&f[4], "lon", line)?,
        altitude: parse_f64(&f[5], "alt", line)?,
        vel_v: parse_f64(&f[6], "vel_v", line)?,
        vel_h: parse_f64(&f[7], "vel_h", line)?,
        heading: parse_f64(&f[8], "heading", line)?,
        temp: parse_f64(&f[9], "temp", line)?,
        humidity: parse_f64(&f[10], "humidity", line)?,
        pressure: f[11].trim().parse().ok(),
        sonde_type: f[12].clone(),
        freq_mhz: parse_f64(&f[13], "freq_mhz", line)?,
        snr: f[14].trim().parse().ok(),
        f_error_hz: f[15].trim().parse().ok(),
        sats: f[16].trim().parse().ok(),
        batt_v: f[17].trim().parse().ok(),
        burst_timer: f[18].trim().parse().ok(),
        aux_data: (!f[19].is_empty()).then(|| f[19].clone()),
    })
}

fn parse_old_row(f: &[String], line: usize) -> Result<LogRecord, LogError> {
    if f.len() < 13 {
        return Err(LogError::InvalidRow {
            line,
            reason: format!("expected at least 13 columns, got {}", f.len()),
        });
    }
    Ok(LogRecord {
        datetime: parse_datetime(&f[0], line)?,
        serial: f[1].clone(),
        frame: f[2].clone(),
        latitude: parse_f64(&f[3], "lat", line)?,
        longitude: parse_f64(&f[4], "lon", line)?,
        altitude: parse_f64(&f[5], "alt", line)?,
        vel_v: parse_f64(&f[6], "vel_v", line)?,
        vel_h: parse_f64(&f[7], "vel_h", line)?,
        heading: parse_f64(&f[8], "heading", line)?,
        temp: parse_f64(&f[9], "temp", line)?,
        humidity: parse_f64(&f[10], "humidity", line)?,
        pressure: None,
        sonde_type: f[11].clone(),
        freq_mhz: parse_f64(&f[12], "freq", line)?,
        snr: None,
        f_error_hz: None,
        sats: None,
        batt_v: None,
        burst_timer: None,
        aux_data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_new_schema() {
        assert_eq!(detect_schema(NEW_HEADER), Schema::New);
    }

    #[test]
    fn detects_old_schema_by_substring() {
        let header = "timestamp,serial,frame,lat,lon,alt,vel_v,vel_h,heading,temp,humidity,type,freq,other";
        assert_eq!(detect_schema(header), Schema::Old);
    }

    #[test]
    fn old_row_ignores_trailing_variable_columns() {
        let fields: Vec<String> = "2020-06-06T00:58:09.001Z,R3670268,7685,-31.21523,137.68126,33752.4,5.9,2.1,44.5,-273.0,-1.0,RS41,401.501,SNR 5.4,FERROR -187,SATS 9,BATT 2.7"
            .split(',')
            .map(String::from)
            .collect();
        let record = parse_row(&fields, Schema::Old, 2).unwrap();
        assert_eq!(record.serial, "R3670268");
        assert_eq!(record.sonde_type, "RS41");
        assert!(record.pressure.is_none());
        assert!((record.freq_mhz - 401.501).abs() < 1e-9);
    }
}
