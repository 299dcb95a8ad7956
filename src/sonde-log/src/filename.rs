// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Log filename parsing and directory listing.
//!
//! Filename schema: `YYYYMMDD-HHMMSS_<serial>_<shortType>_<freqKHz>_sonde.log`,
//! e.g. `20210430-235413_IMET-89F2720A_IMET_401999_sonde.log`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::LogError;

/// One catalog entry as produced by listing a logging directory.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFilename {
    pub path: PathBuf,
    pub datetime: DateTime<Utc>,
    /// Human-readable age (`now - datetime`), e.g. `"3h12m"`.
    pub age: String,
    pub serial: String,
    /// Human-readable sonde type, via [`sonde_core::sonde_type::display_name`].
    pub sonde_type: String,
    pub freq_mhz: f64,
}

/// Strip a leading `<TYPE>-` prefix from a serial, if present.
///
/// e.g. `IMET-89F2720A` -> `89F2720A`, `R2230624` -> `R2230624` unchanged.
/// Shared with [`crate::flight::read_log`], which applies the same
/// transform to the serial read from the CSV body, not just the filename.
pub(crate) fn strip_sonde_serial(raw: &str) -> &str {
    match raw.split_once('-') {
        Some((_prefix, rest)) if !rest.is_empty() => rest,
        _ => raw,
    }
}

/// Format a duration as a short human-readable age string, e.g. `"2d 4h"`,
/// `"15m"`, `"32s"`.
fn readable_timedelta(age: chrono::Duration) -> String {
    let total_secs = age.num_seconds().max(0);
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}

/// Parse a single log filename into a [`LogFilename`] catalog entry.
///
/// `now` is threaded in explicitly rather than read from the system clock,
/// to keep this function pure and testable.
pub fn parse_filename(path: &Path, now: DateTime<Utc>) -> Result<LogFilename, LogError> {
    let basename = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LogError::Filename(path.to_path_buf(), "no file name".into()))?;

    let fields: Vec<&str> = basename.split('_').collect();
    if fields.len() < 4 {
        return Err(LogError::Filename(
            path.to_path_buf(),
            format!("expected at least 4 underscore-separated fields, got {}", fields.len()),
        ));
    }

    let datetime = DateTime::parse_from_str(&format!("{}Z", fields[0]), "%Y%m%d-%H%M%SZ")
        .map_err(|e| LogError::Filename(path.to_path_buf(), format!("bad timestamp: {e}")))?
        .with_timezone(&Utc);

    let serial = strip_sonde_serial(fields[1]).to_string();
    let sonde_type = sonde_core::sonde_type::display_name(fields[2]).to_string();

    let freq_khz: f64 = fields[3]
        .parse()
        .map_err(|e| LogError::Filename(path.to_path_buf(), format!("bad frequency: {e}")))?;

    let age = readable_timedelta(now.signed_duration_since(datetime));

    Ok(LogFilename {
        path: path.to_path_buf(),
        datetime,
        age,
        serial,
        sonde_type,
        freq_mhz: freq_khz / 1000.0,
    })
}

/// List all `*_sonde.log` files in `dir`, newest first.
///
/// Sorted lexicographically (which equals chronological order, since the
/// filename timestamp prefix is fixed-width) then reversed. Entries that
/// fail to parse are logged and skipped, not fatal.
pub fn list_logs(dir: &Path, now: DateTime<Utc>) -> Vec<LogFilename> {
    let mask = dir.join("*_sonde.log");
    let pattern = mask.to_string_lossy().into_owned();

    let mut paths: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(entries) => entries.filter_map(Result::ok).collect(),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid log glob pattern");
            return Vec::new();
        }
    };
    paths.sort();
    paths.reverse();

    paths
        .into_iter()
        .filter_map(|path| match parse_filename(&path, now) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(?path, error = %e, "skipping unparseable log filename");
                None
            }
        })
        .collect()
}
