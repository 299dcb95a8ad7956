// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-sonde telemetry logs: filenames, the two CSV schemas, the Skew-T
//! builder, and the writer that produces the files this crate reads back.

pub mod error;
pub mod filename;
pub mod flight;
pub mod record;
pub mod skewt;
pub mod writer;

pub use error::LogError;
pub use filename::{list_logs, parse_filename, LogFilename};
pub use flight::{read_log, read_log_by_serial, FlightSummary};
pub use record::{LogRecord, Schema};
pub use skewt::{build_skewt, SkewTSample};
pub use writer::PerSondeLogWriter;
