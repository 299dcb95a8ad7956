// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Network telemetry exporters: APRS-IS and PSKReporter uploaders.
//!
//! Their wire protocols are out of scope — these types model the
//! configuration shape and the `ExporterSink` contract only. `accept()`
//! records intent at debug level rather than opening a socket.

use sonde_log::LogRecord;

use crate::error::ExporterError;
use crate::ExporterSink;

/// Configuration for an APRS-IS uploader.
#[derive(Debug, Clone)]
pub struct AprsIsConfig {
    pub server: String,
    pub port: u16,
    pub callsign: String,
}

pub struct AprsIsSink {
    config: AprsIsConfig,
}

impl AprsIsSink {
    pub fn new(config: AprsIsConfig) -> Self {
        Self { config }
    }
}

impl ExporterSink for AprsIsSink {
    fn accept(&self, frame: &LogRecord) -> Result<(), ExporterError> {
        tracing::debug!(
            server = %self.config.server,
            port = self.config.port,
            callsign = %self.config.callsign,
            serial = %frame.serial,
            "would forward frame to APRS-IS"
        );
        Ok(())
    }
}

/// Configuration for a PSKReporter uploader.
#[derive(Debug, Clone)]
pub struct PskReporterConfig {
    pub callsign: String,
    pub antenna: Option<String>,
}

pub struct PskReporterSink {
    config: PskReporterConfig,
}

impl PskReporterSink {
    pub fn new(config: PskReporterConfig) -> Self {
        Self { config }
    }
}

impl ExporterSink for PskReporterSink {
    fn accept(&self, frame: &LogRecord) -> Result<(), ExporterError> {
        tracing::debug!(
            callsign = %self.config.callsign,
            serial = %frame.serial,
            "would forward frame to PSKReporter"
        );
        Ok(())
    }
}
