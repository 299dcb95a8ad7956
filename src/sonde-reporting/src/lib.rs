// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Exporter sinks: the fan-out from a decoder's accepted frames to the rest
//! of the world. Every sink must be internally synchronized, since decoders
//! call `accept()` from their own background task and a single sink may be
//! shared across several decoders (e.g. one network uploader for the whole
//! station).

pub mod error;
pub mod network;
pub mod per_sonde_log;

use sonde_log::LogRecord;

pub use error::ExporterError;
pub use per_sonde_log::PerSondeLogSink;

/// Capability every exporter sink exposes to a decoder task.
pub trait ExporterSink: Send + Sync {
    fn accept(&self, frame: &LogRecord) -> Result<(), ExporterError>;
}

/// Dispatches one frame to every configured sink, in order, continuing past
/// a failing sink rather than aborting the fan-out — one broken uploader
/// must not stop the per-sonde log from being written.
pub fn dispatch(sinks: &[Box<dyn ExporterSink>], frame: &LogRecord) {
    for sink in sinks {
        if let Err(e) = sink.accept(frame) {
            tracing::warn!(error = %e, "exporter sink rejected frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink(Arc<AtomicUsize>);

    impl ExporterSink for CountingSink {
        fn accept(&self, _frame: &LogRecord) -> Result<(), ExporterError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    impl ExporterSink for FailingSink {
        fn accept(&self, _frame: &LogRecord) -> Result<(), ExporterError> {
            Err(ExporterError::Unreachable {
                sink: "failing",
                reason: "always fails".into(),
            })
        }
    }

    fn sample_frame() -> LogRecord {
        LogRecord {
            datetime: chrono::Utc::now(),
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
        }
    }

    #[test]
    fn dispatch_continues_past_a_failing_sink() {
        let count = Arc::new(AtomicUsize::new(0));
        let sinks: Vec<Box<dyn ExporterSink>> =
            vec![Box::new(FailingSink), Box::new(CountingSink(count.clone()))];
        dispatch(&sinks, &sample_frame());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
