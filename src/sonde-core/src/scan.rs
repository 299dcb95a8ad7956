// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Scan result channel: the single-producer, single-consumer path from the
//! active scanner to the scheduler loop.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One detected sonde signal: its frequency and decoded sonde-type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub frequency_mhz: f64,
    pub sonde_type: String,
}

pub type ScanResultSender = mpsc::UnboundedSender<Vec<Detection>>;
pub type ScanResultReceiver = mpsc::UnboundedReceiver<Vec<Detection>>;

/// Unbounded FIFO of detection batches. One scan pass produces one batch.
///
/// When the scanner is preempted, batches already queued here are *not*
/// flushed — they are drained on a later tick once capacity returns. This is
/// intentional: a detection discovered moments before preemption is still
/// worth dispatching once a device frees up.
pub struct ScanResultChannel;

impl ScanResultChannel {
    pub fn new() -> (ScanResultSender, ScanResultReceiver) {
        mpsc::unbounded_channel()
    }
}
