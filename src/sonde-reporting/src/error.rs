// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink {sink} unreachable: {reason}")]
    Unreachable { sink: &'static str, reason: String },
}
