// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

/// Errors from parsing a log filename. Callers of [`crate::filename::list_logs`]
/// log and skip these; callers of [`crate::flight::read_log`] get them directly,
/// since a content parse error there must propagate (see error policy).
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error reading log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("log file is empty")]
    EmptyFile,

    #[error("malformed filename {0:?}: {1}")]
    Filename(std::path::PathBuf, String),

    #[error("row {line} has too few columns: {reason}")]
    InvalidRow { line: usize, reason: String },
}
