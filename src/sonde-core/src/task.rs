// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Task keys, task handles, and the task table — the scheduler's other half
//! of shared state alongside the device registry.

use std::collections::HashMap;

use thiserror::Error;

/// Error from a task's liveness check (`TaskHandle::is_running`). Treated as
/// transient by the scheduler: logged and retried next tick, never causing
/// the device to be released.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TaskError(pub String);

impl From<String> for TaskError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

impl From<&str> for TaskError {
    fn from(reason: &str) -> Self {
        Self(reason.to_string())
    }
}

/// Key identifying a running task in the task table.
///
/// `Frequency` equality is exact `f64` equality, as emitted by the scanner —
/// callers must not rescale or round. This is a known rough edge (see
/// Design Notes in the spec): a quantized integer-kHz key would be more
/// robust, but the source treats frequencies as exact map keys and this
/// behavior is preserved intentionally, not fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskKey {
    Scan,
    Frequency(f64),
}

impl Eq for TaskKey {}

impl std::hash::Hash for TaskKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            TaskKey::Scan => 0u8.hash(state),
            TaskKey::Frequency(f) => {
                1u8.hash(state);
                f.to_bits().hash(state);
            }
        }
    }
}

/// Capability every running task exposes to the scheduler.
///
/// The scheduler never touches anything task-specific beyond these two
/// calls; `stop()` is synchronous and must not return until the task is
/// guaranteed to emit no further callbacks / frames.
pub trait TaskHandle: Send {
    /// Returns `Ok(true)` if still running, `Ok(false)` if it has ended, or
    /// `Err` if the liveness check itself failed (treated as transient by
    /// the scheduler: log and retry next tick, do not release the device).
    fn is_running(&mut self) -> Result<bool, TaskError>;

    /// Stop the task. Must not return before the task is quiescent.
    fn stop(&mut self);
}

struct Entry {
    device_id: String,
    handle: Box<dyn TaskHandle>,
}

/// Maps `TaskKey -> (device_id, handle)`. The single source of truth for
/// which frequencies are being decoded and whether a scanner is live.
#[derive(Default)]
pub struct TaskTable {
    entries: HashMap<TaskKey, Entry>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: TaskKey, device_id: String, handle: Box<dyn TaskHandle>) {
        self.entries.insert(key, Entry { device_id, handle });
    }

    pub fn remove(&mut self, key: &TaskKey) -> Option<(String, Box<dyn TaskHandle>)> {
        self.entries.remove(key).map(|e| (e.device_id, e.handle))
    }

    pub fn contains(&self, key: &TaskKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn contains_scan(&self) -> bool {
        self.contains(&TaskKey::Scan)
    }

    pub fn device_id_for(&self, key: &TaskKey) -> Option<&str> {
        self.entries.get(key).map(|e| e.device_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.entries.keys()
    }

    pub fn handle_mut(&mut self, key: &TaskKey) -> Option<&mut Box<dyn TaskHandle>> {
        self.entries.get_mut(key).map(|e| &mut e.handle)
    }

    /// Iterate over `(key, device_id)` pairs without touching the handles —
    /// used by the reaper, which needs a stable key list before mutating.
    pub fn device_ids(&self) -> Vec<(TaskKey, String)> {
        self.entries
            .iter()
            .map(|(k, e)| (*k, e.device_id.clone()))
            .collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&TaskKey, &mut Box<dyn TaskHandle>)> {
        self.entries.iter_mut().map(|(k, e)| (k, &mut e.handle))
    }
}
