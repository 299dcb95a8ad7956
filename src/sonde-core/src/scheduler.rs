// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The scheduler loop: the core state machine over the device registry and
//! task table. Runs the reap / refill-scanner / dispatch-detections sequence
//! on a fixed tick, with scanner-to-decoder preemption as its only priority
//! rule.
//!
//! Grounded in the teacher's [`FixedPolling`]-style policy objects
//! (`trx-core::rig::controller::policies`) for the tick interval, and in the
//! single-control-thread ownership model of `trx-server::rig_task::run_rig_task`
//! — here generalized from a `tokio::select!` over a command channel to a
//! plain periodic tick, since the scheduler has no inbound command surface of
//! its own.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::device::DeviceRegistry;
use crate::scan::{Detection, ScanResultReceiver};
use crate::task::{TaskError, TaskHandle, TaskKey, TaskTable};

/// Constructs a scanner task bound to a device, given the frequency range
/// etc. is already known to the implementor (captured at construction time).
/// Returns the boxed handle to register in the task table.
///
/// Implemented outside `sonde-core` (the scanner itself is an external
/// collaborator, per the spec) and injected into the scheduler.
pub trait ScannerFactory: Send {
    fn start(&self, device_id: &str) -> Box<dyn TaskHandle>;
}

/// Constructs a decoder task bound to a device and a detected frequency.
pub trait DecoderFactory: Send {
    fn start(&self, device_id: &str, detection: &Detection) -> Box<dyn TaskHandle>;
}

/// Owned scheduler state: the device registry, the task table, and the
/// inbound scan-result channel. Mutated only by [`SchedulerState::tick`].
pub struct SchedulerState {
    pub registry: DeviceRegistry,
    pub tasks: TaskTable,
    scan_results: ScanResultReceiver,
}

impl SchedulerState {
    pub fn new(registry: DeviceRegistry, scan_results: ScanResultReceiver) -> Self {
        Self {
            registry,
            tasks: TaskTable::new(),
            scan_results,
        }
    }

    /// Run one scheduler tick: reap dead tasks, refill the scanner if
    /// capacity allows, then dispatch any queued detections.
    ///
    /// Order matters (see spec §5): reap precedes dispatch so devices freed
    /// by natural decoder termination are visible to the same tick's
    /// dispatch; scanner refill precedes dispatch so a freshly restarted
    /// scanner may itself be preempted within the same tick.
    pub fn tick(
        &mut self,
        scanner_factory: &dyn ScannerFactory,
        decoder_factory: &dyn DecoderFactory,
    ) {
        self.reap();
        self.refill_scanner(scanner_factory);
        self.dispatch_detections(decoder_factory);
    }

    /// Step 1: reap tasks whose `is_running()` now reports false, releasing
    /// their device. A transient `is_running()` error is logged and the
    /// entry is retained untouched — releasing on an error we can't confirm
    /// would risk double-allocating the device.
    fn reap(&mut self) {
        let keys: Vec<TaskKey> = self.tasks.keys().copied().collect();
        for key in keys {
            let running = {
                let handle = self
                    .tasks
                    .handle_mut(&key)
                    .expect("key came from tasks.keys()");
                handle.is_running()
            };
            match running {
                Ok(true) => {}
                Ok(false) => {
                    let (device_id, _handle) = self
                        .tasks
                        .remove(&key)
                        .expect("key came from tasks.keys()");
                    self.registry.release(&device_id);
                    debug!(?key, device_id, "task ended, device released");
                }
                Err(e) => {
                    error!(?key, error = %e, "is_running() failed, retaining entry");
                }
            }
        }
    }

    /// Step 2: if no scanner is running and a device is free, start one.
    fn refill_scanner(&mut self, scanner_factory: &dyn ScannerFactory) {
        if self.tasks.contains_scan() {
            return;
        }
        let Some(device_id) = self.registry.allocate(true) else {
            return;
        };
        self.registry.allocate(false);
        let handle = scanner_factory.start(&device_id);
        self.tasks.insert(TaskKey::Scan, device_id.clone(), handle);
        info!(device_id, "scanner started");
    }

    /// Step 3: drain the scan-result channel and dispatch each detection in
    /// arrival order. Greedy, no priority among frequencies: the first
    /// detection that needs a device and can't get one not by preemption is
    /// dropped outright, to be rediscovered on a later tick.
    fn dispatch_detections(&mut self, decoder_factory: &dyn DecoderFactory) {
        let mut batches = Vec::new();
        while let Ok(batch) = self.scan_results.try_recv() {
            batches.push(batch);
        }
        for batch in batches {
            for detection in batch {
                self.dispatch_one(&detection, decoder_factory);
            }
        }
    }

    fn dispatch_one(&mut self, detection: &Detection, decoder_factory: &dyn DecoderFactory) {
        let key = TaskKey::Frequency(detection.frequency_mhz);
        if self.tasks.contains(&key) {
            debug!(freq = detection.frequency_mhz, "duplicate detection, skipped");
            return;
        }

        if let Some(device_id) = self.registry.allocate(true) {
            self.registry.allocate(false);
            let handle = decoder_factory.start(&device_id, detection);
            self.tasks.insert(key, device_id.clone(), handle);
            info!(device_id, freq = detection.frequency_mhz, "decoder started");
            return;
        }

        if self.tasks.contains_scan() {
            let (device_id, mut scanner) = self
                .tasks
                .remove(&TaskKey::Scan)
                .expect("contains_scan() just returned true");
            warn!(device_id, "preempting scanner to decode detection");
            scanner.stop();
            self.registry.release(&device_id);

            self.registry.allocate(false);
            let handle = decoder_factory.start(&device_id, detection);
            self.tasks.insert(key, device_id.clone(), handle);
            info!(device_id, freq = detection.frequency_mhz, "decoder started (preempted scanner)");
            return;
        }

        warn!(
            freq = detection.frequency_mhz,
            "no capacity for detection, dropped"
        );
    }

    /// Stop every running task, best-effort. Called once on shutdown.
    pub fn shutdown(&mut self) {
        for (key, handle) in self.tasks.iter_mut() {
            debug!(?key, "stopping task for shutdown");
            handle.stop();
        }
    }
}

/// Drives [`SchedulerState::tick`] on a fixed interval.
pub struct Scheduler {
    interval: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// The scheduler loop runs at a fixed 5 second tick (spec §4.4).
    pub fn new() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }

    #[cfg(test)]
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run the scheduler loop until cancelled. Suspends only in the fixed
    /// sleep between ticks; all per-tick work is synchronous and
    /// non-blocking, per spec §5.
    pub async fn run(
        &self,
        state: &mut SchedulerState,
        scanner_factory: &dyn ScannerFactory,
        decoder_factory: &dyn DecoderFactory,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    state.tick(scanner_factory, decoder_factory);
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler loop shutting down");
                        state.shutdown();
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeTask {
        running: Arc<AtomicBool>,
        stopped: Arc<AtomicBool>,
    }

    impl TaskHandle for FakeTask {
        fn is_running(&mut self) -> Result<bool, TaskError> {
            Ok(self.running.load(Ordering::SeqCst))
        }
        fn stop(&mut self) {
            self.running.store(false, Ordering::SeqCst);
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    struct CountingScanner {
        starts: Arc<AtomicUsize>,
        running: Arc<AtomicBool>,
        stopped: Arc<AtomicBool>,
    }

    impl ScannerFactory for CountingScanner {
        fn start(&self, _device_id: &str) -> Box<dyn TaskHandle> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.running.store(true, Ordering::SeqCst);
            Box::new(FakeTask {
                running: self.running.clone(),
                stopped: self.stopped.clone(),
            })
        }
    }

    struct CountingDecoder {
        starts: Arc<AtomicUsize>,
    }

    impl DecoderFactory for CountingDecoder {
        fn start(&self, _device_id: &str, _detection: &Detection) -> Box<dyn TaskHandle> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Box::new(FakeTask {
                running: Arc::new(AtomicBool::new(true)),
                stopped: Arc::new(AtomicBool::new(false)),
            })
        }
    }

    fn registry_of(n: usize) -> DeviceRegistry {
        let mut reg = DeviceRegistry::new();
        for i in 0..n {
            reg.add(Device::new(format!("sdr{i}"), false, 0, -1.0));
        }
        reg
    }

    fn detection(freq: f64) -> Detection {
        Detection {
            frequency_mhz: freq,
            sonde_type: "RS41".to_string(),
        }
    }

    #[test]
    fn scenario_scanner_preemption() {
        let (tx, rx) = crate::scan::ScanResultChannel::new();
        let mut state = SchedulerState::new(registry_of(1), rx);

        let scanner_running = Arc::new(AtomicBool::new(true));
        let scanner_stopped = Arc::new(AtomicBool::new(false));
        let scanner_starts = Arc::new(AtomicUsize::new(0));
        let scanner = CountingScanner {
            starts: scanner_starts.clone(),
            running: scanner_running.clone(),
            stopped: scanner_stopped.clone(),
        };
        let decoder_starts = Arc::new(AtomicUsize::new(0));
        let decoder = CountingDecoder {
            starts: decoder_starts.clone(),
        };

        // Tick 1: scanner starts on the lone SDR.
        state.tick(&scanner, &decoder);
        assert_eq!(scanner_starts.load(Ordering::SeqCst), 1);
        assert!(state.tasks.contains_scan());

        // Channel delivers a detection while the scanner holds the only SDR.
        tx.send(vec![detection(402.5)]).unwrap();

        // Tick 2: scanner is preempted, decoder takes over the SDR.
        state.tick(&scanner, &decoder);
        assert!(scanner_stopped.load(Ordering::SeqCst));
        assert!(!state.tasks.contains_scan());
        assert_eq!(decoder_starts.load(Ordering::SeqCst), 1);
        assert!(state.tasks.contains(&TaskKey::Frequency(402.5)));

        // Decoder terminates naturally.
        if let Some(handle) = state.tasks.handle_mut(&TaskKey::Frequency(402.5)) {
            handle.stop();
        }

        // Tick 3: device released, scanner restarted.
        state.tick(&scanner, &decoder);
        assert!(!state.tasks.contains(&TaskKey::Frequency(402.5)));
        assert!(state.tasks.contains_scan());
        assert_eq!(scanner_starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn scenario_dedup_within_batch() {
        let (tx, rx) = crate::scan::ScanResultChannel::new();
        let mut state = SchedulerState::new(registry_of(2), rx);

        let scanner = CountingScanner {
            starts: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
        };
        let decoder_starts = Arc::new(AtomicUsize::new(0));
        let decoder = CountingDecoder {
            starts: decoder_starts.clone(),
        };

        state.tick(&scanner, &decoder); // scanner grabs one SDR

        tx.send(vec![detection(402.5), detection(402.5)]).unwrap();
        state.tick(&scanner, &decoder);

        assert_eq!(decoder_starts.load(Ordering::SeqCst), 1);
        assert!(state.tasks.contains(&TaskKey::Frequency(402.5)));
        assert!(state.tasks.contains_scan());
    }

    #[test]
    fn scenario_capacity_exhaustion_drops_detection() {
        let (tx, rx) = crate::scan::ScanResultChannel::new();
        let mut registry = registry_of(1);
        registry.allocate(false); // pretend a decoder already owns the lone SDR
        let mut state = SchedulerState::new(registry, rx);
        state
            .tasks
            .insert(
                TaskKey::Frequency(402.5),
                "sdr0".to_string(),
                Box::new(FakeTask {
                    running: Arc::new(AtomicBool::new(true)),
                    stopped: Arc::new(AtomicBool::new(false)),
                }),
            );

        let scanner = CountingScanner {
            starts: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
        };
        let decoder_starts = Arc::new(AtomicUsize::new(0));
        let decoder = CountingDecoder {
            starts: decoder_starts.clone(),
        };

        tx.send(vec![detection(405.1)]).unwrap();
        state.tick(&scanner, &decoder);

        assert_eq!(decoder_starts.load(Ordering::SeqCst), 0);
        assert_eq!(state.tasks.len(), 1);
        assert!(!state.tasks.contains(&TaskKey::Frequency(405.1)));
    }
}
