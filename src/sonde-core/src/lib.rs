// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod device;
pub mod math;
pub mod scan;
pub mod scheduler;
pub mod sonde_type;
pub mod task;

pub use device::{Device, DeviceRegistry};
pub use scan::{Detection, ScanResultChannel, ScanResultReceiver, ScanResultSender};
pub use scheduler::{Scheduler, SchedulerState};
pub use task::{TaskError, TaskHandle, TaskKey, TaskTable};
