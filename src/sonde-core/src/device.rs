// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! SDR device registry.
//!
//! Tracks each configured SDR's static settings and its current allocation
//! state. Populated once at startup from configuration; devices are never
//! created or destroyed at runtime.

/// A single SDR's static configuration and dynamic allocation state.
#[derive(Debug, Clone)]
pub struct Device {
    pub device_id: String,
    pub bias_tee: bool,
    pub ppm_offset: i32,
    /// Gain in dB, or -1.0 for hardware AGC.
    pub gain: f64,
    in_use: bool,
}

impl Device {
    pub fn new(device_id: impl Into<String>, bias_tee: bool, ppm_offset: i32, gain: f64) -> Self {
        Self {
            device_id: device_id.into(),
            bias_tee,
            ppm_offset,
            gain,
            in_use: false,
        }
    }

    pub fn in_use(&self) -> bool {
        self.in_use
    }
}

/// Registry of all configured SDR devices.
///
/// Declaration order (the order devices were added) is preserved and is the
/// order `allocate()` searches in, making allocation deterministic.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Add a device to the registry in configuration-declaration order.
    pub fn add(&mut self, device: Device) {
        self.devices.push(device);
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Find the first free device in declaration order.
    ///
    /// If `check_only` is false, atomically marks it in-use. Returns `None`
    /// if every device is occupied.
    pub fn allocate(&mut self, check_only: bool) -> Option<String> {
        let device = self.devices.iter_mut().find(|d| !d.in_use)?;
        if !check_only {
            device.in_use = true;
            tracing::info!(device_id = %device.device_id, "SDR allocated");
        }
        Some(device.device_id.clone())
    }

    /// Release a device, making it available for allocation again. Idempotent.
    ///
    /// Panics if `device_id` is not a known device — releasing an unknown
    /// device is a programming error, not a runtime condition to recover from.
    pub fn release(&mut self, device_id: &str) {
        let device = self
            .devices
            .iter_mut()
            .find(|d| d.device_id == device_id)
            .unwrap_or_else(|| panic!("release() of unknown device {device_id}"));
        device.in_use = false;
    }

    /// Look up a device's static config by id.
    ///
    /// Panics if `device_id` is not a known device (programming error).
    pub fn get(&self, device_id: &str) -> &Device {
        self.devices
            .iter()
            .find(|d| d.device_id == device_id)
            .unwrap_or_else(|| panic!("get() of unknown device {device_id}"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_of(n: usize) -> DeviceRegistry {
        let mut reg = DeviceRegistry::new();
        for i in 0..n {
            reg.add(Device::new(format!("sdr{i}"), false, 0, -1.0));
        }
        reg
    }

    #[test]
    fn allocate_is_deterministic_and_in_order() {
        let mut reg = registry_of(3);
        assert_eq!(reg.allocate(false).as_deref(), Some("sdr0"));
        assert_eq!(reg.allocate(false).as_deref(), Some("sdr1"));
        assert_eq!(reg.allocate(false).as_deref(), Some("sdr2"));
        assert_eq!(reg.allocate(false), None);
    }

    #[test]
    fn check_only_does_not_mutate() {
        let mut reg = registry_of(1);
        assert_eq!(reg.allocate(true).as_deref(), Some("sdr0"));
        assert!(!reg.get("sdr0").in_use());
        assert_eq!(reg.allocate(true).as_deref(), Some("sdr0"));
    }

    #[test]
    fn release_is_idempotent() {
        let mut reg = registry_of(1);
        reg.allocate(false);
        reg.release("sdr0");
        reg.release("sdr0");
        assert!(!reg.get("sdr0").in_use());
        assert_eq!(reg.allocate(false).as_deref(), Some("sdr0"));
    }

    #[test]
    #[should_panic]
    fn release_of_unknown_device_panics() {
        let mut reg = registry_of(1);
        reg.release("nope");
    }
}
