// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Thermodynamic Skew-T series construction from a decoded flight's records.

use sonde_core::math::{atmosphere, geo};

use crate::record::LogRecord;

const DEW_POINT_A: f64 = 17.625;
const DEW_POINT_B: f64 = 243.04;
const TOP_OF_PLOT_HPA: f64 = 100.0;
const MIN_SAMPLES: usize = 10;
const MAX_FIRST_ALTITUDE_M: f64 = 15_000.0;

/// One point on the Skew-T diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct SkewTSample {
    pub press_hpa: f64,
    pub hght_m: f64,
    pub temp_c: f64,
    pub dwpt_c: f64,
    pub wdir_deg: f64,
    pub wspd_mps: f64,
}

fn argmax_altitude(records: &[LogRecord]) -> usize {
    records
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.altitude.total_cmp(&b.altitude))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn dew_point_c(temp_c: f64, rh_pct: f64) -> f64 {
    let gamma = (rh_pct / 100.0).ln() + (DEW_POINT_A * temp_c) / (DEW_POINT_B + temp_c);
    (DEW_POINT_B * gamma) / (DEW_POINT_A - gamma)
}

/// Build the Skew-T series for a flight, decimating every `decimation`-th
/// sample between the start of the record and the burst index.
///
/// Guards (any one empties the result): fewer than 10 samples, no ascent
/// data (burst at index 0), or the first sample already above 15000 m.
pub fn build_skewt(records: &[LogRecord], decimation: usize) -> Vec<SkewTSample> {
    if records.len() < MIN_SAMPLES {
        return Vec::new();
    }
    let burst_idx = argmax_altitude(records);
    if burst_idx == 0 {
        return Vec::new();
    }
    if records[0].altitude > MAX_FIRST_ALTITUDE_M {
        return Vec::new();
    }

    let step = decimation.max(1);
    let mut samples = Vec::new();
    let mut i = 0usize;

    loop {
        i += step;
        if i >= burst_idx {
            break;
        }

        let cur = &records[i];
        let prev = &records[i - 1];

        if cur.temp < -260.0 || cur.humidity < 0.0 {
            continue;
        }

        let dt = (cur.datetime - prev.datetime).num_milliseconds() as f64 / 1000.0;
        if dt == 0.0 {
            continue;
        }

        let distance_m =
            geo::great_circle_distance_m(prev.latitude, prev.longitude, cur.latitude, cur.longitude);
        let bearing_deg = geo::bearing_deg(prev.latitude, prev.longitude, cur.latitude, cur.longitude);
        let wspd_mps = distance_m / dt;

        let press_hpa = match cur.pressure {
            Some(p) if p >= 0.0 => p,
            _ => atmosphere::pressure_pa(cur.altitude) / 100.0,
        };

        let dwpt_c = dew_point_c(cur.temp, cur.humidity);
        if !dwpt_c.is_finite() {
            continue;
        }

        samples.push(SkewTSample {
            press_hpa,
            hght_m: cur.altitude,
            temp_c: cur.temp,
            dwpt_c,
            wdir_deg: bearing_deg,
            wspd_mps,
        });

        if press_hpa < TOP_OF_PLOT_HPA {
            break;
        }
    }

    samples
}
