// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! ICAO standard atmosphere, used as a pressure fallback when a sonde frame
//! carries altitude but no pressure sensor reading (older RS92 frames, some
//! DFM variants).

const SEA_LEVEL_PRESSURE_PA: f64 = 101_325.0;
const SEA_LEVEL_TEMPERATURE_K: f64 = 288.15;
const TROPOSPHERE_LAPSE_RATE: f64 = 0.0065; // K/m
const GRAVITY: f64 = 9.80665; // m/s^2
const GAS_CONSTANT_AIR: f64 = 287.052_87; // J/(kg*K)

const TROPOPAUSE_ALTITUDE_M: f64 = 11_000.0;
const TROPOPAUSE_TEMPERATURE_K: f64 = 216.65;
const TROPOPAUSE_PRESSURE_PA: f64 = 22_632.1;

/// Pressure in pascals at a given geometric altitude in meters, per the ICAO
/// standard atmosphere.
///
/// Two regimes:
/// - troposphere (altitude <= 11000 m): barometric formula with the standard
///   6.5 K/km lapse rate.
/// - lower stratosphere (11000 m < altitude <= 20000 m): isothermal at
///   216.65 K.
///
/// Altitudes above 20000 m are clamped to the isothermal formula rather than
/// rejected; sonde bursts rarely exceed it but when they do this keeps the
/// function total and monotone.
pub fn pressure_pa(altitude_m: f64) -> f64 {
    if altitude_m <= TROPOPAUSE_ALTITUDE_M {
        let base = 1.0 - (TROPOSPHERE_LAPSE_RATE * altitude_m) / SEA_LEVEL_TEMPERATURE_K;
        let exponent = GRAVITY / (GAS_CONSTANT_AIR * TROPOSPHERE_LAPSE_RATE);
        SEA_LEVEL_PRESSURE_PA * base.powf(exponent)
    } else {
        let delta = altitude_m - TROPOPAUSE_ALTITUDE_M;
        let exponent = -GRAVITY * delta / (GAS_CONSTANT_AIR * TROPOPAUSE_TEMPERATURE_K);
        TROPOPAUSE_PRESSURE_PA * exponent.exp()
    }
}
