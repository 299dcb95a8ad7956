// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Standalone numerical helpers shared by the log builder and the scheduler:
//! standard-atmosphere pressure and great-circle geometry.

pub mod atmosphere;
pub mod geo;

pub use atmosphere::pressure_pa;
pub use geo::{bearing_deg, great_circle_distance_m};
