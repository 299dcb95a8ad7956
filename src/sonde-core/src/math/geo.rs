// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Great-circle geometry between consecutive GPS fixes, used to derive wind
//! speed and direction from the horizontal drift of the sonde.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine great-circle distance between two WGS-84 points, in meters.
pub fn great_circle_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Initial bearing from point 1 to point 2, in degrees, normalized to
/// [0, 360).
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlon = lon2 - lon1;
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let theta = y.atan2(x).to_degrees();
    (theta + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_zero_for_identical_points() {
        assert_eq!(great_circle_distance_m(52.0, 21.0, 52.0, 21.0), 0.0);
    }

    #[test]
    fn distance_one_degree_longitude_at_equator_is_about_111km() {
        let d = great_circle_distance_m(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 500.0);
    }

    #[test]
    fn bearing_due_east_at_equator() {
        let b = bearing_deg(0.0, 0.0, 0.0, 1.0);
        assert!((b - 90.0).abs() < 0.5);
    }

    #[test]
    fn bearing_due_north() {
        let b = bearing_deg(0.0, 0.0, 1.0, 0.0);
        assert!(b.abs() < 0.5);
    }

    #[test]
    fn bearing_is_normalized_to_0_360() {
        let b = bearing_deg(1.0, 0.0, 0.0, -1.0);
        assert!((0.0..360.0).contains(&b));
    }
}
