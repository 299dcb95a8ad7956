// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Sonde-type shortform table: maps the tag a decoder emits (and that the
//! CSV log stores) to a human-readable manufacturer/model name.

/// Look up the human-readable name for a decoder's sonde-type shortform.
///
/// Unknown shortforms pass through unchanged rather than erroring — new
/// sonde models show up in the field before this table is updated, and the
/// log writer must not refuse to log a flight just because its type name is
/// new.
pub fn display_name(shortform: &str) -> &str {
    match shortform {
        "RS41" => "Vaisala RS41",
        "RS92" => "Vaisala RS92",
        "IMET" => "InterMet iMet",
        "DFM" => "Graw DFM",
        "M10" => "MeteoModem M10",
        "M20" => "MeteoModem M20",
        "LMS6" => "Lockheed Martin LMS6",
        "MK2LMS" => "Lockheed Martin LMS6 (Mk2a)",
        "MEISEI" => "Meisei iMS-100",
        "MRZ" => "Meteorit MRZ",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_shortforms_resolve() {
        assert_eq!(display_name("RS41"), "Vaisala RS41");
        assert_eq!(display_name("DFM"), "Graw DFM");
    }

    #[test]
    fn unknown_shortform_passes_through() {
        assert_eq!(display_name("XYZ99"), "XYZ99");
    }
}
