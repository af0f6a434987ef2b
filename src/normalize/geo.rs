use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{
    MAX_ARRONDISSEMENT, MAX_LATITUDE, MAX_LONGITUDE, MIN_ARRONDISSEMENT, MIN_LATITUDE,
    MIN_LONGITUDE,
};
use crate::domain::GeoPoint;

static TRAILING_TWO_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{2})$").expect("static regex"));

/// Parse a raw coordinate pair and keep it only if both sides fall inside the
/// Paris bounding box. Rejection is atomic: a single bad side drops both.
pub fn validate_coordinates(lat_raw: Option<&str>, lon_raw: Option<&str>) -> Option<GeoPoint> {
    let latitude = parse_coordinate(lat_raw?)?;
    let longitude = parse_coordinate(lon_raw?)?;

    if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
        return None;
    }
    if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
        return None;
    }

    Some(GeoPoint { latitude, longitude })
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Arrondissement number from the last two digits of a postal code.
///
/// Extraction is lenient: `"75116"` yields 16 and `"92100"` yields 0. Callers
/// that only want Paris districts filter with [`is_paris_arrondissement`].
pub fn derive_arrondissement(zipcode: Option<&str>) -> Option<u8> {
    let caps = TRAILING_TWO_DIGITS.captures(zipcode?)?;
    caps.get(1)?.as_str().parse().ok()
}

pub fn is_paris_arrondissement(arrondissement: u8) -> bool {
    (MIN_ARRONDISSEMENT..=MAX_ARRONDISSEMENT).contains(&arrondissement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_coordinates_inside_paris() {
        let point = validate_coordinates(Some("48.85"), Some("2.30")).unwrap();
        assert_eq!(point.latitude, 48.85);
        assert_eq!(point.longitude, 2.30);
    }

    #[test]
    fn test_rejects_out_of_box_latitude() {
        assert_eq!(validate_coordinates(Some("40.0"), Some("2.30")), None);
    }

    #[test]
    fn test_rejects_pair_with_missing_side() {
        assert_eq!(validate_coordinates(Some("48.85"), None), None);
        assert_eq!(validate_coordinates(None, Some("2.30")), None);
    }

    #[test]
    fn test_rejects_swapped_and_zero_coordinates() {
        assert_eq!(validate_coordinates(Some("2.30"), Some("48.85")), None);
        assert_eq!(validate_coordinates(Some("0"), Some("0")), None);
    }

    #[test]
    fn test_rejects_unparseable_and_non_finite_values() {
        assert_eq!(validate_coordinates(Some("north"), Some("2.30")), None);
        assert_eq!(validate_coordinates(Some("NaN"), Some("2.30")), None);
        assert_eq!(validate_coordinates(Some("48.85"), Some("inf")), None);
    }

    #[test]
    fn test_bounding_box_is_inclusive() {
        assert!(validate_coordinates(Some("48.8"), Some("2.2")).is_some());
        assert!(validate_coordinates(Some("48.9"), Some("2.4")).is_some());
        assert!(validate_coordinates(Some(" 48.86 "), Some("2.35")).is_some());
    }

    #[test]
    fn test_derives_arrondissement_from_zipcode() {
        assert_eq!(derive_arrondissement(Some("75011")), Some(11));
        assert_eq!(derive_arrondissement(Some("75001")), Some(1));
        assert_eq!(derive_arrondissement(Some("75116")), Some(16));
    }

    #[test]
    fn test_no_trailing_digits_yields_none() {
        assert_eq!(derive_arrondissement(Some("")), None);
        assert_eq!(derive_arrondissement(Some("ABCDE")), None);
        assert_eq!(derive_arrondissement(Some("7")), None);
        assert_eq!(derive_arrondissement(None), None);
    }

    #[test]
    fn test_extraction_does_not_range_check() {
        assert_eq!(derive_arrondissement(Some("92100")), Some(0));
        assert_eq!(derive_arrondissement(Some("93200")), Some(0));
        assert_eq!(derive_arrondissement(Some("94130")), Some(30));
        assert!(!is_paris_arrondissement(0));
        assert!(!is_paris_arrondissement(30));
        assert!(is_paris_arrondissement(1));
        assert!(is_paris_arrondissement(20));
    }
}
