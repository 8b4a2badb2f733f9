//! Map weblink derivation from record coordinates.
//!
//! Pure string construction, no network access. The URL shape is fixed:
//! `https://www.google.com/maps?q=<lat>,<lon>&t=k&z=<zoom>` with the
//! satellite map-type flag (`t=k`).

use crate::error::{Error, Result};

/// Parse and range-check a coordinate pair from raw CSV cell values
///
/// Returns `(longitude, latitude)`. Failures carry the offending record
/// identifier so the orchestrator can report them per row.
pub fn parse_coordinates(object_id: &str, lon_raw: &str, lat_raw: &str) -> Result<(f64, f64)> {
    let longitude = parse_value(object_id, lon_raw, "longitude")?;
    let latitude = parse_value(object_id, lat_raw, "latitude")?;
    validate(object_id, longitude, latitude)?;
    Ok((longitude, latitude))
}

/// Build the map weblink for a coordinate pair
///
/// Deterministic and pure; fails when either coordinate is out of range.
pub fn link(longitude: f64, latitude: f64, zoom: u8) -> Result<String> {
    validate("", longitude, latitude)?;
    Ok(format!(
        "https://www.google.com/maps?q={latitude},{longitude}&t=k&z={zoom}"
    ))
}

fn parse_value(object_id: &str, raw: &str, axis: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| {
        Error::invalid_coordinate(object_id, raw, format!("{axis} is not a decimal number"))
    })
}

fn validate(object_id: &str, longitude: f64, latitude: f64) -> Result<()> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::invalid_coordinate(
            object_id,
            longitude.to_string(),
            "longitude outside [-180, 180]",
        ));
    }
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::invalid_coordinate(
            object_id,
            latitude.to_string(),
            "latitude outside [-90, 90]",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_record_produces_expected_link() {
        // OBJECTID=6 from the reference dataset
        let (lon, lat) = parse_coordinates("6", "-93.4983819", "44.97368603").unwrap();
        let url = link(lon, lat, 18).unwrap();
        assert_eq!(
            url,
            "https://www.google.com/maps?q=44.97368603,-93.4983819&t=k&z=18"
        );
    }

    #[test]
    fn non_numeric_coordinate_is_rejected() {
        let err = parse_coordinates("3", "not-a-number", "44.9").unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinate { ref object_id, .. } if object_id == "3"));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(parse_coordinates("1", "-193.5", "44.9").is_err());
        assert!(parse_coordinates("1", "-93.5", "94.9").is_err());
        assert!(link(200.0, 0.0, 18).is_err());
        assert!(link(0.0, -91.0, 18).is_err());
    }

    #[test]
    fn whitespace_around_values_is_tolerated() {
        let (lon, lat) = parse_coordinates("2", " -93.5 ", " 44.9 ").unwrap();
        assert_eq!((lon, lat), (-93.5, 44.9));
    }

    /// Split a generated link back into its embedded (lat, lon, zoom)
    fn parse_back(url: &str) -> Option<(f64, f64, u8)> {
        let rest = url.strip_prefix("https://www.google.com/maps?q=")?;
        let (coords, tail) = rest.split_once("&t=k&z=")?;
        let (lat, lon) = coords.split_once(',')?;
        Some((lat.parse().ok()?, lon.parse().ok()?, tail.parse().ok()?))
    }

    proptest! {
        /// Round trip: every valid coordinate pair is recoverable from the URL
        #[test]
        fn link_round_trips(
            lon in -180.0f64..=180.0,
            lat in -90.0f64..=90.0,
            zoom in 1u8..=21,
        ) {
            let url = link(lon, lat, zoom).unwrap();
            let (lat2, lon2, zoom2) = parse_back(&url).unwrap();
            prop_assert_eq!(lat2, lat);
            prop_assert_eq!(lon2, lon);
            prop_assert_eq!(zoom2, zoom);
        }
    }
}
