//! Decoder for the encoded polyline format (precision 1e5).
//!
//! Each value is a zig-zag encoded delta split into 5-bit chunks, low chunk
//! first, with 0x20 marking "more chunks follow" and 63 added to every byte to
//! keep it printable. Values alternate latitude, longitude.

use crate::error::PolylineError;
use crate::gpx_types::Point;

const PRECISION: f64 = 1e5;

/// Decode into `[lng, lat]` positions, the GeoJSON order used by routing APIs.
///
/// Input that ends mid-value, or with a latitude but no longitude, is rejected
/// as a whole rather than returning the points read so far.
pub fn decode(encoded: &str) -> Result<Vec<[f64; 2]>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut coords = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, next_delta(bytes, &mut index)?, index)?;
        lng = accumulate(lng, next_delta(bytes, &mut index)?, index)?;
        coords.push([lng as f64 / PRECISION, lat as f64 / PRECISION]);
    }

    Ok(coords)
}

/// Decode straight into [`Point`]s.
pub fn decode_points(encoded: &str) -> Result<Vec<Point>, PolylineError> {
    Ok(decode(encoded)?
        .into_iter()
        .map(|[lng, lat]| Point::new(lat, lng))
        .collect())
}

fn accumulate(total: i64, delta: i64, offset: usize) -> Result<i64, PolylineError> {
    total
        .checked_add(delta)
        .ok_or(PolylineError::Overflow { offset })
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let offset = *index;
        let Some(&byte) = bytes.get(offset) else {
            return Err(PolylineError::Truncated { offset });
        };
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidByte { offset, byte });
        }
        if shift >= 60 {
            return Err(PolylineError::Overflow { offset });
        }

        let chunk = i64::from(byte - 63);
        *index += 1;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_vector_lng_lat_order() {
        let coords = decode(REFERENCE).unwrap();
        assert_eq!(coords.len(), 3);
        let expected = [[-120.2, 38.5], [-120.95, 40.7], [-126.453, 43.252]];
        for (got, want) in coords.iter().zip(expected.iter()) {
            assert!(close(got[0], want[0]), "lng {} != {}", got[0], want[0]);
            assert!(close(got[1], want[1]), "lat {} != {}", got[1], want[1]);
        }
    }

    #[test]
    fn test_reference_vector_points() {
        let points = decode_points(REFERENCE).unwrap();
        assert!(close(points[0].lat, 38.5));
        assert!(close(points[0].lng, -120.2));
        assert!(close(points[1].lat, 40.7));
        assert!(close(points[1].lng, -120.95));
        assert!(close(points[2].lat, 43.252));
        assert!(close(points[2].lng, -126.453));
        assert!(points.iter().all(|p| p.ele.is_none()));
    }

    #[test]
    fn test_empty_input() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_single_zero_point() {
        // "?" encodes a zero delta.
        let coords = decode("??").unwrap();
        assert_eq!(coords, vec![[0.0, 0.0]]);
    }

    #[test]
    fn test_truncated_mid_value() {
        // Drop the final byte of the last longitude.
        let cut = &REFERENCE[..REFERENCE.len() - 1];
        assert_eq!(
            decode(cut),
            Err(PolylineError::Truncated { offset: cut.len() })
        );
    }

    #[test]
    fn test_latitude_without_longitude() {
        assert_eq!(decode("_p~iF"), Err(PolylineError::Truncated { offset: 5 }));
    }

    #[test]
    fn test_invalid_byte() {
        assert_eq!(
            decode("_p~iF ps|U"),
            Err(PolylineError::InvalidByte {
                offset: 5,
                byte: b' '
            })
        );
    }

    #[test]
    fn test_overlong_value() {
        let encoded = "~".repeat(20);
        assert!(matches!(
            decode(&encoded),
            Err(PolylineError::Overflow { .. })
        ));
    }
}
