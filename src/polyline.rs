//! Polyline representation for route geometries.
//!
//! Routes are kept as decoded coordinate sequences. The compact encoded
//! polyline format (Google's algorithm, as emitted by OSRM with
//! `geometries=polyline` / `polyline6`) is handled here at the boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Coordinate;

/// Decimal digits used by `geometries=polyline`.
pub const DEFAULT_PRECISION: u32 = 5;

/// Beyond this many digits an `f64` degree value no longer scales exactly.
pub const MAX_PRECISION: u32 = 15;

const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION: i64 = 0x20;
const BIAS: u8 = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("encoded polyline ends mid-value at byte {offset}")]
    Truncated { offset: usize },
    #[error("invalid byte {byte:#04x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },
    #[error("value starting before byte {offset} overflows 64 bits")]
    Overflow { offset: usize },
    #[error("precision {0} is out of range (0..={max})", max = MAX_PRECISION)]
    Precision(u32),
}

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<Coordinate> for Polyline {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Decodes an encoded polyline at the given precision (decimal digits).
///
/// A string that stops inside a value, or after a latitude with no
/// longitude, is rejected rather than silently shortened.
pub fn decode(encoded: &str, precision: u32) -> Result<Polyline, PolylineError> {
    let factor = scale(precision)?;
    let bytes = encoded.as_bytes();

    let mut index = 0;
    let mut lat = 0i64;
    let mut lng = 0i64;
    let mut points = Vec::new();

    while index < bytes.len() {
        lat = accumulate(lat, bytes, &mut index)?;
        lng = accumulate(lng, bytes, &mut index)?;
        points.push(Coordinate::new(lat as f64 / factor, lng as f64 / factor));
    }

    Ok(Polyline::new(points))
}

/// [`decode`] at [`DEFAULT_PRECISION`].
pub fn decode5(encoded: &str) -> Result<Polyline, PolylineError> {
    decode(encoded, DEFAULT_PRECISION)
}

fn scale(precision: u32) -> Result<f64, PolylineError> {
    if precision > MAX_PRECISION {
        return Err(PolylineError::Precision(precision));
    }
    Ok(10f64.powi(precision as i32))
}

/// Adds the next delta to `total`; deltas are individually in range but
/// their running sum need not be.
fn accumulate(total: i64, bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let start = *index;
    let delta = next_value(bytes, index)?;
    total
        .checked_add(delta)
        .ok_or(PolylineError::Overflow { offset: start })
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let start = *index;
    let mut result = 0i64;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PolylineError::Truncated { offset: *index });
        };
        if !(BIAS..=BIAS + 63).contains(&byte) {
            return Err(PolylineError::InvalidByte {
                byte,
                offset: *index,
            });
        }
        if shift > 60 {
            return Err(PolylineError::Overflow { offset: start });
        }

        let chunk = i64::from(byte - BIAS);
        *index += 1;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

/// Encodes coordinates into the polyline format at the given precision.
pub fn encode(points: &[Coordinate], precision: u32) -> Result<String, PolylineError> {
    let factor = scale(precision)?;
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat = 0i64;
    let mut prev_lng = 0i64;

    for point in points {
        let lat = (point.lat * factor).round() as i64;
        let lng = (point.lng * factor).round() as i64;
        push_value(lat - prev_lat, &mut out);
        push_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    Ok(out)
}

fn push_value(value: i64, out: &mut String) {
    let mut rest = if value < 0 { !(value << 1) } else { value << 1 };
    while rest >= CONTINUATION {
        out.push(char::from(((CONTINUATION | (rest & CHUNK_MASK)) as u8) + BIAS));
        rest >>= CHUNK_BITS;
    }
    out.push(char::from(rest as u8 + BIAS));
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn reference_points() -> Vec<Coordinate> {
        vec![
            Coordinate::new(38.5, -120.2),
            Coordinate::new(40.7, -120.95),
            Coordinate::new(43.252, -126.453),
        ]
    }

    fn assert_close(actual: &[Coordinate], expected: &[Coordinate], tolerance: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!(
                (a.lat - e.lat).abs() <= tolerance && (a.lng - e.lng).abs() <= tolerance,
                "{:?} != {:?}",
                a,
                e
            );
        }
    }

    #[test]
    fn test_decode_reference_string() {
        let polyline = decode5(REFERENCE).unwrap();
        assert_close(polyline.points(), &reference_points(), 1e-9);
    }

    #[test]
    fn test_encode_reference_points() {
        assert_eq!(encode(&reference_points(), DEFAULT_PRECISION).unwrap(), REFERENCE);
    }

    #[test]
    fn test_round_trip_istanbul_path() {
        let points = vec![
            Coordinate::new(41.0082, 28.9784),
            Coordinate::new(41.01234, 28.98321),
            Coordinate::new(40.99871, 29.02744),
            Coordinate::new(-33.86785, 151.20732),
        ];
        let encoded = encode(&points, 5).unwrap();
        let decoded = decode(&encoded, 5).unwrap();
        assert_close(decoded.points(), &points, 1e-5);
    }

    #[test]
    fn test_precision_six() {
        let points = vec![Coordinate::new(41.008213, 28.978412)];
        let decoded = decode(&encode(&points, 6).unwrap(), 6).unwrap();
        assert_close(decoded.points(), &points, 1e-6);
    }

    #[test]
    fn test_empty_input() {
        assert!(decode5("").unwrap().is_empty());
    }

    #[test]
    fn test_truncated_mid_group() {
        // Drop the final byte so the last longitude is left open.
        let truncated = &REFERENCE[..REFERENCE.len() - 1];
        assert!(matches!(
            decode5(truncated),
            Err(PolylineError::Truncated { .. })
        ));
    }

    #[test]
    fn test_latitude_without_longitude() {
        // "_p~iF" is a complete latitude value on its own.
        assert_eq!(
            decode5("_p~iF"),
            Err(PolylineError::Truncated { offset: 5 })
        );
    }

    #[test]
    fn test_invalid_byte() {
        assert_eq!(
            decode5("_p~iF ps|U"),
            Err(PolylineError::InvalidByte {
                byte: b' ',
                offset: 5
            })
        );
    }

    #[test]
    fn test_overflow_is_rejected() {
        let endless = "~".repeat(20);
        assert!(matches!(
            decode5(&endless),
            Err(PolylineError::Overflow { offset: 0 })
        ));
    }

    #[test]
    fn test_running_sum_overflow_is_rejected() {
        // Each value is 2^62 - 1: valid alone, but the third latitude
        // pushes the running total past i64::MAX.
        let huge = format!("}}{}F", "~".repeat(11));
        assert_eq!(
            decode5(&huge.repeat(6)),
            Err(PolylineError::Overflow { offset: 52 })
        );
    }

    #[test]
    fn test_precision_out_of_range() {
        assert_eq!(decode("_p~iF~ps|U", 400), Err(PolylineError::Precision(400)));
        assert_eq!(
            encode(&reference_points(), MAX_PRECISION + 1),
            Err(PolylineError::Precision(16))
        );
        assert!(decode("_p~iF~ps|U", MAX_PRECISION).is_ok());
    }

    #[test]
    fn test_new_and_points() {
        let points = reference_points();
        let polyline = Polyline::new(points.clone());
        assert_eq!(polyline.points(), &points[..]);
        assert_eq!(polyline.into_points(), points);
    }
}
