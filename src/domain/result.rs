use std::fmt::Write;

use crate::batch::{Axis, BatchError};

/// Outcome of geocoding a single address in a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchForwardResult {
    /// Raw `[latitude, longitude]` strings as returned by the service
    coordinates: Option<[String; 2]>,
}

impl BatchForwardResult {
    pub fn new(coordinates: Option<[String; 2]>) -> Self {
        Self { coordinates }
    }

    pub fn coordinates(&self) -> Option<&[String; 2]> {
        self.coordinates.as_ref()
    }

    /// Latitude in degrees, `None` when the address was not geocoded
    pub fn lat(&self) -> Result<Option<f64>, BatchError> {
        self.parse(Axis::Latitude)
    }

    /// Longitude in degrees, `None` when the address was not geocoded
    pub fn lng(&self) -> Result<Option<f64>, BatchError> {
        self.parse(Axis::Longitude)
    }

    /// Both coordinates as a (lat, lon) tuple
    pub fn point(&self) -> Result<Option<(f64, f64)>, BatchError> {
        Ok(self.lat()?.zip(self.lng()?))
    }

    /// True when the service returned a coordinate pair for this address
    pub fn ok(&self) -> bool {
        self.coordinates.is_some()
    }

    fn parse(&self, axis: Axis) -> Result<Option<f64>, BatchError> {
        let Some(pair) = &self.coordinates else {
            return Ok(None);
        };

        let value = match axis {
            Axis::Latitude => &pair[0],
            Axis::Longitude => &pair[1],
        };
        value
            .trim()
            .parse()
            .map(Some)
            .map_err(|source| BatchError::Coordinate {
                axis,
                value: value.clone(),
                source,
            })
    }

    /// Human-readable diagnostic block with the raw pair
    pub fn render_debug(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n");
        let _ = writeln!(out, "Bing Batch result\n");
        let _ = writeln!(out, "-----------\n");
        match &self.coordinates {
            Some([lat, lng]) => {
                let _ = writeln!(out, "['{}', '{}']", lat, lng);
            }
            None => {
                let _ = writeln!(out, "None");
            }
        }
        out
    }

    /// Print the diagnostic block when `verbose` is set.
    ///
    /// Always returns `[None, None]`; use [`lat`](Self::lat) and
    /// [`lng`](Self::lng) for the actual values.
    pub fn debug(&self, verbose: bool) -> [Option<f64>; 2] {
        if verbose {
            println!("{}", self.render_debug());
        }
        [None, None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(lat: &str, lng: &str) -> BatchForwardResult {
        BatchForwardResult::new(Some([lat.to_string(), lng.to_string()]))
    }

    #[test]
    fn test_present_pair() {
        let r = result("39.5", "-104.8");
        assert_eq!(r.lat().unwrap(), Some(39.5));
        assert_eq!(r.lng().unwrap(), Some(-104.8));
        assert_eq!(r.point().unwrap(), Some((39.5, -104.8)));
        assert!(r.ok());
    }

    #[test]
    fn test_absent_pair() {
        let r = BatchForwardResult::new(None);
        assert_eq!(r.lat().unwrap(), None);
        assert_eq!(r.lng().unwrap(), None);
        assert_eq!(r.point().unwrap(), None);
        assert!(!r.ok());
    }

    #[test]
    fn test_blank_pair_fails_conversion() {
        let r = result("", "");
        assert!(r.ok());
        assert!(matches!(
            r.lat(),
            Err(BatchError::Coordinate {
                axis: Axis::Latitude,
                ..
            })
        ));
        assert!(matches!(
            r.lng(),
            Err(BatchError::Coordinate {
                axis: Axis::Longitude,
                ..
            })
        ));
        assert!(r.point().is_err());
    }

    #[test]
    fn test_non_numeric_coordinate() {
        let r = result("north", "-104.8");
        assert!(r.ok());

        let err = r.lat().unwrap_err();
        match err {
            BatchError::Coordinate { axis, value, .. } => {
                assert_eq!(axis, Axis::Latitude);
                assert_eq!(value, "north");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(r.lng().unwrap(), Some(-104.8));
    }

    #[test]
    fn test_half_missing_pair_fails_conversion() {
        let r = result("39.5", "");
        assert!(r.ok());
        assert!(matches!(
            r.lng(),
            Err(BatchError::Coordinate {
                axis: Axis::Longitude,
                ..
            })
        ));
    }

    #[test]
    fn test_debug_never_reports_coordinates() {
        let r = result("39.73", "-104.99");
        assert_eq!(r.debug(false), [None, None]);

        assert_eq!(
            r.render_debug(),
            "\n\nBing Batch result\n\n-----------\n\n['39.73', '-104.99']\n"
        );
    }

    #[test]
    fn test_debug_block_without_pair() {
        let r = BatchForwardResult::new(None);
        assert_eq!(r.debug(false), [None, None]);
        assert!(r.render_debug().ends_with("-----------\n\nNone\n"));
    }
}
