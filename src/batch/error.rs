use std::num::ParseFloatError;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Which half of a coordinate pair failed to convert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("malformed batch CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("batch result header has no {0:?} column")]
    MissingColumn(&'static str),

    #[error("batch document is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("{axis} {value:?} is not a number: {source}")]
    Coordinate {
        axis: Axis,
        value: String,
        #[source]
        source: ParseFloatError,
    },
}
