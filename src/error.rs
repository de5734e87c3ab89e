//! Error type for the fallible edges of the library.
//!
//! Statistics, normalization and heatmap generation never fail: malformed
//! records are dropped and logged. Errors only surface where the library
//! touches external data (EXIF tags, image extraction, GPX writing, JSON input, CLI I/O).

use thiserror::Error;

/// Errors produced at the library boundaries.
#[derive(Debug, Error)]
pub enum PhotoRouteError {
    /// The image carried no GPS latitude/longitude tags
    #[error("'{name}' has no GPS coordinates")]
    MissingGps { name: String },

    /// An EXIF rational had a zero denominator or non-finite value
    #[error("invalid rational value in EXIF field {field}")]
    InvalidRational { field: &'static str },

    /// The metadata extractor itself failed for an image
    #[error("metadata extraction failed for '{name}': {message}")]
    Extraction { name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PhotoRouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PhotoRouteError::MissingGps { name: "IMG_1.jpg".to_string() };
        assert_eq!(err.to_string(), "'IMG_1.jpg' has no GPS coordinates");

        let err = PhotoRouteError::InvalidRational { field: "GPSAltitude" };
        assert_eq!(err.to_string(), "invalid rational value in EXIF field GPSAltitude");
    }

    #[test]
    fn test_io_error_converts() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(PhotoRouteError::Io(_))));
    }

    #[test]
    fn test_gpx_write_failure_is_io() {
        struct Full;
        impl std::io::Write for Full {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let result = crate::write_gpx(&[crate::Waypoint::new("a", 0.0, 0.0)], Full);
        assert!(matches!(result, Err(PhotoRouteError::Io(_))));
    }
}
