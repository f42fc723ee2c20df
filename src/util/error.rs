//! Error types for the turntable library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scene and asset operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File extension is not a supported asset format
    #[error("Unsupported asset format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Model file parsed but its content is unusable
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// Mesh primitive without position data
    #[error("Primitive in mesh '{0}' has no positions")]
    MissingPositions(String),

    /// glTF parse/validation error
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    /// Environment image decode error
    #[cfg(feature = "viewer")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid scene error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidScene(msg.into())
    }
}

/// Result type alias for turntable operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::FileNotFound(PathBuf::from("/tmp/missing.gltf"));
        assert!(e.to_string().contains("missing.gltf"));

        let e = Error::MissingPositions("pump_body".to_string());
        assert!(e.to_string().contains("pump_body"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
