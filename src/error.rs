//! Error types for the QR pipeline.

use crate::helper::ExportFormat;
use crate::qrcode::DataTooLong;
use crate::validate::ValidationError;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a generation, export or configuration step can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload was rejected before any encoding was attempted
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The payload does not fit a symbol at the requested error correction level
    #[error("QR encoding failed: {0}")]
    Encoding(#[from] DataTooLong),

    /// A style post-processing step could not be applied
    #[error("Style transform failed: {0}")]
    StyleTransform(String),

    /// Generation options are out of range
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// A color string is not of the form `#RRGGBB`
    #[error("Invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    /// The export format is recognised but cannot be produced
    #[error("Export format not supported: {0}")]
    UnsupportedFormat(ExportFormat),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Raster encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for input problems the user can fix by editing the payload or options.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::Encoding(_)
                | Error::InvalidOptions(_)
                | Error::InvalidColor(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::from(ValidationError::EmptyPayload);
        assert_eq!(err.to_string(), "QR code text cannot be empty");
        assert!(err.is_user_error());

        let err = Error::from(DataTooLong::DataOverCapacity(100, 72));
        assert!(err.to_string().contains("100 bits"));
        assert!(err.is_user_error());

        let err = Error::UnsupportedFormat(ExportFormat::Pdf);
        assert_eq!(err.to_string(), "Export format not supported: pdf");
        assert!(!err.is_user_error());
    }
}
