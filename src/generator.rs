//! The generation entry point: validate, encode, style, export.

use crate::error::Result;
use crate::helper::{rasterize, to_blob, to_data_url, Blob};
use crate::options::{QrCodeOptions, MIN_SCANNABLE_CONTRAST};
use crate::qrcode::{QrCode, QrCodeEcc, Version};
use crate::style::apply_style;
use crate::validate::{validate_text, ValidationWarning};
use image::RgbaImage;
use tracing::{debug, instrument, warn};

/// Everything produced by one generation call. The caller owns all of it.
#[derive(Debug, Clone)]
pub struct QrCodeResult {
    /// The styled raster, `size × size` pixels
    pub surface: RgbaImage,
    /// `data:image/png;base64,` embed of `surface`
    pub data_url: String,
    /// PNG bytes of `surface`
    pub blob: Blob,
    /// Symbol version chosen by the encoder
    pub version: Version,
    pub error_correction_level: QrCodeEcc,
    /// Advisory findings from validation
    pub warnings: Vec<ValidationWarning>,
}

/// Generates a styled QR code for `text`.
///
/// Validation errors and encoding errors are returned before any raster is produced.
/// Validation warnings never block and are carried on the result.
///
/// # Example
///
/// ```rust
/// use scanfolio_qr::{generate_qr_code, QrCodeOptions};
///
/// let result = generate_qr_code("https://scanfolio.com/acme", &QrCodeOptions::default()).unwrap();
/// assert!(result.data_url.starts_with("data:image/png;base64,"));
/// assert_eq!(result.surface.width(), 256);
/// ```
#[instrument(level = "debug", skip(text), fields(len = text.len()))]
pub fn generate_qr_code(text: &str, options: &QrCodeOptions) -> Result<QrCodeResult> {
    options.check()?;
    let warnings = validate_text(text).into_result()?;
    for warning in &warnings {
        debug!(%warning, "Payload accepted with warning");
    }
    if !options.has_scannable_contrast() {
        warn!(
            contrast = options.contrast_ratio(),
            minimum = MIN_SCANNABLE_CONTRAST,
            "Low color contrast may prevent scanning"
        );
    }

    let qr = QrCode::encode_text(text, options.error_correction_level)?;
    debug!(version = qr.version().value(), mask = qr.mask().value(), "Encoded symbol");

    let mut surface = rasterize(&qr, options);
    apply_style(&mut surface, options.style)?;

    let data_url = to_data_url(&surface)?;
    let blob = to_blob(&surface)?;

    Ok(QrCodeResult {
        surface,
        data_url,
        blob,
        version: qr.version(),
        error_correction_level: qr.error_correction_level(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::options::{Color, QrStyle};
    use crate::validate::ValidationError;
    use proptest::prelude::*;

    #[test]
    fn test_scenario() {
        let options = QrCodeOptions {
            size: 256,
            margin: 4,
            foreground_color: Color::BLACK,
            background_color: Color::WHITE,
            error_correction_level: QrCodeEcc::Medium,
            style: QrStyle::Square,
        };
        let result = generate_qr_code("https://scanfolio.com/acme", &options).unwrap();
        assert_eq!(result.surface.dimensions(), (256, 256));
        assert!(result.data_url.starts_with("data:image/png;base64,"));
        assert!(!result.blob.is_empty());
        assert_eq!(result.error_correction_level, QrCodeEcc::Medium);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validation_blocks_generation() {
        let options = QrCodeOptions::default();
        assert!(matches!(
            generate_qr_code("   ", &options),
            Err(Error::Validation(ValidationError::EmptyPayload))
        ));
        assert!(matches!(
            generate_qr_code(&"x".repeat(2954), &options),
            Err(Error::Validation(ValidationError::PayloadTooLong { length: 2954 }))
        ));
    }

    #[test]
    fn test_encoding_error_is_not_downgraded() {
        // Valid length, but too long for level H
        let options = QrCodeOptions {
            error_correction_level: QrCodeEcc::High,
            ..QrCodeOptions::default()
        };
        assert!(matches!(
            generate_qr_code(&"x".repeat(2000), &options),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn test_warnings_are_carried() {
        let result = generate_qr_code("ftp://files.scanfolio.com/menu.pdf", &QrCodeOptions::default()).unwrap();
        assert_eq!(
            result.warnings,
            vec![ValidationWarning::UnusualScheme {
                scheme: "ftp".to_owned()
            }]
        );
    }

    #[test]
    fn test_low_contrast_still_generates() {
        let options = QrCodeOptions {
            foreground_color: Color::rgb(0xf0, 0xf0, 0xf0),
            ..QrCodeOptions::default()
        };
        assert!(generate_qr_code("pale", &options).is_ok());
    }

    #[test]
    fn test_zero_size_rejected() {
        let options = QrCodeOptions {
            size: 0,
            ..QrCodeOptions::default()
        };
        assert!(matches!(
            generate_qr_code("ok", &options),
            Err(Error::InvalidOptions(_))
        ));
    }

    fn any_options() -> impl Strategy<Value = QrCodeOptions> {
        (
            16u32..400,
            0u32..12,
            any::<[u8; 3]>(),
            any::<[u8; 3]>(),
            prop::sample::select(QrCodeEcc::ALL.to_vec()),
            prop::sample::select(vec![QrStyle::Square, QrStyle::Dots, QrStyle::Rounded]),
        )
            .prop_map(|(size, margin, fg, bg, ecl, style)| QrCodeOptions {
                size,
                margin,
                foreground_color: Color::rgb(fg[0], fg[1], fg[2]),
                background_color: Color::rgb(bg[0], bg[1], bg[2]),
                error_correction_level: ecl,
                style,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn generation_is_deterministic(text in "[ -~]{1,120}", options in any_options()) {
            prop_assume!(!text.trim().is_empty());
            let a = generate_qr_code(&text, &options).unwrap();
            let b = generate_qr_code(&text, &options).unwrap();
            prop_assert_eq!(&a.surface, &b.surface);
            prop_assert_eq!(&a.data_url, &b.data_url);
            prop_assert_eq!(&a.blob, &b.blob);
            prop_assert_eq!(a.surface.dimensions(), (options.size, options.size));
        }
    }
}
