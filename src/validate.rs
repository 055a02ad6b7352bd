//! Payload validation and complexity estimation.
//!
//! Both checks run before encoding and never panic. Validation can reject a payload outright;
//! complexity estimation is purely advisory.

use crate::qrcode::QrCodeEcc;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Largest payload accepted, in UTF-16 code units. This is the byte-mode capacity of a version 40
/// symbol at the lowest error correction level.
pub const MAX_PAYLOAD_LEN: usize = 2953;

/// Payloads longer than this still encode but produce dense, harder to scan symbols.
pub const LONG_PAYLOAD_LEN: usize = 500;

/// Upper bound of the `low` complexity band.
pub const LOW_COMPLEXITY_LEN: usize = 100;

/// Reasons a payload is rejected before encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("QR code text cannot be empty")]
    EmptyPayload,
    #[error("QR code text is too long ({length} code units, max 2953)")]
    PayloadTooLong { length: usize },
}

/// Advisory findings that do not block generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationWarning {
    LongPayload { length: usize },
    UnusualScheme { scheme: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::LongPayload { .. } => {
                write!(f, "Long text may result in complex QR codes that are harder to scan")
            }
            ValidationWarning::UnusualScheme { scheme } => write!(
                f,
                "Non-HTTP URLs ({scheme}:) may not be supported by all QR scanners"
            ),
        }
    }
}

/// Result of [`validate_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid { warnings: Vec<ValidationWarning> },
    Invalid(ValidationError),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid { .. })
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationOutcome::Invalid(err) => Some(err),
            ValidationOutcome::Valid { .. } => None,
        }
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        match self {
            ValidationOutcome::Valid { warnings } => warnings,
            ValidationOutcome::Invalid(_) => &[],
        }
    }

    /// Converts into a `Result`, keeping the warnings on success.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ValidationError> {
        match self {
            ValidationOutcome::Valid { warnings } => Ok(warnings),
            ValidationOutcome::Invalid(err) => Err(err),
        }
    }
}

/// Checks a payload before it is encoded.
///
/// Length is counted in UTF-16 code units, the way browsers measure text, so a character
/// outside the Basic Multilingual Plane (an emoji, say) counts twice. A payload that parses as an absolute URL with a scheme
/// other than `http` or `https` is accepted with a warning.
pub fn validate_text(text: &str) -> ValidationOutcome {
    if text.trim().is_empty() {
        return ValidationOutcome::Invalid(ValidationError::EmptyPayload);
    }

    let length = utf16_len(text);
    if length > MAX_PAYLOAD_LEN {
        return ValidationOutcome::Invalid(ValidationError::PayloadTooLong { length });
    }

    let mut warnings = Vec::new();
    if length > LONG_PAYLOAD_LEN {
        warnings.push(ValidationWarning::LongPayload { length });
    }

    // Anything that isn't a URL is fine as-is
    if let Ok(url) = Url::parse(text) {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            warnings.push(ValidationWarning::UnusualScheme {
                scheme: scheme.to_owned(),
            });
        }
    }

    ValidationOutcome::Valid { warnings }
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
}

/// Advisory output of [`estimate_complexity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexityEstimate {
    pub level: ComplexityLevel,
    pub recommendation: &'static str,
}

impl ComplexityEstimate {
    /// Error correction levels suggested for this complexity band.
    pub fn recommended_levels(&self) -> &'static [QrCodeEcc] {
        match self.level {
            ComplexityLevel::Low => &QrCodeEcc::ALL,
            ComplexityLevel::Medium => &[QrCodeEcc::Medium, QrCodeEcc::Quartile],
            ComplexityLevel::High => &[QrCodeEcc::High],
        }
    }
}

/// Classifies a payload by length, in UTF-16 code units. Never gates generation.
pub fn estimate_complexity(text: &str) -> ComplexityEstimate {
    let length = utf16_len(text);
    if length <= LOW_COMPLEXITY_LEN {
        ComplexityEstimate {
            level: ComplexityLevel::Low,
            recommendation: "Perfect for quick scanning. Consider using any error correction level.",
        }
    } else if length <= LONG_PAYLOAD_LEN {
        ComplexityEstimate {
            level: ComplexityLevel::Medium,
            recommendation: "Good for most use cases. Recommend Medium or Quartile error correction.",
        }
    } else {
        ComplexityEstimate {
            level: ComplexityLevel::High,
            recommendation: "Complex QR code. Use High error correction and ensure good print quality.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_whitespace_rejected() {
        for text in ["", " ", "\t\n  "] {
            assert_eq!(
                validate_text(text).error(),
                Some(&ValidationError::EmptyPayload)
            );
        }
    }

    #[test]
    fn test_length_boundary() {
        let at_limit = validate_text(&"x".repeat(MAX_PAYLOAD_LEN));
        assert!(at_limit.is_valid());
        assert!(at_limit.error().is_none());

        let over = validate_text(&"x".repeat(MAX_PAYLOAD_LEN + 1));
        assert_eq!(
            over.error(),
            Some(&ValidationError::PayloadTooLong { length: 2954 })
        );
        assert!(over.warnings().is_empty());
    }

    #[test]
    fn test_long_payload_warning_boundary() {
        assert!(validate_text(&"x".repeat(500)).warnings().is_empty());
        assert_eq!(
            validate_text(&"x".repeat(501)).warnings(),
            &[ValidationWarning::LongPayload { length: 501 }]
        );
    }

    #[test]
    fn test_length_counts_utf16_units() {
        // BMP characters count once, whatever their UTF-8 width
        assert!(validate_text(&"é".repeat(500)).warnings().is_empty());

        // Astral characters count as a surrogate pair
        assert!(validate_text(&"😀".repeat(250)).warnings().is_empty());
        assert_eq!(
            validate_text(&"😀".repeat(251)).warnings(),
            &[ValidationWarning::LongPayload { length: 502 }]
        );
        assert_eq!(
            validate_text(&"😀".repeat(1477)).error(),
            Some(&ValidationError::PayloadTooLong { length: 2954 })
        );

        assert_eq!(estimate_complexity(&"😀".repeat(50)).level, ComplexityLevel::Low);
        assert_eq!(estimate_complexity(&"😀".repeat(51)).level, ComplexityLevel::Medium);
        assert_eq!(estimate_complexity(&"😀".repeat(300)).level, ComplexityLevel::High);
    }

    #[test]
    fn test_scheme_warnings() {
        assert!(validate_text("https://scanfolio.com/acme").warnings().is_empty());
        assert!(validate_text("http://scanfolio.com").warnings().is_empty());
        assert!(validate_text("plain words, not a url").warnings().is_empty());

        let outcome = validate_text("mailto:hello@scanfolio.com");
        assert!(outcome.is_valid());
        assert_eq!(
            outcome.warnings(),
            &[ValidationWarning::UnusualScheme {
                scheme: "mailto".to_owned()
            }]
        );
        assert!(outcome.warnings()[0].to_string().contains("mailto:"));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(validate_text("ok").into_result(), Ok(vec![]));
        assert_eq!(
            validate_text("").into_result(),
            Err(ValidationError::EmptyPayload)
        );
    }

    #[test]
    fn test_complexity_thresholds() {
        let level = |n: usize| estimate_complexity(&"x".repeat(n)).level;
        assert_eq!(level(0), ComplexityLevel::Low);
        assert_eq!(level(100), ComplexityLevel::Low);
        assert_eq!(level(101), ComplexityLevel::Medium);
        assert_eq!(level(500), ComplexityLevel::Medium);
        assert_eq!(level(501), ComplexityLevel::High);
    }

    #[test]
    fn test_recommended_levels() {
        let high = estimate_complexity(&"x".repeat(900));
        assert_eq!(high.recommended_levels(), &[QrCodeEcc::High]);
        let medium = estimate_complexity(&"x".repeat(200));
        assert_eq!(
            medium.recommended_levels(),
            &[QrCodeEcc::Medium, QrCodeEcc::Quartile]
        );
    }

    #[test]
    fn test_warning_wire_shape() {
        let json = serde_json::to_value(ValidationWarning::LongPayload { length: 600 }).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "longPayload", "length": 600 }));
    }

    proptest! {
        #[test]
        fn validation_never_panics_and_respects_limit(text in ".{0,3100}") {
            let outcome = validate_text(&text);
            let length = text.encode_utf16().count();
            if text.trim().is_empty() {
                prop_assert_eq!(outcome.error(), Some(&ValidationError::EmptyPayload));
            } else if length > MAX_PAYLOAD_LEN {
                prop_assert!(!outcome.is_valid());
            } else {
                prop_assert!(outcome.is_valid());
            }
        }
    }
}
