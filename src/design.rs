//! Saved QR code designs as edited in the dashboard form.
//!
//! A design bundles what is stored with a QR code (name, target portfolio, colors, style,
//! branding) with the generation settings used for the preview.

use crate::error::{Error, Result};
use crate::helper::ExportFormat;
use crate::options::{Color, QrCodeOptions, QrStyle, MAX_UI_MARGIN, MAX_UI_SIZE, MIN_UI_SIZE};
use crate::qrcode::QrCodeEcc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

pub const MAX_NAME_LEN: usize = 100;
pub const MIN_LOGO_SIZE: u32 = 10;
pub const MAX_LOGO_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrDesign {
    pub name: String,
    pub portfolio_id: String,
    pub style: QrStyle,
    pub foreground_color: Color,
    pub background_color: Color,
    /// Any string; relative paths served by the app are fine
    pub logo_url: Option<String>,
    /// Logo size, in percent
    pub logo_size: u32,
    pub frame_style: Option<String>,
    pub frame_text: Option<String>,
    pub file_format: ExportFormat,
    pub is_active: bool,
    pub size: u32,
    pub error_correction: QrCodeEcc,
    pub margin: u32,
}

impl Default for QrDesign {
    fn default() -> Self {
        let options = QrCodeOptions::default();
        Self {
            name: String::new(),
            portfolio_id: String::new(),
            style: options.style,
            foreground_color: options.foreground_color,
            background_color: options.background_color,
            logo_url: None,
            logo_size: 20,
            frame_style: None,
            frame_text: None,
            file_format: ExportFormat::Png,
            is_active: true,
            size: options.size,
            error_correction: options.error_correction_level,
            margin: options.margin,
        }
    }
}

/// Field errors keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignErrors(pub BTreeMap<&'static str, String>);

impl DesignErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }
}

impl fmt::Display for DesignErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl QrDesign {
    /// Checks every field and reports all problems at once.
    pub fn validate(&self) -> std::result::Result<(), DesignErrors> {
        let mut errors = DesignErrors::default();

        let name_len = self.name.encode_utf16().count();
        if name_len == 0 {
            errors.add("name", "Name is required");
        } else if name_len > MAX_NAME_LEN {
            errors.add("name", "Name too long");
        }
        if self.portfolio_id.is_empty() {
            errors.add("portfolio_id", "Portfolio is required");
        }
        if !(MIN_LOGO_SIZE..=MAX_LOGO_SIZE).contains(&self.logo_size) {
            errors.add(
                "logo_size",
                format!("Logo size must be between {MIN_LOGO_SIZE} and {MAX_LOGO_SIZE}"),
            );
        }
        if !(MIN_UI_SIZE..=MAX_UI_SIZE).contains(&self.size) {
            errors.add(
                "size",
                format!("Size must be between {MIN_UI_SIZE} and {MAX_UI_SIZE}"),
            );
        }
        if self.margin > MAX_UI_MARGIN {
            errors.add("margin", format!("Margin must be between 0 and {MAX_UI_MARGIN}"));
        }
        if self.file_format == ExportFormat::Jpg {
            errors.add("file_format", "File format must be png, svg or pdf");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Generation options for this design's preview and downloads.
    pub fn to_options(&self) -> QrCodeOptions {
        QrCodeOptions {
            size: self.size,
            margin: self.margin,
            foreground_color: self.foreground_color,
            background_color: self.background_color,
            error_correction_level: self.error_correction,
            style: self.style,
        }
    }
}

/// Builds the public portfolio URL a QR code points at: `{origin}/portfolio/{slug}`.
pub fn portfolio_url(origin: &str, slug: &str) -> Result<Url> {
    let slug = slug.trim();
    if slug.is_empty() || slug.contains('/') {
        return Err(Error::InvalidOptions(format!("invalid portfolio slug {slug:?}")));
    }
    let mut url = Url::parse(origin)
        .map_err(|e| Error::Config(format!("Invalid origin '{origin}': {e}")))?;
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("Origin '{origin}' cannot carry a path")))?
        .pop_if_empty()
        .push("portfolio")
        .push(slug);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_design() -> QrDesign {
        QrDesign {
            name: "Acme business card".to_owned(),
            portfolio_id: "7d1c4f0e".to_owned(),
            ..QrDesign::default()
        }
    }

    #[test]
    fn test_defaults_match_form() {
        let design = QrDesign::default();
        assert_eq!(design.size, 256);
        assert_eq!(design.margin, 4);
        assert_eq!(design.logo_size, 20);
        assert_eq!(design.error_correction, QrCodeEcc::Medium);
        assert!(design.is_active);
        assert_eq!(design.to_options(), QrCodeOptions::default());
    }

    #[test]
    fn test_valid_design() {
        assert_eq!(valid_design().validate(), Ok(()));
    }

    #[test]
    fn test_collects_all_field_errors() {
        let design = QrDesign {
            name: "n".repeat(101),
            portfolio_id: String::new(),
            logo_size: 5,
            size: 2048,
            margin: 11,
            file_format: ExportFormat::Jpg,
            ..QrDesign::default()
        };
        let errors = design.validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Name too long"));
        assert_eq!(errors.get("portfolio_id"), Some("Portfolio is required"));
        assert!(errors.get("logo_size").is_some());
        assert!(errors.get("size").is_some());
        assert!(errors.get("margin").is_some());
        assert!(errors.get("file_format").is_some());
        assert!(errors.to_string().starts_with("file_format: "));
    }

    #[test]
    fn test_empty_name_and_logo() {
        let design = QrDesign {
            name: String::new(),
            logo_url: Some(String::new()),
            ..valid_design()
        };
        let errors = design.validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("logo_url"), None);
    }

    #[test]
    fn test_logo_url_accepts_any_string() {
        for logo in ["/logos/acme.png", "logos/acme.png", "https://cdn.scanfolio.com/acme.png"] {
            let design = QrDesign {
                logo_url: Some(logo.to_owned()),
                ..valid_design()
            };
            assert_eq!(design.validate(), Ok(()), "{logo:?}");
        }
    }

    #[test]
    fn test_name_length_counts_utf16_units() {
        let at_limit = QrDesign {
            name: "😀".repeat(50),
            ..valid_design()
        };
        assert_eq!(at_limit.validate(), Ok(()));
        let over = QrDesign {
            name: "😀".repeat(51),
            ..valid_design()
        };
        assert_eq!(over.validate().unwrap_err().get("name"), Some("Name too long"));
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let json = serde_json::json!({
            "name": "Menu",
            "portfolio_id": "p1",
            "foreground_color": "#123456",
            "file_format": "svg",
            "error_correction": "H"
        });
        let design: QrDesign = serde_json::from_value(json).unwrap();
        assert_eq!(design.foreground_color, Color::rgb(0x12, 0x34, 0x56));
        assert_eq!(design.background_color, Color::WHITE);
        assert_eq!(design.file_format, ExportFormat::Svg);
        assert_eq!(design.error_correction, QrCodeEcc::High);
        assert_eq!(design.validate(), Ok(()));
    }

    #[test]
    fn test_portfolio_url() {
        assert_eq!(
            portfolio_url("https://scanfolio.com", "acme").unwrap().as_str(),
            "https://scanfolio.com/portfolio/acme"
        );
        assert_eq!(
            portfolio_url("https://scanfolio.com/", "acme").unwrap().as_str(),
            "https://scanfolio.com/portfolio/acme"
        );
        assert!(portfolio_url("https://scanfolio.com", "").is_err());
        assert!(portfolio_url("https://scanfolio.com", "a/b").is_err());
        assert!(matches!(
            portfolio_url("scanfolio", "acme"),
            Err(Error::Config(_))
        ));
    }
}
