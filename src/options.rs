//! Generation options: size, quiet zone, colors, error correction level and style.

use crate::error::{Error, Result};
use crate::qrcode::QrCodeEcc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest output size offered by the product UI, in pixels.
pub const MIN_UI_SIZE: u32 = 128;
/// Largest output size offered by the product UI, in pixels.
pub const MAX_UI_SIZE: u32 = 1024;
/// Widest quiet zone offered by the product UI, in modules.
pub const MAX_UI_MARGIN: u32 = 10;

/// Largest raster side [`QrCodeOptions::check`] accepts, in pixels. A 1 GiB RGBA buffer.
pub const MAX_RASTER_SIZE: u32 = 16_384;

/// Contrast ratio below which scanners start to struggle.
pub const MIN_SCANNABLE_CONTRAST: f64 = 3.0;

/// An opaque RGB color, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Opaque RGBA channels for raster output.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xff]
    }

    /// WCAG relative luminance, in `[0, 1]`.
    pub fn relative_luminance(self) -> f64 {
        let channel = |c: u8| {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    /// WCAG contrast ratio between two colors, in `[1, 21]`. Symmetric.
    pub fn contrast_ratio(self, other: Color) -> f64 {
        let (a, b) = (self.relative_luminance(), other.relative_luminance());
        let (lighter, darker) = if a >= b { (a, b) } else { (b, a) };
        (lighter + 0.05) / (darker + 0.05)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| Error::InvalidColor(s.to_owned()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| Error::InvalidColor(s.to_owned()))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Cosmetic treatment applied to the rendered modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrStyle {
    #[default]
    Square,
    Dots,
    Rounded,
}

impl fmt::Display for QrStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QrStyle::Square => "square",
            QrStyle::Dots => "dots",
            QrStyle::Rounded => "rounded",
        })
    }
}

impl FromStr for QrStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "square" => Ok(QrStyle::Square),
            "dots" => Ok(QrStyle::Dots),
            "rounded" => Ok(QrStyle::Rounded),
            other => Err(Error::InvalidOptions(format!("unknown style {other:?}"))),
        }
    }
}

/// Everything that shapes a rendered symbol besides the payload itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeOptions {
    /// Width and height of the square output, in pixels
    pub size: u32,
    /// Quiet zone, in modules
    pub margin: u32,
    pub foreground_color: Color,
    pub background_color: Color,
    pub error_correction_level: QrCodeEcc,
    #[serde(default)]
    pub style: QrStyle,
}

impl Default for QrCodeOptions {
    fn default() -> Self {
        Self {
            size: 256,
            margin: 4,
            foreground_color: Color::BLACK,
            background_color: Color::WHITE,
            error_correction_level: QrCodeEcc::Medium,
            style: QrStyle::Square,
        }
    }
}

impl QrCodeOptions {
    /// Checks the constraints the encoder itself needs.
    ///
    /// Any positive size up to [`MAX_RASTER_SIZE`] is accepted, so the raster buffer can
    /// always be allocated.
    pub fn check(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidOptions("size must be positive".to_owned()));
        }
        if self.size > MAX_RASTER_SIZE {
            return Err(Error::InvalidOptions(format!(
                "size {} exceeds the maximum of {MAX_RASTER_SIZE} pixels",
                self.size
            )));
        }
        // Keeps the module grid arithmetic in range; far beyond any real symbol
        if self.margin > u32::from(u16::MAX) {
            return Err(Error::InvalidOptions(format!(
                "margin {} is too large",
                self.margin
            )));
        }
        Ok(())
    }

    /// Checks the tighter ranges offered by the product UI.
    pub fn check_ui_ranges(&self) -> Result<()> {
        self.check()?;
        if !(MIN_UI_SIZE..=MAX_UI_SIZE).contains(&self.size) {
            return Err(Error::InvalidOptions(format!(
                "size must be between {MIN_UI_SIZE} and {MAX_UI_SIZE}"
            )));
        }
        if self.margin > MAX_UI_MARGIN {
            return Err(Error::InvalidOptions(format!(
                "margin must be between 0 and {MAX_UI_MARGIN}"
            )));
        }
        Ok(())
    }

    pub fn contrast_ratio(&self) -> f64 {
        self.foreground_color.contrast_ratio(self.background_color)
    }

    pub fn has_scannable_contrast(&self) -> bool {
        self.contrast_ratio() >= MIN_SCANNABLE_CONTRAST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!("#000000".parse::<Color>().unwrap(), Color::BLACK);
        assert_eq!("#ffffff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!(
            "#1a2B3c".parse::<Color>().unwrap(),
            Color::rgb(0x1a, 0x2b, 0x3c)
        );
        for bad in ["000000", "#00000", "#0000000", "#GG0000", "", "#", "#ééé"] {
            assert!(
                matches!(bad.parse::<Color>(), Err(Error::InvalidColor(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_color_display_is_uppercase() {
        assert_eq!(Color::rgb(0xab, 0x01, 0xff).to_string(), "#AB01FF");
    }

    #[test]
    fn test_contrast() {
        assert!((Color::BLACK.contrast_ratio(Color::WHITE) - 21.0).abs() < 1e-9);
        assert!((Color::WHITE.contrast_ratio(Color::WHITE) - 1.0).abs() < 1e-9);
        assert_eq!(
            Color::BLACK.contrast_ratio(Color::WHITE),
            Color::WHITE.contrast_ratio(Color::BLACK)
        );

        let pale = QrCodeOptions {
            foreground_color: Color::rgb(0xee, 0xee, 0xee),
            ..QrCodeOptions::default()
        };
        assert!(!pale.has_scannable_contrast());
        assert!(QrCodeOptions::default().has_scannable_contrast());
    }

    #[test]
    fn test_check() {
        assert!(QrCodeOptions::default().check().is_ok());
        assert!(QrCodeOptions::default().check_ui_ranges().is_ok());

        let tiny = QrCodeOptions {
            size: 1,
            ..QrCodeOptions::default()
        };
        assert!(tiny.check().is_ok());
        assert!(tiny.check_ui_ranges().is_err());

        let zero = QrCodeOptions {
            size: 0,
            ..QrCodeOptions::default()
        };
        assert!(matches!(zero.check(), Err(Error::InvalidOptions(_))));

        let largest = QrCodeOptions {
            size: MAX_RASTER_SIZE,
            ..QrCodeOptions::default()
        };
        assert!(largest.check().is_ok());
        for size in [MAX_RASTER_SIZE + 1, 60_000, u32::MAX] {
            let huge = QrCodeOptions {
                size,
                ..QrCodeOptions::default()
            };
            assert!(
                matches!(huge.check(), Err(Error::InvalidOptions(_))),
                "size {size} should be rejected"
            );
        }

        let wide = QrCodeOptions {
            margin: 11,
            ..QrCodeOptions::default()
        };
        assert!(wide.check().is_ok());
        assert!(wide.check_ui_ranges().is_err());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::json!({
            "size": 512,
            "margin": 2,
            "foregroundColor": "#112233",
            "backgroundColor": "#ffffff",
            "errorCorrectionLevel": "Q",
            "style": "rounded"
        });
        let options: QrCodeOptions = serde_json::from_value(json).unwrap();
        assert_eq!(options.size, 512);
        assert_eq!(options.foreground_color, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(options.error_correction_level, QrCodeEcc::Quartile);
        assert_eq!(options.style, QrStyle::Rounded);

        let back = serde_json::to_value(&options).unwrap();
        assert_eq!(back["backgroundColor"], "#FFFFFF");
        assert_eq!(back["errorCorrectionLevel"], "Q");
    }

    #[test]
    fn test_bad_color_rejected_on_deserialize() {
        let json = serde_json::json!({
            "size": 256,
            "margin": 4,
            "foregroundColor": "black",
            "backgroundColor": "#FFFFFF",
            "errorCorrectionLevel": "M"
        });
        assert!(serde_json::from_value::<QrCodeOptions>(json).is_err());
    }

    #[test]
    fn test_style_parse() {
        for style in [QrStyle::Square, QrStyle::Dots, QrStyle::Rounded] {
            assert_eq!(style.to_string().parse::<QrStyle>().unwrap(), style);
        }
        assert!("hexagon".parse::<QrStyle>().is_err());
    }
}
