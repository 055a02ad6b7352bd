//! # scanfolio-qr
//!
//! QR code generation for ScanFolio portfolio links.
//!
//! `scanfolio-qr` turns a payload (usually a portfolio URL) and a set of options into a styled,
//! downloadable QR code. It validates payloads before encoding, encodes QR Code Model 2 symbols
//! (versions 1 to 40, four error correction levels), rasterizes them at an exact pixel size with
//! custom colors, and exports PNG data URLs, PNG/JPEG files and SVG.
//!
//! ## Features
//!
//! - Validate payloads up front: empty and oversized payloads are rejected, long payloads and
//!   unusual URL schemes produce warnings.
//! - Estimate payload complexity and suggest an error correction level.
//! - Encode at exactly the requested error correction level; never silently downgrade.
//! - Render `size × size` rasters with verbatim foreground/background colors.
//! - Export as PNG data URL, PNG blob, JPEG, or SVG.
//! - Last-write-wins delivery for live previews.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Example
//!
//! Generate a QR code for a portfolio:
//!
//! ```rust
//! use scanfolio_qr::{generate_qr_code, portfolio_url, QrCodeEcc, QrCodeOptions};
//!
//! let target = portfolio_url("https://scanfolio.com", "acme").unwrap();
//! let options = QrCodeOptions {
//!     size: 512,
//!     error_correction_level: QrCodeEcc::Quartile,
//!     ..QrCodeOptions::default()
//! };
//! let result = generate_qr_code(target.as_str(), &options).unwrap();
//! assert_eq!(result.surface.dimensions(), (512, 512));
//! assert!(result.warnings.is_empty());
//! ```
//!
//! Check a payload before encoding:
//!
//! ```rust
//! use scanfolio_qr::validate::{estimate_complexity, validate_text, ComplexityLevel};
//!
//! let outcome = validate_text("mailto:hello@scanfolio.com");
//! assert!(outcome.is_valid());
//! assert_eq!(outcome.warnings().len(), 1);
//! assert_eq!(estimate_complexity("short").level, ComplexityLevel::Low);
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: Core QR code encoding functionality.
//! - [`helper`]: Rasterizing, SVG rendering and file export.
//! - [`validate`]: Payload validation and complexity estimation.
//! - [`options`]: Generation options and colors.
//! - [`style`]: Style post-processing.
//! - [`generator`]: The generation entry point.
//! - [`preview`]: Last-write-wins preview delivery.
//! - [`design`]: Saved design validation and portfolio links.
//! - [`config`]: Environment-driven defaults.

#![forbid(unsafe_code)]

pub mod config;
pub mod design;
pub mod error;
pub mod generator;
pub mod helper;
pub mod options;
pub mod preview;
pub mod qrcode;
pub mod style;
pub mod validate;

pub use config::GeneratorConfig;
pub use design::{portfolio_url, QrDesign};
pub use error::{Error, Result};
pub use generator::{generate_qr_code, QrCodeResult};
pub use helper::{encode, export_file, to_blob, to_data_url, to_svg, Blob, ExportFormat};
pub use options::{Color, QrCodeOptions, QrStyle};
pub use preview::{PreviewScheduler, PreviewTicket};
pub use qrcode::{DataTooLong, QrCode, QrCodeEcc};
pub use style::apply_style;
pub use validate::{
    estimate_complexity, validate_text, ComplexityEstimate, ComplexityLevel, ValidationError,
    ValidationOutcome, ValidationWarning,
};
