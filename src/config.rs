//! Configuration for the generation defaults.
//!
//! Every field can be overridden through a `SCANFOLIO_QR_`-prefixed environment variable,
//! e.g. `SCANFOLIO_QR_SIZE=512` or `SCANFOLIO_QR_ERROR_CORRECTION_LEVEL=H`.

use crate::design;
use crate::error::{Error, Result};
use crate::helper::{self, ExportFormat, DEFAULT_OUTPUT_DIR};
use crate::options::{Color, QrCodeOptions, QrStyle};
use crate::qrcode::QrCodeEcc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const ENV_PREFIX: &str = "SCANFOLIO_QR_";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_size")]
    pub size: u32,

    #[serde(default = "default_margin")]
    pub margin: u32,

    #[serde(default = "default_foreground")]
    pub foreground_color: Color,

    #[serde(default = "default_background")]
    pub background_color: Color,

    #[serde(default = "default_error_correction")]
    pub error_correction_level: QrCodeEcc,

    #[serde(default)]
    pub style: QrStyle,

    /// Where exported files land
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Public origin used to build portfolio links, e.g. `https://scanfolio.com`
    #[serde(default)]
    pub portfolio_origin: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            margin: default_margin(),
            foreground_color: default_foreground(),
            background_color: default_background(),
            error_correction_level: default_error_correction(),
            style: QrStyle::default(),
            output_dir: default_output_dir(),
            portfolio_origin: None,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .map_err(|e| Error::Config(format!("Failed to parse environment variables: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.default_options()
            .check()
            .map_err(|e| Error::Config(e.to_string()))?;

        if let Some(origin) = &self.portfolio_origin {
            let url = Url::parse(origin)
                .map_err(|e| Error::Config(format!("Invalid portfolio_origin: {}", e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(Error::Config(
                    "portfolio_origin must be an http or https URL".to_string(),
                ));
            }
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::Config("output_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Options new QR codes start from
    pub fn default_options(&self) -> QrCodeOptions {
        QrCodeOptions {
            size: self.size,
            margin: self.margin,
            foreground_color: self.foreground_color,
            background_color: self.background_color,
            error_correction_level: self.error_correction_level,
            style: self.style,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Renders `text` and writes it into the configured output directory.
    ///
    /// See [`helper::export_file`] for naming and format handling.
    pub fn export_file(
        &self,
        text: &str,
        options: &QrCodeOptions,
        format: ExportFormat,
        name: &str,
    ) -> Result<PathBuf> {
        helper::export_file(text, options, format, Some(self.output_dir()), name)
    }

    /// Public link for `slug` under the configured `portfolio_origin`.
    pub fn portfolio_url(&self, slug: &str) -> Result<Url> {
        let origin = self
            .portfolio_origin
            .as_deref()
            .ok_or_else(|| Error::Config("portfolio_origin is not set".to_string()))?;
        design::portfolio_url(origin, slug)
    }
}

fn default_size() -> u32 {
    256
}

fn default_margin() -> u32 {
    4
}

fn default_foreground() -> Color {
    Color::BLACK
}

fn default_background() -> Color {
    Color::WHITE
}

fn default_error_correction() -> QrCodeEcc {
    QrCodeEcc::Medium
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}
