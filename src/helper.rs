use crate::error::{Error, Result};
use crate::options::QrCodeOptions;
use crate::qrcode::QrCode;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Prefix of every PNG data URL produced by [`to_data_url`].
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Directory used by [`export_file`] when the caller does not name one.
pub const DEFAULT_OUTPUT_DIR: &str = "generated";

/*---- Encoding ----*/

/// Encodes `text` at the configured error correction level and rasterizes it.
///
/// The output is exactly `options.size` pixels square. Each pixel samples the module grid,
/// quiet zone included, with integer arithmetic, so the same input always yields the same
/// pixels. Colors are written verbatim and fully opaque.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when the payload does not fit a version 40 symbol at the
/// requested level, and [`Error::InvalidOptions`] for a zero size or one above
/// [`crate::options::MAX_RASTER_SIZE`].
///
/// # Example
///
/// ```rust
/// use scanfolio_qr::helper::encode;
/// use scanfolio_qr::options::QrCodeOptions;
///
/// let img = encode("https://scanfolio.com/acme", &QrCodeOptions::default()).unwrap();
/// assert_eq!(img.dimensions(), (256, 256));
/// ```
pub fn encode(text: &str, options: &QrCodeOptions) -> Result<RgbaImage> {
    options.check()?;
    let qr = QrCode::encode_text(text, options.error_correction_level)?;
    Ok(rasterize(&qr, options))
}

/// Renders an already encoded symbol into a `size × size` raster.
pub fn rasterize(qr: &QrCode, options: &QrCodeOptions) -> RgbaImage {
    let size = u64::from(options.size);
    let margin = i64::from(options.margin);
    let total = qr.size() as u64 + 2 * margin as u64;
    let dark = Rgba(options.foreground_color.to_rgba());
    let light = Rgba(options.background_color.to_rgba());

    // Module index along one axis for a pixel coordinate
    let module_at = |p: u32| (u64::from(p) * total / size) as i64 - margin;

    RgbaImage::from_fn(options.size, options.size, |x, y| {
        let (qr_x, qr_y) = (module_at(x), module_at(y));
        let in_range = |v: i64| (0..i64::from(qr.size())).contains(&v);
        if in_range(qr_x) && in_range(qr_y) && qr.get_module(qr_x as i32, qr_y as i32) {
            dark
        } else {
            light
        }
    })
}

/*---- Raster exports ----*/

/// Binary PNG payload for file download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl Blob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encodes the raster as PNG bytes.
pub fn to_png_bytes(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}

/// Returns a `data:image/png;base64,` URL embedding the raster. Deterministic for equal input.
pub fn to_data_url(img: &RgbaImage) -> Result<String> {
    let png = to_png_bytes(img)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

/// Returns the same pixels as [`to_data_url`] as a binary PNG blob.
pub fn to_blob(img: &RgbaImage) -> Result<Blob> {
    Ok(Blob {
        bytes: to_png_bytes(img)?,
        mime_type: ExportFormat::Png.mime_type(),
    })
}

/// Encodes the raster as JPEG. The alpha channel is dropped since every pixel is opaque.
pub fn to_jpeg_bytes(img: &RgbaImage) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut buffer = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)?;
    Ok(buffer)
}

/*---- Vector export ----*/

/// Returns a string of SVG code depicting `text` encoded with the given options.
///
/// This is an independent encode at the same error correction level, not a tracing of the
/// raster. The `style` option has no effect on vector output.
/// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg(text: &str, options: &QrCodeOptions) -> Result<String> {
    options.check()?;
    let qr = QrCode::encode_text(text, options.error_correction_level)?;
    Ok(to_svg_string(&qr, options))
}

/// Returns SVG code for an already encoded symbol.
pub fn to_svg_string(qr: &QrCode, options: &QrCodeOptions) -> String {
	let border = options.margin as i64;
	let dimension = i64::from(qr.size()) + 2 * border;
	let mut result = String::new();
	result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
	result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
	result += &format!(
		"<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{1}\" height=\"{1}\" viewBox=\"0 0 {0} {0}\" shape-rendering=\"crispEdges\" stroke=\"none\">\n",
		dimension, options.size);
	result += &format!("\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n", options.background_color);
	result += "\t<path d=\"";
	let mut first = true;
	for y in 0 .. qr.size() {
		for x in 0 .. qr.size() {
			if qr.get_module(x, y) {
				if !first {
					result += " ";
				}
				first = false;
				result += &format!("M{},{}h1v1h-1z", i64::from(x) + border, i64::from(y) + border);
			}
		}
	}
	result += &format!("\" fill=\"{}\"/>\n", options.foreground_color);
	result += "</svg>\n";
	result
}

/*---- Files ----*/

/// File formats offered for download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpg,
    Svg,
    /// Recognised for stored designs but not rendered yet.
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpg => "image/jpeg",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Builds the download file name, falling back to `qr-code` when `name` is blank.
///
/// Only the last path component of `name` is kept, with either slash treated as a separator,
/// so the result never leaves the export directory. A name with no usable component, such as
/// `..`, also falls back to `qr-code`.
pub fn download_file_name(name: &str, format: ExportFormat) -> String {
    let stem = name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|stem| !stem.is_empty() && *stem != "." && *stem != "..")
        .unwrap_or("qr-code");
    format!("{}.{}", stem, format.extension())
}

/// Renders `text` in the requested format and returns the file contents.
///
/// Raster formats go through [`crate::generate_qr_code`], so validation and styling apply.
pub fn render_file(text: &str, options: &QrCodeOptions, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Png => Ok(crate::generate_qr_code(text, options)?.blob.bytes),
        ExportFormat::Jpg => to_jpeg_bytes(&crate::generate_qr_code(text, options)?.surface),
        ExportFormat::Svg => {
            crate::validate::validate_text(text).into_result()?;
            Ok(to_svg(text, options)?.into_bytes())
        }
        ExportFormat::Pdf => Err(Error::UnsupportedFormat(format)),
    }
}

/// Renders `text` and writes it to `{directory}/{name}.{ext}`.
///
/// # Arguments
///
/// * `text` - The content to encode.
/// * `options` - Generation options.
/// * `format` - Output file format.
/// * `directory` - Optional. Defaults to [`DEFAULT_OUTPUT_DIR`]; created if missing.
/// * `name` - File stem, see [`download_file_name`].
///
/// # Returns
///
/// The path of the written file.
pub fn export_file(
    text: &str,
    options: &QrCodeOptions,
    format: ExportFormat,
    directory: Option<&Path>,
    name: &str,
) -> Result<PathBuf> {
    let bytes = render_file(text, options, format)?;

    let directory = directory.unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR));
    // Check if the directory exists, create it if it doesn't
    if !directory.exists() {
        fs::create_dir_all(directory)?;
    }

    let path = directory.join(download_file_name(name, format));
    fs::write(&path, bytes)?;
    tracing::debug!(path = %path.display(), %format, "Exported QR code");
    Ok(path)
}
