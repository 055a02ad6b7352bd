//! Cosmetic post-processing of a rendered raster.
//!
//! `square` is the encoder's own output. `dots` and `rounded` are accepted and currently leave
//! the raster untouched; a real transform would need the module grid, not just pixels, to keep
//! finder patterns square for scanners.

use crate::error::{Error, Result};
use crate::options::QrStyle;
use image::RgbaImage;

/// Applies `style` to `surface` in place.
///
/// # Errors
///
/// Returns [`Error::StyleTransform`] if the surface is empty or not square.
pub fn apply_style(surface: &mut RgbaImage, style: QrStyle) -> Result<()> {
    let (width, height) = surface.dimensions();
    if width == 0 || width != height {
        return Err(Error::StyleTransform(format!(
            "cannot apply {style} style to a {width}x{height} surface"
        )));
    }

    match style {
        QrStyle::Square => {}
        QrStyle::Dots | QrStyle::Rounded => {
            tracing::debug!(%style, "Style has no module transform yet, keeping square modules");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::encode;
    use crate::options::QrCodeOptions;

    #[test]
    fn test_every_style_is_pixel_identical() {
        let original = encode("https://scanfolio.com/acme", &QrCodeOptions::default()).unwrap();
        for style in [QrStyle::Square, QrStyle::Dots, QrStyle::Rounded] {
            let mut styled = original.clone();
            apply_style(&mut styled, style).unwrap();
            assert_eq!(styled, original, "{style} changed pixels");
        }
    }

    #[test]
    fn test_rejects_unusable_surfaces() {
        let mut empty = RgbaImage::new(0, 0);
        assert!(matches!(
            apply_style(&mut empty, QrStyle::Square),
            Err(Error::StyleTransform(_))
        ));

        let mut wide = RgbaImage::new(20, 10);
        let err = apply_style(&mut wide, QrStyle::Dots).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Style transform failed: cannot apply dots style to a 20x10 surface"
        );
    }
}
