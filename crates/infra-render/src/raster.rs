// Image decoding into core rasters

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::RgbaImage;
use ocrdeck_core::port::{Raster, RenderError};

/// Decode encoded image bytes (any format the `image` crate was built with)
pub fn decode_image(bytes: &[u8]) -> Result<Raster, RenderError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| RenderError::Decode(e.to_string()))?;
    Ok(from_rgba(decoded.to_rgba8()))
}

/// Payload of a `data:<mime>;base64,<payload>` URL
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, RenderError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Unsupported("not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Decode("data URL without payload".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(RenderError::Unsupported(format!(
            "data URL encoding '{}'",
            meta
        )));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| RenderError::Decode(e.to_string()))
}

pub fn from_rgba(image: RgbaImage) -> Raster {
    Raster {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    }
}

pub fn to_rgba(raster: &Raster) -> Result<RgbaImage, RenderError> {
    RgbaImage::from_raw(raster.width, raster.height, raster.rgba.clone()).ok_or_else(|| {
        RenderError::Decode(format!(
            "raster buffer does not match {}x{}",
            raster.width, raster.height
        ))
    })
}

/// Solid PNG used by tests across the crate
#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    use image::{ImageFormat, Rgba};
    let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png() {
        let raster = decode_image(&png_bytes(4, 3)).unwrap();
        assert_eq!((raster.width, raster.height), (4, 3));
        assert_eq!(&raster.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(RenderError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_data_url() {
        let bytes = png_bytes(2, 2);
        let url = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));
        assert_eq!(decode_data_url(&url).unwrap(), bytes);

        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("https://example.com/a.png").is_err());
    }

    #[test]
    fn test_raster_buffer_mismatch() {
        let raster = Raster {
            width: 3,
            height: 3,
            rgba: vec![0; 4],
        };
        assert!(to_rgba(&raster).is_err());
    }
}
