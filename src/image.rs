use crate::canvas::ImagePixels;
use crate::context::LayoutContext;
use crate::error::{LayoutError, Result};
use crate::surface::Surface;
use crate::types::{Pt, Size};
use base64::Engine;
use std::path::Path;
use std::sync::Arc;

/// Pluggable image measurement and drawing.
pub trait ImageRenderer: std::fmt::Debug + Send + Sync {
    fn measure(&self, ctx: &LayoutContext) -> Result<Size>;
    /// Draws at the surface origin.
    fn render(&self, surface: &mut Surface<'_>) -> Result<()>;
}

/// Decoded raster image drawn at its intrinsic size, one point per pixel.
#[derive(Debug, Clone)]
pub struct BitmapImage {
    source_id: String,
    pixels: ImagePixels,
}

impl BitmapImage {
    pub fn from_pixels(source_id: impl Into<String>, pixels: image::RgbaImage) -> Self {
        Self {
            source_id: source_id.into(),
            pixels: Arc::new(pixels),
        }
    }

    pub fn from_bytes(source_id: impl Into<String>, data: &[u8]) -> Result<Self> {
        let source_id = source_id.into();
        let pixels =
            decode_rgba(data, None).map_err(|err| LayoutError::resource(&source_id, err))?;
        Ok(Self::from_pixels(source_id, pixels))
    }

    /// Loads a `data:` URI or a file path.
    pub fn load(source: &str) -> Result<Self> {
        if source.starts_with("data:") {
            let (mime, data) = parse_data_uri(source).ok_or_else(|| {
                LayoutError::resource(source_label(source), "malformed data URI")
            })?;
            let pixels = decode_rgba(&data, Some(&mime))
                .map_err(|err| LayoutError::resource(source_label(source), err))?;
            return Ok(Self::from_pixels(source, pixels));
        }
        let bytes =
            std::fs::read(Path::new(source)).map_err(|err| LayoutError::resource(source, err))?;
        Self::from_bytes(source, &bytes)
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn pixels(&self) -> &ImagePixels {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn intrinsic_size(&self) -> Size {
        Size::new(
            Pt::from_i32(self.width() as i32),
            Pt::from_i32(self.height() as i32),
        )
    }
}

impl ImageRenderer for BitmapImage {
    fn measure(&self, _ctx: &LayoutContext) -> Result<Size> {
        Ok(self.intrinsic_size())
    }

    fn render(&self, surface: &mut Surface<'_>) -> Result<()> {
        let size = self.intrinsic_size();
        let canvas = surface.canvas();
        canvas.register_image(self.source_id.clone(), self.pixels.clone());
        canvas.draw_image(
            Pt::ZERO,
            Pt::ZERO,
            size.width,
            size.height,
            self.source_id.clone(),
        );
        Ok(())
    }
}

/// Image leaf content.
#[derive(Debug, Clone)]
pub struct ImageBox {
    renderer: Arc<dyn ImageRenderer>,
}

impl ImageBox {
    pub fn new(renderer: Arc<dyn ImageRenderer>) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &Arc<dyn ImageRenderer> {
        &self.renderer
    }
}

// Data URIs make unreadable error labels; keep the header only.
fn source_label(source: &str) -> String {
    match source.split_once(',') {
        Some((header, _)) => format!("{header},..."),
        None => source.to_string(),
    }
}

fn decode_rgba(
    data: &[u8],
    mime: Option<&str>,
) -> std::result::Result<image::RgbaImage, image::ImageError> {
    let format = match mime {
        Some(mime) if mime.contains("png") => Some(image::ImageFormat::Png),
        Some(mime) if mime.contains("jpeg") || mime.contains("jpg") => {
            Some(image::ImageFormat::Jpeg)
        }
        Some(_) => None,
        None => image::guess_format(data).ok(),
    };
    let decoded = match format {
        Some(format) => image::load_from_memory_with_format(data, format)?,
        None => image::load_from_memory(data)?,
    };
    Ok(decoded.to_rgba8())
}

fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let (header, payload) = uri.strip_prefix("data:")?.split_once(',')?;
    let mime = header
        .split(';')
        .next()
        .filter(|v| !v.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = if header.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .ok()?
    } else {
        payload.as_bytes().to_vec()
    };
    Some((mime, data))
}
