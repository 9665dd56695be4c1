//! Company logo upload: pick an image, validate it, keep it as a data URI.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use eframe::egui;
use image::ImageFormat;

use crate::error::LogoError;
use crate::task::Task;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Outcome of one upload: `Ok(None)` when the picker was dismissed.
pub type LogoResult = Result<Option<String>, LogoError>;

pub struct LogoLoader;

impl LogoLoader {
    /// Open the image picker and read the chosen file off the UI thread.
    pub fn spawn(ctx: &egui::Context) -> Task<LogoResult> {
        Task::spawn(ctx, "logo-read", || futures::executor::block_on(pick_and_read()))
    }
}

async fn pick_and_read() -> LogoResult {
    let Some(handle) = rfd::AsyncFileDialog::new()
        .set_title("Company Logo")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
        .await
    else {
        tracing::debug!("Logo picker dismissed");
        return Ok(None);
    };

    let bytes = std::fs::read(handle.path())?;
    tracing::debug!(file = %handle.file_name(), bytes = bytes.len(), "Read logo file");
    encode_data_uri(&bytes).map(Some)
}

/// Validate `bytes` as an image and wrap them as `data:<mime>;base64,...`.
pub fn encode_data_uri(bytes: &[u8]) -> Result<String, LogoError> {
    let format = image::guess_format(bytes)?;
    // Decode once so a corrupt file never replaces a good logo.
    image::load_from_memory_with_format(bytes, format)?;
    Ok(format!(
        "data:{};base64,{}",
        mime_type(format),
        STANDARD.encode(bytes)
    ))
}

pub fn decode_data_uri(uri: &str) -> Result<egui::ColorImage, LogoError> {
    let payload = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| LogoError::DataUri("expected data:<mime>;base64,<payload>".into()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| LogoError::DataUri(e.to_string()))?;
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Texture for the current logo, rebuilt only when the URI changes.
#[derive(Default)]
pub struct LogoCache {
    uri: Option<String>,
    texture: Option<egui::TextureHandle>,
}

impl LogoCache {
    pub fn sync(&mut self, ctx: &egui::Context, uri: Option<&str>) -> Option<&egui::TextureHandle> {
        if self.uri.as_deref() != uri {
            self.uri = uri.map(str::to_string);
            self.texture = uri.and_then(|uri| match decode_data_uri(uri) {
                Ok(image) => Some(ctx.load_texture("company-logo", image, egui::TextureOptions::LINEAR)),
                Err(e) => {
                    tracing::warn!("Cannot display logo: {}", e);
                    None
                }
            });
        }
        self.texture.as_ref()
    }
}
