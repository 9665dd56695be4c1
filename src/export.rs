//! Preview → PDF.
//!
//! 1. [`ExportPipeline::request`] starts capturing the preview page.
//! 2. While capturing, the app scrolls the preview to
//!    [`ExportPipeline::scroll_override`] and reports each drawn frame to
//!    [`ExportPipeline::poll`]. The pipeline screenshots the visible part of the
//!    page, pastes it into a page-sized canvas and scrolls on until every part of
//!    the page has been seen.
//! 3. A worker resamples the canvas to the export scale, embeds it in an A4-wide
//!    PDF page and saves the file.

use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui::{self, Rect, Vec2};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage, imageops::FilterType};
use printpdf::{Image, ImageTransform, Mm, PdfDocument};

use crate::error::ExportError;
use crate::settings::ExportSettings;
use crate::task::{Task, TaskPoll};

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;
const MM_PER_INCH: f32 = 25.4;
/// Sub-point slack when comparing layout positions between frames.
const LAYOUT_SLACK: f32 = 0.5;

/// `Invoice-{number}.pdf`, or `Invoice-untitled.pdf` for a blank number.
///
/// The number is user text, so anything that could turn the name into a path
/// (separators, `..`, characters Windows rejects) becomes `-`.
pub fn export_file_name(invoice_number: &str) -> String {
    let number: String = invoice_number
        .trim()
        .chars()
        .map(|c| if unsafe_in_file_name(c) { '-' } else { c })
        .collect();
    let number = number.replace("..", "-");
    let number = if number.is_empty() { "untitled" } else { number.as_str() };
    format!("Invoice-{}.pdf", number)
}

fn unsafe_in_file_name(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// Where the raster lands on the page, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub image_height_mm: f32,
    /// Raster resolution that makes the image exactly one page wide.
    pub dpi: f32,
}

impl PageGeometry {
    /// A4 width; the page grows past A4 height when the raster is taller.
    pub fn for_raster(width_px: u32, height_px: u32) -> Self {
        let width_px = width_px.max(1) as f32;
        let image_height_mm = height_px as f32 * A4_WIDTH_MM / width_px;
        PageGeometry {
            width_mm: A4_WIDTH_MM,
            height_mm: image_height_mm.max(A4_HEIGHT_MM),
            image_height_mm,
            dpi: width_px * MM_PER_INCH / A4_WIDTH_MM,
        }
    }
}

/// Resample `raster`, captured at `pixels_per_point`, to `scale` pixels per point.
pub fn upscale(raster: RgbaImage, pixels_per_point: f32, scale: f32) -> RgbaImage {
    let factor = scale / pixels_per_point;
    if (factor - 1.0).abs() < f32::EPSILON {
        return raster;
    }
    let width = ((raster.width() as f32 * factor).round() as u32).max(1);
    let height = ((raster.height() as f32 * factor).round() as u32).max(1);
    image::imageops::resize(&raster, width, height, FilterType::CatmullRom)
}

/// Embed `raster` in a one-page PDF, anchored top-left.
pub fn render_pdf(raster: &RgbImage, title: &str) -> Result<Vec<u8>, ExportError> {
    if raster.width() == 0 || raster.height() == 0 {
        return Err(ExportError::Empty);
    }

    let geometry = PageGeometry::for_raster(raster.width(), raster.height());
    let (doc, page, layer) = PdfDocument::new(
        title,
        Mm(geometry.width_mm),
        Mm(geometry.height_mm),
        "Invoice",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(raster.clone()));
    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(0.0)),
            // PDF origin is bottom-left.
            translate_y: Some(Mm(geometry.height_mm - geometry.image_height_mm)),
            dpi: Some(geometry.dpi),
            ..Default::default()
        },
    );

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Copy `rect` (in points) out of a window screenshot, clamped to the image.
pub fn crop_screenshot(shot: &egui::ColorImage, rect: Rect, pixels_per_point: f32) -> RgbaImage {
    let [width, height] = shot.size;
    let to_px = |v: f32, limit: usize| ((v * pixels_per_point).round().max(0.0) as usize).min(limit);
    let (x0, x1) = (to_px(rect.min.x, width), to_px(rect.max.x, width));
    let (y0, y1) = (to_px(rect.min.y, height), to_px(rect.max.y, height));

    let tile_width = x1.saturating_sub(x0) as u32;
    let tile_height = y1.saturating_sub(y0) as u32;
    RgbaImage::from_fn(tile_width, tile_height, |x, y| {
        let pixel = shot.pixels[(y0 + y as usize) * width + x0 + x as usize];
        Rgba(pixel.to_srgba_unmultiplied())
    })
}

/// How the preview was laid out in one frame, in screen points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewFrame {
    /// The whole page, which may extend past the viewport.
    pub page: Rect,
    /// The scroll area's viewport. Only `page ∩ viewport` is on screen.
    pub viewport: Rect,
    pub scroll_offset: Vec2,
}

impl PreviewFrame {
    pub fn visible(&self) -> Rect {
        self.page.intersect(self.viewport)
    }

    /// Top-left of the page in scroll-content coordinates.
    fn page_origin(&self) -> Vec2 {
        self.page.min - self.viewport.min + self.scroll_offset
    }
}

#[derive(Debug, PartialEq)]
pub enum CaptureProgress {
    More,
    Done,
}

/// Stitches screenshots of the scrolled preview into one raster of the page.
///
/// Tiles are taken row by row. Each one must show the page starting at the
/// cursor, otherwise the page cannot be captured whole and stitching fails.
#[derive(Debug)]
pub struct PageCapture {
    page_size: Vec2,
    pixels_per_point: f32,
    canvas: RgbaImage,
    /// Page-relative point that the next tile has to start at.
    cursor: Vec2,
    /// Highest bottom edge shared by every tile of the current row.
    row_bottom: f32,
}

impl PageCapture {
    pub fn new(page_size: Vec2, pixels_per_point: f32) -> Self {
        let width = (page_size.x * pixels_per_point).round().max(1.0) as u32;
        let height = (page_size.y * pixels_per_point).round().max(1.0) as u32;
        PageCapture {
            page_size,
            pixels_per_point,
            canvas: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
            cursor: Vec2::ZERO,
            row_bottom: f32::INFINITY,
        }
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    /// Paste the visible part of the page from `shot`, taken of a frame laid
    /// out as `frame`.
    pub fn add_tile(
        &mut self,
        shot: &egui::ColorImage,
        frame: &PreviewFrame,
        pixels_per_point: f32,
    ) -> Result<CaptureProgress, ExportError> {
        let resized = (frame.page.size() - self.page_size).abs().max_elem() > LAYOUT_SLACK;
        if resized || (pixels_per_point - self.pixels_per_point).abs() > f32::EPSILON {
            return Err(ExportError::PreviewChanged);
        }

        let visible = frame.visible();
        let min = visible.min - frame.page.min;
        let max = visible.max - frame.page.min;
        let covers_cursor = min.x <= self.cursor.x + LAYOUT_SLACK
            && min.y <= self.cursor.y + LAYOUT_SLACK
            && max.x > self.cursor.x
            && max.y > self.cursor.y;
        if !visible.is_positive() || !covers_cursor {
            return Err(ExportError::Incomplete);
        }

        let tile = crop_screenshot(shot, visible, pixels_per_point);
        let x = (min.x * pixels_per_point).round() as i64;
        let y = (min.y * pixels_per_point).round() as i64;
        image::imageops::replace(&mut self.canvas, &tile, x, y);

        self.row_bottom = self.row_bottom.min(max.y);
        if max.x < self.page_size.x - LAYOUT_SLACK {
            self.cursor.x = max.x;
            return Ok(CaptureProgress::More);
        }

        self.cursor = Vec2::new(0.0, self.row_bottom);
        self.row_bottom = f32::INFINITY;
        if self.cursor.y < self.page_size.y - LAYOUT_SLACK {
            Ok(CaptureProgress::More)
        } else {
            Ok(CaptureProgress::Done)
        }
    }

    pub fn into_raster(self) -> RgbaImage {
        self.canvas
    }
}

#[derive(Debug)]
struct Capture {
    generation: u64,
    file_name: String,
    page_origin: Vec2,
    stitch: PageCapture,
    /// A screenshot was asked for and has not arrived yet.
    awaiting: bool,
    /// This frame is drawn at the capture's scroll offset without scroll bars.
    positioned: bool,
    /// Where the user had scrolled before the capture took over.
    restore_offset: Vec2,
}

/// Travels with each screenshot request: the capture it belongs to and the
/// layout of the frame being captured.
#[derive(Debug, Clone)]
struct CaptureTicket {
    generation: u64,
    frame: PreviewFrame,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportStatus {
    Idle,
    Capturing,
    Rendering,
    Finished(PathBuf),
    Cancelled,
    Failed(String),
}

type ExportResult = Result<Option<PathBuf>, ExportError>;

pub struct ExportPipeline {
    status: ExportStatus,
    capture: Option<Capture>,
    generation: u64,
    restore: Option<Vec2>,
    worker: Option<Task<ExportResult>>,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        ExportPipeline {
            status: ExportStatus::Idle,
            capture: None,
            generation: 0,
            restore: None,
            worker: None,
        }
    }
}

impl ExportPipeline {
    pub fn status(&self) -> &ExportStatus {
        &self.status
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.status, ExportStatus::Capturing | ExportStatus::Rendering)
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Start an export. Without a rendered preview this does nothing.
    pub fn request(&mut self, ctx: &egui::Context, preview: Option<PreviewFrame>, invoice_number: &str) {
        let Some(frame) = preview.filter(|f| f.page.is_positive()) else {
            tracing::debug!("Export requested before the preview was rendered; ignoring");
            return;
        };
        if self.status == ExportStatus::Rendering {
            tracing::debug!("Export already in progress; ignoring");
            return;
        }

        // Asking again mid-capture starts over, so a lost screenshot cannot wedge it.
        let restore_offset = self
            .capture
            .take()
            .map_or(frame.scroll_offset, |c| c.restore_offset);
        self.generation += 1;
        let capture = Capture {
            generation: self.generation,
            file_name: export_file_name(invoice_number),
            page_origin: frame.page_origin(),
            stitch: PageCapture::new(frame.page.size(), ctx.pixels_per_point()),
            awaiting: false,
            positioned: false,
            restore_offset,
        };
        tracing::debug!(file = %capture.file_name, page = ?frame.page.size(), "Capturing preview");
        self.capture = Some(capture);
        self.status = ExportStatus::Capturing;
        ctx.request_repaint();
    }

    /// Scroll offset the preview has to be drawn at this frame, if any.
    /// Call once per frame before drawing the preview.
    pub fn scroll_override(&mut self) -> Option<Vec2> {
        match &mut self.capture {
            Some(capture) => {
                capture.positioned = true;
                Some(capture.page_origin + capture.stitch.cursor())
            }
            None => self.restore.take(),
        }
    }

    /// Drive the pipeline; call once per frame, after the preview was drawn.
    pub fn poll(&mut self, ctx: &egui::Context, preview: Option<PreviewFrame>, settings: &ExportSettings) {
        self.poll_capture(ctx, preview, settings);
        self.poll_worker();
    }

    /// Clear a finished status once it has been shown.
    pub fn acknowledge(&mut self) {
        if !self.is_busy() {
            self.status = ExportStatus::Idle;
        }
    }

    fn poll_capture(&mut self, ctx: &egui::Context, preview: Option<PreviewFrame>, settings: &ExportSettings) {
        let Some(capture) = &mut self.capture else {
            return;
        };

        if let Some((shot, ticket)) = take_screenshot(ctx, capture.generation) {
            match capture.stitch.add_tile(&shot, &ticket.frame, ctx.pixels_per_point()) {
                Ok(CaptureProgress::More) => {
                    capture.awaiting = false;
                    capture.positioned = false;
                    ctx.request_repaint();
                }
                Ok(CaptureProgress::Done) => {
                    if let Some(capture) = self.capture.take() {
                        self.restore = Some(capture.restore_offset);
                        self.start_worker(ctx, capture, settings);
                    }
                }
                Err(e) => {
                    tracing::warn!("Export failed: {}", e);
                    self.restore = self.capture.take().map(|c| c.restore_offset);
                    self.status = ExportStatus::Failed(e.to_string());
                }
            }
            // The next tile needs a frame drawn at the new offset.
            return;
        }

        if capture.awaiting || !capture.positioned {
            return;
        }
        let Some(frame) = preview else {
            return;
        };
        capture.awaiting = true;
        let ticket = CaptureTicket {
            generation: capture.generation,
            frame,
        };
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::new(ticket)));
    }

    fn start_worker(&mut self, ctx: &egui::Context, capture: Capture, settings: &ExportSettings) {
        let pixels_per_point = capture.stitch.pixels_per_point();
        let raster = capture.stitch.into_raster();
        let file_name = capture.file_name;
        let settings = settings.clone();
        self.worker = Some(Task::spawn(ctx, "pdf-export", move || {
            render_and_save(raster, pixels_per_point, &file_name, &settings)
        }));
        self.status = ExportStatus::Rendering;
    }

    fn poll_worker(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };
        let finished = match worker.poll() {
            TaskPoll::Pending => return,
            TaskPoll::Ready(result) => result,
            TaskPoll::Lost => Err(ExportError::Interrupted),
        };
        self.worker = None;

        self.status = match finished {
            Ok(Some(path)) => {
                tracing::info!("Exported invoice to {:?}", path);
                ExportStatus::Finished(path)
            }
            Ok(None) => {
                tracing::debug!("Export save dialog cancelled");
                ExportStatus::Cancelled
            }
            Err(e) => {
                tracing::warn!("Export failed: {}", e);
                ExportStatus::Failed(e.to_string())
            }
        };
    }
}

fn take_screenshot(ctx: &egui::Context, generation: u64) -> Option<(Arc<egui::ColorImage>, CaptureTicket)> {
    ctx.input(|i| {
        i.raw.events.iter().find_map(|event| match event {
            egui::Event::Screenshot { image, user_data, .. } => {
                let ticket = user_data
                    .data
                    .as_ref()?
                    .downcast_ref::<CaptureTicket>()?
                    .clone();
                (ticket.generation == generation).then(|| (Arc::clone(image), ticket))
            }
            _ => None,
        })
    })
}

fn render_and_save(
    raster: RgbaImage,
    pixels_per_point: f32,
    file_name: &str,
    settings: &ExportSettings,
) -> ExportResult {
    let raster = upscale(raster, pixels_per_point, settings.scale);
    let rgb = DynamicImage::ImageRgba8(raster).to_rgb8();
    let bytes = render_pdf(&rgb, file_name.trim_end_matches(".pdf"))?;
    save(&bytes, file_name, settings)
}

fn save(bytes: &[u8], file_name: &str, settings: &ExportSettings) -> ExportResult {
    let dir = settings.target_dir();

    if !settings.prompt {
        let path = dir.join(file_name);
        write_pdf(&path, bytes)?;
        return Ok(Some(path));
    }

    futures::executor::block_on(ask_and_save(bytes, file_name, &dir))
}

async fn ask_and_save(bytes: &[u8], file_name: &str, dir: &Path) -> ExportResult {
    let Some(handle) = rfd::AsyncFileDialog::new()
        .set_title("Save Invoice")
        .set_directory(dir)
        .set_file_name(file_name)
        .add_filter("PDF", &["pdf"])
        .save_file()
        .await
    else {
        return Ok(None);
    };
    let path = handle.path().to_path_buf();
    write_pdf(&path, bytes)?;
    Ok(Some(path))
}

fn write_pdf(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
