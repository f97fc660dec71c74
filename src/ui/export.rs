use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use eframe::egui::{self, ColorImage, Rect};
use image::{ImageFormat, RgbaImage, imageops};

// ---------------------------------------------------------------------------
// Plot export
// ---------------------------------------------------------------------------

/// Where and how large to save the next export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub path: PathBuf,
    /// Pixel scale applied on top of the screen resolution.
    pub scale: f32,
}

/// Saves the plot area as PNG via a viewport screenshot.
///
/// A request is queued, a screenshot is asked from the viewport, and the
/// image arrives as an event on a later frame.
#[derive(Debug, Default)]
pub struct Exporter {
    pending: Option<ExportRequest>,
    screenshot_requested: bool,
}

impl Exporter {
    /// Ask the user for a destination and queue the export.
    pub fn request_with_dialog(&mut self, scale: f32) {
        let file = rfd::FileDialog::new()
            .set_title("Export plot")
            .add_filter("PNG Files", &["png"])
            .set_file_name("plot.png")
            .save_file();
        if let Some(path) = file {
            self.pending = Some(ExportRequest { path, scale });
        }
    }

    /// Whether an export is queued or waiting for its screenshot.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Drive the export state machine. Call once per frame with the plot rect.
    /// Returns the outcome once an export finishes.
    pub fn poll(&mut self, ctx: &egui::Context, plot_rect: Rect) -> Option<Result<PathBuf>> {
        let request = self.pending.as_ref()?;

        if !self.screenshot_requested {
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
            self.screenshot_requested = true;
            return None;
        }

        let screenshot: Option<Arc<ColorImage>> = ctx.input(|i| {
            i.raw.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(Arc::clone(image)),
                _ => None,
            })
        });
        let shot = screenshot?;

        let region = shot.region(&plot_rect, Some(ctx.pixels_per_point()));
        let outcome = write_png(&region, &request.path, request.scale)
            .map(|()| request.path.clone());

        match &outcome {
            Ok(path) => log::info!("Plot saved to {}", path.display()),
            Err(e) => log::error!("Export failed: {e:#}"),
        }
        self.pending = None;
        self.screenshot_requested = false;
        Some(outcome)
    }
}

/// Encode `image` as PNG at `scale` times its pixel size.
pub fn write_png(image: &ColorImage, path: &Path, scale: f32) -> Result<()> {
    if !(scale.is_finite() && scale > 0.0) {
        bail!("export scale must be positive, got {scale}");
    }
    let [w, h] = image.size;
    let bytes: Vec<u8> = image.pixels.iter().flat_map(|c| c.to_array()).collect();
    let rgba = RgbaImage::from_raw(w as u32, h as u32, bytes)
        .context("screenshot buffer does not match its size")?;

    let out_w = ((w as f32) * scale).round().max(1.0) as u32;
    let out_h = ((h as f32) * scale).round().max(1.0) as u32;
    let rgba = if (out_w, out_h) == (w as u32, h as u32) {
        rgba
    } else {
        imageops::resize(&rgba, out_w, out_h, imageops::FilterType::Lanczos3)
    };

    rgba.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))
}
