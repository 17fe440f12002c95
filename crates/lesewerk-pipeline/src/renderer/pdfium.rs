// SPDX-License-Identifier: PMPL-1.0-or-later
//
// PDFium-backed page renderer.
//
// Renders PDF pages to PNG bitmaps via the PDFium dynamic library. The
// library is discovered through the loader's ordered candidate list: an
// explicit `PDFIUM_DYNAMIC_LIB_PATH` override, then alongside the running
// executable, then the configured vendored directories, then the system
// search paths. The platform-specific library filename is derived from each
// candidate directory.
//
// `PdfiumRenderer` is stateless (`Send + Sync`). Each operation re-binds the
// library because the upstream `Pdfium` type is `!Send`; the OS caches
// `dlopen`/`LoadLibrary` calls, so repeat loads are near-free.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use image::ImageFormat;
use lesewerk_core::config::PipelineConfig;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::RecognitionSource;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::{PageRenderer, RendererProvider};

/// Environment override naming the library file directly.
pub const LIBRARY_PATH_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// Maximum dimension (width or height) for rendered page bitmaps.
/// Prevents OOM on absurd page sizes.
const MAX_DIMENSION_PX: u32 = 4096;

/// Where one renderer instance binds its library from.
#[derive(Debug, Clone)]
enum LibrarySource {
    /// Explicit path to the library file.
    File(String),
    /// Directory holding the platform-named library.
    Directory(PathBuf),
    /// Platform library search paths.
    System,
}

impl LibrarySource {
    fn bind(&self) -> Result<Pdfium> {
        let bindings = match self {
            Self::File(path) => Pdfium::bind_to_library(path),
            Self::Directory(dir) => Pdfium::bind_to_library(
                Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref()),
            ),
            Self::System => Pdfium::bind_to_system_library(),
        }
        .map_err(|err| {
            LesewerkError::RendererUnavailable(format!("cannot bind PDFium ({self:?}): {err}"))
        })?;
        Ok(Pdfium::new(bindings))
    }
}

/// PDF page renderer backed by the PDFium dynamic library.
pub struct PdfiumRenderer {
    library: LibrarySource,
}

/// Compute pixel dimensions for rendering one page, applying the dimension
/// guard. Preserves aspect ratio when capping.
fn compute_render_dimensions(width_points: f32, height_points: f32, scale: f32) -> (u32, u32) {
    let raw_w = (width_points * scale).max(1.0);
    let raw_h = (height_points * scale).max(1.0);

    let max_dim = raw_w.max(raw_h);
    if max_dim > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / max_dim;
        let w = ((raw_w * ratio) as u32).clamp(1, MAX_DIMENSION_PX);
        let h = ((raw_h * ratio) as u32).clamp(1, MAX_DIMENSION_PX);
        (w, h)
    } else {
        (raw_w as u32, raw_h as u32)
    }
}

impl PageRenderer for PdfiumRenderer {
    fn page_count(&self, document: &[u8]) -> Result<usize> {
        let pdfium = self.library.bind()?;
        let doc = pdfium
            .load_pdf_from_byte_slice(document, None)
            .map_err(|err| LesewerkError::PageRender {
                page: 0,
                reason: format!("failed to load PDF: {err}"),
            })?;
        Ok(doc.pages().len() as usize)
    }

    fn render_page(
        &self,
        document: &[u8],
        page_number: u32,
        scale: f32,
    ) -> Result<RecognitionSource> {
        let pdfium = self.library.bind()?;
        let doc = pdfium
            .load_pdf_from_byte_slice(document, None)
            .map_err(|err| LesewerkError::PageRender {
                page: page_number,
                reason: format!("failed to load PDF: {err}"),
            })?;

        let pages = doc.pages();
        let index = u16::try_from(page_number.saturating_sub(1)).map_err(|_| {
            LesewerkError::PageRender {
                page: page_number,
                reason: "page index exceeds u16 range".into(),
            }
        })?;
        let page = pages.get(index).map_err(|_| LesewerkError::PageRender {
            page: page_number,
            reason: format!("page out of range (document has {} pages)", pages.len()),
        })?;

        let width_points = page.width().value;
        let height_points = page.height().value;
        let (target_w, target_h) = compute_render_dimensions(width_points, height_points, scale);
        if (width_points * scale) as u32 != target_w {
            warn!(
                page = page_number,
                capped_width = target_w,
                capped_height = target_h,
                "page dimensions capped to {MAX_DIMENSION_PX}px"
            );
        }

        let config = PdfRenderConfig::new()
            .set_target_width(target_w as i32)
            .set_maximum_height(target_h as i32);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|err| LesewerkError::PageRender {
                page: page_number,
                reason: format!("rendering failed: {err}"),
            })?;

        let mut cursor = Cursor::new(Vec::new());
        bitmap
            .as_image()
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| LesewerkError::PageRender {
                page: page_number,
                reason: format!("PNG encoding failed: {err}"),
            })?;
        let png = cursor.into_inner();

        debug!(
            page = page_number,
            width = target_w,
            height = target_h,
            png_size = png.len(),
            "rendered PDF page"
        );
        Ok(RecognitionSource::document_page(png, page_number))
    }
}

/// One candidate PDFium location. Construction binds the library once as a
/// fail-fast check; the winning renderer re-binds per operation.
pub struct PdfiumProvider {
    library: LibrarySource,
}

impl PdfiumProvider {
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            library: LibrarySource::Directory(dir.into()),
        }
    }

    pub fn system() -> Self {
        Self {
            library: LibrarySource::System,
        }
    }
}

impl RendererProvider for PdfiumProvider {
    fn describe(&self) -> String {
        format!("PDFium {:?}", self.library)
    }

    fn construct(&self) -> Result<Arc<dyn PageRenderer>> {
        self.library.bind()?;
        Ok(Arc::new(PdfiumRenderer {
            library: self.library.clone(),
        }))
    }
}

/// Build the candidate list: env override, alongside the executable, the
/// configured vendored directories, then the system search paths.
pub fn providers_from_config(config: &PipelineConfig) -> Vec<Box<dyn RendererProvider>> {
    let mut providers: Vec<Box<dyn RendererProvider>> = Vec::new();

    if let Ok(path) = std::env::var(LIBRARY_PATH_ENV) {
        providers.push(Box::new(PdfiumProvider {
            library: LibrarySource::File(path),
        }));
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(exe_dir) = exe.parent()
    {
        providers.push(Box::new(PdfiumProvider::directory(exe_dir)));
    }

    for dir in &config.renderer_library_dirs {
        providers.push(Box::new(PdfiumProvider::directory(dir.clone())));
    }

    providers.push(Box::new(PdfiumProvider::system()));
    providers
}
