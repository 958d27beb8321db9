//! Thumbnails of the uploaded input.
//!
//! PDF pages are rasterised through pdfium; images are scaled with `image`.
//! Both run on the blocking pool. A preview is decoration: any failure is
//! captured as [`Preview::Failed`] and never reaches the workflow state.
//!
//! ## Locating pdfium
//!
//! 1. `PDFIUM_LIB_PATH` (a library file or the directory containing it)
//! 2. the platform library name in the current directory
//! 3. the system library search path

use crate::config::WorkflowConfig;
use crate::tool::Tool;
use ::image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable pointing at the pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// A rendered thumbnail with its caption.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// `"Page 3"` for PDF pages, the file name for images.
    pub label: String,
    pub image: DynamicImage,
}

/// What the presentation can show next to the upload.
#[derive(Debug, Clone, Default)]
pub enum Preview {
    /// The tool has nothing to preview.
    #[default]
    None,
    Pages(Vec<Thumbnail>),
    Image(Thumbnail),
    /// Rendering failed; the message is shown in place of the thumbnails.
    Failed(String),
}

impl Preview {
    /// Write each thumbnail into `dir` as PNG (`page-<n>.png` or
    /// `thumbnail.png`) and return the written paths.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, ::image::ImageError> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        match self {
            Preview::Pages(pages) => {
                for (i, thumb) in pages.iter().enumerate() {
                    let path = dir.join(format!("page-{}.png", i + 1));
                    thumb.image.save(&path)?;
                    written.push(path);
                }
            }
            Preview::Image(thumb) => {
                let path = dir.join("thumbnail.png");
                thumb.image.save(&path)?;
                written.push(path);
            }
            Preview::None | Preview::Failed(_) => {}
        }
        Ok(written)
    }
}

/// Preview for `path` as an input of `tool`.
pub async fn preview_for(tool: Tool, path: &Path, config: &WorkflowConfig) -> Preview {
    if tool.has_page_preview() {
        pdf_thumbnails(path, config.thumbnail_width, config.thumbnail_height).await
    } else if matches!(tool, Tool::ImageSizeReducer | Tool::ImageFormatConverter) {
        image_thumbnail(path, config.image_thumbnail_edge).await
    } else {
        Preview::None
    }
}

/// Render every page of the PDF at `path` to fit `max_width × max_height`.
pub async fn pdf_thumbnails(path: &Path, max_width: u32, max_height: u32) -> Preview {
    let path = path.to_path_buf();
    let rendered = tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, max_width, max_height)
    })
    .await
    .map_err(|e| format!("Preview task panicked: {e}"))
    .and_then(|r| r);

    match rendered {
        Ok(pages) => Preview::Pages(pages),
        Err(msg) => {
            warn!("Page preview failed: {}", msg);
            Preview::Failed(msg)
        }
    }
}

/// Scale the image at `path` so its longest edge is at most `max_edge`.
pub async fn image_thumbnail(path: &Path, max_edge: u32) -> Preview {
    let path = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || {
        let img = ::image::open(&path).map_err(|e| format!("Could not load image: {e}"))?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok::<_, String>(Thumbnail {
            label,
            image: img.thumbnail(max_edge, max_edge),
        })
    })
    .await
    .map_err(|e| format!("Preview task panicked: {e}"))
    .and_then(|r| r);

    match result {
        Ok(thumb) => Preview::Image(thumb),
        Err(msg) => {
            warn!("Image preview failed: {}", msg);
            Preview::Failed(msg)
        }
    }
}

fn bind_pdfium() -> Result<Pdfium, String> {
    let from_env = std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from);
    let bindings = match from_env {
        Some(path) if path.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&path))
        }
        Some(path) => Pdfium::bind_to_library(&path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")),
    }
    .or_else(|_| Pdfium::bind_to_system_library())
    .map_err(|e| format!("PDFium library not available: {e:?}"))?;
    Ok(Pdfium::new(bindings))
}

fn render_pages_blocking(
    path: &Path,
    max_width: u32,
    max_height: u32,
) -> Result<Vec<Thumbnail>, String> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| format!("Could not open PDF for preview: {e:?}"))?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_width as i32)
        .set_maximum_height(max_height as i32);

    let mut thumbs = Vec::with_capacity(document.pages().len() as usize);
    for (i, page) in document.pages().iter().enumerate() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| format!("Could not render page {}: {e:?}", i + 1))?;
        let image = bitmap.as_image();
        debug!(
            "Rendered preview of page {} → {}x{} px",
            i + 1,
            image.width(),
            image.height()
        );
        thumbs.push(Thumbnail {
            label: format!("Page {}", i + 1),
            image,
        });
    }
    Ok(thumbs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgb, RgbImage};

    #[tokio::test]
    async fn image_thumbnail_fits_requested_edge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::from_pixel(800, 200, Rgb([10, 20, 30])).save(&path).unwrap();

        match image_thumbnail(&path, 320).await {
            Preview::Image(thumb) => {
                assert_eq!(thumb.label, "wide.png");
                assert_eq!(thumb.image.width(), 320);
                assert_eq!(thumb.image.height(), 80);
            }
            other => panic!("expected image preview, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreadable_image_is_captured_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"nope").unwrap();
        assert!(matches!(image_thumbnail(&path, 320).await, Preview::Failed(_)));
    }

    #[tokio::test]
    async fn tools_without_preview_return_none() {
        let config = WorkflowConfig::default();
        let preview = preview_for(Tool::TextToPdf, Path::new("notes.txt"), &config).await;
        assert!(matches!(preview, Preview::None));
    }

    #[tokio::test]
    async fn missing_pdf_preview_fails_without_panicking() {
        let preview = pdf_thumbnails(Path::new("/definitely/missing.pdf"), 120, 160).await;
        assert!(matches!(preview, Preview::Failed(_)));
    }

    #[test]
    fn write_to_dir_names_thumbnails() {
        let dir = tempfile::tempdir().unwrap();
        let thumb = |label: &str| Thumbnail {
            label: label.to_string(),
            image: DynamicImage::ImageRgb8(RgbImage::new(4, 4)),
        };

        let pages = Preview::Pages(vec![thumb("Page 1"), thumb("Page 2")]);
        let written = pages.write_to_dir(dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("page-2.png").is_file());

        let single = Preview::Image(thumb("x.png"));
        single.write_to_dir(&dir.path().join("img")).unwrap();
        assert!(dir.path().join("img/thumbnail.png").is_file());
    }
}
