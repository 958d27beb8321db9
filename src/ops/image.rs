//! Raster image operations: lossy size reduction and format conversion.

use crate::error::OperationError;
use crate::output::SizeReport;
use image::{DynamicImage, ImageFormat};
use jpeg_encoder::{ColorType as JpegColorType, Encoder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Output format of the image format converter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageTarget {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Gif,
    Tiff,
}

impl ImageTarget {
    pub const ALL: [ImageTarget; 5] = [
        ImageTarget::Png,
        ImageTarget::Jpeg,
        ImageTarget::Bmp,
        ImageTarget::Gif,
        ImageTarget::Tiff,
    ];

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageTarget::Png => "png",
            ImageTarget::Jpeg => "jpg",
            ImageTarget::Bmp => "bmp",
            ImageTarget::Gif => "gif",
            ImageTarget::Tiff => "tiff",
        }
    }

    pub fn format(&self) -> ImageFormat {
        match self {
            ImageTarget::Png => ImageFormat::Png,
            ImageTarget::Jpeg => ImageFormat::Jpeg,
            ImageTarget::Bmp => ImageFormat::Bmp,
            ImageTarget::Gif => ImageFormat::Gif,
            ImageTarget::Tiff => ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for ImageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageTarget::Png),
            "jpg" | "jpeg" => Ok(ImageTarget::Jpeg),
            "bmp" => Ok(ImageTarget::Bmp),
            "gif" => Ok(ImageTarget::Gif),
            "tif" | "tiff" => Ok(ImageTarget::Tiff),
            other => Err(format!(
                "Unknown image format '{other}' (expected png, jpeg, bmp, gif or tiff)"
            )),
        }
    }
}

/// Re-encode `input` as an optimized RGB JPEG at `quality` and write it to
/// `output`.
///
/// Alpha is dropped and Huffman tables are optimized for the image. The
/// result is not guaranteed to be smaller than the input; the returned
/// report carries both sizes either way.
pub fn reduce(input: &Path, output: &Path, quality: u8) -> Result<SizeReport, OperationError> {
    let rgb = open(input)?.to_rgb8();
    let encode_err = |detail: String| OperationError::JpegEncode {
        path: output.to_path_buf(),
        detail,
    };
    let width = u16::try_from(rgb.width())
        .map_err(|_| encode_err(format!("width {} exceeds 65535", rgb.width())))?;
    let height = u16::try_from(rgb.height())
        .map_err(|_| encode_err(format!("height {} exceeds 65535", rgb.height())))?;

    let file = File::create(output).map_err(|e| OperationError::Io {
        path: output.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    let mut encoder = Encoder::new(&mut writer, quality.clamp(1, 100));
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(rgb.as_raw(), width, height, JpegColorType::Rgb)
        .map_err(|e| encode_err(e.to_string()))?;
    writer.flush().map_err(|e| OperationError::Io {
        path: output.to_path_buf(),
        source: e,
    })?;

    let report = SizeReport {
        original_bytes: file_size(input)?,
        reduced_bytes: file_size(output)?,
    };
    info!(
        "Re-encoded {} at quality {} ({} → {} bytes)",
        input.display(),
        quality,
        report.original_bytes,
        report.reduced_bytes
    );
    Ok(report)
}

/// Decode `input` and write it to `output` in the `target` format.
pub fn convert(input: &Path, output: &Path, target: ImageTarget) -> Result<(), OperationError> {
    let img = open(input)?;
    // JPEG has no alpha channel; the BMP and GIF encoders only take 8-bit.
    let img = match target {
        ImageTarget::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageTarget::Bmp | ImageTarget::Gif => DynamicImage::ImageRgba8(img.to_rgba8()),
        ImageTarget::Png | ImageTarget::Tiff => img,
    };

    img.save_with_format(output, target.format())
        .map_err(|e| OperationError::Image {
            path: output.to_path_buf(),
            source: e,
        })?;
    info!(
        "Converted {} to {} at {}",
        input.display(),
        target,
        output.display()
    );
    Ok(())
}

fn open(path: &Path) -> Result<DynamicImage, OperationError> {
    super::ensure_readable(path)?;
    image::open(path).map_err(|e| OperationError::Image {
        path: path.to_path_buf(),
        source: e,
    })
}

fn file_size(path: &Path) -> Result<u64, OperationError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| OperationError::from_io(path, e))
}
