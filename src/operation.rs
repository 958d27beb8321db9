//! The conversion a workflow run performs, as one tagged value.
//!
//! An [`Operation`] is built from the selected [`Tool`], the uploaded files
//! and the per-run [`ToolOptions`]. Building it is where user input is
//! validated; executing it is a plain blocking call into [`crate::ops`] that
//! the controller moves onto the blocking pool.

use crate::config::WorkflowConfig;
use crate::error::{OperationError, ValidationError};
use crate::ops::image::ImageTarget;
use crate::ops::pdf::PageRange;
use crate::ops::{image, pdf, text, word};
use crate::output::OperationOutput;
use crate::tool::Tool;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Per-run options entered alongside the upload.
///
/// Only the fields the selected tool uses are read; the rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOptions {
    /// Page range text as typed by the user (`"2-4"`). Split only.
    pub page_range: Option<String>,
    /// JPEG quality override. Size reducer only.
    pub quality: Option<u8>,
    /// Target format override. Format converter only.
    pub image_target: Option<ImageTarget>,
}

impl ToolOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_range(mut self, range: impl Into<String>) -> Self {
        self.page_range = Some(range.into());
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn image_target(mut self, target: ImageTarget) -> Self {
        self.image_target = Some(target);
        self
    }
}

/// A validated conversion, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Merge {
        inputs: Vec<PathBuf>,
        output: PathBuf,
    },
    Split {
        input: PathBuf,
        range: PageRange,
        output: PathBuf,
    },
    PdfToWord {
        input: PathBuf,
        output: PathBuf,
    },
    DocxToPdf {
        input: PathBuf,
        output: PathBuf,
        converter: PathBuf,
    },
    ReduceImage {
        input: PathBuf,
        output: PathBuf,
        quality: u8,
    },
    ConvertImage {
        input: PathBuf,
        output: PathBuf,
        target: ImageTarget,
    },
    TextToPdf {
        input: PathBuf,
        output: PathBuf,
    },
}

impl Operation {
    /// Validate `files` and `options` for `tool` and resolve the output path
    /// inside `config.work_dir`.
    pub fn build(
        tool: Tool,
        files: &[PathBuf],
        options: &ToolOptions,
        config: &WorkflowConfig,
    ) -> Result<Self, ValidationError> {
        check_file_count(tool, files)?;
        let output = config.work_dir.join(tool.output_file_name());
        let input = files[0].clone();

        let op = match tool {
            Tool::MergePdf => Operation::Merge {
                inputs: files.to_vec(),
                output,
            },
            Tool::SplitPdf => {
                let text = options
                    .page_range
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(ValidationError::MissingPageRange)?;
                Operation::Split {
                    input,
                    range: text.parse()?,
                    output,
                }
            }
            Tool::PdfToWord => Operation::PdfToWord { input, output },
            Tool::DocxToPdf => Operation::DocxToPdf {
                input,
                output,
                converter: config.soffice.clone(),
            },
            Tool::ImageSizeReducer => {
                let quality = options.quality.unwrap_or(config.jpeg_quality);
                if !(1..=100).contains(&quality) {
                    return Err(ValidationError::InvalidQuality(quality));
                }
                Operation::ReduceImage {
                    input,
                    output,
                    quality,
                }
            }
            Tool::ImageFormatConverter => {
                let target = options.image_target.unwrap_or(config.image_target);
                Operation::ConvertImage {
                    input,
                    output: config
                        .work_dir
                        .join(format!("converted_image.{}", target.extension())),
                    target,
                }
            }
            Tool::TextToPdf => Operation::TextToPdf { input, output },
        };
        debug!("Built {:?}", op);
        Ok(op)
    }

    pub fn tool(&self) -> Tool {
        match self {
            Operation::Merge { .. } => Tool::MergePdf,
            Operation::Split { .. } => Tool::SplitPdf,
            Operation::PdfToWord { .. } => Tool::PdfToWord,
            Operation::DocxToPdf { .. } => Tool::DocxToPdf,
            Operation::ReduceImage { .. } => Tool::ImageSizeReducer,
            Operation::ConvertImage { .. } => Tool::ImageFormatConverter,
            Operation::TextToPdf { .. } => Tool::TextToPdf,
        }
    }

    /// Where the result will be written.
    pub fn output(&self) -> &Path {
        match self {
            Operation::Merge { output, .. }
            | Operation::Split { output, .. }
            | Operation::PdfToWord { output, .. }
            | Operation::DocxToPdf { output, .. }
            | Operation::ReduceImage { output, .. }
            | Operation::ConvertImage { output, .. }
            | Operation::TextToPdf { output, .. } => output,
        }
    }

    /// Extension proposed when saving the result.
    pub fn save_extension(&self) -> &'static str {
        match self {
            Operation::ConvertImage { target, .. } => target.extension(),
            other => other.tool().save_extension(),
        }
    }

    /// Run the conversion. Blocks; call from the blocking pool.
    pub fn execute(self) -> Result<OperationOutput, OperationError> {
        let tool = self.tool();
        if let Some(dir) = self.output().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| OperationError::Io {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
            }
        }

        match self {
            Operation::Merge { inputs, output } => {
                let pages = pdf::merge(&inputs, &output)?;
                Ok(OperationOutput::new(tool, output).with_page_count(pages))
            }
            Operation::Split {
                input,
                range,
                output,
            } => {
                let pages = pdf::split(&input, range, &output)?;
                Ok(OperationOutput::new(tool, output).with_page_count(pages))
            }
            Operation::PdfToWord { input, output } => {
                pdf::to_docx(&input, &output)?;
                Ok(OperationOutput::new(tool, output))
            }
            Operation::DocxToPdf {
                input,
                output,
                converter,
            } => {
                word::docx_to_pdf(&input, &output, &converter)?;
                Ok(OperationOutput::new(tool, output))
            }
            Operation::ReduceImage {
                input,
                output,
                quality,
            } => {
                let size = image::reduce(&input, &output, quality)?;
                Ok(OperationOutput::new(tool, output).with_size(size))
            }
            Operation::ConvertImage {
                input,
                output,
                target,
            } => {
                image::convert(&input, &output, target)?;
                Ok(OperationOutput::new(tool, output))
            }
            Operation::TextToPdf { input, output } => {
                let pages = text::to_pdf(&input, &output)?;
                Ok(OperationOutput::new(tool, output).with_page_count(pages))
            }
        }
    }
}

/// Exact-cardinality check shared by upload and build.
pub(crate) fn check_file_count(tool: Tool, files: &[PathBuf]) -> Result<(), ValidationError> {
    if files.is_empty() {
        return Err(ValidationError::NoSelection {
            hint: tool.selection_hint(),
        });
    }
    if files.len() != tool.required_inputs() {
        return Err(ValidationError::WrongFileCount {
            expected: tool.required_inputs(),
            actual: files.len(),
            noun: tool.file_noun().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> WorkflowConfig {
        WorkflowConfig::builder().work_dir(dir).build().unwrap()
    }

    #[test]
    fn merge_needs_exactly_two_files() {
        let c = config(Path::new("/work"));
        let one = vec![PathBuf::from("a.pdf")];
        let err = Operation::build(Tool::MergePdf, &one, &ToolOptions::new(), &c).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongFileCount {
                expected: 2,
                actual: 1,
                noun: "PDF files".into()
            }
        );
    }

    #[test]
    fn empty_selection_is_reported_with_hint() {
        let c = config(Path::new("/work"));
        let err = Operation::build(Tool::SplitPdf, &[], &ToolOptions::new(), &c).unwrap_err();
        assert_eq!(err.to_string(), "Please select a PDF file.");
    }

    #[test]
    fn split_requires_a_valid_range() {
        let c = config(Path::new("/work"));
        let files = vec![PathBuf::from("a.pdf")];

        let missing = Operation::build(Tool::SplitPdf, &files, &ToolOptions::new(), &c);
        assert_eq!(missing, Err(ValidationError::MissingPageRange));

        let reversed = Operation::build(
            Tool::SplitPdf,
            &files,
            &ToolOptions::new().page_range("5-2"),
            &c,
        );
        assert!(matches!(reversed, Err(ValidationError::InvalidPageRange { .. })));

        let ok = Operation::build(
            Tool::SplitPdf,
            &files,
            &ToolOptions::new().page_range("2-4"),
            &c,
        )
        .unwrap();
        assert_eq!(ok.output(), Path::new("/work/split_output.pdf"));
    }

    #[test]
    fn reducer_uses_configured_quality_unless_overridden() {
        let c = config(Path::new("/work"));
        let files = vec![PathBuf::from("photo.png")];

        let op = Operation::build(Tool::ImageSizeReducer, &files, &ToolOptions::new(), &c).unwrap();
        assert!(matches!(op, Operation::ReduceImage { quality: 70, .. }));

        let op = Operation::build(
            Tool::ImageSizeReducer,
            &files,
            &ToolOptions::new().quality(40),
            &c,
        )
        .unwrap();
        assert!(matches!(op, Operation::ReduceImage { quality: 40, .. }));

        let err = Operation::build(
            Tool::ImageSizeReducer,
            &files,
            &ToolOptions::new().quality(0),
            &c,
        );
        assert_eq!(err, Err(ValidationError::InvalidQuality(0)));
    }

    #[test]
    fn converter_output_follows_target_format() {
        let c = config(Path::new("/work"));
        let files = vec![PathBuf::from("photo.bmp")];

        let op = Operation::build(Tool::ImageFormatConverter, &files, &ToolOptions::new(), &c)
            .unwrap();
        assert_eq!(op.output(), Path::new("/work/converted_image.png"));
        assert_eq!(op.save_extension(), "png");

        let op = Operation::build(
            Tool::ImageFormatConverter,
            &files,
            &ToolOptions::new().image_target(ImageTarget::Jpeg),
            &c,
        )
        .unwrap();
        assert_eq!(op.output(), Path::new("/work/converted_image.jpg"));
    }

    #[test]
    fn every_tool_maps_back_to_itself() {
        let c = config(Path::new("/work"));
        for tool in Tool::ALL {
            let files: Vec<PathBuf> = (0..tool.required_inputs())
                .map(|i| PathBuf::from(format!("in{i}")))
                .collect();
            let options = ToolOptions::new().page_range("1-1");
            let op = Operation::build(tool, &files, &options, &c).unwrap();
            assert_eq!(op.tool(), tool);
        }
    }

    #[test]
    fn execute_creates_missing_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "hello").unwrap();
        let c = config(&dir.path().join("nested/out"));

        let op = Operation::build(Tool::TextToPdf, &[input], &ToolOptions::new(), &c).unwrap();
        let out = op.execute().unwrap();
        assert_eq!(out.page_count, Some(1));
        assert!(out.path.ends_with("nested/out/converted_text.pdf"));
        assert!(out.path.is_file());
    }
}
