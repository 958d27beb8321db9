//! The fixed catalogue of tools shown in the menu.
//!
//! A [`Tool`] decides everything that differs between workflows: which
//! [`crate::operation::Operation`] runs, how many files the upload step
//! accepts, which extensions the file dialog filters on, the fixed output
//! filename in the working directory, and the texts the presentation shows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Menu heading a tool is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolCategory {
    Pdf,
    Word,
    Image,
    Text,
}

impl ToolCategory {
    /// Headings in menu order.
    pub const ALL: [ToolCategory; 4] = [
        ToolCategory::Pdf,
        ToolCategory::Word,
        ToolCategory::Image,
        ToolCategory::Text,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            ToolCategory::Pdf => "PDF Tools",
            ToolCategory::Word => "Word Tools",
            ToolCategory::Image => "Image Tools",
            ToolCategory::Text => "Text Tools",
        }
    }
}

/// One of the seven supported file transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    MergePdf,
    SplitPdf,
    PdfToWord,
    DocxToPdf,
    ImageSizeReducer,
    ImageFormatConverter,
    TextToPdf,
}

const PDF_EXTENSIONS: &[&str] = &["pdf"];
const DOCX_EXTENSIONS: &[&str] = &["docx"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];
const TEXT_EXTENSIONS: &[&str] = &["txt"];

impl Tool {
    /// Every tool, in menu order.
    pub const ALL: [Tool; 7] = [
        Tool::MergePdf,
        Tool::SplitPdf,
        Tool::PdfToWord,
        Tool::DocxToPdf,
        Tool::ImageSizeReducer,
        Tool::ImageFormatConverter,
        Tool::TextToPdf,
    ];

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Tool::MergePdf => "Merge PDF",
            Tool::SplitPdf => "Split PDF",
            Tool::PdfToWord => "PDF to Word",
            Tool::DocxToPdf => "Docs to PDF",
            Tool::ImageSizeReducer => "Image Size Reducer",
            Tool::ImageFormatConverter => "Image Format Converter",
            Tool::TextToPdf => "Text to PDF",
        }
    }

    pub fn category(self) -> ToolCategory {
        match self {
            Tool::MergePdf | Tool::SplitPdf | Tool::PdfToWord => ToolCategory::Pdf,
            Tool::DocxToPdf => ToolCategory::Word,
            Tool::ImageSizeReducer | Tool::ImageFormatConverter => ToolCategory::Image,
            Tool::TextToPdf => ToolCategory::Text,
        }
    }

    /// Exact number of files the upload step must receive.
    pub fn required_inputs(self) -> usize {
        match self {
            Tool::MergePdf => 2,
            _ => 1,
        }
    }

    /// Extensions (lower case, no dot) offered by the file-open dialog.
    pub fn input_extensions(self) -> &'static [&'static str] {
        match self {
            Tool::MergePdf | Tool::SplitPdf | Tool::PdfToWord => PDF_EXTENSIONS,
            Tool::DocxToPdf => DOCX_EXTENSIONS,
            Tool::ImageSizeReducer | Tool::ImageFormatConverter => IMAGE_EXTENSIONS,
            Tool::TextToPdf => TEXT_EXTENSIONS,
        }
    }

    /// Whether a new file can be uploaded straight from a finished run.
    pub fn can_upload_again(self) -> bool {
        matches!(self, Tool::ImageSizeReducer | Tool::ImageFormatConverter)
    }

    /// Whether the input is a paginated document worth previewing page by page.
    pub fn has_page_preview(self) -> bool {
        matches!(self, Tool::SplitPdf | Tool::PdfToWord)
    }

    /// Fixed output filename written into the working directory.
    ///
    /// The format converter's name depends on the chosen target, so it is
    /// resolved by [`crate::operation::Operation`] instead.
    pub fn output_file_name(self) -> &'static str {
        match self {
            Tool::MergePdf => "merged_output.pdf",
            Tool::SplitPdf => "split_output.pdf",
            Tool::PdfToWord => "converted_output.docx",
            Tool::DocxToPdf => "converted_output.pdf",
            Tool::ImageSizeReducer => "reduced_image.jpg",
            Tool::ImageFormatConverter => "converted_image.png",
            Tool::TextToPdf => "converted_text.pdf",
        }
    }

    /// Default extension proposed by the file-save dialog.
    ///
    /// For the format converter this is the default target; a finished run
    /// reports the real one through [`crate::output::OperationOutput::save_extension`].
    pub fn save_extension(self) -> &'static str {
        match self {
            Tool::PdfToWord => "docx",
            Tool::ImageSizeReducer => "jpg",
            Tool::ImageFormatConverter => "png",
            _ => "pdf",
        }
    }

    /// Noun used in validation messages ("Please select exactly 2 PDF files.").
    pub fn file_noun(self) -> &'static str {
        match self {
            Tool::MergePdf => "PDF files",
            Tool::SplitPdf | Tool::PdfToWord => "PDF file",
            Tool::DocxToPdf => "DOCX file",
            Tool::ImageSizeReducer | Tool::ImageFormatConverter => "image file",
            Tool::TextToPdf => "text file",
        }
    }

    pub fn upload_label(self) -> &'static str {
        match self {
            Tool::MergePdf => "Upload PDF Files",
            Tool::SplitPdf | Tool::PdfToWord => "Upload PDF File",
            Tool::DocxToPdf => "Upload DOCX File",
            Tool::ImageSizeReducer | Tool::ImageFormatConverter => "Upload Image File",
            Tool::TextToPdf => "Upload Text File",
        }
    }

    pub fn save_label(self) -> &'static str {
        match self {
            Tool::SplitPdf => "Save Split PDF",
            Tool::PdfToWord => "Save Word File",
            Tool::ImageSizeReducer | Tool::ImageFormatConverter => "Save Image",
            _ => "Save PDF",
        }
    }

    /// Status text shown right after the tool is selected.
    pub fn upload_prompt(self) -> &'static str {
        match self {
            Tool::MergePdf => "Please upload 2 PDF files to merge.",
            Tool::SplitPdf => "Please upload a PDF file to split.",
            Tool::PdfToWord => "Please upload a PDF file to convert to Word.",
            Tool::DocxToPdf => "Please upload a DOCX file to convert to PDF.",
            Tool::ImageSizeReducer => "Please upload an image file to reduce size.",
            Tool::ImageFormatConverter => "Please upload an image file to convert format.",
            Tool::TextToPdf => "Please upload a text file to convert to PDF.",
        }
    }

    /// Status text when the file dialog returned nothing usable.
    pub fn selection_hint(self) -> String {
        match self.required_inputs() {
            1 => {
                let article = if self.file_noun().starts_with(['a', 'e', 'i', 'o', 'u']) {
                    "an"
                } else {
                    "a"
                };
                format!("Please select {article} {}.", self.file_noun())
            }
            n => format!("Please select exactly {n} {}.", self.file_noun()),
        }
    }

    /// Info text once the upload has been accepted.
    pub fn uploaded_info(self) -> &'static str {
        match self {
            Tool::MergePdf => "Files uploaded. Processing...",
            Tool::SplitPdf => "PDF uploaded. Enter the page range to split.",
            Tool::PdfToWord => "PDF uploaded. Converting to Word...",
            Tool::DocxToPdf => "DOCX uploaded. Converting to PDF...",
            Tool::ImageSizeReducer => "Image uploaded. Press Reduce to continue.",
            Tool::ImageFormatConverter => "Image uploaded. Converting format...",
            Tool::TextToPdf => "Text file uploaded. Converting to PDF...",
        }
    }

    /// Status text while the operation runs.
    pub fn running_status(self) -> &'static str {
        match self {
            Tool::MergePdf => "Merging PDFs, please wait...",
            Tool::SplitPdf => "Splitting PDF, please wait...",
            Tool::PdfToWord | Tool::DocxToPdf | Tool::TextToPdf => "Converting, please wait...",
            Tool::ImageSizeReducer => "Reducing image size, please wait...",
            Tool::ImageFormatConverter => "Converting image, please wait...",
        }
    }

    pub fn success_status(self) -> &'static str {
        match self {
            Tool::MergePdf => "PDFs merged successfully!",
            Tool::SplitPdf => "PDF split successfully!",
            Tool::PdfToWord => "PDF converted successfully!",
            Tool::DocxToPdf => "DOCX converted successfully!",
            Tool::ImageSizeReducer => "Image size reduced successfully!",
            Tool::ImageFormatConverter => "Image format converted successfully!",
            Tool::TextToPdf => "Text converted successfully!",
        }
    }

    pub fn success_info(self) -> &'static str {
        match self {
            Tool::MergePdf => "Merge complete. You can now save the file.",
            Tool::SplitPdf => "Split complete. You can now save the file.",
            Tool::PdfToWord => "Conversion complete. You can now save the Word file.",
            Tool::DocxToPdf | Tool::TextToPdf => {
                "Conversion complete. You can now save the PDF file."
            }
            Tool::ImageSizeReducer => "Reduction complete. You can now save the image.",
            Tool::ImageFormatConverter => "Conversion complete. You can now save the image.",
        }
    }

    /// Whether `path` carries one of this tool's input extensions.
    pub fn accepts(self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.input_extensions().iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn only_merge_needs_two_inputs() {
        for tool in Tool::ALL {
            let expected = if tool == Tool::MergePdf { 2 } else { 1 };
            assert_eq!(tool.required_inputs(), expected, "{tool}");
        }
    }

    #[test]
    fn only_image_tools_upload_again() {
        let again: Vec<_> = Tool::ALL.into_iter().filter(|t| t.can_upload_again()).collect();
        assert_eq!(again, [Tool::ImageSizeReducer, Tool::ImageFormatConverter]);
    }

    #[test]
    fn every_category_has_a_tool() {
        for cat in ToolCategory::ALL {
            assert!(Tool::ALL.iter().any(|t| t.category() == cat), "{cat:?}");
        }
    }

    #[test]
    fn selection_hints() {
        assert_eq!(
            Tool::MergePdf.selection_hint(),
            "Please select exactly 2 PDF files."
        );
        assert_eq!(Tool::SplitPdf.selection_hint(), "Please select a PDF file.");
        assert_eq!(
            Tool::ImageSizeReducer.selection_hint(),
            "Please select an image file."
        );
    }

    #[test]
    fn accepts_is_case_insensitive() {
        assert!(Tool::ImageSizeReducer.accepts(Path::new("/x/photo.JPG")));
        assert!(Tool::TextToPdf.accepts(Path::new("notes.txt")));
        assert!(!Tool::TextToPdf.accepts(Path::new("notes")));
        assert!(!Tool::DocxToPdf.accepts(Path::new("a.pdf")));
    }

    #[test]
    fn output_names_are_distinct_per_tool() {
        let mut names: Vec<_> = Tool::ALL.iter().map(|t| t.output_file_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Tool::ALL.len());
    }
}
