//! Error types for the filenode library.
//!
//! Three error types reflect the three places a workflow can go wrong:
//!
//! * [`ValidationError`]: the user's input was rejected **before** any
//!   background work started (wrong number of files, malformed page range).
//!   The controller stays where it was and surfaces the message as status
//!   text.
//!
//! * [`OperationError`]: a conversion operation failed while running (bad
//!   page index, unreadable file, unsupported format, converter crashed).
//!   The controller moves to `Ready(Error)` and keeps only the message.
//!
//! * [`WorkflowError`]: a controller method was called in a state that
//!   does not allow it, or the final save copy failed.
//!
//! Preview failures are not errors at this level: they are captured inline by
//! [`crate::preview::Preview::Failed`].

use std::path::PathBuf;
use thiserror::Error;

/// Input rejected before a conversion was started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The file dialog was aborted or returned nothing.
    #[error("{hint}")]
    NoSelection { hint: String },

    /// The number of selected files does not match what the tool needs.
    #[error("Please select exactly {expected} {noun}.")]
    WrongFileCount {
        expected: usize,
        actual: usize,
        noun: String,
    },

    /// The page-range text could not be parsed or is reversed.
    #[error("❌ Invalid page range. Use the format: start-end (e.g., 1-5).")]
    InvalidPageRange { input: String },

    /// A split was requested without a page range.
    #[error("Enter the page range to split (e.g., 1-5).")]
    MissingPageRange,

    /// JPEG quality outside 1–100.
    #[error("Quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),
}

/// A conversion operation failed.
///
/// The `Display` text is what the user sees; no structured error codes leave
/// the controller.
#[derive(Debug, Error)]
pub enum OperationError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// lopdf could not load, edit or write the document.
    #[error("PDF '{path}' could not be processed: {detail}")]
    Pdf { path: PathBuf, detail: String },

    /// Start page is zero or after the end page.
    #[error("Invalid page range {start}-{end}: start must be >= 1 and <= end")]
    InvalidPageRange { start: u32, end: u32 },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    // ── Office errors ─────────────────────────────────────────────────────
    /// docx-rs failed to pack the Word document.
    #[error("Failed to write Word document '{path}': {detail}")]
    Docx { path: PathBuf, detail: String },

    /// The external document converter binary is not installed.
    #[error(
        "Document converter '{program}' was not found.\n\
Install LibreOffice or point --soffice / FILENODE_SOFFICE at the soffice binary."
    )]
    ConverterNotFound { program: String },

    /// The external document converter ran but did not produce a PDF.
    #[error("Document conversion of '{path}' failed: {detail}")]
    ConverterFailed { path: PathBuf, detail: String },

    // ── Image errors ──────────────────────────────────────────────────────
    /// The JPEG encoder rejected the image (e.g. a side longer than 65535 px).
    #[error("Failed to encode JPEG '{path}': {detail}")]
    JpegEncode { path: PathBuf, detail: String },

    /// Decoding or encoding an image failed.
    #[error("Image '{path}' could not be processed: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Reading an input or writing an output failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// The blocking conversion task panicked or was torn down.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OperationError {
    /// Map an `io::Error` raised while opening `path` to the matching variant.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => OperationError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => OperationError::PermissionDenied { path },
            _ => OperationError::Io { path, source },
        }
    }

    pub(crate) fn pdf(path: impl Into<PathBuf>, err: lopdf::Error) -> Self {
        OperationError::Pdf {
            path: path.into(),
            detail: err.to_string(),
        }
    }
}

/// A controller method was misused or the save step failed.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Input rejected; the controller state is unchanged.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The call is not allowed in the controller's current state.
    #[error("Cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    /// Copying the result to the chosen destination failed.
    #[error("Failed to save '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
