//! Conversion operations.
//!
//! Each submodule wraps exactly one kind of third-party capability and
//! exposes plain blocking functions `input path(s) → output path`. They hold
//! no state and know nothing about the workflow around them; the controller
//! runs them on the blocking pool.
//!
//! ```text
//! pdf    merge · split · extract text → .docx     (lopdf, docx-rs)
//! word   .docx → .pdf                            (LibreOffice)
//! image  JPEG re-encode · format change           (image)
//! text   .txt → paginated .pdf                    (lopdf)
//! ```

pub mod image;
pub mod pdf;
pub mod text;
pub mod word;

use crate::error::OperationError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Check that `path` exists and can be opened for reading.
pub(crate) fn ensure_readable(path: &Path) -> Result<(), OperationError> {
    File::open(path)
        .map(|_| ())
        .map_err(|e| OperationError::from_io(path, e))
}

/// Check that `path` is readable and starts with the `%PDF` magic bytes.
///
/// Files shorter than four bytes are left for the parser to reject.
pub(crate) fn ensure_pdf(path: &Path) -> Result<(), OperationError> {
    let mut file = File::open(path).map_err(|e| OperationError::from_io(path, e))?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(OperationError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}
