//! PDF operations on top of `lopdf`: merge, split, and text extraction into
//! an editable Word document.
//!
//! ## Merging page trees
//!
//! Every source document is renumbered past the highest object id already
//! used by the output, its objects are copied over, and its pages are hung
//! under one new flat `/Pages` node in input order. Attributes a page may
//! inherit from its old page-tree ancestors (`MediaBox`, `Resources`,
//! `CropBox`, `Rotate`) are copied onto the page first, since those ancestors
//! do not survive the merge.

use crate::error::{OperationError, ValidationError};
use docx_rs::{BreakType, Docx, Paragraph, Run};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// A 1-based, inclusive page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Create a range, rejecting `start == 0` and `start > end`.
    pub fn new(start: u32, end: u32) -> Result<Self, OperationError> {
        if start == 0 || start > end {
            return Err(OperationError::InvalidPageRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of pages covered.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

impl FromStr for PageRange {
    type Err = ValidationError;

    /// Parse `"start-end"` (or a single page `"n"`), as typed by the user.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidPageRange {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        let (start, end) = match trimmed.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (trimmed, trimmed),
        };
        let start: u32 = start.parse().map_err(|_| invalid())?;
        let end: u32 = end.parse().map_err(|_| invalid())?;
        PageRange::new(start, end).map_err(|_| invalid())
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Number of pages in the PDF at `path`.
pub fn page_count(path: &Path) -> Result<u32, OperationError> {
    let doc = load(path)?;
    Ok(doc.get_pages().len() as u32)
}

/// Concatenate the pages of `inputs`, in order, into `output`.
///
/// Returns the page count of the merged document.
pub fn merge(inputs: &[PathBuf], output: &Path) -> Result<u32, OperationError> {
    let mut merged = Document::with_version("1.5");
    let pages_id = merged.new_object_id();
    let mut page_ids: Vec<ObjectId> = Vec::new();

    for path in inputs {
        let mut doc = load(path)?;
        flatten_inherited_attributes(&mut doc);
        doc.renumber_objects_with(merged.max_id + 1);
        merged.max_id = merged.max_id.max(doc.max_id);

        // get_pages() is keyed by page number, so values come out in page order.
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let skipped: HashSet<ObjectId> = doc
            .objects
            .iter()
            .filter(|(_, object)| matches!(type_name(object), Some(b"Pages") | Some(b"Catalog")))
            .map(|(id, _)| *id)
            .collect();

        debug!(
            "Merging {} pages from {} ({} objects)",
            pages.len(),
            path.display(),
            doc.objects.len()
        );

        for (id, object) in doc.objects {
            if !skipped.contains(&id) {
                merged.objects.insert(id, object);
            }
        }
        page_ids.extend(pages);
    }

    for id in &page_ids {
        if let Some(Object::Dictionary(page)) = merged.objects.get_mut(id) {
            page.set("Parent", pages_id);
        }
    }

    let kids: Vec<Object> = page_ids.iter().copied().map(Object::Reference).collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    save(&mut merged, output)?;
    info!(
        "Merged {} documents into {} ({} pages)",
        inputs.len(),
        output.display(),
        page_ids.len()
    );
    Ok(page_ids.len() as u32)
}

/// Write pages `range.start..=range.end` of `input` to `output`, in order.
///
/// Returns the page count of the output (`range.len()`).
pub fn split(input: &Path, range: PageRange, output: &Path) -> Result<u32, OperationError> {
    let range = PageRange::new(range.start, range.end)?;
    let mut doc = load(input)?;
    let total = doc.get_pages().len() as u32;
    if range.end > total {
        return Err(OperationError::PageOutOfRange {
            page: range.end,
            total,
        });
    }

    let dropped: Vec<u32> = (1..=total).filter(|n| !range.contains(*n)).collect();
    if !dropped.is_empty() {
        doc.delete_pages(&dropped);
        doc.prune_objects();
    }

    save(&mut doc, output)?;
    info!(
        "Split pages {} of {} into {}",
        range,
        input.display(),
        output.display()
    );
    Ok(range.len())
}

/// Extract each page's plain text into one paragraph of a `.docx` file.
///
/// Pages without extractable text are skipped. Layout and formatting are not
/// preserved. Returns the number of paragraphs written.
pub fn to_docx(input: &Path, output: &Path) -> Result<usize, OperationError> {
    let doc = load(input)?;
    let mut docx = Docx::new();
    let mut paragraphs = 0;

    for page_num in doc.get_pages().keys().copied() {
        let text = match doc.extract_text(&[page_num]) {
            Ok(text) => text,
            Err(e) => {
                warn!("No text extracted from page {}: {}", page_num, e);
                continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }

        let mut run = Run::new();
        for (i, line) in text.trim_end().lines().enumerate() {
            if i > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            run = run.add_text(line);
        }
        docx = docx.add_paragraph(Paragraph::new().add_run(run));
        paragraphs += 1;
    }

    let file = File::create(output).map_err(|e| OperationError::Io {
        path: output.to_path_buf(),
        source: e,
    })?;
    docx.build().pack(file).map_err(|e| OperationError::Docx {
        path: output.to_path_buf(),
        detail: e.to_string(),
    })?;

    info!(
        "Extracted {} paragraphs from {} into {}",
        paragraphs,
        input.display(),
        output.display()
    );
    Ok(paragraphs)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn load(path: &Path) -> Result<Document, OperationError> {
    super::ensure_pdf(path)?;
    Document::load(path).map_err(|e| OperationError::pdf(path, e))
}

pub(crate) fn save(doc: &mut Document, path: &Path) -> Result<(), OperationError> {
    let file = File::create(path).map_err(|e| OperationError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    doc.save_to(&mut writer).map_err(|e| OperationError::Pdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    writer.flush().map_err(|e| OperationError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// The `/Type` name of a dictionary or stream object.
fn type_name(object: &Object) -> Option<&[u8]> {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return None,
    };
    dict.get(b"Type").and_then(Object::as_name).ok()
}

/// Copy inheritable attributes from page-tree ancestors onto each page.
fn flatten_inherited_attributes(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in page_ids {
        let inherited: Vec<(&[u8], Object)> = match doc.get_object(page_id).and_then(Object::as_dict) {
            Ok(page) => INHERITABLE_KEYS
                .iter()
                .filter(|key| !page.has(key))
                .filter_map(|key| inherited_value(doc, page, key).map(|v| (*key, v)))
                .collect(),
            Err(_) => continue,
        };

        if inherited.is_empty() {
            continue;
        }
        if let Some(Object::Dictionary(page)) = doc.objects.get_mut(&page_id) {
            for (key, value) in inherited {
                page.set(key.to_vec(), value);
            }
        }
    }
}

fn inherited_value(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return None;
        }
        let node = doc.get_object(id).and_then(Object::as_dict).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}
