//! Plain text → paginated PDF.
//!
//! Lines are laid out top to bottom on A4 pages in 12 pt Helvetica, one line
//! per 10 mm row. Text is written through the font's WinAnsi encoding, so
//! characters outside Latin-1 are replaced with `?`.

use crate::error::OperationError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;
use tracing::{debug, info};

const PT_PER_MM: f32 = 72.0 / 25.4;

// Layout in millimetres: A4 portrait, 10 mm rows and margins, 20 mm kept
// clear at the bottom.
const PAGE_WIDTH_MM: u32 = 210;
const PAGE_HEIGHT_MM: u32 = 297;
const MARGIN_MM: u32 = 10;
const BOTTOM_MARGIN_MM: u32 = 20;
const ROW_HEIGHT_MM: u32 = 10;
const FONT_SIZE: i64 = 12;

/// A4 portrait in points.
pub const PAGE_WIDTH: f32 = PAGE_WIDTH_MM as f32 * PT_PER_MM;
pub const PAGE_HEIGHT: f32 = PAGE_HEIGHT_MM as f32 * PT_PER_MM;

const MARGIN: f32 = MARGIN_MM as f32 * PT_PER_MM;
const ROW_HEIGHT: f32 = ROW_HEIGHT_MM as f32 * PT_PER_MM;

/// Text rows that fit between the top margin and the bottom break line.
pub const ROWS_PER_PAGE: usize =
    ((PAGE_HEIGHT_MM - MARGIN_MM - BOTTOM_MARGIN_MM) / ROW_HEIGHT_MM) as usize;

/// Render the UTF-8 text file at `input` into `output`.
///
/// Returns the number of pages written; an empty file still yields one
/// blank page.
pub fn to_pdf(input: &Path, output: &Path) -> Result<u32, OperationError> {
    super::ensure_readable(input)?;
    let bytes = std::fs::read(input).map_err(|e| OperationError::from_io(input, e))?;
    let text = String::from_utf8_lossy(&bytes);

    let pages = paginate(&text);
    let mut doc = build_document(&pages)?;
    super::pdf::save(&mut doc, output)?;

    info!(
        "Rendered {} lines from {} into {} pages at {}",
        text.lines().count(),
        input.display(),
        pages.len(),
        output.display()
    );
    Ok(pages.len() as u32)
}

/// Split `text` into pages of at most [`ROWS_PER_PAGE`] lines.
///
/// Lines are trimmed. Always returns at least one page.
pub fn paginate(text: &str) -> Vec<Vec<&str>> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    if lines.is_empty() {
        return vec![Vec::new()];
    }
    lines.chunks(ROWS_PER_PAGE).map(<[&str]>::to_vec).collect()
}

/// Encode `line` as WinAnsi bytes, replacing anything outside Latin-1.
fn encode_latin1(line: &str) -> Vec<u8> {
    line.chars()
        .filter(|c| *c != '\r')
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn build_document(pages: &[Vec<&str>]) -> Result<Document, OperationError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for (index, rows) in pages.iter().enumerate() {
        let content = page_content(rows);
        let encoded = content.encode().map_err(|e| {
            OperationError::Internal(format!("Failed to encode page {}: {}", index + 1, e))
        })?;
        let mut stream = Stream::new(dictionary! {}, encoded);
        // Uncompressed content is still valid, just larger.
        let _ = stream.compress();
        let content_id = doc.add_object(stream);

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
        debug!("Laid out page {} with {} rows", index + 1, rows.len());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

fn page_content(rows: &[&str]) -> Content {
    let mut operations = Vec::with_capacity(rows.len() * 2 + 3);
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec!["F1".into(), Object::Integer(FONT_SIZE)],
    ));
    // Baseline of the first row sits one row below the top margin.
    operations.push(Operation::new(
        "Td",
        vec![
            Object::Real(MARGIN),
            Object::Real(PAGE_HEIGHT - MARGIN - ROW_HEIGHT),
        ],
    ));

    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(0), Object::Real(-ROW_HEIGHT)],
            ));
        }
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_latin1(row))],
        ));
    }

    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}
