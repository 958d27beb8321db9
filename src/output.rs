//! Result types produced by conversion operations and the save step.

use crate::tool::Tool;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A finished conversion: where its output was written, plus tool-specific
/// details the presentation may show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutput {
    pub tool: Tool,
    /// Output file inside the working directory.
    pub path: PathBuf,
    /// Pages in the output document, for paginated outputs.
    pub page_count: Option<u32>,
    /// Before/after sizes, for the image size reducer.
    pub size: Option<SizeReport>,
}

impl OperationOutput {
    pub fn new(tool: Tool, path: PathBuf) -> Self {
        Self {
            tool,
            path,
            page_count: None,
            size: None,
        }
    }

    pub fn with_page_count(mut self, pages: u32) -> Self {
        self.page_count = Some(pages);
        self
    }

    pub fn with_size(mut self, size: SizeReport) -> Self {
        self.size = Some(size);
        self
    }

    /// Extension to propose when saving, taken from the file actually written.
    pub fn save_extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_else(|| self.tool.save_extension())
    }
}

/// Byte sizes of an image before and after re-encoding.
///
/// Re-encoding never guarantees a smaller file, so the reduction can be
/// negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeReport {
    pub original_bytes: u64,
    pub reduced_bytes: u64,
}

impl SizeReport {
    /// `100 × (1 − reduced / original)`; `0.0` for an empty original.
    pub fn percent_reduced(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        100.0 * (1.0 - self.reduced_bytes as f64 / self.original_bytes as f64)
    }

    /// The three-line summary shown under the reducer's buttons.
    pub fn summary(&self) -> String {
        format!(
            "Original size: {}\nReduced size: {}\nSize reduced: {:.1}%",
            format_size(self.original_bytes),
            format_size(self.reduced_bytes),
            self.percent_reduced()
        )
    }
}

/// Outcome of copying a result to the user's chosen destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
}

/// Human-readable size using decimal units (1 KB = 1000 B).
pub fn format_size(bytes: u64) -> String {
    if bytes < 1_000 {
        format!("{bytes} B")
    } else if bytes < 1_000_000 {
        format!("{:.2} KB", bytes as f64 / 1_000.0)
    } else if bytes < 1_000_000_000 {
        format!("{:.2} MB", bytes as f64 / 1_000_000.0)
    } else {
        format!("{:.2} GB", bytes as f64 / 1_000_000_000.0)
    }
}
