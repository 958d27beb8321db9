//! Stateless presentation: what the screen shows for a given snapshot.
//!
//! Front-ends (the CLI here, a GUI elsewhere) subscribe to the workflow and
//! call [`render`] on every snapshot. Nothing in this module holds state.

use crate::output::format_size;
use crate::tool::{Tool, ToolCategory};
use crate::workflow::{Outcome, Snapshot, WorkflowState};
use serde::Serialize;

/// One heading of the tool menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuSection {
    pub category: ToolCategory,
    pub heading: &'static str,
    pub tools: Vec<Tool>,
}

/// The tool menu, grouped by category in fixed order.
pub fn menu() -> Vec<MenuSection> {
    ToolCategory::ALL
        .iter()
        .map(|&category| MenuSection {
            category,
            heading: category.heading(),
            tools: Tool::ALL
                .iter()
                .copied()
                .filter(|t| t.category() == category)
                .collect(),
        })
        .collect()
}

/// Everything a front-end draws for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub title: Option<&'static str>,
    pub info: String,
    pub status: String,
    pub progress: f32,
    /// Progress as a whole percentage, for text front-ends.
    pub percent: u8,
    pub upload_enabled: bool,
    pub upload_label: Option<&'static str>,
    pub cancel_enabled: bool,
    pub save_enabled: bool,
    pub save_label: Option<&'static str>,
    /// Extension the save dialog should propose, without the dot.
    pub save_extension: Option<String>,
    /// Before/after sizes, for the size reducer.
    pub size_summary: Option<String>,
    /// Pages in the result, for paginated outputs.
    pub page_summary: Option<String>,
}

/// Render `snapshot` into what the screen should show.
pub fn render(snapshot: &Snapshot) -> View {
    let tool = snapshot.state.tool();
    let success = match &snapshot.state {
        WorkflowState::Ready {
            outcome: Outcome::Success(output),
            ..
        } => Some(output),
        _ => None,
    };

    View {
        title: tool.map(Tool::label),
        info: snapshot.info.clone(),
        status: snapshot.status.clone(),
        progress: snapshot.progress,
        percent: (snapshot.progress.clamp(0.0, 1.0) * 100.0).round() as u8,
        upload_enabled: match &snapshot.state {
            WorkflowState::AwaitingUpload { .. } | WorkflowState::Uploaded { .. } => true,
            WorkflowState::Ready { tool, .. } => tool.can_upload_again(),
            _ => false,
        },
        upload_label: tool.map(Tool::upload_label),
        cancel_enabled: matches!(
            snapshot.state,
            WorkflowState::Uploaded { .. }
                | WorkflowState::Running { .. }
                | WorkflowState::Ready { .. }
        ),
        save_enabled: success.is_some(),
        save_label: success.map(|o| o.tool.save_label()),
        save_extension: success.map(|o| o.save_extension().to_string()),
        size_summary: success.and_then(|o| o.size).map(|size| {
            let percent = size.percent_reduced();
            format!(
                "{} → {} ({:.1}% {})",
                format_size(size.original_bytes),
                format_size(size.reduced_bytes),
                percent.abs(),
                if percent < 0.0 { "larger" } else { "smaller" }
            )
        }),
        page_summary: success
            .and_then(|o| o.page_count)
            .map(|n| format!("{n} page{}", if n == 1 { "" } else { "s" })),
    }
}
