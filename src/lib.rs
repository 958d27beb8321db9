//! # filenode
//!
//! Merge and split PDFs, turn PDFs into Word documents and back, shrink or
//! re-encode images, and typeset plain text as PDF, all behind one
//! upload → run → save workflow.
//!
//! ## Workflow Overview
//!
//! ```text
//! select tool
//!  │
//!  ├─ 1. Upload   validate file count for the tool
//!  ├─ 2. Options  page range / JPEG quality / target format
//!  ├─ 3. Run      conversion on the blocking pool (lopdf, docx-rs, image, LibreOffice)
//!  ├─ 4. Animate  fixed-cadence progress until 100 %, then await completion once
//!  ├─ 5. Ready    success (output in the work dir) or error message
//!  └─ 6. Save     byte copy to the chosen destination
//! ```
//!
//! Every tool shares the same [`Workflow`]; what differs per tool is captured
//! by [`Tool`] and the [`Operation`] built from it. Front-ends subscribe to
//! [`Snapshot`]s and draw them with [`view::render`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filenode::{Tool, ToolOptions, Workflow, WorkflowConfig};
//! use std::path::{Path, PathBuf};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workflow = Workflow::new(WorkflowConfig::builder().work_dir("/tmp").build()?);
//!
//!     workflow.select_tool(Tool::SplitPdf);
//!     workflow.upload(vec![PathBuf::from("report.pdf")])?;
//!     let run = workflow.start(&ToolOptions::new().page_range("2-4"))?;
//!
//!     if run.wait().await.is_some_and(|o| o.is_success()) {
//!         workflow.save(Some(Path::new("pages-2-4.pdf"))).await?;
//!     }
//!     println!("{}", workflow.snapshot().status);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `filenode` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! filenode = { version = "0.1", default-features = false }
//! ```
//!
//! ## External Programs
//!
//! | Needed for | Program | Missing means |
//! |------------|---------|---------------|
//! | Docs to PDF | LibreOffice `soffice` | that tool fails with an install hint |
//! | Page previews | `libpdfium` | previews show an inline error |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod operation;
pub mod ops;
pub mod output;
pub mod preview;
pub mod progress;
pub mod tool;
pub mod view;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{WorkflowConfig, WorkflowConfigBuilder};
pub use error::{OperationError, ValidationError, WorkflowError};
pub use operation::{Operation, ToolOptions};
pub use ops::image::ImageTarget;
pub use ops::pdf::PageRange;
pub use output::{format_size, OperationOutput, SaveReport, SizeReport};
pub use preview::{Preview, Thumbnail};
pub use progress::ProgressAnimation;
pub use tool::{Tool, ToolCategory};
pub use view::{menu, render, MenuSection, View};
pub use workflow::{Outcome, RunHandle, Snapshot, Workflow, WorkflowState};
