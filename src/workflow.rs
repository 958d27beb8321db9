//! The workflow controller: select → upload → run → ready → save.
//!
//! ## State machine
//!
//! ```text
//!            select_tool             upload               start
//!  Idle ───────────────▶ AwaitingUpload ─────▶ Uploaded ─────────▶ Running
//!   ▲                          ▲   (re-upload) ◀──┘                    │
//!   │                          └──────── select_tool (any state)       │ animation
//!   │                                                                  ▼ + completion
//!   └───────────── save / cancel (any state) ─────────────────── Ready(Success | Error)
//! ```
//!
//! ## Concurrency
//!
//! The current [`Snapshot`] lives in a `tokio::sync::watch` channel and
//! every change goes through `send_modify` / `send_if_modified`, so readers
//! never see a torn state. Each `start` spawns two tasks:
//!
//! 1. the conversion itself, on the blocking pool (`spawn_blocking`);
//! 2. a driver task that plays the progress animation and then awaits the
//!    conversion's `JoinHandle` exactly once before publishing `Ready`.
//!
//! The image tools also accept `upload` straight from `Ready`, replacing the
//! finished result with the new input.
//!
//! Every reselect, cancel and start bumps the snapshot's `generation`. The
//! driver only writes while the generation it was started with is still
//! current, so a conversion that finishes after the user moved on is dropped
//! on the floor. Conversions are never aborted once started.

use crate::config::WorkflowConfig;
use crate::error::{OperationError, WorkflowError};
use crate::operation::{check_file_count, Operation, ToolOptions};
use crate::output::{OperationOutput, SaveReport};
use crate::preview::{self, Preview};
use crate::progress::ProgressAnimation;
use crate::tool::Tool;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Info text shown when no tool is selected.
pub const IDLE_INFO: &str = "Select a tool to continue";

/// How a finished run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Success(OperationOutput),
    /// Only the user-facing message survives.
    Error { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Where a workflow currently is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    AwaitingUpload {
        tool: Tool,
    },
    Uploaded {
        tool: Tool,
        files: Vec<PathBuf>,
    },
    Running {
        tool: Tool,
        files: Vec<PathBuf>,
    },
    Ready {
        tool: Tool,
        outcome: Outcome,
    },
}

impl WorkflowState {
    /// Short human name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::AwaitingUpload { .. } => "awaiting upload",
            WorkflowState::Uploaded { .. } => "uploaded",
            WorkflowState::Running { .. } => "running",
            WorkflowState::Ready { .. } => "ready",
        }
    }

    pub fn tool(&self) -> Option<Tool> {
        match self {
            WorkflowState::Idle => None,
            WorkflowState::AwaitingUpload { tool }
            | WorkflowState::Uploaded { tool, .. }
            | WorkflowState::Running { tool, .. }
            | WorkflowState::Ready { tool, .. } => Some(*tool),
        }
    }

    /// Uploaded files, while the workflow still holds them.
    pub fn files(&self) -> &[PathBuf] {
        match self {
            WorkflowState::Uploaded { files, .. } | WorkflowState::Running { files, .. } => files,
            _ => &[],
        }
    }
}

/// Everything the presentation needs to draw the current screen.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Bumped on every reselect, cancel and start.
    pub generation: u64,
    pub state: WorkflowState,
    /// Animated progress in `[0, 1]`.
    pub progress: f32,
    pub info: String,
    pub status: String,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            generation: 0,
            state: WorkflowState::Idle,
            progress: 0.0,
            info: IDLE_INFO.to_string(),
            status: String::new(),
        }
    }
}

/// One tool-agnostic controller.
///
/// Cloning is cheap and every clone drives the same workflow. Methods that
/// start background work (`start`) must be called from within a Tokio
/// runtime.
#[derive(Debug, Clone)]
pub struct Workflow {
    config: Arc<WorkflowConfig>,
    tx: Arc<watch::Sender<Snapshot>>,
}

impl Workflow {
    pub fn new(config: WorkflowConfig) -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self {
            config: Arc::new(config),
            tx: Arc::new(tx),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// A copy of the current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Switch to `tool`, discarding whatever the previous tool was doing.
    pub fn select_tool(&self, tool: Tool) {
        self.tx.send_modify(|s| {
            s.generation += 1;
            s.state = WorkflowState::AwaitingUpload { tool };
            s.progress = 0.0;
            s.info = tool.label().to_string();
            s.status = tool.upload_prompt().to_string();
        });
        info!("Selected tool: {}", tool);
    }

    /// Accept the files returned by the file-open dialog.
    ///
    /// An empty list means the dialog was cancelled. On a validation error
    /// the state is unchanged and the message becomes the status text.
    pub fn upload(&self, files: Vec<PathBuf>) -> Result<(), WorkflowError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|s| {
            let tool = match &s.state {
                WorkflowState::AwaitingUpload { tool } | WorkflowState::Uploaded { tool, .. } => {
                    *tool
                }
                WorkflowState::Ready { tool, .. } if tool.can_upload_again() => *tool,
                other => {
                    result = Err(WorkflowError::InvalidState {
                        action: "upload files",
                        state: other.name(),
                    });
                    return false;
                }
            };

            if let Err(e) = check_file_count(tool, &files) {
                s.status = e.to_string();
                result = Err(e.into());
                return true;
            }

            for file in files.iter().filter(|f| !tool.accepts(f)) {
                warn!("{} does not have a {} extension", file.display(), tool.file_noun());
            }

            s.info = tool.uploaded_info().to_string();
            s.status = format!("Selected: {}", display_names(&files));
            s.progress = 0.0;
            s.state = WorkflowState::Uploaded {
                tool,
                files: files.clone(),
            };
            true
        });
        if result.is_ok() {
            debug!("Uploaded {} file(s)", files.len());
        }
        result
    }

    /// Start the conversion for the uploaded files.
    ///
    /// Validation failures (missing or malformed page range, bad quality)
    /// keep the workflow in `Uploaded`.
    pub fn start(&self, options: &ToolOptions) -> Result<RunHandle, WorkflowError> {
        let mut started: Result<(u64, Operation), WorkflowError> = Err(WorkflowError::InvalidState {
            action: "start",
            state: "idle",
        });

        self.tx.send_if_modified(|s| {
            let (tool, files) = match &s.state {
                WorkflowState::Uploaded { tool, files } => (*tool, files.clone()),
                other => {
                    started = Err(WorkflowError::InvalidState {
                        action: "start",
                        state: other.name(),
                    });
                    return false;
                }
            };

            match Operation::build(tool, &files, options, &self.config) {
                Ok(op) => {
                    s.generation += 1;
                    s.progress = 0.0;
                    s.status = tool.running_status().to_string();
                    s.state = WorkflowState::Running { tool, files };
                    started = Ok((s.generation, op));
                }
                Err(e) => {
                    s.status = e.to_string();
                    started = Err(e.into());
                }
            }
            true
        });

        let (generation, op) = started?;
        let tool = op.tool();
        info!("Starting {} (run {})", tool, generation);

        let conversion = tokio::task::spawn_blocking(move || op.execute());
        let driver = tokio::spawn(drive(
            Arc::clone(&self.tx),
            generation,
            self.config.animation(),
            tool,
            conversion,
        ));
        Ok(RunHandle {
            generation,
            task: driver,
        })
    }

    /// Abandon the current tool and files. Allowed in every state.
    ///
    /// A conversion already running keeps running; its result is ignored.
    pub fn cancel(&self) {
        self.tx.send_modify(|s| {
            if matches!(s.state, WorkflowState::Running { .. }) {
                debug!("Cancelling run {}", s.generation);
            }
            s.generation += 1;
            s.state = WorkflowState::Idle;
            s.progress = 0.0;
            s.info = IDLE_INFO.to_string();
            s.status.clear();
        });
    }

    /// Copy a successful result to `destination`.
    ///
    /// `None` means the save dialog was cancelled: nothing happens and
    /// `Ok(None)` is returned. After a successful copy the workflow returns
    /// to `Idle`.
    pub async fn save(&self, destination: Option<&Path>) -> Result<Option<SaveReport>, WorkflowError> {
        let (generation, output) = {
            let s = self.tx.borrow();
            match &s.state {
                WorkflowState::Ready {
                    outcome: Outcome::Success(output),
                    ..
                } => (s.generation, output.clone()),
                other => {
                    return Err(WorkflowError::InvalidState {
                        action: "save",
                        state: if matches!(other, WorkflowState::Ready { .. }) {
                            "the last run failed"
                        } else {
                            other.name()
                        },
                    });
                }
            }
        };

        let Some(destination) = destination else {
            debug!("Save cancelled");
            return Ok(None);
        };

        let bytes = match copy_result(&output.path, destination).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.tx.send_if_modified(|s| {
                    if s.generation != generation {
                        return false;
                    }
                    s.status = format!("❌ Error saving file: {e}");
                    true
                });
                return Err(WorkflowError::SaveFailed {
                    path: destination.to_path_buf(),
                    source: e,
                });
            }
        };

        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| destination.display().to_string());
        self.tx.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.state = WorkflowState::Idle;
            s.progress = 0.0;
            s.info = "File saved successfully!".to_string();
            s.status = format!("File saved: {name}");
            true
        });
        info!("Saved {} to {}", output.path.display(), destination.display());

        Ok(Some(SaveReport {
            source: output.path,
            destination: destination.to_path_buf(),
            bytes,
        }))
    }

    /// Thumbnails for the uploaded input, when the tool has any.
    ///
    /// Failures come back as [`Preview::Failed`] and never touch the
    /// workflow state.
    pub async fn preview(&self) -> Preview {
        let (tool, file) = {
            let s = self.tx.borrow();
            match (s.state.tool(), s.state.files().first()) {
                (Some(tool), Some(file)) => (tool, file.clone()),
                _ => return Preview::None,
            }
        };
        preview::preview_for(tool, &file, &self.config).await
    }
}

/// Handle to a started run.
#[derive(Debug)]
pub struct RunHandle {
    generation: u64,
    task: JoinHandle<Option<Outcome>>,
}

impl RunHandle {
    /// Generation the run was started with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the driver task to finish.
    ///
    /// Returns the outcome it published, or `None` when the run was
    /// superseded by a cancel or reselect before it could publish.
    pub async fn wait(self) -> Option<Outcome> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Run {} driver task failed: {}", self.generation, e);
                None
            }
        }
    }
}

/// Animate progress, then await the conversion once and publish `Ready`.
async fn drive(
    tx: Arc<watch::Sender<Snapshot>>,
    generation: u64,
    animation: ProgressAnimation,
    tool: Tool,
    conversion: JoinHandle<Result<OperationOutput, OperationError>>,
) -> Option<Outcome> {
    let animated = animation
        .run(|value| {
            let mut current = false;
            tx.send_if_modified(|s| {
                current = s.generation == generation;
                if current {
                    s.progress = value;
                }
                current
            });
            current
        })
        .await;

    let result = conversion
        .await
        .unwrap_or_else(|e| Err(OperationError::Internal(e.to_string())));

    if !animated {
        debug!("Run {} superseded during animation; result discarded", generation);
        return None;
    }

    let outcome = match result {
        Ok(output) => Outcome::Success(output),
        Err(e) => {
            warn!("{} failed: {}", tool, e);
            Outcome::Error {
                message: e.to_string(),
            }
        }
    };

    let published = tx.send_if_modified(|s| {
        if s.generation != generation {
            return false;
        }
        s.progress = 1.0;
        match &outcome {
            Outcome::Success(output) => {
                s.status = tool.success_status().to_string();
                s.info = match &output.size {
                    Some(size) => size.summary(),
                    None => tool.success_info().to_string(),
                };
            }
            Outcome::Error { message } => {
                s.status = format!("❌ Error: {message}");
            }
        }
        s.state = WorkflowState::Ready {
            tool,
            outcome: outcome.clone(),
        };
        true
    });

    if published {
        Some(outcome)
    } else {
        debug!("Run {} finished after being superseded; result discarded", generation);
        None
    }
}

/// Byte-for-byte copy, guarding against saving a file onto itself.
async fn copy_result(source: &Path, destination: &Path) -> std::io::Result<u64> {
    if let (Ok(a), Ok(b)) = (
        tokio::fs::canonicalize(source).await,
        tokio::fs::canonicalize(destination).await,
    ) {
        if a == b {
            return Ok(tokio::fs::metadata(source).await?.len());
        }
    }
    tokio::fs::copy(source, destination).await
}

fn display_names(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| {
            f.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| f.display().to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}
