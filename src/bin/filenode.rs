//! CLI binary for filenode.
//!
//! A thin shim over the library crate: positional arguments stand in for the
//! file-open dialog, `--output` for the file-save dialog, and an indicatif
//! bar subscribed to the workflow plays the progress animation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filenode::{
    menu, render, ImageTarget, Outcome, SaveReport, Snapshot, Tool, ToolOptions, View, Workflow,
    WorkflowConfig, WorkflowState,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Merge two PDFs and save the result
  filenode merge a.pdf b.pdf -o combined.pdf

  # Keep pages 2 to 4
  filenode split report.pdf --pages 2-4 -o excerpt.pdf

  # Extract text into an editable Word document
  filenode pdf-to-word scan.pdf -o scan.docx

  # Word to PDF through LibreOffice
  filenode docx-to-pdf letter.docx -o letter.pdf --soffice /opt/libreoffice/program/soffice

  # Shrink a photo, print the report as JSON
  filenode reduce-image photo.png --quality 60 -o small.jpg --json

  # Change an image's format and write thumbnails of the input
  filenode convert-image logo.bmp --format png -o logo.png --preview-dir thumbs/

  # Typeset a text file on A4 pages
  filenode text-to-pdf notes.txt -o notes.pdf

  # List the tools by category
  filenode tools

Without -o the result stays in the working directory under its fixed name
(merged_output.pdf, split_output.pdf, converted_output.docx, ...), and is
overwritten by the next run of the same tool.

ENVIRONMENT VARIABLES:
  FILENODE_WORK_DIR     Directory for intermediate results (default: .)
  FILENODE_SOFFICE      LibreOffice binary used by docx-to-pdf (default: soffice)
  FILENODE_QUALITY      JPEG quality for reduce-image (default: 70)
  FILENODE_TICK_MS      Progress animation tick in milliseconds (default: 30)
  PDFIUM_LIB_PATH       libpdfium used for page previews
  RUST_LOG              Log filter, overrides --verbose / --quiet
"#;

/// Merge, split and convert PDFs, Word documents, images and text files.
#[derive(Parser, Debug)]
#[command(
    name = "filenode",
    version,
    about = "Merge, split and convert PDFs, Word documents, images and text files",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Save the result to this path. Without it nothing is saved.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Directory the tool writes its fixed-name result into.
    #[arg(long, global = true, env = "FILENODE_WORK_DIR", default_value = ".")]
    work_dir: PathBuf,

    /// LibreOffice binary used by docx-to-pdf.
    #[arg(long, global = true, env = "FILENODE_SOFFICE", default_value = "soffice")]
    soffice: PathBuf,

    /// Write thumbnails of the input into this directory.
    #[arg(long, global = true, env = "FILENODE_PREVIEW_DIR")]
    preview_dir: Option<PathBuf>,

    /// Progress animation tick in milliseconds.
    #[arg(long, global = true, env = "FILENODE_TICK_MS", default_value_t = 30,
          value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Print a JSON report instead of text.
    #[arg(long, global = true, env = "FILENODE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "FILENODE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "FILENODE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "FILENODE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge two PDF files, pages of the first then the second.
    Merge {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Keep a range of pages from a PDF.
    Split {
        input: PathBuf,
        /// Page range, 1-based and inclusive (e.g. 1-5).
        #[arg(short, long)]
        pages: String,
    },
    /// Extract the text of a PDF into a Word document.
    PdfToWord { input: PathBuf },
    /// Convert a Word document to PDF with LibreOffice.
    DocxToPdf { input: PathBuf },
    /// Re-encode an image as JPEG to reduce its size.
    ReduceImage {
        input: PathBuf,
        /// JPEG quality (1–100).
        #[arg(long, env = "FILENODE_QUALITY", default_value_t = 70,
              value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },
    /// Convert an image to another format.
    ConvertImage {
        input: PathBuf,
        /// Target format.
        #[arg(long, value_enum, default_value = "png")]
        format: FormatArg,
    },
    /// Lay out a text file on A4 PDF pages.
    TextToPdf { input: PathBuf },
    /// List the available tools by category.
    Tools,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
    Bmp,
    Gif,
    Tiff,
}

impl From<FormatArg> for ImageTarget {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => ImageTarget::Png,
            FormatArg::Jpeg => ImageTarget::Jpeg,
            FormatArg::Bmp => ImageTarget::Bmp,
            FormatArg::Gif => ImageTarget::Gif,
            FormatArg::Tiff => ImageTarget::Tiff,
        }
    }
}

impl Command {
    /// Tool, uploaded files and options for a conversion command.
    fn plan(&self) -> Option<(Tool, Vec<PathBuf>, ToolOptions)> {
        let single = |tool, input: &PathBuf, options| Some((tool, vec![input.clone()], options));
        match self {
            Command::Merge { inputs } => Some((Tool::MergePdf, inputs.clone(), ToolOptions::new())),
            Command::Split { input, pages } => single(
                Tool::SplitPdf,
                input,
                ToolOptions::new().page_range(pages.as_str()),
            ),
            Command::PdfToWord { input } => single(Tool::PdfToWord, input, ToolOptions::new()),
            Command::DocxToPdf { input } => single(Tool::DocxToPdf, input, ToolOptions::new()),
            Command::ReduceImage { input, quality } => single(
                Tool::ImageSizeReducer,
                input,
                ToolOptions::new().quality(*quality),
            ),
            Command::ConvertImage { input, format } => single(
                Tool::ImageFormatConverter,
                input,
                ToolOptions::new().image_target((*format).into()),
            ),
            Command::TextToPdf { input } => single(Tool::TextToPdf, input, ToolOptions::new()),
            Command::Tools => None,
        }
    }
}

/// Final report printed with `--json`.
#[derive(Serialize)]
struct Report<'a> {
    tool: Tool,
    outcome: &'a Outcome,
    saved: Option<SaveReport>,
    view: View,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let Some((tool, files, options)) = cli.command.plan() else {
        print_menu(cli.json)?;
        return Ok(());
    };

    let config = WorkflowConfig::builder()
        .work_dir(&cli.work_dir)
        .soffice(&cli.soffice)
        .progress_tick_ms(cli.tick_ms)
        .build()
        .context("Invalid configuration")?;
    let workflow = Workflow::new(config);

    // ── Select & upload ──────────────────────────────────────────────────
    workflow.select_tool(tool);
    workflow
        .upload(files)
        .with_context(|| format!("{} needs different input", tool))?;

    if let Some(ref dir) = cli.preview_dir {
        write_preview(&workflow, dir, cli.quiet).await?;
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let run = workflow
        .start(&options)
        .with_context(|| format!("Could not start {}", tool))?;
    // Subscribed after start so the first snapshot seen is the running one.
    let rx = workflow.subscribe();
    let bar = show_progress.then(|| progress_bar(tool));
    let (outcome, ()) = tokio::join!(run.wait(), follow_progress(rx, bar));

    let outcome = outcome.context("Run was superseded before it finished")?;
    if let Outcome::Error { message } = &outcome {
        anyhow::bail!("{} failed: {}", tool, message);
    }
    let ready_view = render(&workflow.snapshot());

    // ── Save ─────────────────────────────────────────────────────────────
    let saved = match cli.output {
        Some(ref dest) => workflow
            .save(Some(dest.as_path()))
            .await
            .with_context(|| format!("Failed to save result to {}", dest.display()))?,
        None => None,
    };

    if cli.json {
        let report = Report {
            tool,
            outcome: &outcome,
            saved,
            view: ready_view,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&ready_view, &outcome, saved.as_ref());
    }

    Ok(())
}

fn progress_bar(tool: Tool) -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    bar.set_style(style);
    bar.set_prefix(tool.label());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Mirror snapshots onto the bar until the run leaves `Running`.
async fn follow_progress(mut rx: watch::Receiver<Snapshot>, bar: Option<ProgressBar>) {
    loop {
        let (view, running) = {
            let snapshot = rx.borrow_and_update();
            (
                render(&snapshot),
                matches!(snapshot.state, WorkflowState::Running { .. }),
            )
        };
        if let Some(ref bar) = bar {
            bar.set_position(u64::from(view.percent));
            bar.set_message(view.status);
        }
        if !running || rx.changed().await.is_err() {
            break;
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
}

async fn write_preview(workflow: &Workflow, dir: &std::path::Path, quiet: bool) -> Result<()> {
    let preview = workflow.preview().await;
    if let filenode::Preview::Failed(ref msg) = preview {
        // Previews never block the conversion.
        if !quiet {
            eprintln!("{} preview unavailable: {}", cyan("⚠"), msg);
        }
        return Ok(());
    }
    let written = preview
        .write_to_dir(dir)
        .with_context(|| format!("Failed to write preview to {}", dir.display()))?;
    if !quiet && !written.is_empty() {
        eprintln!(
            "{} {} thumbnail(s) written to {}",
            green("✔"),
            written.len(),
            dir.display()
        );
    }
    Ok(())
}

fn print_menu(json: bool) -> Result<()> {
    let sections = menu();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&sections).context("Failed to serialise menu")?
        );
        return Ok(());
    }
    for section in sections {
        println!("{}", bold(section.heading));
        for tool in section.tools {
            println!(
                "  {:<24} {}",
                tool.label(),
                dim(&format!(
                    "{} input, .{}",
                    tool.required_inputs(),
                    tool.input_extensions().join(" .")
                ))
            );
        }
    }
    Ok(())
}

fn print_summary(view: &View, outcome: &Outcome, saved: Option<&SaveReport>) {
    let Outcome::Success(output) = outcome else {
        eprintln!("{} {}", red("✘"), view.status);
        return;
    };

    eprintln!("{} {}", green("✔"), bold(&view.status));
    if let Some(ref pages) = view.page_summary {
        eprintln!("   {}", dim(pages));
    }
    if let Some(ref size) = view.size_summary {
        eprintln!("   {}", dim(size));
    }
    match saved {
        Some(report) => eprintln!(
            "   {}  →  {}",
            dim(&filenode::format_size(report.bytes)),
            bold(&report.destination.display().to_string())
        ),
        None => eprintln!(
            "   result left at {} (pass -o to save it elsewhere)",
            bold(&output.path.display().to_string())
        ),
    }
}
