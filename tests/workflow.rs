//! End-to-end workflow tests: select → upload → run → ready → save.
//!
//! Fixtures are generated into temporary directories at test time, so the
//! tests need neither network access nor checked-in binaries. The Docs to PDF
//! tool needs LibreOffice and is covered by unit tests with a fake converter
//! instead.

use filenode::{
    Outcome, Tool, ToolOptions, ValidationError, Workflow, WorkflowConfig, WorkflowError,
    WorkflowState,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A PDF whose page `n` shows `"<tag> page n"`.
fn write_pdf(path: &Path, tag: &str, pages: u32) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("{tag} page {n}"))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn page_texts(path: &Path) -> Vec<Vec<u8>> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| doc.get_page_content(*id).unwrap())
        .collect()
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w == needle.as_bytes())
}

struct Fixture {
    dir: TempDir,
    workflow: Workflow,
}

impl Fixture {
    /// Fast animation: four 1 ms ticks.
    fn new() -> Self {
        Self::with_tick(1)
    }

    fn with_tick(tick_ms: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkflowConfig::builder()
            .work_dir(dir.path().join("work"))
            .progress_step(0.25)
            .progress_tick_ms(tick_ms)
            .build()
            .unwrap();
        Self {
            workflow: Workflow::new(config),
            dir,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn pdf(&self, name: &str, pages: u32) -> PathBuf {
        let path = self.path(name);
        write_pdf(&path, name, pages);
        path
    }
}

// ── Merge ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn merge_two_documents_and_save() {
    let fx = Fixture::new();
    let a = fx.pdf("a.pdf", 2);
    let b = fx.pdf("b.pdf", 3);

    fx.workflow.select_tool(Tool::MergePdf);
    fx.workflow.upload(vec![a.clone(), b.clone()]).unwrap();
    let outcome = fx.workflow.start(&ToolOptions::new()).unwrap().wait().await;

    let output = match outcome {
        Some(Outcome::Success(output)) => output,
        other => panic!("expected success, got {other:?}"),
    };
    assert_eq!(output.page_count, Some(5));
    assert!(output.path.ends_with("work/merged_output.pdf"));

    let merged = page_texts(&output.path);
    assert_eq!(merged.len(), 5);
    assert!(contains(&merged[0], "a.pdf page 1"));
    assert!(contains(&merged[1], "a.pdf page 2"));
    assert!(contains(&merged[2], "b.pdf page 1"));
    assert!(contains(&merged[4], "b.pdf page 3"));

    let snapshot = fx.workflow.snapshot();
    assert_eq!(snapshot.status, "PDFs merged successfully!");
    assert_eq!(snapshot.progress, 1.0);

    let dest = fx.path("combined.pdf");
    let report = fx.workflow.save(Some(dest.as_path())).await.unwrap().unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), std::fs::read(&output.path).unwrap());
    assert_eq!(report.bytes, std::fs::metadata(&dest).unwrap().len());

    let snapshot = fx.workflow.snapshot();
    assert_eq!(snapshot.state, WorkflowState::Idle);
    assert_eq!(snapshot.status, "File saved: combined.pdf");
}

#[tokio::test]
async fn merge_with_one_file_never_starts() {
    let fx = Fixture::new();
    let a = fx.pdf("a.pdf", 1);

    fx.workflow.select_tool(Tool::MergePdf);
    let err = fx.workflow.upload(vec![a]).unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::WrongFileCount { expected: 2, actual: 1, .. })
    ));

    let err = fx.workflow.start(&ToolOptions::new()).unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidState { .. }));
    assert!(!fx.path("work/merged_output.pdf").exists());
}

// ── Split ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn split_keeps_the_requested_pages() {
    let fx = Fixture::new();
    let input = fx.pdf("book.pdf", 5);

    fx.workflow.select_tool(Tool::SplitPdf);
    fx.workflow.upload(vec![input.clone()]).unwrap();
    let outcome = fx
        .workflow
        .start(&ToolOptions::new().page_range("2-4"))
        .unwrap()
        .wait()
        .await;

    let Some(Outcome::Success(output)) = outcome else {
        panic!("split failed: {:?}", fx.workflow.snapshot().status);
    };
    assert_eq!(output.page_count, Some(3));
    assert_eq!(page_texts(&output.path), page_texts(&input)[1..4].to_vec());
}

#[tokio::test]
async fn reversed_range_is_rejected_before_running() {
    let fx = Fixture::new();
    let input = fx.pdf("book.pdf", 5);

    fx.workflow.select_tool(Tool::SplitPdf);
    fx.workflow.upload(vec![input]).unwrap();
    let err = fx
        .workflow
        .start(&ToolOptions::new().page_range("4-2"))
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::InvalidPageRange { .. })
    ));
    let snapshot = fx.workflow.snapshot();
    assert!(matches!(snapshot.state, WorkflowState::Uploaded { .. }));
    assert_eq!(snapshot.progress, 0.0);
}

#[tokio::test]
async fn range_past_the_end_is_an_error_result() {
    let fx = Fixture::new();
    let input = fx.pdf("book.pdf", 5);

    fx.workflow.select_tool(Tool::SplitPdf);
    fx.workflow.upload(vec![input]).unwrap();
    let outcome = fx
        .workflow
        .start(&ToolOptions::new().page_range("4-9"))
        .unwrap()
        .wait()
        .await;

    match outcome {
        Some(Outcome::Error { message }) => assert!(message.contains("out of range"), "{message}"),
        other => panic!("expected error outcome, got {other:?}"),
    }
    let snapshot = fx.workflow.snapshot();
    assert!(snapshot.status.starts_with("❌ Error:"));

    let err = fx.workflow.save(Some(fx.path("x.pdf").as_path())).await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidState { action: "save", .. }));
    assert!(!fx.path("x.pdf").exists());
}

// ── Other tools ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn reducer_reports_sizes() {
    let fx = Fixture::new();
    let input = fx.path("photo.png");
    image::RgbImage::from_fn(96, 64, |x, y| image::Rgb([(x * 2) as u8, (y * 3) as u8, 128]))
        .save(&input)
        .unwrap();

    fx.workflow.select_tool(Tool::ImageSizeReducer);
    fx.workflow.upload(vec![input.clone()]).unwrap();
    let outcome = fx.workflow.start(&ToolOptions::new()).unwrap().wait().await;

    let Some(Outcome::Success(output)) = outcome else {
        panic!("reduce failed");
    };
    let size = output.size.expect("size report");
    assert_eq!(size.original_bytes, std::fs::metadata(&input).unwrap().len());
    assert_eq!(size.reduced_bytes, std::fs::metadata(&output.path).unwrap().len());

    let expected = 100.0 * (1.0 - size.reduced_bytes as f64 / size.original_bytes as f64);
    assert!((size.percent_reduced() - expected).abs() < 1e-9);
    assert!(fx.workflow.snapshot().info.contains("Size reduced:"));
}

#[tokio::test]
async fn text_to_pdf_round_trip() {
    let fx = Fixture::new();
    let input = fx.path("notes.txt");
    std::fs::write(&input, "first line\nsecond line\n").unwrap();

    fx.workflow.select_tool(Tool::TextToPdf);
    fx.workflow.upload(vec![input]).unwrap();
    let outcome = fx.workflow.start(&ToolOptions::new()).unwrap().wait().await;

    let Some(Outcome::Success(output)) = outcome else {
        panic!("text conversion failed");
    };
    assert_eq!(output.page_count, Some(1));
    let pages = page_texts(&output.path);
    assert!(contains(&pages[0], "(first line)"));
    assert!(contains(&pages[0], "(second line)"));
}

// ── Progress & concurrency ───────────────────────────────────────────────────

#[tokio::test]
async fn progress_is_monotonic_and_finishes_before_ready() {
    let fx = Fixture::with_tick(5);
    let input = fx.pdf("book.pdf", 2);

    fx.workflow.select_tool(Tool::PdfToWord);
    fx.workflow.upload(vec![input]).unwrap();
    let run = fx.workflow.start(&ToolOptions::new()).unwrap();
    let mut rx = fx.workflow.subscribe();

    let mut seen = Vec::new();
    loop {
        let (progress, running) = {
            let s = rx.borrow_and_update();
            (s.progress, matches!(s.state, WorkflowState::Running { .. }))
        };
        seen.push(progress);
        if !running || rx.changed().await.is_err() {
            break;
        }
    }
    assert!(run.wait().await.is_some());

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
    assert!(seen.iter().all(|p| (0.0..=1.0).contains(p)));
    assert_eq!(seen.last(), Some(&1.0));
    assert!(fx.path("work/converted_output.docx").is_file());
}

#[tokio::test]
async fn cancel_while_running_discards_the_result() {
    // 4 ticks of 50 ms: long enough to cancel mid-animation.
    let fx = Fixture::with_tick(50);
    let input = fx.pdf("book.pdf", 3);

    fx.workflow.select_tool(Tool::SplitPdf);
    fx.workflow.upload(vec![input]).unwrap();
    let run = fx
        .workflow
        .start(&ToolOptions::new().page_range("1-2"))
        .unwrap();
    let generation = run.generation();

    fx.workflow.cancel();
    assert_eq!(run.wait().await, None);

    let snapshot = fx.workflow.snapshot();
    assert_eq!(snapshot.state, WorkflowState::Idle);
    assert_eq!(snapshot.generation, generation + 1);
    assert_eq!(snapshot.progress, 0.0);
    assert!(snapshot.status.is_empty());
}

#[tokio::test]
async fn reselecting_during_a_run_ignores_the_late_completion() {
    let fx = Fixture::with_tick(50);
    let input = fx.pdf("book.pdf", 2);

    fx.workflow.select_tool(Tool::PdfToWord);
    fx.workflow.upload(vec![input]).unwrap();
    let run = fx.workflow.start(&ToolOptions::new()).unwrap();

    fx.workflow.select_tool(Tool::TextToPdf);
    assert_eq!(run.wait().await, None);

    let snapshot = fx.workflow.snapshot();
    assert_eq!(
        snapshot.state,
        WorkflowState::AwaitingUpload {
            tool: Tool::TextToPdf
        }
    );
    assert_eq!(snapshot.progress, 0.0);
}

#[tokio::test]
async fn cancelled_save_dialog_keeps_the_result() {
    let fx = Fixture::new();
    let input = fx.pdf("book.pdf", 1);

    fx.workflow.select_tool(Tool::SplitPdf);
    fx.workflow.upload(vec![input]).unwrap();
    fx.workflow
        .start(&ToolOptions::new().page_range("1-1"))
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(fx.workflow.save(None).await.unwrap(), None);
    assert!(matches!(
        fx.workflow.snapshot().state,
        WorkflowState::Ready { .. }
    ));
}

#[tokio::test]
async fn missing_input_surfaces_as_error_outcome() {
    let fx = Fixture::new();

    fx.workflow.select_tool(Tool::PdfToWord);
    fx.workflow.upload(vec![fx.path("ghost.pdf")]).unwrap();
    let outcome = fx.workflow.start(&ToolOptions::new()).unwrap().wait().await;

    match outcome {
        Some(Outcome::Error { message }) => assert!(message.contains("File not found"), "{message}"),
        other => panic!("expected error outcome, got {other:?}"),
    }
}
