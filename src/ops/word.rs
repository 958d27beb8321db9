//! Word → PDF through a headless LibreOffice.
//!
//! `soffice --headless --convert-to pdf --outdir DIR INPUT` writes
//! `DIR/<input stem>.pdf`. The conversion runs in a private temporary
//! directory and the result is copied to the requested output path, so a
//! stale file from an earlier run can never be mistaken for a fresh one.

use crate::error::OperationError;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Convert the Word document at `input` into a PDF at `output` using the
/// LibreOffice binary `soffice`.
pub fn docx_to_pdf(input: &Path, output: &Path, soffice: &Path) -> Result<(), OperationError> {
    super::ensure_readable(input)?;

    let outdir = tempfile::tempdir().map_err(|e| OperationError::Io {
        path: std::env::temp_dir(),
        source: e,
    })?;

    debug!(
        "Running {} --headless --convert-to pdf on {}",
        soffice.display(),
        input.display()
    );
    let result = Command::new(soffice)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(outdir.path())
        .arg(input)
        .output();

    let out = match result {
        Ok(out) => out,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(OperationError::ConverterNotFound {
                program: soffice.display().to_string(),
            });
        }
        Err(e) => {
            return Err(OperationError::ConverterFailed {
                path: input.to_path_buf(),
                detail: e.to_string(),
            });
        }
    };

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(OperationError::ConverterFailed {
            path: input.to_path_buf(),
            detail: format!("{} exited with {}: {}", soffice.display(), out.status, stderr.trim()),
        });
    }

    let mut produced_name = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("document"));
    produced_name.push(".pdf");
    let produced = outdir.path().join(produced_name);

    if !produced.is_file() {
        return Err(OperationError::ConverterFailed {
            path: input.to_path_buf(),
            detail: format!(
                "converter reported success but wrote no PDF ({})",
                String::from_utf8_lossy(&out.stdout).trim()
            ),
        });
    }

    std::fs::copy(&produced, output).map_err(|e| OperationError::Io {
        path: output.to_path_buf(),
        source: e,
    })?;
    info!("Converted {} to {}", input.display(), output.display());
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Write an executable shell script standing in for `soffice`.
    fn fake_converter(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-soffice");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn copies_converter_output_to_destination() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.docx");
        let output = dir.path().join("docx_to_pdf.pdf");
        std::fs::write(&input, b"%PDF-1.5 pretend").unwrap();
        // $5 is the outdir, $6 the input file.
        let soffice = fake_converter(
            dir.path(),
            r#"name=$(basename "$6"); cp "$6" "$5/${name%.*}.pdf""#,
        );

        docx_to_pdf(&input, &output, &soffice).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"%PDF-1.5 pretend");
    }

    #[test]
    fn missing_converter_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"x").unwrap();

        let err = docx_to_pdf(
            &input,
            &dir.path().join("o.pdf"),
            Path::new("/nonexistent/soffice"),
        );
        assert!(matches!(err, Err(OperationError::ConverterNotFound { .. })));
    }

    #[test]
    fn failing_converter_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"x").unwrap();
        let soffice = fake_converter(dir.path(), "echo 'source file could not be loaded' >&2; exit 1");

        match docx_to_pdf(&input, &dir.path().join("o.pdf"), &soffice) {
            Err(OperationError::ConverterFailed { detail, .. }) => {
                assert!(detail.contains("could not be loaded"), "{detail}");
            }
            other => panic!("expected ConverterFailed, got {other:?}"),
        }
    }

    #[test]
    fn silent_converter_without_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"x").unwrap();
        let soffice = fake_converter(dir.path(), "exit 0");

        let err = docx_to_pdf(&input, &dir.path().join("o.pdf"), &soffice);
        assert!(matches!(err, Err(OperationError::ConverterFailed { .. })));
    }
}
