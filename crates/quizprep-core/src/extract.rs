//! Import note content from files on disk.
//!
//! Plain text is read directly. PDFs are handed to the `pdftotext` executable
//! (poppler-utils) and the result is tidied with [`clean_pdf_text`].

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ExtractError;
use crate::text::clean_pdf_text;

/// File extensions accepted for import.
pub const SUPPORTED_TYPES: &[&str] = &["pdf", "txt"];

/// Lowercased extension of `path` if it is one of [`SUPPORTED_TYPES`].
pub fn file_type(path: &Path) -> Result<&'static str, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    SUPPORTED_TYPES
        .iter()
        .copied()
        .find(|t| *t == ext)
        .ok_or_else(|| {
            ExtractError::UnsupportedType(if ext.is_empty() {
                path.display().to_string()
            } else {
                ext
            })
        })
}

/// Extract the text of a `.txt` or `.pdf` file.
pub async fn extract_text(path: &Path, timeout: Duration) -> Result<String, ExtractError> {
    let text = match file_type(path)? {
        "pdf" => extract_pdf(path, timeout).await?,
        _ => read_txt(path).await?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Empty(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), chars = text.chars().count(), "text extracted");
    Ok(text)
}

async fn read_txt(path: &Path) -> Result<String, ExtractError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })
}

async fn extract_pdf(path: &Path, timeout: Duration) -> Result<String, ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }

    let mut cmd = Command::new("pdftotext");
    cmd.arg("-layout")
        .arg(path)
        .arg("-")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| ExtractError::Timeout(timeout.as_secs()))?
        .map_err(|e| ExtractError::ToolMissing(e.to_string()))?;

    if !output.status.success() {
        return Err(ExtractError::ToolFailed {
            path: path.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(clean_pdf_text(&String::from_utf8_lossy(&output.stdout)))
}
