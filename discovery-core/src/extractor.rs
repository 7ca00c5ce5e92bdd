use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::Path;

/// Turns a document on disk into plain text
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> anyhow::Result<String>;
}

/// Reads text formats directly and shells out to `pdftotext` for PDFs.
///
/// Requires poppler-utils on the PATH for PDF input.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    pdftotext: String,
}

impl Default for FileExtractor {
    fn default() -> Self {
        Self {
            pdftotext: "pdftotext".to_string(),
        }
    }
}

impl FileExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific pdftotext binary
    pub fn with_pdftotext(mut self, binary: impl Into<String>) -> Self {
        self.pdftotext = binary.into();
        self
    }

    async fn extract_pdf(&self, path: &Path) -> anyhow::Result<String> {
        let output = tokio::process::Command::new(&self.pdftotext)
            .arg("-layout")
            .arg(path)
            .arg("-")
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.pdftotext))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.pdftotext,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DocumentExtractor for FileExtractor {
    async fn extract(&self, path: &Path) -> anyhow::Result<String> {
        if !path.exists() {
            bail!("File does not exist: {}", path.display());
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let text = match extension.as_str() {
            "pdf" => self.extract_pdf(path).await?,
            "txt" | "md" | "markdown" | "csv" | "json" | "text" | "" => {
                tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?
            }
            other => bail!("Unsupported document format: .{other}"),
        };

        tracing::debug!(path = %path.display(), chars = text.len(), "Extracted document text");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_extracts_plain_text() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "Scope of Work\nThe vendor shall deliver a portal.").unwrap();

        let text = FileExtractor::new().extract(file.path()).await.unwrap();
        assert!(text.contains("deliver a portal"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = FileExtractor::new()
            .extract(Path::new("/definitely/not/here.txt"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unsupported_format_is_an_error() {
        let file = tempfile::Builder::new().suffix(".pptx").tempfile().unwrap();
        let err = FileExtractor::new().extract(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }

    #[tokio::test]
    async fn test_missing_pdftotext_binary_is_an_error() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let result = FileExtractor::new()
            .with_pdftotext("pdftotext-does-not-exist")
            .extract(file.path())
            .await;
        assert!(result.is_err());
    }
}
