use crate::domain::ports::PdfConverter;
use crate::utils::error::{EtlError, Result};
use std::path::Path;
use tokio::process::Command;

/// Converts HTML to PDF with an external `wkhtmltopdf` binary.
#[derive(Debug, Clone)]
pub struct WkHtmlToPdf {
    tool: String,
}

impl WkHtmlToPdf {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

impl PdfConverter for WkHtmlToPdf {
    async fn convert(&self, html_path: &Path, pdf_path: &Path) -> Result<()> {
        tracing::debug!(
            "Running {} {} -> {}",
            self.tool,
            html_path.display(),
            pdf_path.display()
        );

        let output = Command::new(&self.tool)
            .arg("--quiet")
            .arg("--enable-local-file-access")
            .arg(html_path)
            .arg(pdf_path)
            .output()
            .await
            .map_err(|e| EtlError::RenderError {
                message: format!("Could not start '{}': {}", self.tool, e),
            })?;

        if !output.status.success() {
            return Err(EtlError::RenderError {
                message: format!(
                    "'{}' exited with {}: {}",
                    self.tool,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}
