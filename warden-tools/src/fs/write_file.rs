use crate::fs::validate_path;
use crate::prelude::*;
use std::path::PathBuf;

/// Input for writing a file
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileInput {
    /// Path to write (relative to the workspace root or absolute)
    pub file_path: PathBuf,

    /// Content to write
    pub content: String,

    /// Append instead of overwrite (optional, default false)
    #[serde(default)]
    pub append: bool,
}

/// Write-kind tool that creates or replaces files.
///
/// Overwriting an existing file asks the operator first; creating a new
/// file relies on the permission policy alone.
pub struct WriteFileTool {
    base_path: PathBuf,
}

impl WriteFileTool {
    /// Creates a tool rooted at the given workspace directory.
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Creates a tool rooted at the current working directory.
    pub fn try_new() -> std::io::Result<Self> {
        Ok(Self {
            base_path: std::env::current_dir()?,
        })
    }
}

impl Tool for WriteFileTool {
    type Input = WriteFileInput;

    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file, creating it if needed. Overwrites by default; set append to add to the end."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Write
    }

    fn affected_paths(&self, input: &Self::Input) -> Vec<String> {
        vec![input.file_path.display().to_string()]
    }

    fn confirmation(&self, input: &Self::Input) -> Option<ConfirmationDetails> {
        let existing = validate_path(&self.base_path, &input.file_path).ok()?;
        if !existing.exists() || input.append {
            return None;
        }
        Some(ConfirmationDetails::edit(
            format!("Overwrite {}?", input.file_path.display()),
            format!(
                "write_file will replace the existing file '{}' with {} bytes of new content.",
                input.file_path.display(),
                input.content.len()
            ),
        ))
    }

    async fn execute(
        &self,
        input: Self::Input,
        _ctx: &ExecutionContext,
    ) -> Result<ToolOutput, ToolError> {
        let path = validate_path(&self.base_path, &input.file_path)?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ToolError::from(format!("failed to create directory: {}", e)))?;
            }
        }

        if input.append {
            use tokio::io::AsyncWriteExt;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(|e| ToolError::from(format!("failed to open file: {}", e)))?;
            file.write_all(input.content.as_bytes())
                .await
                .map_err(|e| ToolError::from(format!("failed to append: {}", e)))?;
        } else {
            tokio::fs::write(&path, &input.content)
                .await
                .map_err(|e| ToolError::from(format!("failed to write file: {}", e)))?;
        }

        Ok(format!(
            "Wrote {} bytes to {}",
            input.content.len(),
            input.file_path.display()
        )
        .into())
    }
}
