use crate::fs::validate_path;
use crate::prelude::*;
use std::path::PathBuf;

/// Input for editing a file
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditFileInput {
    /// Path to the file to edit (relative to the workspace root or absolute)
    pub file_path: PathBuf,

    /// Exact text to replace. Must appear exactly once in the file.
    pub old_string: String,

    /// Replacement text
    pub new_string: String,
}

/// Edit-kind tool performing a single exact-match replacement.
///
/// The match must be unique: zero occurrences is an error (nothing to
/// edit), more than one is ambiguous and the model is asked to include
/// more surrounding context.
pub struct EditFileTool {
    base_path: PathBuf,
}

impl EditFileTool {
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

impl Tool for EditFileTool {
    type Input = EditFileInput;

    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Replace one exact occurrence of a string in a file with new text."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Edit
    }

    fn affected_paths(&self, input: &Self::Input) -> Vec<String> {
        vec![input.file_path.display().to_string()]
    }

    fn confirmation(&self, input: &Self::Input) -> Option<ConfirmationDetails> {
        Some(ConfirmationDetails::edit(
            format!("Edit {}?", input.file_path.display()),
            format!(
                "edit_file will replace:\n--- remove\n{}\n+++ insert\n{}",
                preview(&input.old_string),
                preview(&input.new_string)
            ),
        ))
    }

    async fn execute(
        &self,
        input: Self::Input,
        _ctx: &ExecutionContext,
    ) -> Result<ToolOutput, ToolError> {
        let path = validate_path(&self.base_path, &input.file_path)?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::from(format!("failed to read file: {}", e)))?;

        let occurrences = content.matches(&input.old_string).count();
        match occurrences {
            0 => {
                return Err(ToolError::from(format!(
                    "old_string not found in {}",
                    input.file_path.display()
                )))
            }
            1 => {}
            n => {
                return Err(ToolError::from(format!(
                    "old_string appears {} times in {}; include more context to make it unique",
                    n,
                    input.file_path.display()
                )))
            }
        }

        let updated = content.replacen(&input.old_string, &input.new_string, 1);
        tokio::fs::write(&path, &updated)
            .await
            .map_err(|e| ToolError::from(format!("failed to write file: {}", e)))?;

        Ok(format!("Edited {}", input.file_path.display()).into())
    }
}

const PREVIEW_LINES: usize = 8;

fn preview(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= PREVIEW_LINES {
        text.to_string()
    } else {
        format!(
            "{}\n… +{} more lines",
            lines[..PREVIEW_LINES].join("\n"),
            lines.len() - PREVIEW_LINES
        )
    }
}
