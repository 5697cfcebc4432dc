//! Persistent memory notes for the agent.

use crate::fs::validate_path;
use crate::prelude::*;
use chrono::Utc;
use std::path::PathBuf;

/// Default file the agent's notes are appended to.
pub const DEFAULT_MEMORY_FILE: &str = "MEMORY.md";

/// Input for appending a memory note
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryAppendInput {
    /// The note to remember
    pub note: String,
}

/// Write-kind tool appending timestamped notes to the workspace memory
/// file.
///
/// The first write asks the operator before creating the file; subsequent
/// appends are governed by the permission policy alone.
pub struct MemoryAppendTool {
    base_path: PathBuf,
    file_name: String,
}

impl MemoryAppendTool {
    /// Creates a tool using [`DEFAULT_MEMORY_FILE`] in the given workspace.
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path,
            file_name: DEFAULT_MEMORY_FILE.to_string(),
        }
    }

    /// Use a different memory file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

impl Tool for MemoryAppendTool {
    type Input = MemoryAppendInput;

    fn name(&self) -> &str {
        "memory_append"
    }

    fn description(&self) -> &str {
        "Append a timestamped note to the workspace memory file so it survives across sessions."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Write
    }

    fn affected_paths(&self, _input: &Self::Input) -> Vec<String> {
        vec![self.file_name.clone()]
    }

    fn confirmation(&self, input: &Self::Input) -> Option<ConfirmationDetails> {
        if self.base_path.join(&self.file_name).exists() {
            return None;
        }
        Some(ConfirmationDetails::generic(
            format!("Create {}?", self.file_name),
            format!(
                "memory_append wants to create '{}' and record:\n  {}",
                self.file_name, input.note
            ),
        ))
    }

    async fn execute(
        &self,
        input: Self::Input,
        _ctx: &ExecutionContext,
    ) -> Result<ToolOutput, ToolError> {
        let path = validate_path(&self.base_path, std::path::Path::new(&self.file_name))?;

        let stamp = Utc::now().format("%Y-%m-%d %H:%M");
        let entry = format!("- [{}] {}\n", stamp, input.note.trim());

        let mut content = match tokio::fs::read_to_string(&path).await {
            Ok(existing) => existing,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(ToolError::from(format!("failed to read memory file: {}", e))),
        };
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&entry);

        tokio::fs::write(&path, &content)
            .await
            .map_err(|e| ToolError::from(format!("failed to write memory file: {}", e)))?;

        Ok(format!("Remembered: {}", input.note.trim()).into())
    }
}
