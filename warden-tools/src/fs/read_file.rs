use crate::fs::validate_path;
use crate::prelude::*;
use std::path::PathBuf;

/// Input for reading a file
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileInput {
    /// Path to the file to read (relative to the workspace root or absolute)
    pub file_path: PathBuf,

    /// Starting line number (0-indexed, optional)
    #[serde(default)]
    pub offset: Option<usize>,

    /// Maximum number of lines to read (optional)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Read-only tool returning file contents, optionally a line range.
pub struct ReadFileTool {
    base_path: PathBuf,
}

impl ReadFileTool {
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

impl Tool for ReadFileTool {
    type Input = ReadFileInput;

    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Supports reading entire files or specific line ranges."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::ReadOnly
    }

    fn affected_paths(&self, input: &Self::Input) -> Vec<String> {
        vec![input.file_path.display().to_string()]
    }

    fn render_output(&self, output: &ToolOutput) -> String {
        let content = output.as_text();
        if content.is_empty() {
            return "(empty file)".to_string();
        }

        let lines: Vec<&str> = content.lines().collect();
        let width = lines.len().to_string().len().max(3);

        let mut out = String::new();
        for (i, line) in lines.iter().enumerate() {
            out.push_str(&format!("{:>width$} │ {}\n", i + 1, line, width = width));
        }
        out
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

        let result = if input.offset.is_some() || input.limit.is_some() {
            let lines: Vec<&str> = content.lines().collect();
            let offset = input.offset.unwrap_or(0);
            let limit = input.limit.unwrap_or(lines.len().saturating_sub(offset));

            lines
                .iter()
                .skip(offset)
                .take(limit)
                .copied()
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            content
        };

        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tool_in(temp: &TempDir) -> ReadFileTool {
        ReadFileTool::with_base_path(temp.path().to_path_buf())
    }

    #[tokio::test]
    async fn test_read_full_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("test.txt"), "line1\nline2\nline3").unwrap();

        let input = ReadFileInput {
            file_path: PathBuf::from("test.txt"),
            offset: None,
            limit: None,
        };

        let result = tool_in(&temp)
            .execute(input, &ExecutionContext::new(temp.path()))
            .await
            .unwrap();
        assert_eq!(result.as_text(), "line1\nline2\nline3");
    }

    #[tokio::test]
    async fn test_read_line_range() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("test.txt"), "a\nb\nc\nd").unwrap();

        let input = ReadFileInput {
            file_path: PathBuf::from("test.txt"),
            offset: Some(1),
            limit: Some(2),
        };

        let result = tool_in(&temp)
            .execute(input, &ExecutionContext::new(temp.path()))
            .await
            .unwrap();
        assert_eq!(result.as_text(), "b\nc");
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let input = ReadFileInput {
            file_path: PathBuf::from("../../../etc/passwd"),
            offset: None,
            limit: None,
        };

        let result = tool_in(&temp)
            .execute(input, &ExecutionContext::new(temp.path()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_errors() {
        let temp = TempDir::new().unwrap();
        let input = ReadFileInput {
            file_path: PathBuf::from("absent.txt"),
            offset: None,
            limit: None,
        };

        let result = tool_in(&temp)
            .execute(input, &ExecutionContext::new(temp.path()))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_reports_affected_path() {
        let temp = TempDir::new().unwrap();
        let input = ReadFileInput {
            file_path: PathBuf::from("src/.env"),
            offset: None,
            limit: None,
        };
        assert_eq!(tool_in(&temp).affected_paths(&input), vec!["src/.env"]);
    }

    #[test]
    fn test_render_output_numbers_lines() {
        let temp = TempDir::new().unwrap();
        let rendered = tool_in(&temp).render_output(&ToolOutput::text("alpha\nbeta"));
        assert!(rendered.contains("1 │ alpha"));
        assert!(rendered.contains("2 │ beta"));
    }
}
