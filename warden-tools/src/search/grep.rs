use crate::fs::validate_path;
use crate::prelude::*;
use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Input for searching file contents
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GrepInput {
    /// Regular expression to search for
    pub pattern: String,

    /// Directory to search, relative to the workspace root (optional,
    /// defaults to the whole workspace)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum number of matching lines to return (optional, default 100)
    #[serde(default)]
    pub max_results: Option<usize>,
}

const DEFAULT_MAX_RESULTS: usize = 100;

/// Read-only tool searching file contents with a regex.
///
/// Respects `.gitignore` and skips binary-looking files. Output is one
/// `path:line_number:line` entry per match.
pub struct GrepTool {
    base_path: PathBuf,
}

impl GrepTool {
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

impl Tool for GrepTool {
    type Input = GrepInput;

    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search file contents with a regular expression, honoring .gitignore. Returns path:line:text matches."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::ReadOnly
    }

    fn affected_paths(&self, input: &Self::Input) -> Vec<String> {
        match &input.path {
            Some(path) => vec![path.display().to_string()],
            None => Vec::new(),
        }
    }

    async fn execute(
        &self,
        input: Self::Input,
        _ctx: &ExecutionContext,
    ) -> Result<ToolOutput, ToolError> {
        let root = match &input.path {
            Some(path) => validate_path(&self.base_path, path)?,
            None => self.base_path.clone(),
        };

        let regex = Regex::new(&input.pattern)
            .map_err(|e| ToolError::from(format!("invalid pattern: {}", e)))?;
        let max_results = input.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let base = self.base_path.clone();

        let matches = tokio::task::spawn_blocking(move || search(&root, &base, &regex, max_results))
            .await
            .map_err(|e| ToolError::from(format!("search task failed: {}", e)))?;

        if matches.is_empty() {
            Ok("No matches found".into())
        } else {
            Ok(matches.join("\n").into())
        }
    }
}

fn search(root: &Path, base: &Path, regex: &Regex, max_results: usize) -> Vec<String> {
    let mut matches = Vec::new();

    for entry in WalkBuilder::new(root).build().flatten() {
        if matches.len() >= max_results {
            break;
        }
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        // Skip files that are not valid UTF-8 text
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };

        let display = entry
            .path()
            .strip_prefix(base)
            .unwrap_or(entry.path())
            .display()
            .to_string();

        for (line_number, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                matches.push(format!("{}:{}:{}", display, line_number + 1, line));
                if matches.len() >= max_results {
                    break;
                }
            }
        }
    }

    matches
}
