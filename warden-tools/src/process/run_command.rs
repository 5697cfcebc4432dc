use crate::prelude::*;
use std::path::PathBuf;
use std::process::Stdio;

/// Input for running a shell command
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunCommandInput {
    /// Command line to execute via the shell
    pub command: String,

    /// Optional timeout in milliseconds (default: 120000)
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Execute-kind tool running a shell command in the workspace directory.
///
/// Every call carries a confirmation predicate showing the exact command
/// line, and the executor honors the context's cancellation token: a
/// cancelled call kills the child process rather than letting it finish in
/// the background.
pub struct RunCommandTool {
    base_path: PathBuf,
}

impl RunCommandTool {
    /// Creates a tool that runs commands in the given directory.
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Creates a tool that runs commands in the current working directory.
    pub fn try_new() -> std::io::Result<Self> {
        Ok(Self {
            base_path: std::env::current_dir()?,
        })
    }
}

impl Tool for RunCommandTool {
    type Input = RunCommandInput;

    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Run a shell command in the workspace and return its output and exit status."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Execute
    }

    fn confirmation(&self, input: &Self::Input) -> Option<ConfirmationDetails> {
        Some(ConfirmationDetails::execute(
            "Run command?",
            format!("run_command wants to execute:\n  {}", input.command),
        ))
    }

    async fn execute(
        &self,
        input: Self::Input,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutput, ToolError> {
        let child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&input.command)
            .current_dir(&self.base_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::from(format!("failed to spawn command: {}", e)))?;

        let timeout = std::time::Duration::from_millis(
            input.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        );

        // Dropping the unfinished wait future kills the child (kill_on_drop)
        let output = tokio::select! {
            output = child.wait_with_output() => {
                output.map_err(|e| ToolError::from(format!("failed to wait for command: {}", e)))?
            }
            _ = ctx.cancellation.cancelled() => {
                return Err(ToolError::from("command cancelled"));
            }
            _ = tokio::time::sleep(timeout) => {
                return Err(ToolError::from(format!(
                    "command timed out after {}ms",
                    timeout.as_millis()
                )));
            }
        };

        let out = String::from_utf8_lossy(&output.stdout);
        let err = String::from_utf8_lossy(&output.stderr);
        let status = output.status;

        ctx.progress(&format!(
            "command exited with status {}",
            status.code().map_or("unknown".to_string(), |c| c.to_string())
        ));

        let mut result = String::new();
        if !out.is_empty() {
            result.push_str(&out);
        }
        if !err.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str("stderr:\n");
            result.push_str(&err);
        }
        result.push_str(&format!(
            "{}exit status: {}",
            if result.is_empty() { "" } else { "\n" },
            status.code().map_or("terminated by signal".to_string(), |c| c.to_string())
        ));

        if status.success() {
            Ok(result.into())
        } else {
            Err(ToolError::from(result))
        }
    }
}
