//! The tool contract: what the execution pipeline requires from a tool.
//!
//! Tools define a typed input with `#[derive(Deserialize, JsonSchema)]`;
//! the JSON schema the model sees is generated from the type. Implement
//! [`Tool`] and erase it with [`box_tool`] for storage in the registry.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::confirm::ConfirmationDetails;
use crate::pipeline::ExecutionContext;

/// Capability category of a tool.
///
/// The pipeline's permission-mode overrides key off this: mutating kinds
/// (`Write`, `Edit`, `Execute`) can never run without an `allow` decision
/// or an approved confirmation, while `ReadOnly` tools skip confirmation
/// under the default mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolKind {
    /// Inspects state without changing it (read, list, search).
    ReadOnly,

    /// Creates or replaces files or other workspace state.
    Write,

    /// Modifies existing files in place.
    Edit,

    /// Runs commands or spawns processes.
    Execute,
}

impl ToolKind {
    /// True for every kind that can change workspace state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, ToolKind::ReadOnly)
    }
}

/// Payload a tool executor produces on success.
///
/// `Text` is returned to the model verbatim; `Json` for structured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolOutput {
    /// Plain text response.
    Text(String),

    /// Structured JSON data.
    Json(Value),
}

impl ToolOutput {
    /// Create a text output.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Create a JSON output from any serializable type.
    pub fn json<T: Serialize>(value: T) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Text form of the output, rendering JSON compactly.
    pub fn as_text(&self) -> String {
        match self {
            ToolOutput::Text(s) => s.clone(),
            ToolOutput::Json(v) => v.to_string(),
        }
    }

    /// Borrow the text if this is a `Text` output.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ToolOutput::Text(s) => Some(s),
            ToolOutput::Json(_) => None,
        }
    }
}

impl From<String> for ToolOutput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ToolOutput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Errors a tool executor can produce.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("path validation failed: {0}")]
    PathValidation(String),

    #[error("{0}")]
    Custom(String),
}

impl From<String> for ToolError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

/// Trait implemented by every tool the runtime can dispatch.
///
/// # Example
///
/// ```rust
/// use warden_core::{ExecutionContext, Tool, ToolError, ToolKind, ToolOutput};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct EchoInput {
///     /// Message to echo back
///     message: String,
/// }
///
/// struct EchoTool;
///
/// impl Tool for EchoTool {
///     type Input = EchoInput;
///
///     fn name(&self) -> &str { "echo" }
///     fn description(&self) -> &str { "Echo a message back" }
///     fn kind(&self) -> ToolKind { ToolKind::ReadOnly }
///
///     async fn execute(
///         &self,
///         input: Self::Input,
///         _ctx: &ExecutionContext,
///     ) -> Result<ToolOutput, ToolError> {
///         Ok(input.message.into())
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// The input type for this tool. Must implement `Deserialize` and
    /// `JsonSchema`.
    type Input: DeserializeOwned + JsonSchema;

    /// Unique tool name (the registry key).
    fn name(&self) -> &str;

    /// What the tool does, shown to the model.
    fn description(&self) -> &str;

    /// Capability category.
    fn kind(&self) -> ToolKind;

    /// Execute with validated, typed input.
    ///
    /// Long-running executors should watch `ctx.cancellation` and return
    /// early when it fires; the pipeline does not preempt them.
    fn execute(
        &self,
        input: Self::Input,
        ctx: &ExecutionContext,
    ) -> impl std::future::Future<Output = Result<ToolOutput, ToolError>> + Send;

    /// Dynamic confirmation predicate.
    ///
    /// Return details to force an operator confirmation for this specific
    /// call, independent of the policy decision. The default never asks.
    fn confirmation(&self, _input: &Self::Input) -> Option<ConfirmationDetails> {
        None
    }

    /// Filesystem paths this call would touch, used for rule matching.
    fn affected_paths(&self, _input: &Self::Input) -> Vec<String> {
        Vec::new()
    }

    /// JSON schema for the input type, generated from the derive.
    fn input_schema(&self) -> Value {
        let schema = schemars::schema_for!(Self::Input);
        serde_json::to_value(schema).expect("schema serialization cannot fail")
    }

    /// Render input parameters for human-facing display.
    fn render_input(&self, params: &Value) -> String {
        render_params(self.name(), params)
    }

    /// Render output for human-facing display.
    fn render_output(&self, output: &ToolOutput) -> String {
        render_output(output)
    }
}

/// Object-safe form of [`Tool`], used by the registry and pipeline.
///
/// Implementors should use [`Tool`] and [`box_tool`] instead of
/// implementing this directly.
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn kind(&self) -> ToolKind;
    fn input_schema(&self) -> Value;

    /// Confirmation predicate over raw parameters.
    ///
    /// Returns `None` when the parameters do not deserialize; the pipeline
    /// validates before calling this.
    fn confirmation_raw(&self, params: &Value) -> Option<ConfirmationDetails>;

    /// Affected paths over raw parameters (empty when they do not
    /// deserialize).
    fn affected_paths_raw(&self, params: &Value) -> Vec<String>;

    /// Execute with raw parameters.
    fn execute_raw<'a>(
        &'a self,
        params: Value,
        ctx: &'a ExecutionContext,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>,
    >;

    fn render_input(&self, params: &Value) -> String;
    fn render_output(&self, output: &ToolOutput) -> String;
}

/// Convert a [`Tool`] into a type-erased `Box<dyn DynTool>` for
/// registration.
pub fn box_tool<T: Tool + 'static>(tool: T) -> Box<dyn DynTool> {
    Box::new(ToolAdapter(tool))
}

/// Create a `Vec<Box<dyn DynTool>>` from heterogeneous tool types.
///
/// ```ignore
/// registry.register_all(box_tools![ReadFileTool::new(), WriteFileTool::new()])?;
/// ```
#[macro_export]
macro_rules! box_tools {
    ($($tool:expr),* $(,)?) => {
        vec![$($crate::tool::box_tool($tool)),*]
    };
}

/// Internal adapter implementing [`DynTool`] for any [`Tool`].
struct ToolAdapter<T>(T);

impl<T: Tool + 'static> DynTool for ToolAdapter<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn kind(&self) -> ToolKind {
        self.0.kind()
    }

    fn input_schema(&self) -> Value {
        self.0.input_schema()
    }

    fn confirmation_raw(&self, params: &Value) -> Option<ConfirmationDetails> {
        let input: T::Input = serde_json::from_value(params.clone()).ok()?;
        self.0.confirmation(&input)
    }

    fn affected_paths_raw(&self, params: &Value) -> Vec<String> {
        match serde_json::from_value::<T::Input>(params.clone()) {
            Ok(input) => self.0.affected_paths(&input),
            Err(_) => Vec::new(),
        }
    }

    fn execute_raw<'a>(
        &'a self,
        params: Value,
        ctx: &'a ExecutionContext,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>,
    > {
        Box::pin(async move {
            let input: T::Input = serde_json::from_value(params)
                .map_err(|e| ToolError::Custom(format!("failed to deserialize input: {}", e)))?;
            self.0.execute(input, ctx).await
        })
    }

    fn render_input(&self, params: &Value) -> String {
        self.0.render_input(params)
    }

    fn render_output(&self, output: &ToolOutput) -> String {
        self.0.render_output(output)
    }
}

// ============================================================================
// Display rendering helpers
// ============================================================================

const MAX_PARAMS: usize = 10;
const MAX_VALUE_LEN: usize = 80;
const MAX_OUTPUT_LINES: usize = 12;

fn value_preview(value: &Value) -> String {
    match value {
        Value::String(s) => {
            let end = s
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|&i| i <= MAX_VALUE_LEN)
                .last()
                .unwrap_or(0);
            if s.len() > MAX_VALUE_LEN {
                format!("\"{}…\"", &s[..end])
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} keys}}", obj.len()),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}

/// Default rendering of tool parameters: tool name plus one line per
/// parameter, truncated.
pub fn render_params(tool_name: &str, params: &Value) -> String {
    let mut out = tool_name.to_string();

    if let Some(obj) = params.as_object() {
        for (key, value) in obj.iter().take(MAX_PARAMS) {
            out.push_str(&format!("\n  {}: {}", key, value_preview(value)));
        }
        if obj.len() > MAX_PARAMS {
            out.push_str(&format!("\n  … +{} more", obj.len() - MAX_PARAMS));
        }
    }

    out
}

/// Default rendering of tool output, truncated to a screenful.
pub fn render_output(output: &ToolOutput) -> String {
    let text = output.as_text();
    let lines: Vec<&str> = text.lines().collect();

    if lines.len() <= MAX_OUTPUT_LINES {
        text
    } else {
        format!(
            "{}\n… +{} more lines",
            lines[..MAX_OUTPUT_LINES].join("\n"),
            lines.len() - MAX_OUTPUT_LINES
        )
    }
}
