//! Ready-to-use tools for the warden runtime.
//!
//! Every tool here implements [`warden_core::Tool`] with a typed input,
//! declares its capability kind, reports the filesystem paths a call would
//! touch (so permission rules with path filters apply), and supplies a
//! confirmation predicate where a human should look before it runs.

pub mod fs;
pub mod memory;
pub mod plan;
pub mod process;
pub mod search;

// Re-export validate_path at crate root for convenience
pub use fs::validate_path;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use schemars::JsonSchema;
    pub use serde::{Deserialize, Serialize};
    pub use warden_core::{
        ConfirmationDetails, ExecutionContext, Tool, ToolError, ToolKind, ToolOutput,
    };
}

use warden_core::tool::DynTool;

/// All tools in this crate, rooted at `base_path`, ready for
/// [`warden_core::ToolRegistry::register_all`].
pub fn all_tools(base_path: std::path::PathBuf) -> Vec<Box<dyn DynTool>> {
    warden_core::box_tools![
        fs::ReadFileTool::with_base_path(base_path.clone()),
        fs::WriteFileTool::with_base_path(base_path.clone()),
        fs::EditFileTool::with_base_path(base_path.clone()),
        search::GrepTool::with_base_path(base_path.clone()),
        memory::MemoryAppendTool::with_base_path(base_path.clone()),
        process::RunCommandTool::with_base_path(base_path),
        plan::ExitPlanModeTool,
    ]
}
