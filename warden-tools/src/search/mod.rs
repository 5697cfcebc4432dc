//! Workspace search tools.

mod grep;

pub use grep::GrepTool;
