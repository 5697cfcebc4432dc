//! Filesystem tools confined to a base directory.
//!
//! Every tool in this module resolves user-supplied paths against a
//! configured `base_path` and refuses anything that escapes it, including
//! `..` traversal, absolute paths outside the base, and symlinks pointing
//! elsewhere. The check happens in the executor; the runtime's permission
//! rules see the paths a call reports via `affected_paths` and can gate
//! them independently (for example `Read(file_path:**/.env)` in a deny
//! list).
//!
//! These checks are guardrails for model-proposed paths, not a sandbox;
//! deployments handling untrusted workspaces should add OS-level isolation
//! around the process.

mod edit_file;
mod read_file;
mod write_file;

pub use edit_file::EditFileTool;
pub use read_file::ReadFileTool;
pub use write_file::WriteFileTool;

use std::path::{Path, PathBuf};
use warden_core::ToolError;

/// Resolve `target_path` against `base_path` and reject anything outside it.
///
/// Existing paths are canonicalized, so symlinks that lead out of the base
/// are caught. For paths that do not exist yet (write targets), the nearest
/// existing ancestor is canonicalized and checked instead, then the
/// remaining components are re-applied.
pub fn validate_path(base_path: &Path, target_path: &Path) -> Result<PathBuf, ToolError> {
    let canonical_base = base_path.canonicalize().map_err(|e| {
        ToolError::PathValidation(format!(
            "base directory '{}' is not accessible: {}",
            base_path.display(),
            e
        ))
    })?;

    let full_path = if target_path.is_absolute() {
        target_path.to_path_buf()
    } else {
        canonical_base.join(target_path)
    };

    if full_path.exists() {
        let canonical = full_path.canonicalize().map_err(|e| {
            ToolError::PathValidation(format!(
                "failed to canonicalize '{}': {}",
                full_path.display(),
                e
            ))
        })?;
        if !canonical.starts_with(&canonical_base) {
            return Err(ToolError::PathValidation(format!(
                "path '{}' escapes the workspace",
                target_path.display()
            )));
        }
        return Ok(canonical);
    }

    // Walk up to the nearest existing ancestor, then re-apply the rest
    let mut ancestor = full_path.clone();
    let mut remainder = Vec::new();
    while !ancestor.exists() {
        match (ancestor.parent(), ancestor.file_name()) {
            (Some(parent), Some(name)) => {
                remainder.push(name.to_os_string());
                ancestor = parent.to_path_buf();
            }
            _ => {
                return Err(ToolError::PathValidation(format!(
                    "path '{}' has no existing ancestor",
                    target_path.display()
                )));
            }
        }
    }

    let canonical_ancestor = ancestor.canonicalize().map_err(|e| {
        ToolError::PathValidation(format!(
            "failed to canonicalize '{}': {}",
            ancestor.display(),
            e
        ))
    })?;
    if !canonical_ancestor.starts_with(&canonical_base) {
        return Err(ToolError::PathValidation(format!(
            "path '{}' escapes the workspace",
            target_path.display()
        )));
    }

    let mut resolved = canonical_ancestor;
    for component in remainder.into_iter().rev() {
        resolved.push(component);
    }
    Ok(resolved)
}
