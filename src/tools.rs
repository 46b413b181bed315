//! Runtime tool path resolution
//!
//! For each external tool (e.g., `helm`):
//! 1. Check for an environment variable `{TOOL}_BIN` (e.g., `HELM_BIN`)
//! 2. Fall back to PATH-based invocation if the envvar is not set
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::tools::{get_tool_path, tools};
//! use tokio::process::Command;
//!
//! // Reads HELM_BIN, falls back to "helm"
//! let helm = get_tool_path(tools::HELM);
//! Command::new(&helm).args(["list", "-n", "acme"]).output().await?;
//! ```

use std::env;

/// Get the path to an external tool
///
/// Checks for an environment variable `{TOOL}_BIN` (uppercase tool name + "_BIN").
/// Falls back to the tool name itself if the envvar is not set, which relies on PATH.
pub fn get_tool_path(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase().replace('-', "_"));
    env::var(&env_var).unwrap_or_else(|_| tool.to_string())
}

/// Common tool names
pub mod tools {
    pub const HELM: &str = "helm";
}
