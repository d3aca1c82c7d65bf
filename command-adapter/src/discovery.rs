//! Locates the runner binary on the system.

use crate::error::CommandError;
use std::path::PathBuf;
use which::which;

/// Environment variable that overrides the runner binary path.
pub const COMMAND_BIN_ENV_VAR: &str = "RIG_GUARD_COMMAND_BIN";

/// Locates the runner executable.
///
/// Resolution order:
/// 1. `explicit_path` if provided and the file exists.
/// 2. The path in the `RIG_GUARD_COMMAND_BIN` environment variable.
/// 3. `binary` resolved via `$PATH`.
/// 4. Common install location fallbacks (platform-specific).
///
/// # Errors
///
/// Returns `CommandError::ExecutableNotFound` when no valid executable can be
/// located.
pub fn discover_command(
    binary: &str,
    explicit_path: Option<PathBuf>,
) -> Result<PathBuf, CommandError> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Ok(path);
        }
        return Err(CommandError::ExecutableNotFound(format!(
            "Explicit path does not exist: {}",
            path.display()
        )));
    }

    if let Ok(path_str) = std::env::var(COMMAND_BIN_ENV_VAR) {
        let path = PathBuf::from(path_str);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Ok(path) = which(binary) {
        return Ok(path);
    }

    for location in fallback_locations(binary) {
        if location.exists() {
            return Ok(location);
        }
    }

    Err(CommandError::ExecutableNotFound(format!(
        "{binary} not found. Searched: {COMMAND_BIN_ENV_VAR}, PATH, common install locations."
    )))
}

#[cfg(unix)]
fn fallback_locations(binary: &str) -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(home) = dirs::home_dir() {
        locations.push(home.join(".local/bin").join(binary));
    }
    locations.push(PathBuf::from("/usr/local/bin").join(binary));
    locations.push(PathBuf::from("/opt/homebrew/bin").join(binary));
    locations
}

#[cfg(windows)]
fn fallback_locations(binary: &str) -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(local) = dirs::data_local_dir() {
        locations.push(
            local
                .join("Programs")
                .join(binary)
                .join(format!("{binary}.exe")),
        );
    }
    locations
}
