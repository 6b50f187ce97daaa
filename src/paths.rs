//! Per-user directory lookup. Never fails: when the platform lookup comes up
//! empty, the current directory (or `.`) is used instead.

use std::path::PathBuf;

fn fallback_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn non_empty(p: PathBuf) -> Option<PathBuf> {
    (!p.as_os_str().is_empty()).then_some(p)
}

/// The user's home directory (`$HOME`, `%USERPROFILE%`).
#[must_use]
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .and_then(non_empty)
        .unwrap_or_else(fallback_dir)
}

/// Per-user local data directory.
///
/// | Platform | Value                                  |
/// | -------- | -------------------------------------- |
/// | Linux    | `$XDG_DATA_HOME` or `$HOME/.local/share` |
/// | macOS    | `$HOME/Library/Application Support`    |
/// | Windows  | `%LOCALAPPDATA%`                       |
#[must_use]
pub fn data_home_dir() -> PathBuf {
    dirs::data_local_dir()
        .and_then(non_empty)
        .unwrap_or_else(fallback_dir)
}
