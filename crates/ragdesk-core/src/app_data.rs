//! Where ragdesk stores its own data (config and the persisted index).
//!
//! Source documents stay where they are. We only store app state here.

use std::path::PathBuf;

/// Subdirectory of the app data directory holding the persisted index.
pub const INDEX_DIRNAME: &str = "index";

/// Returns the directory where ragdesk stores config, index, and other app data.
/// On Linux: `~/.local/share/ragdesk/`. On macOS: `~/Library/Application Support/app.RagDesk.RagDesk/`.
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = directories::ProjectDirs::from("app", "RagDesk", "RagDesk")?
        .data_local_dir()
        .to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Default location of the persisted index: `<app data>/index`.
pub fn default_index_dir() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(INDEX_DIRNAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_is_some() {
        assert!(app_data_dir().is_some());
    }

    #[test]
    fn index_dir_is_inside_app_data() {
        let index = default_index_dir().unwrap();
        assert!(index.starts_with(app_data_dir().unwrap()));
        assert!(index.ends_with(INDEX_DIRNAME));
    }
}
