//! GUI command handler.
//!
//! Launches the native host window with the bundled demo apps.

use crate::config::{load_config_from_path, load_global_config, HostConfig};
use crate::error::Result;
use crate::gui::app::run_gui;
use std::path::Path;

/// Config for the GUI: the file at `path`, or the global config.
pub fn resolve_config(path: Option<&Path>) -> Result<HostConfig> {
    match path {
        Some(path) => load_config_from_path(path),
        None => load_global_config(),
    }
}

/// Launch the native GUI application.
///
/// # Returns
///
/// * `Ok(())` when the user closes the window
/// * `Err(HydraError)` if the config is invalid or the GUI fails to initialize
pub fn gui_command(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    tracing::info!(title = %config.title, "launching host window");
    run_gui(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HydraError;

    #[test]
    fn test_resolve_config_from_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hydra.toml");
        std::fs::write(&path, "title = \"Ops\"\nuse_loader = false\n").unwrap();

        let config = resolve_config(Some(&path)).unwrap();

        assert_eq!(config.title, "Ops");
        assert!(!config.use_loader);
    }

    #[test]
    fn test_resolve_config_missing_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            resolve_config(Some(&path)),
            Err(HydraError::ConfigNotFound(_))
        ));
    }
}
