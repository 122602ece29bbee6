//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\speech-recognizer\
//!   macOS:   ~/Library/Application Support/speech-recognizer/
//!   Linux:   ~/.config/speech-recognizer/
//!
//! Data dir (acoustic models):
//!   Windows: %LOCALAPPDATA%\speech-recognizer\
//!   macOS:   ~/Library/Application Support/speech-recognizer/
//!   Linux:   ~/.local/share/speech-recognizer/

use std::path::PathBuf;

/// Resolved application directories and files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default parent of acoustic model directories.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "speech-recognizer";

    /// Falls back to the current directory if the platform has no standard
    /// location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            models_dir: data_dir.join("models"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
