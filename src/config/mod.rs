//! Persistent settings for the recognizer.
//!
//! Provides [`RecognizerSettings`] (model, device, logging, vocabulary),
//! [`AppPaths`] for platform directories, and TOML persistence via
//! `RecognizerSettings::load_from` / `RecognizerSettings::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AudioSettings, GrammarFile, RecognizerSettings, VocabularySettings};
