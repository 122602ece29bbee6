//! Persistent recognizer settings and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through `settings.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// AudioSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// 16-bit samples read from the device per processing step.
    pub chunk_samples: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            chunk_samples: crate::session::DEFAULT_CHUNK_SAMPLES,
        }
    }
}

// ---------------------------------------------------------------------------
// VocabularySettings
// ---------------------------------------------------------------------------

/// A JSGF grammar file registered under `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarFile {
    pub name: String,
    pub path: PathBuf,
}

/// Searches and dictionary entries installed after setup.
///
/// Grammars are registered in order, so the first entry becomes the base
/// grammar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularySettings {
    pub grammars: Vec<GrammarFile>,
    /// Word → phone string, e.g. `robot = "R OW B AA T"`.
    pub words: BTreeMap<String, String>,
    pub keyword: Option<String>,
    pub threshold: Option<f64>,
}

impl VocabularySettings {
    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty() && self.words.is_empty() && self.keyword.is_none()
    }
}

// ---------------------------------------------------------------------------
// RecognizerSettings  (top-level)
// ---------------------------------------------------------------------------

/// Top-level settings, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use speech_recognizer::config::RecognizerSettings;
///
/// // Defaults when the file is missing
/// let settings = RecognizerSettings::load().unwrap();
/// println!("model: {}", settings.model_dir.display());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerSettings {
    /// Acoustic model directory passed to `setup`.
    pub model_dir: PathBuf,
    /// Capture device name (`-adcdev`).
    pub input_device: String,
    /// Write the decoder log to `<model_dir>/<date>.log`.
    pub log_to_file: bool,
    pub audio: AudioSettings,
    pub vocabulary: VocabularySettings,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            model_dir: AppPaths::new().models_dir.join("en-us"),
            input_device: crate::session::DEFAULT_INPUT_DEVICE.into(),
            log_to_file: true,
            audio: AudioSettings::default(),
            vocabulary: VocabularySettings::default(),
        }
    }
}

impl RecognizerSettings {
    /// Load from the platform `settings.toml`; defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.  A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        if settings.audio.chunk_samples == 0 {
            anyhow::bail!("{}: audio.chunk_samples must be > 0", path.display());
        }
        Ok(settings)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
