//! Decoder configuration assembly and model asset validation.
//!
//! [`ConfigurationBuilder::build`] turns a model directory, an input device
//! name and the logging flag into a [`DecoderConfig`]:
//!
//! 1. The model directory must exist.  If it carries an `assets.lst`
//!    manifest, every file listed there must exist too.
//! 2. Microphone input and noise removal are always enabled; the acoustic
//!    model and input device are set from the arguments.
//! 3. With logging enabled the decoder writes to
//!    `<model_dir>/<YYYY-MM-DD>.log`.
//! 4. An `-argfile`, if configured, is merged last so it can override any of
//!    the above.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::decoder::args::{ARG_FILE, HMM, INPUT_DEVICE, INPUT_MIC, LOG_FILE, REMOVE_NOISE};
use crate::decoder::{ArgSchema, DecoderConfig};
use crate::error::{RecognizerError, Result};

/// Name of the optional asset manifest inside a model directory.
pub const ASSET_MANIFEST: &str = "assets.lst";

// ---------------------------------------------------------------------------
// ConfigurationBuilder
// ---------------------------------------------------------------------------

/// Builds validated decoder configurations from an [`ArgSchema`].
#[derive(Debug, Clone)]
pub struct ConfigurationBuilder {
    schema: Arc<ArgSchema>,
}

impl ConfigurationBuilder {
    pub fn new(schema: ArgSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &ArgSchema {
        &self.schema
    }

    /// Build a configuration dated today (local time).
    pub fn build(
        &self,
        model_path: &Path,
        input_device_name: &str,
        logging_enabled: bool,
    ) -> Result<DecoderConfig> {
        let today = chrono::Local::now().date_naive();
        self.build_on(model_path, input_device_name, logging_enabled, today)
    }

    /// Build a configuration whose log file is named after `date`.
    ///
    /// # Errors
    ///
    /// - [`RecognizerError::MissingAsset`]: the model directory or a
    ///   manifest entry does not exist.
    /// - [`RecognizerError::Io`]: the manifest exists but cannot be read.
    /// - [`RecognizerError::ConfigParse`]: the argument file is unreadable
    ///   or malformed.
    pub fn build_on(
        &self,
        model_path: &Path,
        input_device_name: &str,
        logging_enabled: bool,
        date: NaiveDate,
    ) -> Result<DecoderConfig> {
        check_model_assets(model_path)?;

        let mut config = DecoderConfig::new(Arc::clone(&self.schema));
        config.set_str(HMM, model_path.to_string_lossy())?;
        config.set_bool(REMOVE_NOISE, true)?;
        config.set_bool(INPUT_MIC, true)?;
        config.set_str(INPUT_DEVICE, input_device_name)?;

        if logging_enabled {
            let log_path = log_file_path(model_path, date);
            config.set_str(LOG_FILE, log_path.to_string_lossy())?;
        }

        if let Some(arg_file) = config.str_value(ARG_FILE).map(PathBuf::from) {
            let applied = config.parse_file(&arg_file)?;
            log::debug!(
                "config: merged {applied} option(s) from {}",
                arg_file.display()
            );
        }

        Ok(config)
    }
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self::new(ArgSchema::recognizer())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `<model_path>/<YYYY-MM-DD>.log`
pub fn log_file_path(model_path: &Path, date: NaiveDate) -> PathBuf {
    model_path.join(format!("{}.log", date.format("%Y-%m-%d")))
}

/// Verify `model_path` is a directory and every file listed in its
/// [`ASSET_MANIFEST`] exists.
///
/// Entries are always resolved inside `model_path`: root, drive prefix and
/// `..` components are dropped, so `/tmp/mdef` names `<model_path>/tmp/mdef`.
/// A missing manifest is not an error: the decoder validates its own files.
pub fn check_model_assets(model_path: &Path) -> Result<()> {
    if !model_path.is_dir() {
        return Err(RecognizerError::MissingAsset(model_path.to_path_buf()));
    }

    let manifest = model_path.join(ASSET_MANIFEST);
    if !manifest.exists() {
        log::info!("config: no {ASSET_MANIFEST} in {}, skipping asset check", model_path.display());
        return Ok(());
    }

    let listing = std::fs::read_to_string(&manifest)?;
    for line in listing.lines() {
        let entry = line.trim_end_matches(['\r', '\n']);
        if entry.trim().is_empty() {
            continue;
        }
        let path = asset_path(model_path, entry);
        if !path.is_file() {
            return Err(RecognizerError::MissingAsset(path));
        }
    }
    Ok(())
}

fn asset_path(model_path: &Path, entry: &str) -> PathBuf {
    let mut path = model_path.to_path_buf();
    for component in Path::new(entry).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
