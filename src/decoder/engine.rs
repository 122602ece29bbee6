//! Decoder engine interface.
//!
//! # Overview
//!
//! The acoustic decoder (feature extraction, search, scoring) lives outside
//! this crate.  The session talks to it through two object-safe traits:
//!
//! - [`DecoderEngine`] creates a decoder from a [`DecoderConfig`].
//! - [`Decoder`] is one live decoder instance.  Dropping the box frees it.
//!
//! Status-returning calls report failure as [`EngineError`]; the session maps
//! those into [`crate::RecognizerError`] variants that name the operation.

use std::path::Path;

use thiserror::Error;

use crate::decoder::DecoderConfig;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Failure reported by the decoder engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A live decoder instance.
///
/// # Contract
///
/// - Searches are named.  `set_jsgf_*` and `set_keyphrase` register (or
///   overwrite) a search; `set_search` makes a registered search active and
///   fails for unknown names.
/// - `process_raw` consumes 16-bit mono PCM at the configured sample rate.
/// - `in_speech` reports voice activity for the most recently processed
///   audio.
/// - `hypothesis` returns the best transcription of the last ended
///   utterance, if any.
pub trait Decoder {
    fn set_search(&mut self, name: &str) -> Result<(), EngineError>;

    fn set_jsgf_file(&mut self, name: &str, path: &Path) -> Result<(), EngineError>;

    fn set_jsgf_string(&mut self, name: &str, grammar: &str) -> Result<(), EngineError>;

    fn set_keyphrase(&mut self, name: &str, phrase: &str) -> Result<(), EngineError>;

    /// Detection threshold for keyphrase searches.  Read when a keyphrase
    /// search is activated, so it must be set before `set_search`.
    fn set_kws_threshold(&mut self, threshold: f64) -> Result<(), EngineError>;

    /// Pronunciation of `word` if it is in the active dictionary.
    fn lookup_word(&self, word: &str) -> Option<String>;

    /// Add `word` with pronunciation `phones`.  With `update` set the search
    /// structures are rebuilt so the word is usable immediately.
    fn add_word(&mut self, word: &str, phones: &str, update: bool) -> Result<(), EngineError>;

    fn start_utt(&mut self) -> Result<(), EngineError>;

    fn end_utt(&mut self) -> Result<(), EngineError>;

    fn hypothesis(&self) -> Option<String>;

    /// Feed samples; returns the number of frames searched.
    fn process_raw(
        &mut self,
        samples: &[i16],
        no_search: bool,
        full_utt: bool,
    ) -> Result<usize, EngineError>;

    fn in_speech(&self) -> bool;
}

// ---------------------------------------------------------------------------
// DecoderEngine
// ---------------------------------------------------------------------------

/// Factory for [`Decoder`] instances.
pub trait DecoderEngine {
    /// Initialise a decoder from `config`.
    ///
    /// The configuration stays owned by the caller for the decoder's whole
    /// lifetime.
    fn init(&self, config: &DecoderConfig) -> Result<Box<dyn Decoder>, EngineError>;
}

// Compile-time assertion: both traits must be usable as trait objects.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Decoder>, _: Box<dyn DecoderEngine>) {}
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
