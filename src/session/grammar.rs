//! Grammar and keyword search bookkeeping.
//!
//! The decoder owns the compiled searches; [`GrammarRegistry`] remembers what
//! was registered so the session can pick a default search when listening
//! starts:
//!
//! ```text
//! keyword mode on  ──▶ -kws_threshold ← threshold, then keyphrase_search
//! keyword mode off ──▶ base grammar (first grammar registered)
//! neither          ──▶ InvalidState
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::decoder::args::KWS_THRESHOLD;
use crate::decoder::{Decoder, DecoderConfig};
use crate::error::{RecognizerError, Result};

/// Reserved search name for keyword spotting.
pub const KEYPHRASE_SEARCH: &str = "keyphrase_search";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a registered grammar came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarSource {
    File(PathBuf),
    Inline(String),
}

/// Keyword spotting settings.  `None` means "unset".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordConfig {
    pub phrase: Option<String>,
    pub threshold: Option<f64>,
}

impl KeywordConfig {
    /// Keyword mode is on once a keyphrase has been installed.
    pub fn is_active(&self) -> bool {
        self.phrase.is_some()
    }
}

// ---------------------------------------------------------------------------
// GrammarRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct GrammarRegistry {
    grammars: BTreeMap<String, GrammarSource>,
    base_grammar: Option<String>,
    keyword: KeywordConfig,
    active_search: Option<String>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every grammar, the keyword search and the active search.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register a JSGF grammar file under `name`.
    pub fn register_file_grammar(
        &mut self,
        decoder: &mut dyn Decoder,
        name: &str,
        path: &Path,
    ) -> Result<()> {
        decoder
            .set_jsgf_file(name, path)
            .map_err(|e| RecognizerError::GrammarRegistration {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        self.record(name, GrammarSource::File(path.to_path_buf()));
        Ok(())
    }

    /// Register JSGF grammar text under `name`.
    pub fn register_inline_grammar(
        &mut self,
        decoder: &mut dyn Decoder,
        name: &str,
        text: &str,
    ) -> Result<()> {
        decoder
            .set_jsgf_string(name, text)
            .map_err(|e| RecognizerError::GrammarRegistration {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        self.record(name, GrammarSource::Inline(text.to_string()));
        Ok(())
    }

    fn record(&mut self, name: &str, source: GrammarSource) {
        log::debug!("grammar: registered {name}");
        self.grammars.insert(name.to_string(), source);
        if self.base_grammar.is_none() {
            self.base_grammar = Some(name.to_string());
        }
    }

    /// Make `name` the grammar used when keyword mode is off.
    ///
    /// # Errors
    ///
    /// [`RecognizerError::UnknownOrInvalidSearch`] if `name` was never
    /// registered.
    pub fn set_base_grammar(&mut self, name: &str) -> Result<()> {
        if !self.grammars.contains_key(name) {
            return Err(RecognizerError::UnknownOrInvalidSearch {
                name: name.to_string(),
            });
        }
        self.base_grammar = Some(name.to_string());
        Ok(())
    }

    /// Install (or overwrite) the keyword search.  Does not activate it.
    pub fn set_keyword(&mut self, decoder: &mut dyn Decoder, phrase: &str) -> Result<()> {
        decoder
            .set_keyphrase(KEYPHRASE_SEARCH, phrase)
            .map_err(|e| RecognizerError::GrammarRegistration {
                name: KEYPHRASE_SEARCH.to_string(),
                reason: e.to_string(),
            })?;
        self.keyword.phrase = Some(phrase.to_string());
        Ok(())
    }

    /// Takes effect on the next [`Self::activate_default_search`].
    pub fn set_threshold(&mut self, threshold: f64) {
        self.keyword.threshold = Some(threshold);
    }

    // -----------------------------------------------------------------------
    // Search selection
    // -----------------------------------------------------------------------

    /// Activate the keyword search if keyword mode is on, otherwise the base
    /// grammar.  Returns the name of the search made active.
    pub fn activate_default_search(
        &mut self,
        config: &mut DecoderConfig,
        decoder: &mut dyn Decoder,
    ) -> Result<String> {
        let name = if self.keyword.is_active() {
            if let Some(threshold) = self.keyword.threshold {
                config.set_float(KWS_THRESHOLD, threshold)?;
                decoder.set_kws_threshold(threshold).map_err(|e| {
                    RecognizerError::GrammarRegistration {
                        name: KEYPHRASE_SEARCH.to_string(),
                        reason: e.to_string(),
                    }
                })?;
            }
            KEYPHRASE_SEARCH.to_string()
        } else {
            self.base_grammar.clone().ok_or_else(|| {
                RecognizerError::InvalidState("no base grammar or keyword registered".into())
            })?
        };
        self.switch_grammar(decoder, &name)?;
        Ok(name)
    }

    /// Switch the decoder to `name` immediately.
    ///
    /// On rejection the previously active search stays recorded.
    pub fn switch_grammar(&mut self, decoder: &mut dyn Decoder, name: &str) -> Result<()> {
        decoder
            .set_search(name)
            .map_err(|_| RecognizerError::UnknownOrInvalidSearch {
                name: name.to_string(),
            })?;
        self.active_search = Some(name.to_string());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dictionary
    // -----------------------------------------------------------------------

    /// Add `word` with pronunciation `phones` unless it is already known.
    pub fn insert_word(&mut self, decoder: &mut dyn Decoder, word: &str, phones: &str) -> Result<()> {
        if decoder.lookup_word(word).is_some() {
            return Err(RecognizerError::DuplicateWord {
                word: word.to_string(),
            });
        }
        decoder
            .add_word(word, phones, true)
            .map_err(|e| RecognizerError::DictionaryInsert {
                word: word.to_string(),
                reason: e.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn base_grammar(&self) -> Option<&str> {
        self.base_grammar.as_deref()
    }

    pub fn active_search(&self) -> Option<&str> {
        self.active_search.as_deref()
    }

    pub fn keyword(&self) -> &KeywordConfig {
        &self.keyword
    }

    pub fn grammars(&self) -> &BTreeMap<String, GrammarSource> {
        &self.grammars
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
