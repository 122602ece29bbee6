//! Session orchestration: setup → listen → stop → teardown.
//!
//! [`SessionController`] owns every piece of session state and is driven
//! from a single thread:
//!
//! ```text
//! setup(model)        release prior session, build config, init decoder
//! register_*/set_*    populate the grammar registry
//! start_listening()   default search, open device, start recording + utterance
//! process_one_chunk() (repeatedly) read → decode → segment → events
//! stop_listening()    stop recording; device and decoder stay allocated
//! shutdown()          release everything
//! ```
//!
//! Every failing operation both returns its error and reports it on the
//! crash channel.

use std::path::Path;

use crate::audio::AudioBackend;
use crate::config::{RecognizerSettings, VocabularySettings};
use crate::decoder::args::{INPUT_DEVICE, SAMPLE_RATE};
use crate::decoder::{DecoderConfig, DecoderEngine};
use crate::error::{RecognizerError, Result};

use super::builder::ConfigurationBuilder;
use super::events::{EventDispatcher, SessionListener};
use super::grammar::{GrammarRegistry, KEYPHRASE_SEARCH};
use super::resources::ResourceHandles;
use super::segmenter::{ChunkReport, UtteranceSegmenter, UtteranceState};

/// Capture device used when none is configured.
pub const DEFAULT_INPUT_DEVICE: &str = "sysdefault";

const DEFAULT_SAMPLE_RATE: u32 = 16_000;

fn not_set_up() -> RecognizerError {
    RecognizerError::InvalidState("session is not set up".into())
}

/// Device rate from `-samprate`, rounded to whole hertz.
fn device_sample_rate(config: &DecoderConfig) -> Result<u32> {
    match config.float_value(SAMPLE_RATE) {
        None => Ok(DEFAULT_SAMPLE_RATE),
        Some(rate) if rate.is_finite() && rate >= 1.0 && rate <= f64::from(u32::MAX) => {
            Ok(rate.round() as u32)
        }
        Some(rate) => Err(RecognizerError::ConfigParse(format!(
            "invalid {SAMPLE_RATE} value {rate}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

pub struct SessionController {
    engine: Box<dyn DecoderEngine>,
    backend: Box<dyn AudioBackend>,
    builder: ConfigurationBuilder,
    resources: ResourceHandles,
    grammars: GrammarRegistry,
    segmenter: UtteranceSegmenter,
    events: EventDispatcher,
    logging_enabled: bool,
    input_device_name: String,
    listening: bool,
}

impl SessionController {
    pub fn new(engine: Box<dyn DecoderEngine>, backend: Box<dyn AudioBackend>) -> Self {
        Self {
            engine,
            backend,
            builder: ConfigurationBuilder::default(),
            resources: ResourceHandles::new(),
            grammars: GrammarRegistry::new(),
            segmenter: UtteranceSegmenter::new(),
            events: EventDispatcher::new(),
            logging_enabled: true,
            input_device_name: DEFAULT_INPUT_DEVICE.to_string(),
            listening: false,
        }
    }

    /// Controller configured from persisted settings: input device, log file
    /// flag and chunk size.  The vocabulary is installed separately with
    /// [`Self::apply_vocabulary`] once the session is set up.
    ///
    /// # Panics
    ///
    /// Panics if `settings.audio.chunk_samples` is zero;
    /// [`RecognizerSettings::load_from`] rejects such files.
    pub fn from_settings(
        engine: Box<dyn DecoderEngine>,
        backend: Box<dyn AudioBackend>,
        settings: &RecognizerSettings,
    ) -> Self {
        let mut session =
            Self::new(engine, backend).with_chunk_samples(settings.audio.chunk_samples);
        session.set_input_device_name(settings.input_device.clone());
        session.set_logging_enabled(settings.log_to_file);
        session
    }

    pub fn with_builder(mut self, builder: ConfigurationBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// # Panics
    ///
    /// Panics if `samples` is zero.
    pub fn with_chunk_samples(mut self, samples: usize) -> Self {
        self.segmenter = UtteranceSegmenter::with_chunk_size(samples);
        self
    }

    pub fn add_listener(&mut self, listener: impl SessionListener + 'static) {
        self.events.add(Box::new(listener));
    }

    /// Takes effect on the next [`Self::setup`].
    pub fn set_logging_enabled(&mut self, enabled: bool) {
        self.logging_enabled = enabled;
    }

    /// Takes effect on the next [`Self::setup`].
    pub fn set_input_device_name(&mut self, name: impl Into<String>) {
        self.input_device_name = name.into();
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Release any prior session and initialise a decoder for `model_path`.
    ///
    /// On failure nothing stays allocated.
    pub fn setup(&mut self, model_path: &Path) -> Result<()> {
        self.listening = false;
        self.grammars.reset();
        self.segmenter.reset();
        let result = self.acquire_session(model_path);
        self.report(result)
    }

    fn acquire_session(&mut self, model_path: &Path) -> Result<()> {
        let mut guard = self.resources.acquire();

        let config =
            self.builder
                .build(model_path, &self.input_device_name, self.logging_enabled)?;
        let decoder = self
            .engine
            .init(&config)
            .map_err(|e| RecognizerError::DecoderInit(e.to_string()))?;

        guard.install_config(config)?;
        guard.install_decoder(decoder)?;
        guard.commit();

        log::debug!("session: decoder ready for {}", model_path.display());
        Ok(())
    }

    /// Activate the default search, open the capture device and start the
    /// first utterance.
    pub fn start_listening(&mut self) -> Result<()> {
        let result = self.begin_listening();
        self.report(result)
    }

    fn begin_listening(&mut self) -> Result<()> {
        if !self.resources.has_decoder() {
            return Err(not_set_up());
        }
        if self.listening {
            return Err(RecognizerError::InvalidState("already listening".into()));
        }

        self.events.log("Start listening");
        // A failed activation is already reported; the decoder may still
        // have a usable search from its own configuration.
        if self.activate_default_search().is_err() {
            log::warn!("session: listening without an explicitly activated search");
        }

        let (name, sample_rate) = {
            let config = self.resources.config().ok_or_else(not_set_up)?;
            let name = config
                .str_value(INPUT_DEVICE)
                .unwrap_or(self.input_device_name.as_str())
                .to_string();
            (name, device_sample_rate(config)?)
        };

        let device = self.backend.open(&name, sample_rate).map_err(|e| {
            RecognizerError::DeviceOpen {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
        self.resources.install_device(device);

        if let Err(e) = self.begin_capture() {
            self.resources.release_device();
            return Err(e);
        }

        self.segmenter.reset();
        self.listening = true;
        self.events.log("Ready...");
        Ok(())
    }

    fn begin_capture(&mut self) -> Result<()> {
        let (device, decoder) = self.resources.capture_parts().ok_or_else(not_set_up)?;
        device
            .start_recording()
            .map_err(|e| RecognizerError::DeviceStart(e.to_string()))?;
        decoder
            .start_utt()
            .map_err(|e| RecognizerError::UttStart(e.to_string()))
    }

    /// Process one chunk of captured audio.
    ///
    /// Returns `Ok(None)` when not listening.  Recognition results and
    /// per-chunk faults are dispatched as events; a read failure stops
    /// listening and is returned.
    pub fn process_one_chunk(&mut self) -> Result<Option<ChunkReport>> {
        if !self.listening {
            return Ok(None);
        }

        let Some((device, decoder)) = self.resources.capture_parts() else {
            self.listening = false;
            let e = RecognizerError::InvalidState("listening without a capture device".into());
            self.events.crash(&e.to_string());
            return Err(e);
        };

        match self.segmenter.process_chunk(device, decoder) {
            Ok(report) => {
                if let Some(text) = &report.hypothesis {
                    self.events.recognition_result(text);
                }
                for fault in &report.faults {
                    self.events.crash(&fault.to_string());
                }
                Ok(Some(report))
            }
            Err(e) => {
                self.events.crash(&e.to_string());
                self.halt_capture();
                Err(e)
            }
        }
    }

    fn halt_capture(&mut self) {
        self.listening = false;
        if let Some(device) = self.resources.device_mut() {
            if let Err(e) = device.stop_recording() {
                log::warn!("session: stop after read failure: {e}");
            }
        }
    }

    /// Stop recording.  The device and decoder stay allocated so listening
    /// can resume without another setup.
    pub fn stop_listening(&mut self) -> Result<()> {
        let Some(device) = self.resources.device_mut() else {
            self.listening = false;
            return Ok(());
        };
        let result = device
            .stop_recording()
            .map_err(|e| RecognizerError::DeviceStop(e.to_string()));
        self.listening = false;
        self.events.log("Stop listening");
        self.report(result)
    }

    /// Stop listening and release the device, decoder and configuration.
    pub fn shutdown(&mut self) {
        if self.listening {
            let _ = self.stop_listening();
        }
        self.listening = false;
        self.resources.release_all();
        self.grammars.reset();
        self.segmenter.reset();
        log::debug!("session: shut down");
    }

    // -----------------------------------------------------------------------
    // Grammar and dictionary
    // -----------------------------------------------------------------------

    pub fn register_file_grammar(&mut self, name: &str, path: &Path) -> Result<()> {
        let result = match self.resources.decoder_mut() {
            Some(decoder) => self.grammars.register_file_grammar(decoder, name, path),
            None => Err(not_set_up()),
        };
        self.report(result)
    }

    pub fn register_inline_grammar(&mut self, name: &str, text: &str) -> Result<()> {
        let result = match self.resources.decoder_mut() {
            Some(decoder) => self.grammars.register_inline_grammar(decoder, name, text),
            None => Err(not_set_up()),
        };
        self.report(result)
    }

    pub fn set_base_grammar(&mut self, name: &str) -> Result<()> {
        let result = self.grammars.set_base_grammar(name);
        self.report(result)
    }

    pub fn set_keyword(&mut self, phrase: &str) -> Result<()> {
        let result = match self.resources.decoder_mut() {
            Some(decoder) => self.grammars.set_keyword(decoder, phrase),
            None => Err(not_set_up()),
        };
        self.report(result)
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.grammars.set_threshold(threshold);
    }

    /// Keyword search if one is installed, otherwise the base grammar.
    pub fn activate_default_search(&mut self) -> Result<()> {
        let result = match self.resources.search_parts() {
            Some((config, decoder)) => self.grammars.activate_default_search(config, decoder),
            None => Err(not_set_up()),
        };
        match result {
            Ok(name) if name == KEYPHRASE_SEARCH => {
                self.events.log("Set search keyword");
                Ok(())
            }
            Ok(name) => {
                self.events.log(&format!("Set search:{name}"));
                Ok(())
            }
            Err(e) => self.report(Err(e)),
        }
    }

    pub fn switch_grammar(&mut self, name: &str) -> Result<()> {
        let result = match self.resources.decoder_mut() {
            Some(decoder) => self.grammars.switch_grammar(decoder, name),
            None => Err(not_set_up()),
        };
        if result.is_ok() {
            self.events.log(&format!("switch grammar:{name}"));
        }
        self.report(result)
    }

    pub fn insert_word(&mut self, word: &str, phones: &str) -> Result<()> {
        let result = match self.resources.decoder_mut() {
            Some(decoder) => self.grammars.insert_word(decoder, word, phones),
            None => Err(not_set_up()),
        };
        self.report(result)
    }

    /// Install the persisted vocabulary: grammars in order, then words, then
    /// the keyword and its threshold.  Stops at the first failure.
    pub fn apply_vocabulary(&mut self, vocabulary: &VocabularySettings) -> Result<()> {
        for grammar in &vocabulary.grammars {
            self.register_file_grammar(&grammar.name, &grammar.path)?;
        }
        for (word, phones) in &vocabulary.words {
            self.insert_word(word, phones)?;
        }
        if let Some(phrase) = &vocabulary.keyword {
            self.set_keyword(phrase)?;
        }
        if let Some(threshold) = vocabulary.threshold {
            self.set_threshold(threshold);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_set_up(&self) -> bool {
        self.resources.has_decoder()
    }

    pub fn utterance_state(&self) -> UtteranceState {
        self.segmenter.state()
    }

    pub fn base_grammar(&self) -> Option<&str> {
        self.grammars.base_grammar()
    }

    pub fn active_search(&self) -> Option<&str> {
        self.grammars.active_search()
    }

    pub fn config(&self) -> Option<&DecoderConfig> {
        self.resources.config()
    }

    pub fn resources(&self) -> &ResourceHandles {
        &self.resources
    }

    fn report<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.events.crash(&e.to_string());
        }
        result
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("resources", &self.resources)
            .field("grammars", &self.grammars)
            .field("segmenter", &self.segmenter)
            .field("events", &self.events)
            .field("logging_enabled", &self.logging_enabled)
            .field("input_device_name", &self.input_device_name)
            .field("listening", &self.listening)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::mpsc::{self, Receiver};

    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::audio::AudioDeviceError;
    use crate::config::GrammarFile;
    use crate::decoder::args::{KWS_THRESHOLD, LOG_FILE};
    use crate::session::builder::ASSET_MANIFEST;
    use crate::session::SessionEvent;
    use crate::testing::{touch_files, DecoderProbe, DeviceProbe, ScriptedBackend, ScriptedEngine};

    struct Harness {
        dec: DecoderProbe,
        dev: DeviceProbe,
        events: Receiver<SessionEvent>,
        model: TempDir,
        session: SessionController,
    }

    impl Harness {
        fn new() -> Self {
            let dec = DecoderProbe::default();
            let dev = DeviceProbe::default();
            let (tx, events) = mpsc::channel();
            let mut session = SessionController::new(
                Box::new(ScriptedEngine::new(dec.clone())),
                Box::new(ScriptedBackend::new(dev.clone())),
            )
            .with_chunk_samples(256);
            session.add_listener(tx);
            Self {
                dec,
                dev,
                events,
                model: tempdir().expect("temp dir"),
                session,
            }
        }

        fn ready() -> Self {
            let mut h = Self::new();
            let model = h.model.path().to_path_buf();
            h.session.setup(&model).expect("setup");
            h
        }

        fn drain(&self) -> Vec<SessionEvent> {
            self.events.try_iter().collect()
        }

        fn crashes(&self) -> Vec<String> {
            self.drain()
                .into_iter()
                .filter_map(|e| match e {
                    SessionEvent::Crash(m) => Some(m),
                    _ => None,
                })
                .collect()
        }
    }

    // ---- construction ------------------------------------------------------

    #[test]
    fn from_settings_applies_device_logging_and_chunk_size() {
        let dec = DecoderProbe::default();
        let dev = DeviceProbe::default();
        let mut settings = RecognizerSettings::default();
        settings.input_device = "hw:1,0".into();
        settings.log_to_file = false;
        settings.audio.chunk_samples = 512;

        let mut session = SessionController::from_settings(
            Box::new(ScriptedEngine::new(dec.clone())),
            Box::new(ScriptedBackend::new(dev.clone())),
            &settings,
        );
        assert_eq!(session.segmenter.chunk_size(), 512);

        let model = tempdir().expect("temp dir");
        session.setup(model.path()).expect("setup");
        let config = session.config().expect("config");
        assert_eq!(config.str_value(INPUT_DEVICE), Some("hw:1,0"));
        assert_eq!(config.str_value(LOG_FILE), None);

        session.start_listening().expect("start");
        assert_eq!(dev.log().opened_with, vec![("hw:1,0".to_string(), 16_000)]);
    }

    // ---- setup -------------------------------------------------------------

    #[test]
    fn setup_builds_config_and_decoder() {
        let h = Harness::ready();
        assert!(h.session.is_set_up());
        assert_eq!(h.dec.inits(), 1);

        let config = h.session.config().expect("config");
        assert_eq!(config.str_value(INPUT_DEVICE), Some(DEFAULT_INPUT_DEVICE));
        assert!(config.str_value(LOG_FILE).is_some());
    }

    #[test]
    fn logging_flag_controls_log_file() {
        let mut h = Harness::new();
        h.session.set_logging_enabled(false);
        let model = h.model.path().to_path_buf();
        h.session.setup(&model).expect("setup");
        assert_eq!(h.session.config().and_then(|c| c.str_value(LOG_FILE)), None);
    }

    #[test]
    fn repeated_setup_frees_previous_decoder() {
        let mut h = Harness::ready();
        let model = h.model.path().to_path_buf();
        h.session.setup(&model).expect("second setup");
        assert_eq!(h.dec.inits(), 2);
        assert_eq!(h.dec.frees(), 1);
    }

    #[test]
    fn missing_asset_releases_everything() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("grammar");

        std::fs::write(h.model.path().join(ASSET_MANIFEST), "mdef\n").expect("manifest");
        let model = h.model.path().to_path_buf();
        let err = h.session.setup(&model).unwrap_err();

        assert!(matches!(err, RecognizerError::MissingAsset(_)));
        assert!(h.session.resources().is_empty());
        assert_eq!(h.dec.frees(), 1);
        assert_eq!(h.session.base_grammar(), None);
        assert_eq!(h.crashes().len(), 1);
    }

    #[test]
    fn decoder_init_failure_releases_config() {
        let mut h = Harness::new();
        h.dec.log().fail_init = true;
        let model = h.model.path().to_path_buf();

        let err = h.session.setup(&model).unwrap_err();
        assert!(matches!(err, RecognizerError::DecoderInit(_)));
        assert!(h.session.resources().is_empty());
    }

    #[test]
    fn operations_before_setup_are_invalid_state() {
        let mut h = Harness::new();
        assert!(matches!(
            h.session.register_inline_grammar("A", "a"),
            Err(RecognizerError::InvalidState(_))
        ));
        assert!(matches!(
            h.session.insert_word("hi", "HH AY"),
            Err(RecognizerError::InvalidState(_))
        ));
        assert!(matches!(
            h.session.start_listening(),
            Err(RecognizerError::InvalidState(_))
        ));
        assert_eq!(h.crashes().len(), 3);
        assert_eq!(h.dev.opens(), 0);
    }

    // ---- start_listening ---------------------------------------------------

    #[test]
    fn start_listening_activates_search_before_utterance() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.register_inline_grammar("B", "b").expect("B");
        h.drain();

        h.session.start_listening().expect("start");

        assert!(h.session.is_listening());
        assert_eq!(h.session.active_search(), Some("A"));
        assert_eq!(h.dev.log().opened_with, vec![("sysdefault".to_string(), 16_000)]);
        assert!(h.dev.log().recording);
        assert_eq!(h.dec.log().utt_starts, 1);
        assert_eq!(
            h.drain(),
            vec![
                SessionEvent::Log("Start listening".into()),
                SessionEvent::Log("Set search:A".into()),
                SessionEvent::Log("Ready...".into()),
            ]
        );
    }

    #[test]
    fn keyword_search_wins_and_threshold_is_applied() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.set_keyword("hey computer").expect("keyword");
        h.session.set_threshold(1e-20);

        h.session.start_listening().expect("start");

        assert_eq!(h.dec.active_search().as_deref(), Some(KEYPHRASE_SEARCH));
        assert_eq!(
            h.session.config().and_then(|c| c.float_value(KWS_THRESHOLD)),
            Some(1e-20)
        );
        assert!(h
            .drain()
            .contains(&SessionEvent::Log("Set search keyword".into())));
    }

    #[test]
    fn keyword_threshold_reaches_decoder() {
        let mut h = Harness::ready();
        h.session.set_keyword("hello").expect("keyword");
        h.session.set_threshold(1e-5);

        h.session.start_listening().expect("start");

        let log = h.dec.log();
        assert_eq!(log.kws_threshold, Some(1e-5));
        assert_eq!(log.kws_threshold_at, Some(None));
        assert_eq!(log.active_search.as_deref(), Some(KEYPHRASE_SEARCH));
    }

    #[test]
    fn invalid_sample_rate_is_rejected_before_open() {
        for bad in [-8000.0, 0.0, f64::NAN, f64::INFINITY] {
            let mut h = Harness::ready();
            h.session.register_inline_grammar("A", "a").expect("A");
            h.session
                .resources
                .config_mut()
                .expect("config")
                .set_float(SAMPLE_RATE, bad)
                .expect("set samprate");
            h.drain();

            let err = h.session.start_listening().unwrap_err();
            assert!(matches!(err, RecognizerError::ConfigParse(_)), "{bad}: {err:?}");
            assert!(!h.session.is_listening());
            assert_eq!(h.dev.opens(), 0);
            assert_eq!(h.crashes().len(), 1);
        }
    }

    #[test]
    fn fractional_sample_rate_is_rounded() {
        let mut h = Harness::ready();
        h.session
            .resources
            .config_mut()
            .expect("config")
            .set_float(SAMPLE_RATE, 8000.6)
            .expect("set samprate");

        h.session.start_listening().expect("start");
        assert_eq!(h.dev.log().opened_with, vec![("sysdefault".to_string(), 8001)]);
    }

    #[test]
    fn listening_proceeds_without_default_search() {
        let mut h = Harness::ready();
        h.session.start_listening().expect("start");

        assert!(h.session.is_listening());
        assert!(h.dec.log().search_calls.is_empty());
        assert_eq!(h.crashes().len(), 1);
    }

    #[test]
    fn configured_input_device_is_opened() {
        let mut h = Harness::new();
        h.session.set_input_device_name("hw:2,0");
        let model = h.model.path().to_path_buf();
        h.session.setup(&model).expect("setup");
        h.session.register_inline_grammar("A", "a").expect("A");

        h.session.start_listening().expect("start");
        assert_eq!(h.dev.log().opened_with[0].0, "hw:2,0");
    }

    #[test]
    fn device_open_failure_is_reported() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.dev.log().fail_open = true;

        let err = h.session.start_listening().unwrap_err();
        assert!(matches!(err, RecognizerError::DeviceOpen { ref name, .. } if name == "sysdefault"));
        assert!(!h.session.is_listening());
        assert!(!h.session.resources().has_device());
    }

    #[test]
    fn start_recording_failure_closes_device() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.dev.log().fail_start = true;

        let err = h.session.start_listening().unwrap_err();
        assert!(matches!(err, RecognizerError::DeviceStart(_)));
        assert_eq!(h.dev.closes(), 1);
        assert!(!h.session.resources().has_device());
        assert!(h.session.is_set_up());
    }

    #[test]
    fn start_utterance_failure_closes_device() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.dec.log().fail_start_utt = true;

        let err = h.session.start_listening().unwrap_err();
        assert!(matches!(err, RecognizerError::UttStart(_)));
        assert_eq!(h.dev.closes(), 1);
        assert!(!h.session.is_listening());
    }

    #[test]
    fn second_start_is_rejected() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.start_listening().expect("start");
        assert!(matches!(
            h.session.start_listening(),
            Err(RecognizerError::InvalidState(_))
        ));
        assert_eq!(h.dev.opens(), 1);
    }

    // ---- process_one_chunk -------------------------------------------------

    #[test]
    fn speech_sequence_yields_two_results() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.start_listening().expect("start");
        h.drain();

        h.dec
            .script_speech(&[false, false, true, true, false, true, false]);
        h.dec.script_hyps(&[Some("turn left"), Some("turn right")]);
        for _ in 0..7 {
            h.session.process_one_chunk().expect("chunk");
        }

        let results: Vec<_> = h
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::RecognitionResult(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(results, vec!["turn left", "turn right"]);
        assert_eq!(h.session.utterance_state(), UtteranceState::Idle);
    }

    #[test]
    fn ongoing_speech_yields_nothing() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.start_listening().expect("start");
        h.drain();

        h.dec.script_speech(&[true, true, true]);
        for _ in 0..3 {
            h.session.process_one_chunk().expect("chunk");
        }
        assert!(h.drain().is_empty());
        assert_eq!(h.session.utterance_state(), UtteranceState::InUtterance);
    }

    #[test]
    fn chunk_is_noop_when_not_listening() {
        let mut h = Harness::ready();
        assert!(h.session.process_one_chunk().expect("noop").is_none());
        assert_eq!(h.dec.log().process_calls, 0);
    }

    #[test]
    fn read_failure_stops_listening() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.start_listening().expect("start");
        h.drain();
        h.dev
            .log()
            .reads
            .push_back(Err(AudioDeviceError::Stream("unplugged".into())));

        let err = h.session.process_one_chunk().unwrap_err();
        assert!(matches!(err, RecognizerError::AudioRead(_)));
        assert!(!h.session.is_listening());
        assert!(!h.dev.log().recording);
        assert_eq!(h.crashes(), vec!["Failed to read audio: audio stream error: unplugged"]);
        assert!(h.session.process_one_chunk().expect("stopped").is_none());
    }

    #[test]
    fn chunk_faults_are_dispatched_as_crashes() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.start_listening().expect("start");
        h.drain();
        h.dec.log().fail_process = true;

        let report = h.session.process_one_chunk().expect("chunk").expect("listening");
        assert_eq!(report.faults.len(), 1);
        assert_eq!(h.crashes().len(), 1);
        assert!(h.session.is_listening());
    }

    // ---- stop / shutdown ---------------------------------------------------

    #[test]
    fn stop_keeps_resources_allocated() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.start_listening().expect("start");
        h.drain();

        h.session.stop_listening().expect("stop");

        assert!(!h.session.is_listening());
        assert!(h.session.resources().has_device());
        assert!(h.session.is_set_up());
        assert!(!h.dev.log().recording);
        assert_eq!(h.drain(), vec![SessionEvent::Log("Stop listening".into())]);
    }

    #[test]
    fn stop_failure_is_reported() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.start_listening().expect("start");
        h.dev.log().fail_stop = true;

        assert!(matches!(
            h.session.stop_listening(),
            Err(RecognizerError::DeviceStop(_))
        ));
        assert!(!h.session.is_listening());
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.start_listening().expect("start");

        h.session.shutdown();
        h.session.shutdown();

        assert!(h.session.resources().is_empty());
        assert_eq!(h.dec.frees(), 1);
        assert_eq!(h.dev.closes(), 1);
    }

    #[test]
    fn drop_releases_everything() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.start_listening().expect("start");
        let (dec, dev) = (h.dec.clone(), h.dev.clone());

        drop(h);
        assert_eq!(dec.frees(), 1);
        assert_eq!(dev.closes(), 1);
    }

    // ---- Grammar and dictionary -------------------------------------------

    #[test]
    fn unknown_switch_is_reported_and_keeps_active_search() {
        let mut h = Harness::ready();
        h.session.register_inline_grammar("A", "a").expect("A");
        h.session.switch_grammar("A").expect("switch");
        h.drain();

        let err = h.session.switch_grammar("missing").unwrap_err();
        assert!(matches!(err, RecognizerError::UnknownOrInvalidSearch { .. }));
        assert_eq!(h.session.active_search(), Some("A"));
        assert_eq!(h.crashes(), vec!["Unknown or invalid search: missing"]);
    }

    #[test]
    fn duplicate_word_is_reported() {
        let mut h = Harness::ready();
        h.session.insert_word("robot", "R OW B AA T").expect("insert");
        h.drain();

        assert!(matches!(
            h.session.insert_word("robot", "R OW B AH T"),
            Err(RecognizerError::DuplicateWord { .. })
        ));
        assert_eq!(h.crashes(), vec!["Word already in dictionary: robot"]);
    }

    #[test]
    fn apply_vocabulary_installs_everything() {
        let mut h = Harness::ready();
        touch_files(h.model.path(), &["commands.gram", "numbers.gram"]);
        let vocabulary = VocabularySettings {
            grammars: vec![
                GrammarFile {
                    name: "commands".into(),
                    path: h.model.path().join("commands.gram"),
                },
                GrammarFile {
                    name: "numbers".into(),
                    path: h.model.path().join("numbers.gram"),
                },
            ],
            words: BTreeMap::from([("robot".to_string(), "R OW B AA T".to_string())]),
            keyword: Some("hello robot".into()),
            threshold: Some(1e-15),
        };

        h.session.apply_vocabulary(&vocabulary).expect("apply");
        h.session.start_listening().expect("start");

        assert_eq!(h.session.base_grammar(), Some("commands"));
        assert_eq!(h.session.active_search(), Some(KEYPHRASE_SEARCH));
        assert!(h.dec.log().dictionary.contains_key("robot"));
        assert_eq!(
            h.session.config().and_then(|c| c.float_value(KWS_THRESHOLD)),
            Some(1e-15)
        );
    }
}
