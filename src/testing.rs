//! Scripted decoder and capture doubles shared by the unit tests.
//!
//! Each double reports into a probe (`Arc<Mutex<…>>`) that the test keeps a
//! clone of, so calls can be inspected after the double has been boxed and
//! handed to the session.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::audio::{AudioBackend, AudioDevice, AudioDeviceError};
use crate::decoder::{Decoder, DecoderConfig, DecoderEngine, EngineError};

// ---------------------------------------------------------------------------
// Decoder double
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DecoderLog {
    pub inits: usize,
    pub frees: usize,
    pub fail_init: bool,
    pub last_config: Option<DecoderConfig>,

    pub searches: BTreeSet<String>,
    pub active_search: Option<String>,
    pub search_calls: Vec<String>,
    pub reject_grammars: BTreeSet<String>,
    pub keyphrases: BTreeMap<String, String>,
    pub reject_keyphrase: bool,
    /// Threshold handed over with `set_kws_threshold`, and the active search
    /// at the moment it arrived.
    pub kws_threshold: Option<f64>,
    pub kws_threshold_at: Option<Option<String>>,

    pub dictionary: BTreeMap<String, String>,
    pub reject_words: BTreeSet<String>,

    pub utt_starts: usize,
    pub utt_ends: usize,
    pub fail_start_utt: bool,
    pub fail_end_utt: bool,
    pub fail_process: bool,

    /// Voice-activity flag reported after each `process_raw` call; the last
    /// value sticks once the script runs out.
    pub speech: VecDeque<bool>,
    pub current_speech: bool,
    /// Hypothesis produced by each `end_utt` call.
    pub hyps: VecDeque<Option<String>>,
    pub current_hyp: Option<String>,
    pub process_calls: usize,
    pub processed_samples: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DecoderProbe(Arc<Mutex<DecoderLog>>);

impl DecoderProbe {
    pub fn log(&self) -> MutexGuard<'_, DecoderLog> {
        self.0.lock().unwrap()
    }

    pub fn inits(&self) -> usize {
        self.log().inits
    }

    pub fn frees(&self) -> usize {
        self.log().frees
    }

    pub fn active_search(&self) -> Option<String> {
        self.log().active_search.clone()
    }

    pub fn script_speech(&self, flags: &[bool]) {
        self.log().speech.extend(flags.iter().copied());
    }

    pub fn script_hyps(&self, hyps: &[Option<&str>]) {
        self.log()
            .hyps
            .extend(hyps.iter().map(|h| h.map(str::to_string)));
    }
}

pub struct ScriptedEngine {
    probe: DecoderProbe,
}

impl ScriptedEngine {
    pub fn new(probe: DecoderProbe) -> Self {
        Self { probe }
    }
}

impl DecoderEngine for ScriptedEngine {
    fn init(&self, config: &DecoderConfig) -> Result<Box<dyn Decoder>, EngineError> {
        let mut log = self.probe.log();
        log.last_config = Some(config.clone());
        if log.fail_init {
            return Err(EngineError::new("acoustic model rejected"));
        }
        log.inits += 1;
        Ok(Box::new(ScriptedDecoder {
            probe: self.probe.clone(),
        }))
    }
}

pub struct ScriptedDecoder {
    probe: DecoderProbe,
}

impl ScriptedDecoder {
    fn register(&mut self, name: &str) -> Result<(), EngineError> {
        let mut log = self.probe.log();
        if log.reject_grammars.contains(name) {
            return Err(EngineError::new(format!("grammar {name} does not compile")));
        }
        log.searches.insert(name.to_string());
        Ok(())
    }
}

impl Decoder for ScriptedDecoder {
    fn set_search(&mut self, name: &str) -> Result<(), EngineError> {
        let mut log = self.probe.log();
        log.search_calls.push(name.to_string());
        if !log.searches.contains(name) {
            return Err(EngineError::new(format!("no search {name:?}")));
        }
        log.active_search = Some(name.to_string());
        Ok(())
    }

    fn set_jsgf_file(&mut self, name: &str, _path: &Path) -> Result<(), EngineError> {
        self.register(name)
    }

    fn set_jsgf_string(&mut self, name: &str, _grammar: &str) -> Result<(), EngineError> {
        self.register(name)
    }

    fn set_keyphrase(&mut self, name: &str, phrase: &str) -> Result<(), EngineError> {
        let mut log = self.probe.log();
        if log.reject_keyphrase {
            return Err(EngineError::new("keyphrase contains unknown words"));
        }
        log.searches.insert(name.to_string());
        log.keyphrases.insert(name.to_string(), phrase.to_string());
        Ok(())
    }

    fn set_kws_threshold(&mut self, threshold: f64) -> Result<(), EngineError> {
        let mut log = self.probe.log();
        log.kws_threshold_at = Some(log.active_search.clone());
        log.kws_threshold = Some(threshold);
        Ok(())
    }

    fn lookup_word(&self, word: &str) -> Option<String> {
        self.probe.log().dictionary.get(word).cloned()
    }

    fn add_word(&mut self, word: &str, phones: &str, _update: bool) -> Result<(), EngineError> {
        let mut log = self.probe.log();
        if log.reject_words.contains(word) {
            return Err(EngineError::new(format!("bad phones {phones:?}")));
        }
        log.dictionary.insert(word.to_string(), phones.to_string());
        Ok(())
    }

    fn start_utt(&mut self) -> Result<(), EngineError> {
        let mut log = self.probe.log();
        if log.fail_start_utt {
            return Err(EngineError::new("utterance already started"));
        }
        log.utt_starts += 1;
        log.current_hyp = None;
        Ok(())
    }

    fn end_utt(&mut self) -> Result<(), EngineError> {
        let mut log = self.probe.log();
        log.utt_ends += 1;
        if log.fail_end_utt {
            return Err(EngineError::new("utterance not started"));
        }
        log.current_hyp = log.hyps.pop_front().flatten();
        Ok(())
    }

    fn hypothesis(&self) -> Option<String> {
        self.probe.log().current_hyp.clone()
    }

    fn process_raw(
        &mut self,
        samples: &[i16],
        _no_search: bool,
        _full_utt: bool,
    ) -> Result<usize, EngineError> {
        let mut log = self.probe.log();
        log.process_calls += 1;
        if log.fail_process {
            return Err(EngineError::new("feature extraction failed"));
        }
        log.processed_samples += samples.len();
        if let Some(flag) = log.speech.pop_front() {
            log.current_speech = flag;
        }
        Ok(samples.len() / 160)
    }

    fn in_speech(&self) -> bool {
        self.probe.log().current_speech
    }
}

impl Drop for ScriptedDecoder {
    fn drop(&mut self) {
        if let Ok(mut log) = self.probe.0.lock() {
            log.frees += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Capture double
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DeviceLog {
    pub opened_with: Vec<(String, u32)>,
    pub closes: usize,
    pub fail_open: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub starts: usize,
    pub stops: usize,
    pub recording: bool,
    /// Result of each `read`; an exhausted script fills the whole buffer.
    pub reads: VecDeque<Result<usize, AudioDeviceError>>,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceProbe(Arc<Mutex<DeviceLog>>);

impl DeviceProbe {
    pub fn log(&self) -> MutexGuard<'_, DeviceLog> {
        self.0.lock().unwrap()
    }

    pub fn opens(&self) -> usize {
        self.log().opened_with.len()
    }

    pub fn closes(&self) -> usize {
        self.log().closes
    }
}

pub struct ScriptedBackend {
    probe: DeviceProbe,
}

impl ScriptedBackend {
    pub fn new(probe: DeviceProbe) -> Self {
        Self { probe }
    }
}

impl AudioBackend for ScriptedBackend {
    fn open(&self, name: &str, sample_rate: u32) -> Result<Box<dyn AudioDevice>, AudioDeviceError> {
        let mut log = self.probe.log();
        if log.fail_open {
            return Err(AudioDeviceError::NotFound(name.to_string()));
        }
        log.opened_with.push((name.to_string(), sample_rate));
        Ok(Box::new(ScriptedDevice {
            probe: self.probe.clone(),
        }))
    }
}

pub struct ScriptedDevice {
    probe: DeviceProbe,
}

impl AudioDevice for ScriptedDevice {
    fn start_recording(&mut self) -> Result<(), AudioDeviceError> {
        let mut log = self.probe.log();
        if log.fail_start {
            return Err(AudioDeviceError::Stream("device busy".into()));
        }
        log.starts += 1;
        log.recording = true;
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), AudioDeviceError> {
        let mut log = self.probe.log();
        if log.fail_stop {
            return Err(AudioDeviceError::Stream("device gone".into()));
        }
        log.stops += 1;
        log.recording = false;
        Ok(())
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, AudioDeviceError> {
        let scripted = self.probe.log().reads.pop_front();
        let n = match scripted {
            Some(result) => result?.min(buf.len()),
            None => buf.len(),
        };
        buf[..n].fill(100);
        Ok(n)
    }
}

impl Drop for ScriptedDevice {
    fn drop(&mut self) {
        if let Ok(mut log) = self.probe.0.lock() {
            log.closes += 1;
            log.recording = false;
        }
    }
}

// ---------------------------------------------------------------------------
// Model directories
// ---------------------------------------------------------------------------

/// Create `files` (relative paths) under `dir`, with parent directories.
pub fn touch_files(dir: &Path, files: &[&str]) {
    for file in files {
        let path = dir.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"").unwrap();
    }
}
