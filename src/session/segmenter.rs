//! Voice-activity driven utterance segmentation.
//!
//! The segmenter is polled once per audio chunk.  It reads from the capture
//! device, feeds the decoder and follows the decoder's voice-activity flag:
//!
//! ```text
//!            speech                      silence
//! Idle ───────────────▶ InUtterance ───────────────▶ Idle
//!  ▲ silence                 │ speech                 │
//!  └──────┘                  └──────┘                 ▼
//!                                         end_utt → hypothesis → start_utt
//! ```
//!
//! A single silent chunk ends an utterance; there is no debounce.

use crate::audio::AudioDevice;
use crate::decoder::Decoder;
use crate::error::{RecognizerError, Result};

/// Samples read from the device per chunk.
pub const DEFAULT_CHUNK_SAMPLES: usize = 2048;

// ---------------------------------------------------------------------------
// UtteranceState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UtteranceState {
    #[default]
    Idle,
    InUtterance,
}

/// Edge detected by [`UtteranceState::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    SpeechStarted,
    SpeechEnded,
}

impl UtteranceState {
    /// Pure transition on the voice-activity flag of one chunk.
    ///
    /// ```
    /// use speech_recognizer::session::{Transition, UtteranceState};
    ///
    /// let (s, t) = UtteranceState::Idle.next(true);
    /// assert_eq!((s, t), (UtteranceState::InUtterance, Transition::SpeechStarted));
    ///
    /// let (s, t) = s.next(false);
    /// assert_eq!((s, t), (UtteranceState::Idle, Transition::SpeechEnded));
    /// ```
    pub fn next(self, in_speech: bool) -> (Self, Transition) {
        match (self, in_speech) {
            (UtteranceState::Idle, true) => (UtteranceState::InUtterance, Transition::SpeechStarted),
            (UtteranceState::InUtterance, false) => (UtteranceState::Idle, Transition::SpeechEnded),
            (state, _) => (state, Transition::None),
        }
    }
}

// ---------------------------------------------------------------------------
// ChunkReport
// ---------------------------------------------------------------------------

/// Outcome of one [`UtteranceSegmenter::process_chunk`] call.
#[derive(Debug, Default)]
pub struct ChunkReport {
    /// Samples read from the device.
    pub samples: usize,
    pub transition: Option<Transition>,
    /// Non-empty hypothesis of an utterance that just ended.
    pub hypothesis: Option<String>,
    /// Recoverable failures; processing continues after each.
    pub faults: Vec<RecognizerError>,
}

// ---------------------------------------------------------------------------
// UtteranceSegmenter
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct UtteranceSegmenter {
    state: UtteranceState,
    chunk: Vec<i16>,
}

impl UtteranceSegmenter {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SAMPLES)
    }

    /// # Panics
    ///
    /// Panics if `samples` is zero.
    pub fn with_chunk_size(samples: usize) -> Self {
        assert!(samples > 0, "chunk size must be > 0");
        Self {
            state: UtteranceState::Idle,
            chunk: vec![0; samples],
        }
    }

    pub fn state(&self) -> UtteranceState {
        self.state
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk.len()
    }

    pub fn reset(&mut self) {
        self.state = UtteranceState::Idle;
    }

    /// Read, decode and segment one chunk.
    ///
    /// # Errors
    ///
    /// Only [`RecognizerError::AudioRead`]; every other failure is collected
    /// in [`ChunkReport::faults`].
    pub fn process_chunk(
        &mut self,
        device: &mut dyn AudioDevice,
        decoder: &mut dyn Decoder,
    ) -> Result<ChunkReport> {
        let samples = device
            .read(&mut self.chunk)
            .map_err(|e| RecognizerError::AudioRead(e.to_string()))?;

        let mut report = ChunkReport {
            samples,
            ..ChunkReport::default()
        };

        if let Err(e) = decoder.process_raw(&self.chunk[..samples], false, false) {
            report.faults.push(RecognizerError::Decode(e.to_string()));
            return Ok(report);
        }

        let (next, transition) = self.state.next(decoder.in_speech());
        self.state = next;
        report.transition = Some(transition);

        match transition {
            Transition::SpeechStarted => log::debug!("segmenter: speech started"),
            Transition::SpeechEnded => {
                log::debug!("segmenter: speech ended");
                match decoder.end_utt() {
                    Ok(()) => {
                        report.hypothesis = decoder.hypothesis().filter(|h| !h.is_empty());
                    }
                    Err(e) => report.faults.push(RecognizerError::UttEnd(e.to_string())),
                }
                if let Err(e) = decoder.start_utt() {
                    report.faults.push(RecognizerError::UttStart(e.to_string()));
                }
            }
            Transition::None => {}
        }

        Ok(report)
    }
}

impl Default for UtteranceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
