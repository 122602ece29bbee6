//! Continuous speech-recognition session control.
//!
//! Drives an external acoustic decoder from live microphone audio:
//! configuration assembly and model validation, grammar and keyword search
//! management, voice-activity driven utterance segmentation, and the
//! lifecycle of the decoder, configuration and capture device handles.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::mpsc;
//!
//! use speech_recognizer::audio::CpalBackend;
//! use speech_recognizer::config::RecognizerSettings;
//! use speech_recognizer::decoder::DecoderEngine;
//! use speech_recognizer::session::{SessionController, SessionEvent};
//!
//! # fn engine() -> Box<dyn DecoderEngine> { unimplemented!() }
//! let settings = RecognizerSettings::load().unwrap();
//! let mut session =
//!     SessionController::from_settings(engine(), Box::new(CpalBackend::new()), &settings);
//! let (tx, rx) = mpsc::channel();
//! session.add_listener(tx);
//!
//! session.setup(&settings.model_dir).unwrap();
//! session.apply_vocabulary(&settings.vocabulary).unwrap();
//! session.register_file_grammar("commands", Path::new("/models/commands.gram")).unwrap();
//! session.start_listening().unwrap();
//!
//! loop {
//!     session.process_one_chunk().unwrap();
//!     for event in rx.try_iter() {
//!         if let SessionEvent::RecognitionResult(text) = event {
//!             println!("{text}");
//!         }
//!     }
//! }
//! ```

pub mod audio;
pub mod config;
pub mod decoder;
pub mod error;
pub mod session;

#[cfg(test)]
mod testing;

pub use error::{RecognizerError, Result};
