//! Error taxonomy for the recognizer session.
//!
//! Every variant is recoverable by the caller: the controller reports it on
//! the crash channel and returns it, and the host decides whether to retry.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while driving a recognition session.
#[derive(Debug, Error)]
pub enum RecognizerError {
    /// The model directory, or a file listed in its asset manifest, is missing.
    #[error("Acoustic model file not found: {}", .0.display())]
    MissingAsset(PathBuf),

    /// The argument file could not be read or contains invalid options.
    #[error("Failed to parse decoder arguments: {0}")]
    ConfigParse(String),

    /// The decoder refused to initialise from the assembled configuration.
    #[error("Failed to initialise decoder: {0}")]
    DecoderInit(String),

    /// The named capture device could not be opened.
    #[error("Audio device {name} not found: {reason}")]
    DeviceOpen { name: String, reason: String },

    #[error("Failed to start recording: {0}")]
    DeviceStart(String),

    #[error("Failed to stop recording: {0}")]
    DeviceStop(String),

    #[error("Failed to start utterance: {0}")]
    UttStart(String),

    #[error("Failed to end utterance: {0}")]
    UttEnd(String),

    /// The decoder rejected a grammar or keyphrase definition.
    #[error("Failed to register grammar {name}: {reason}")]
    GrammarRegistration { name: String, reason: String },

    /// The decoder rejected a search switch (typically an unregistered name).
    #[error("Unknown or invalid search: {name}")]
    UnknownOrInvalidSearch { name: String },

    #[error("Word already in dictionary: {word}")]
    DuplicateWord { word: String },

    #[error("Failed to add word {word} into dictionary: {reason}")]
    DictionaryInsert { word: String, reason: String },

    /// Reading from the capture device failed; listening should stop.
    #[error("Failed to read audio: {0}")]
    AudioRead(String),

    /// The decoder failed to consume a chunk of audio.
    #[error("Failed to process audio: {0}")]
    Decode(String),

    /// The operation is not valid in the current session state.
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecognizerError>;
