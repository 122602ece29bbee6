//! Audio capture collaborator.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → downmix_into → resample_linear → to_pcm16
//!           → SampleQueue ──read()──▶ UtteranceSegmenter
//! ```
//!
//! The session only sees the [`AudioBackend`] / [`AudioDevice`] traits;
//! [`CpalBackend`] is the production implementation.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use speech_recognizer::audio::{AudioBackend, CpalBackend};
//!
//! let backend = CpalBackend::new();
//! let mut device = backend.open("sysdefault", 16_000).unwrap();
//! device.start_recording().unwrap();
//!
//! let mut chunk = [0_i16; 2048];
//! let n = device.read(&mut chunk).unwrap();
//! println!("read {n} samples");
//! ```

pub mod buffer;
pub mod capture;
pub mod device;
pub mod resample;

pub use buffer::SampleQueue;
pub use capture::{CpalBackend, CpalDevice, DEFAULT_DEVICE_NAMES};
pub use device::{AudioBackend, AudioDevice, AudioDeviceError};
pub use resample::{downmix_into, resample_linear, to_pcm16};
