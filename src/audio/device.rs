//! Capture device interface.
//!
//! [`AudioBackend::open`] returns a boxed [`AudioDevice`] that delivers 16-bit
//! mono PCM at the requested sample rate.  Dropping the box closes the
//! device.

use thiserror::Error;

/// Errors reported by a capture backend or device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioDeviceError {
    #[error("no input device named {0:?}")]
    NotFound(String),

    #[error("audio backend error: {0}")]
    Backend(String),

    #[error("audio stream error: {0}")]
    Stream(String),
}

/// An open capture device.
pub trait AudioDevice {
    fn start_recording(&mut self) -> Result<(), AudioDeviceError>;

    fn stop_recording(&mut self) -> Result<(), AudioDeviceError>;

    /// Copy up to `buf.len()` buffered samples into `buf` and return how many
    /// were written.  Zero means nothing is buffered yet.
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, AudioDeviceError>;
}

/// Opens capture devices by name.
pub trait AudioBackend {
    fn open(&self, name: &str, sample_rate: u32) -> Result<Box<dyn AudioDevice>, AudioDeviceError>;
}
