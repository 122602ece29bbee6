//! Microphone capture via `cpal`.
//!
//! [`CpalBackend`] implements [`AudioBackend`] on top of the default cpal
//! host.  Each opened [`CpalDevice`] owns one input stream whose callback
//! converts the native buffer to mono PCM16 at the requested rate and pushes
//! it into a [`SampleQueue`].  [`AudioDevice::read`] drains that queue
//! without blocking.
//!
//! The callback runs on cpal's audio thread; the queue and the fault slot are
//! the only state shared with it.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio::buffer::SampleQueue;
use crate::audio::device::{AudioBackend, AudioDevice, AudioDeviceError};
use crate::audio::resample::{downmix_into, resample_linear, to_pcm16};

/// Device names that select the host's default input device.
pub const DEFAULT_DEVICE_NAMES: &[&str] = &["", "default", "sysdefault"];

/// Seconds of audio buffered before the oldest samples are overwritten.
const QUEUE_SECS: usize = 10;

type SharedQueue = Arc<Mutex<SampleQueue<i16>>>;
type FaultSlot = Arc<Mutex<Option<String>>>;

// ---------------------------------------------------------------------------
// CpalBackend
// ---------------------------------------------------------------------------

/// Capture backend using the platform's default cpal host.
pub struct CpalBackend {
    host: cpal::Host,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Names of all input devices the host reports.
    pub fn input_device_names(&self) -> Result<Vec<String>, AudioDeviceError> {
        let devices = self
            .host
            .input_devices()
            .map_err(|e| AudioDeviceError::Backend(e.to_string()))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    fn find_device(&self, name: &str) -> Result<cpal::Device, AudioDeviceError> {
        if DEFAULT_DEVICE_NAMES.contains(&name) {
            return self
                .host
                .default_input_device()
                .ok_or_else(|| AudioDeviceError::NotFound(name.to_string()));
        }

        let mut devices = self
            .host
            .input_devices()
            .map_err(|e| AudioDeviceError::Backend(e.to_string()))?;
        devices
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| AudioDeviceError::NotFound(name.to_string()))
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn open(&self, name: &str, sample_rate: u32) -> Result<Box<dyn AudioDevice>, AudioDeviceError> {
        let device = self.find_device(name)?;
        let supported = device
            .default_input_config()
            .map_err(|e| AudioDeviceError::Backend(e.to_string()))?;

        let channels = supported.channels();
        let native_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let queue: SharedQueue = Arc::new(Mutex::new(SampleQueue::new(
            sample_rate.max(1) as usize * QUEUE_SECS,
        )));
        let fault: FaultSlot = Arc::new(Mutex::new(None));

        let cb_queue = Arc::clone(&queue);
        let cb_fault = Arc::clone(&fault);
        let mut mono = Vec::new();
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    downmix_into(data, channels, &mut mono);
                    let pcm = to_pcm16(&resample_linear(&mono, native_rate, sample_rate));
                    if let Ok(mut q) = cb_queue.lock() {
                        q.push_slice(&pcm);
                    }
                },
                move |err: cpal::StreamError| {
                    log::error!("cpal stream error: {err}");
                    if let Ok(mut slot) = cb_fault.lock() {
                        *slot = Some(err.to_string());
                    }
                },
                None,
            )
            .map_err(|e| AudioDeviceError::Backend(e.to_string()))?;

        // Some hosts start a stream as soon as it is built.
        if let Err(e) = stream.pause() {
            log::debug!("capture: initial pause not supported: {e}");
        }

        log::debug!(
            "capture: opened {name:?} ({channels} ch @ {native_rate} Hz → mono @ {sample_rate} Hz)"
        );

        Ok(Box::new(CpalDevice {
            name: name.to_string(),
            stream,
            queue,
            fault,
        }))
    }
}

// ---------------------------------------------------------------------------
// CpalDevice
// ---------------------------------------------------------------------------

/// An open cpal input stream.  Dropping it stops and closes the stream.
pub struct CpalDevice {
    name: String,
    stream: cpal::Stream,
    queue: SharedQueue,
    fault: FaultSlot,
}

impl CpalDevice {
    fn take_fault(&self) -> Option<String> {
        self.fault.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl AudioDevice for CpalDevice {
    fn start_recording(&mut self) -> Result<(), AudioDeviceError> {
        if let Ok(mut q) = self.queue.lock() {
            q.clear();
        }
        self.stream
            .play()
            .map_err(|e| AudioDeviceError::Stream(e.to_string()))
    }

    fn stop_recording(&mut self) -> Result<(), AudioDeviceError> {
        self.stream
            .pause()
            .map_err(|e| AudioDeviceError::Stream(e.to_string()))
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, AudioDeviceError> {
        if let Some(fault) = self.take_fault() {
            return Err(AudioDeviceError::Stream(fault));
        }
        let mut q = self
            .queue
            .lock()
            .map_err(|e| AudioDeviceError::Stream(format!("sample queue poisoned: {e}")))?;
        Ok(q.pop_into(buf))
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        let overrun = self.queue.lock().map(|q| q.overrun()).unwrap_or(0);
        if overrun > 0 {
            log::warn!("capture: {:?} dropped {overrun} samples", self.name);
        }
        log::debug!("capture: closed {:?}", self.name);
    }
}
