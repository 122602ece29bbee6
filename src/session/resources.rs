//! Ownership of the three native resources a session holds.
//!
//! ```text
//! configuration ──required by──▶ decoder
//! audio device  (independent; present only while listening is set up)
//! ```
//!
//! [`ResourceHandles::release_all`] may be called any number of times, at
//! any point; it releases only what is held, device first, configuration
//! last.  Setup goes through [`ResourceHandles::acquire`], which starts from
//! a clean slate and hands back an [`AcquireGuard`]: if the guard is dropped
//! without [`AcquireGuard::commit`], everything acquired in that attempt is
//! released again.

use std::ops::{Deref, DerefMut};

use crate::audio::AudioDevice;
use crate::decoder::{Decoder, DecoderConfig};
use crate::error::{RecognizerError, Result};

// ---------------------------------------------------------------------------
// ResourceHandles
// ---------------------------------------------------------------------------

/// Owner of the configuration, decoder and capture device handles.
///
/// Invariant: a decoder is only ever held together with a configuration.
#[derive(Default)]
pub struct ResourceHandles {
    device: Option<Box<dyn AudioDevice>>,
    decoder: Option<Box<dyn Decoder>>,
    config: Option<DecoderConfig>,
}

impl ResourceHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release whatever is currently held.  Idempotent.
    pub fn release_all(&mut self) {
        self.release_device();
        if self.decoder.take().is_some() {
            log::debug!("resources: decoder freed");
        }
        if self.config.take().is_some() {
            log::debug!("resources: configuration freed");
        }
    }

    /// Close the capture device if one is open.  Returns `true` if it was.
    pub fn release_device(&mut self) -> bool {
        let held = self.device.take().is_some();
        if held {
            log::debug!("resources: audio device closed");
        }
        held
    }

    /// Begin a fresh acquisition: releases everything, then returns a guard
    /// that undoes the attempt unless committed.
    pub fn acquire(&mut self) -> AcquireGuard<'_> {
        self.release_all();
        AcquireGuard {
            handles: self,
            committed: false,
        }
    }

    // -----------------------------------------------------------------------
    // Installation
    // -----------------------------------------------------------------------

    /// Store the configuration handle.
    ///
    /// # Errors
    ///
    /// [`RecognizerError::InvalidState`] while a decoder built from the
    /// current configuration is still alive.
    pub fn install_config(&mut self, config: DecoderConfig) -> Result<()> {
        if self.decoder.is_some() {
            return Err(RecognizerError::InvalidState(
                "cannot replace the configuration of a live decoder".into(),
            ));
        }
        self.config = Some(config);
        Ok(())
    }

    /// Store the decoder handle, freeing any previous decoder.
    ///
    /// # Errors
    ///
    /// [`RecognizerError::InvalidState`] when no configuration is held.
    pub fn install_decoder(&mut self, decoder: Box<dyn Decoder>) -> Result<()> {
        if self.config.is_none() {
            return Err(RecognizerError::InvalidState(
                "decoder installed without a configuration".into(),
            ));
        }
        self.decoder = Some(decoder);
        Ok(())
    }

    /// Store the capture device, closing any previous one.
    pub fn install_device(&mut self, device: Box<dyn AudioDevice>) {
        self.release_device();
        self.device = Some(device);
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    pub fn config(&self) -> Option<&DecoderConfig> {
        self.config.as_ref()
    }

    pub fn config_mut(&mut self) -> Option<&mut DecoderConfig> {
        self.config.as_mut()
    }

    pub fn decoder_mut(&mut self) -> Option<&mut (dyn Decoder + 'static)> {
        self.decoder.as_deref_mut()
    }

    pub fn device_mut(&mut self) -> Option<&mut (dyn AudioDevice + 'static)> {
        self.device.as_deref_mut()
    }

    /// Configuration and decoder together, for changes that touch both.
    pub fn search_parts(&mut self) -> Option<(&mut DecoderConfig, &mut (dyn Decoder + 'static))> {
        match (self.config.as_mut(), self.decoder.as_deref_mut()) {
            (Some(config), Some(decoder)) => Some((config, decoder)),
            _ => None,
        }
    }

    /// Device and decoder together, for processing one chunk.
    pub fn capture_parts(
        &mut self,
    ) -> Option<(&mut (dyn AudioDevice + 'static), &mut (dyn Decoder + 'static))> {
        match (self.device.as_deref_mut(), self.decoder.as_deref_mut()) {
            (Some(device), Some(decoder)) => Some((device, decoder)),
            _ => None,
        }
    }

    pub fn has_config(&self) -> bool {
        self.config.is_some()
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !(self.has_config() || self.has_decoder() || self.has_device())
    }
}

impl Drop for ResourceHandles {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl std::fmt::Debug for ResourceHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandles")
            .field("config", &self.has_config())
            .field("decoder", &self.has_decoder())
            .field("device", &self.has_device())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AcquireGuard
// ---------------------------------------------------------------------------

/// Scoped acquisition attempt returned by [`ResourceHandles::acquire`].
pub struct AcquireGuard<'a> {
    handles: &'a mut ResourceHandles,
    committed: bool,
}

impl AcquireGuard<'_> {
    /// Keep everything acquired during this attempt.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Deref for AcquireGuard<'_> {
    type Target = ResourceHandles;

    fn deref(&self) -> &ResourceHandles {
        self.handles
    }
}

impl DerefMut for AcquireGuard<'_> {
    fn deref_mut(&mut self) -> &mut ResourceHandles {
        self.handles
    }
}

impl Drop for AcquireGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            log::debug!("resources: acquisition abandoned, releasing partial state");
            self.handles.release_all();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
