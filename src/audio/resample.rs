//! Sample conversion for the capture callback.
//!
//! The decoder consumes **mono 16-bit PCM** at the configured sample rate,
//! while capture hardware delivers interleaved `f32` at its native rate.
//! Three steps bridge the gap:
//!
//! 1. [`downmix_into`] averages interleaved channels to mono.
//! 2. [`resample_linear`] converts between sample rates.
//! 3. [`to_pcm16`] scales `[-1.0, 1.0]` floats to `i16` with clamping.
//!
//! Resampling is linear interpolation per callback buffer; quality is
//! adequate for speech models trained at 8 or 16 kHz.

// ---------------------------------------------------------------------------
// downmix
// ---------------------------------------------------------------------------

/// Replace the contents of `out` with `samples` averaged down to one channel.
///
/// `out` is the callback's scratch buffer, so its allocation is reused across
/// callbacks.  Trailing samples that do not form a complete frame are
/// dropped; zero channels yields nothing.
///
/// ```rust
/// use speech_recognizer::audio::downmix_into;
///
/// let mut mono = Vec::new();
/// downmix_into(&[0.5_f32, -0.5, 0.2, 0.4], 2, &mut mono); // L R L R
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix_into(samples: &[f32], channels: u16, out: &mut Vec<f32>) {
    out.clear();
    let width = usize::from(channels);
    if width <= 1 {
        if width == 1 {
            out.extend_from_slice(samples);
        }
        return;
    }
    let scale = 1.0 / width as f32;
    out.reserve(samples.len() / width);
    for frame in samples.chunks_exact(width) {
        out.push(frame.iter().sum::<f32>() * scale);
    }
}

// ---------------------------------------------------------------------------
// resample_linear
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `from_rate` to `to_rate` Hz.
///
/// Equal rates (or a zero rate) return the input unchanged.  The output
/// length is `ceil(len * to_rate / from_rate)`.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;
            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(&a), Some(&b)) => a * (1.0 - frac) + b * frac,
                (Some(&a), None) => a,
                _ => 0.0,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// to_pcm16
// ---------------------------------------------------------------------------

/// Convert `[-1.0, 1.0]` float samples to signed 16-bit PCM.
///
/// Out-of-range input is clamped rather than wrapped.
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
