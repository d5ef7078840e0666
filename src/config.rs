/*! Decoder configuration.

The SNR target, the two smoothing betas, and the enable flag are set
from a UI/settings context and read on the audio path. The audio path
must never hold a lock across a tick, so readers take a
[`Settings::snapshot`] (one short read lock, one clone) and work from
the copy for the rest of the call.

The hysteresis guard band and the key debounce are fixed design
constants, not configuration.

The surrounding application persists [`DecoderConfig`] in its own
settings store; the serde derives are the interchange surface.
*/
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::Float;

/// SNR target range, dB.
pub const SNR_DB_MIN: Float = 7.0;
/// SNR target range, dB.
pub const SNR_DB_MAX: Float = 30.0;
/// Smoothing beta range.
pub const BETA_MIN: Float = 0.10;
/// Smoothing beta range.
pub const BETA_MAX: Float = 0.95;

/// Runtime-settable decoder configuration.
///
/// Betas are the retained memory of the exponential smoothers: 0.10
/// tracks the input almost raw, 0.95 is very steady.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Decoder enabled. When false, audio is consumed and dropped.
    pub enabled: bool,
    /// Target SNR for "tone present", in dB.
    pub snr_db: Float,
    /// Peak smoothing beta. Small: the peak must track keying.
    pub peak_beta: Float,
    /// Noise floor smoothing beta. Large: the floor is steady.
    pub noise_beta: Float,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snr_db: 10.0,
            peak_beta: 0.10,
            noise_beta: 0.80,
        }
    }
}

impl DecoderConfig {
    /// Clamp every field into its valid range. Out of range values
    /// saturate; they never error (a settings store may hand us
    /// anything).
    pub fn clamp(&mut self) {
        self.snr_db = self.snr_db.clamp(SNR_DB_MIN, SNR_DB_MAX);
        self.peak_beta = self.peak_beta.clamp(BETA_MIN, BETA_MAX);
        self.noise_beta = self.noise_beta.clamp(BETA_MIN, BETA_MAX);
    }
}

/// Shared handle to the live configuration.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    inner: Arc<RwLock<DecoderConfig>>,
}

impl Settings {
    /// Create a handle starting from the given configuration.
    #[must_use]
    pub fn new(mut config: DecoderConfig) -> Self {
        config.clamp();
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Clone the current configuration. The read lock is dropped
    /// before returning; never held across a tick.
    #[must_use]
    pub fn snapshot(&self) -> DecoderConfig {
        self.inner.read().unwrap().clone()
    }

    /// Mutate the configuration from the settings/UI context. The
    /// result is clamped into range before the lock is released.
    pub fn update<F: FnOnce(&mut DecoderConfig)>(&self, f: F) {
        let mut guard = self.inner.write().unwrap();
        f(&mut guard);
        guard.clamp();
    }
}

/* vim: textwidth=80
 */
