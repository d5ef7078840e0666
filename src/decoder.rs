/*! Decoder session facade.

One [`CwDecoder`] is one CW decode session: it owns the tone detector
and the timing classifier, wired by their tick stream, and is created
on mode entry and dropped on session end. Nothing in it outlives the
session. Band or mode changes and enable toggles go through
[`CwDecoder::reset`]; the surrounding audio pipeline calls
[`CwDecoder::process`] per capture block and drains tokens into its
text panel with [`CwDecoder::poll`].

All processing happens synchronously inside `process`: one audio block
may produce many ticks, or none at all while a tick's worth of samples
straddles blocks. No stage blocks or suspends.
*/
use log::info;

use crate::config::Settings;
use crate::stream::{Streamp, new_streamp};
use crate::timing::{MorseTiming, Token};
use crate::tone_detect::ToneDetector;
use crate::{Float, Result, block::Block};

/// A complete CW decode session.
pub struct CwDecoder {
    audio: Streamp<Float>,
    detector: ToneDetector,
    timing: MorseTiming,
    tokens: Streamp<Token>,
    wpm: Streamp<u32>,
    settings: Settings,
    enabled: bool,
}

impl CwDecoder {
    /// Create a decoder for mono audio at `samp_rate` Hz with one
    /// detector interval per `fft_size` samples.
    pub fn new(samp_rate: Float, fft_size: usize, settings: Settings) -> Result<Self> {
        let audio = new_streamp();
        let (detector, ticks) =
            ToneDetector::new(audio.clone(), samp_rate, fft_size, settings.clone())?;
        let (timing, tokens, wpm) = MorseTiming::new(ticks);
        let enabled = settings.snapshot().enabled;
        Ok(Self {
            audio,
            detector,
            timing,
            tokens,
            wpm,
            settings,
            enabled,
        })
    }

    /// Update the passband edges of the active receive mode.
    pub fn set_passband(&mut self, low_hz: Float, high_hz: Float) {
        self.detector.set_passband(low_hz, high_hz);
    }

    /// Feed one block of audio samples and run both stages.
    pub fn process(&mut self, samples: &[Float]) -> Result<()> {
        let enabled = self.settings.snapshot().enabled;
        if enabled != self.enabled {
            // An enable toggle starts a fresh session.
            self.reset();
            self.enabled = enabled;
            info!("CwDecoder: {}", if enabled { "enabled" } else { "disabled" });
        }
        self.audio.extend(samples.iter().copied());
        self.detector.work()?;
        self.timing.work()?;
        Ok(())
    }

    /// Next decoded token, if any.
    pub fn poll(&mut self) -> Option<Token> {
        self.tokens.pop()
    }

    /// Next words-per-minute change notification, if any.
    pub fn poll_wpm(&mut self) -> Option<u32> {
        self.wpm.pop()
    }

    /// The current words-per-minute estimate.
    #[must_use]
    pub fn wpm(&self) -> u32 {
        self.timing.wpm()
    }

    /// The settings handle this session reads from.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings.clone()
    }

    /// Re-initialize every ring buffer, timer and flag to its default.
    /// Called on band/mode change; needs no coordination with other
    /// threads beyond the settings lock.
    pub fn reset(&mut self) {
        self.audio.clear();
        self.detector.reset();
        self.timing.reset();
        self.tokens.clear();
        self.wpm.clear();
    }
}

/* vim: textwidth=80
 */
