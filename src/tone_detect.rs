/*! Spectral tone detector.

Decides, once per fixed interval, whether a CW tone is present in the
receiver passband, and emits that boolean together with the interval's
wall-clock duration as a [`Tick`].

Within the passband the aggregate spectrum's bins are ranked by power.
The top [`PEAK_WIDTH`] bins average into the peak reading, the rest
into the noise reading; both are smoothed independently and their
difference is the SNR the hysteresis gate runs on. Two thresholds are
derived from one configured target: the gate turns on above
`target·OVER` and off below `(target − 3 dB)·OVER`, and holds
otherwise. That rule is the only place the boolean may change.

Ticks are emitted on every interval, not only on transitions; the
timing classifier downstream needs the elapsed time either way.
*/
use itertools::Itertools;
use log::{debug, info};

use crate::block::{Block, BlockRet};
use crate::config::Settings;
use crate::spectrum::{DB_CEILING, OVER, SpectralAccumulator, SpectrumEstimator};
use crate::stream::{Streamp, new_streamp};
use crate::{Float, Result};

/// Number of top-ranked bins averaged into the peak reading.
pub const PEAK_WIDTH: usize = 2;

/// Hysteresis guard band below the SNR target, in dB. Fixed, not
/// configuration.
pub const GUARD_DB: Float = 3.0;

/// The one message type between the tone detector and the timing
/// classifier: tone state for one detector interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Tone present during this interval.
    pub on: bool,
    /// Wall-clock duration of the interval, in milliseconds.
    pub ms: Float,
}

/// Exponential smoother. `beta` is the retained memory:
/// `y = (1-beta)·x + beta·y_prev`.
#[derive(Debug)]
pub(crate) struct SinglePoleIir {
    beta: Float,
    prev: Float,
}

impl SinglePoleIir {
    pub(crate) fn new(beta: Float, initial: Float) -> Self {
        Self {
            beta: beta.clamp(0.0, 1.0),
            prev: initial,
        }
    }

    pub(crate) fn set_beta(&mut self, beta: Float) {
        self.beta = beta.clamp(0.0, 1.0);
    }

    pub(crate) fn filter(&mut self, sample: Float) -> Float {
        self.prev = (1.0 - self.beta) * sample + self.beta * self.prev;
        self.prev
    }

    pub(crate) fn reset(&mut self, value: Float) {
        self.prev = value;
    }
}

/// The hysteresis state. The transition rule in [`ToneGate::update`]
/// is the only code path that may flip the boolean.
#[derive(Debug, Default)]
pub struct ToneGate {
    on: bool,
}

impl ToneGate {
    /// Apply one SNR reading. Turns on only above `high`, off only
    /// below `low`, holds in between.
    pub fn update(&mut self, snr: Float, high: Float, low: Float) -> bool {
        if !self.on && snr > high {
            self.on = true;
        } else if self.on && snr < low {
            self.on = false;
        }
        self.on
    }

    /// Current state, without applying a reading.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Back to "no tone".
    pub fn reset(&mut self) {
        self.on = false;
    }
}

/// Spectral tone detector block: audio samples in, [`Tick`]s out.
pub struct ToneDetector {
    src: Streamp<Float>,
    dst: Streamp<Tick>,
    settings: Settings,

    size: usize,
    bin_hz: Float,
    tick_ms: Float,
    pending: Vec<Float>,

    est: SpectrumEstimator,
    acc: SpectralAccumulator,
    peak: SinglePoleIir,
    noise: SinglePoleIir,
    gate: ToneGate,

    // Inclusive bin range of the passband; None when it maps to too
    // few bins to rank.
    bins: Option<(usize, usize)>,
}

impl ToneDetector {
    /// Floor for the smoothers, in aggregate units.
    fn floor() -> Float {
        crate::spectrum::DB_FLOOR * OVER as Float
    }

    /// Create a new detector for mono audio at `samp_rate` Hz,
    /// computing one spectrum per `fft_size` samples.
    pub fn new(
        src: Streamp<Float>,
        samp_rate: Float,
        fft_size: usize,
        settings: Settings,
    ) -> Result<(Self, Streamp<Tick>)> {
        let est = SpectrumEstimator::new(fft_size)?;
        let cfg = settings.snapshot();
        let dst = new_streamp();
        let mut det = Self {
            src,
            dst: dst.clone(),
            settings,
            size: fft_size,
            bin_hz: samp_rate / fft_size as Float,
            tick_ms: 1000.0 * fft_size as Float / samp_rate,
            pending: Vec::with_capacity(fft_size),
            acc: SpectralAccumulator::new(est.bins()),
            est,
            peak: SinglePoleIir::new(cfg.peak_beta, Self::floor()),
            noise: SinglePoleIir::new(cfg.noise_beta, Self::floor()),
            gate: ToneGate::default(),
            bins: None,
        };
        det.set_passband(400.0, 900.0);
        Ok((det, dst))
    }

    /// Map new passband edges (Hz) to bin indices. Called on mode
    /// change. A passband too narrow to rank degrades to "off" ticks
    /// rather than erroring.
    pub fn set_passband(&mut self, low_hz: Float, high_hz: Float) {
        let lo = (low_hz / self.bin_hz).ceil() as usize;
        let hi = ((high_hz / self.bin_hz).floor() as usize).min(self.est.bins() - 1);
        self.bins = if hi >= lo && hi - lo + 1 > PEAK_WIDTH {
            Some((lo, hi))
        } else {
            None
        };
        info!(
            "ToneDetector: passband {low_hz}-{high_hz} Hz -> bins {:?}",
            self.bins
        );
    }

    /// Re-initialize all rolling state, e.g. on band or mode change.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.acc.reset();
        self.peak.reset(Self::floor());
        self.noise.reset(Self::floor());
        self.gate.reset();
        debug!("ToneDetector: reset");
    }

    /// Milliseconds represented by one tick.
    #[must_use]
    pub fn tick_ms(&self) -> Float {
        self.tick_ms
    }

    fn process_interval(&mut self, cfg: &crate::config::DecoderConfig) -> Tick {
        let chunk = std::mem::replace(&mut self.pending, Vec::with_capacity(self.size));
        let db = self.est.estimate(&chunk);
        self.acc.insert(db);

        let Some((lo, hi)) = self.bins else {
            // Passband narrower than what we can rank. Most likely
            // tone state is "off".
            return Tick {
                on: false,
                ms: self.tick_ms,
            };
        };

        let agg = self.acc.aggregate();
        let ceiling = DB_CEILING * OVER as Float;
        let ranked: Vec<Float> = agg[lo..=hi]
            .iter()
            .copied()
            .sorted_by(|a, b| b.total_cmp(a))
            .collect();
        let peak_db = (ranked[..PEAK_WIDTH].iter().sum::<Float>() / PEAK_WIDTH as Float)
            .min(ceiling);
        let rest = &ranked[PEAK_WIDTH..];
        let noise_db = (rest.iter().sum::<Float>() / rest.len() as Float).min(ceiling);

        self.peak.set_beta(cfg.peak_beta);
        self.noise.set_beta(cfg.noise_beta);
        let snr = self.peak.filter(peak_db) - self.noise.filter(noise_db);

        let snr_high = cfg.snr_db * OVER as Float;
        let snr_low = (cfg.snr_db - GUARD_DB) * OVER as Float;
        let was = self.gate.is_on();
        let on = self.gate.update(snr, snr_high, snr_low);
        if on != was {
            debug!("ToneDetector: tone {}", if on { "on" } else { "off" });
        }
        Tick {
            on,
            ms: self.tick_ms,
        }
    }
}

impl Block for ToneDetector {
    fn block_name(&self) -> &'static str {
        "ToneDetector"
    }

    fn work(&mut self) -> Result<BlockRet> {
        let cfg = self.settings.snapshot();
        if !cfg.enabled {
            let mut n = 0;
            while self.src.pop().is_some() {
                n += 1;
            }
            if self.src.eof() {
                self.dst.set_eof();
                return Ok(BlockRet::EOF);
            }
            return Ok(if n > 0 { BlockRet::Again } else { BlockRet::Noop });
        }

        let mut produced = 0;
        while let Some(sample) = self.src.pop() {
            self.pending.push(sample);
            if self.pending.len() == self.size {
                let tick = self.process_interval(&cfg);
                self.dst.push(tick);
                produced += 1;
            }
        }
        if produced > 0 {
            Ok(BlockRet::Again)
        } else if self.src.eof() {
            // A trailing partial interval is dropped; upstream gaps
            // read as space, which the classifier handles anyway.
            self.dst.set_eof();
            Ok(BlockRet::EOF)
        } else {
            Ok(BlockRet::Noop)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::streamp_from_slice;

    fn sine(freq: Float, samp_rate: Float, amplitude: Float, n: usize) -> Vec<Float> {
        let k = 2.0 * std::f32::consts::PI * freq / samp_rate;
        (0..n).map(|i| amplitude * (k * i as Float).sin()).collect()
    }

    #[test]
    fn gate_hysteresis_holds_between_thresholds() {
        let mut gate = ToneGate::default();
        // Oscillating strictly between low (56) and high (80): the
        // boolean must never change, from either starting state.
        for snr in [60.0, 79.0, 57.0, 75.0, 60.0] {
            assert!(!gate.update(snr, 80.0, 56.0));
        }
        assert!(gate.update(81.0, 80.0, 56.0));
        for snr in [60.0, 79.0, 57.0, 75.0, 60.0] {
            assert!(gate.update(snr, 80.0, 56.0));
        }
        assert!(!gate.update(55.0, 80.0, 56.0));
    }

    #[test]
    fn gate_exact_threshold_holds() {
        let mut gate = ToneGate::default();
        assert!(!gate.update(80.0, 80.0, 56.0), "needs >, not >=");
        assert!(gate.update(80.1, 80.0, 56.0));
        assert!(gate.update(56.0, 80.0, 56.0), "needs <, not <=");
    }

    #[test]
    fn detects_tone_then_silence() -> crate::Result<()> {
        let samp_rate = 8000.0;
        let size = 32;
        let src = streamp_from_slice(&sine(750.0, samp_rate, 0.5, size * 16));
        let (mut det, ticks) = ToneDetector::new(src.clone(), samp_rate, size, Settings::default())?;
        det.set_passband(300.0, 1800.0);
        det.work()?;
        assert_eq!(ticks.len(), 16);
        let states: Vec<bool> = std::iter::from_fn(|| ticks.pop()).map(|t| t.on).collect();
        assert!(states[8..].iter().all(|&on| on), "got {states:?}");

        // Silence empties the slots again; the gate must drop out.
        src.extend(std::iter::repeat(0.0).take(size * 16));
        det.work()?;
        let states: Vec<bool> = std::iter::from_fn(|| ticks.pop()).map(|t| t.on).collect();
        assert!(states.last() == Some(&false), "got {states:?}");
        Ok(())
    }

    #[test]
    fn ticks_carry_interval_ms() -> crate::Result<()> {
        let src = streamp_from_slice(&sine(750.0, 8000.0, 0.5, 32));
        let (mut det, ticks) = ToneDetector::new(src, 8000.0, 32, Settings::default())?;
        det.work()?;
        let t = ticks.pop().unwrap();
        crate::tests::assert_almost_equal(t.ms, 4.0);
        crate::tests::assert_almost_equal(det.tick_ms(), 4.0);
        Ok(())
    }

    #[test]
    fn narrow_passband_degrades_to_off() -> crate::Result<()> {
        let samp_rate = 8000.0;
        let size = 32;
        let src = streamp_from_slice(&sine(500.0, samp_rate, 0.5, size * 16));
        let (mut det, ticks) = ToneDetector::new(src, samp_rate, size, Settings::default())?;
        // 250 Hz bins; 400..=600 Hz maps to bins 2..=2, fewer than
        // PEAK_WIDTH + 1.
        det.set_passband(400.0, 600.0);
        det.work()?;
        assert_eq!(ticks.len(), 16);
        while let Some(t) = ticks.pop() {
            assert!(!t.on);
        }
        Ok(())
    }

    #[test]
    fn disabled_consumes_and_drops() -> crate::Result<()> {
        let settings = Settings::default();
        settings.update(|c| c.enabled = false);
        let src = streamp_from_slice(&sine(750.0, 8000.0, 0.5, 320));
        let (mut det, ticks) = ToneDetector::new(src.clone(), 8000.0, 32, settings)?;
        assert!(matches!(det.work()?, BlockRet::Again));
        assert!(ticks.is_empty());
        assert!(src.is_empty());
        assert!(matches!(det.work()?, BlockRet::Noop));
        Ok(())
    }

    #[test]
    fn eof_propagates() -> crate::Result<()> {
        let src = streamp_from_slice(&[0.0; 40]);
        src.set_eof();
        let (mut det, ticks) = ToneDetector::new(src, 8000.0, 32, Settings::default())?;
        assert!(matches!(det.work()?, BlockRet::Again));
        assert!(matches!(det.work()?, BlockRet::EOF));
        assert!(ticks.eof());
        Ok(())
    }
}
/* vim: textwidth=80
 */
