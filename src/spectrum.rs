/*! Rolling oversampled power spectrum.

The tone detector does not look at one FFT at a time. Each detector
interval produces one windowed power spectrum (in dB), which is stored
in one of [`OVER`] slots, round robin. The per-bin sum over all slots
is the aggregate the detector actually ranks. This trades time
resolution for much smoother power estimates.

Aggregate values are sums of per-slot dB, so the detector's internal
unit is dB·OVER. SNR thresholds are scaled by [`OVER`] to match.
*/
use std::sync::Arc;

use rustfft::FftPlanner;

use crate::{Complex, Error, Float, Result};

/// Number of sub-spectra summed into the aggregate.
pub const OVER: usize = 8;

/// Hard floor for per-slot bin power. Keeps empty bins finite.
pub const DB_FLOOR: Float = -120.0;

/// Ceiling applied to averaged peak/noise readings, in per-slot dB.
/// Limits the influence of outliers and ADC saturation.
pub const DB_CEILING: Float = -3.0;

const PI: Float = std::f64::consts::PI as Float;

/// Create Hamming window.
///
/// https://en.wikipedia.org/wiki/Window_function#Hann_and_Hamming_windows
#[must_use]
pub fn hamming(ntaps: usize) -> Vec<Float> {
    // 0.54 is commonly used, but Hamming's paper sets a0 as 25/46.
    let a0 = 25.0 / 46.0;
    let a1 = 1.0 - a0;
    let m = (ntaps - 1) as Float;
    (0..ntaps)
        .map(|n| a0 - a1 * (2.0 * PI * (n as Float) / m).cos())
        .collect()
}

/// One windowed power spectrum per detector interval, in dB per bin.
pub struct SpectrumEstimator {
    fft: Arc<dyn rustfft::Fft<Float>>,
    window: Vec<Float>,
    buf: Vec<Complex>,
    db: Vec<Float>,
    size: usize,
}

impl SpectrumEstimator {
    /// Create a new estimator for blocks of `size` real samples.
    pub fn new(size: usize) -> Result<Self> {
        if size < 16 || size % 2 != 0 {
            return Err(Error::msg(format!("bad spectrum size {size}")));
        }
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Ok(Self {
            fft,
            window: hamming(size),
            buf: vec![Complex::default(); size],
            db: vec![DB_FLOOR; size / 2],
            size,
        })
    }

    /// Number of output bins (positive frequencies only).
    #[must_use]
    pub fn bins(&self) -> usize {
        self.size / 2
    }

    /// Compute the dB spectrum of exactly one interval of samples.
    ///
    /// The returned slice is valid until the next call.
    pub fn estimate(&mut self, samples: &[Float]) -> &[Float] {
        assert_eq!(samples.len(), self.size);
        for (to, (s, w)) in self
            .buf
            .iter_mut()
            .zip(samples.iter().zip(self.window.iter()))
        {
            *to = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.buf);
        let norm = 1.0 / (self.size as Float);
        for (db, x) in self.db.iter_mut().zip(self.buf.iter()) {
            let mag2 = x.norm_sqr() * norm * norm;
            *db = (10.0 * mag2.max(1e-12).log10()).max(DB_FLOOR);
        }
        &self.db
    }
}

/// The OVER-slot rolling aggregate.
pub struct SpectralAccumulator {
    slots: Vec<Vec<Float>>,
    sum: Vec<Float>,
    next: usize,
}

impl SpectralAccumulator {
    /// Create a new accumulator for spectra of `bins` bins. All slots
    /// start at the dB floor.
    #[must_use]
    pub fn new(bins: usize) -> Self {
        Self {
            slots: vec![vec![DB_FLOOR; bins]; OVER],
            sum: vec![DB_FLOOR * OVER as Float; bins],
            next: 0,
        }
    }

    /// Replace the oldest slot with a fresh sub-spectrum and update the
    /// aggregate. Wraps at index == OVER.
    pub fn insert(&mut self, spectrum: &[Float]) {
        assert_eq!(spectrum.len(), self.sum.len());
        self.slots[self.next].copy_from_slice(spectrum);
        self.next += 1;
        if self.next == OVER {
            self.next = 0;
        }
        for (bin, s) in self.sum.iter_mut().enumerate() {
            *s = self.slots.iter().map(|slot| slot[bin]).sum();
        }
    }

    /// The per-bin sum over all slots, in dB·OVER.
    #[must_use]
    pub fn aggregate(&self) -> &[Float] {
        &self.sum
    }

    /// Forget everything, back to the floor.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.fill(DB_FLOOR);
        }
        self.sum.fill(DB_FLOOR * OVER as Float);
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::assert_almost_equal;

    #[test]
    fn hamming_shape() {
        let w = hamming(32);
        assert_eq!(w.len(), 32);
        // Endpoints are the minimum, midpoint is the maximum.
        assert_almost_equal(w[0], 25.0 / 46.0 - 21.0 / 46.0);
        assert!(w[16] > 0.99 && w[16] <= 1.0);
        // Symmetric (periodic window over n/(N-1)).
        for i in 0..32 {
            assert_almost_equal(w[i], w[31 - i]);
        }
    }

    #[test]
    fn estimator_finds_the_tone_bin() -> crate::Result<()> {
        let size = 64;
        let mut est = SpectrumEstimator::new(size)?;
        // 8 cycles over 64 samples: energy lands in bin 8.
        let samples: Vec<Float> = (0..size)
            .map(|i| (2.0 * PI * 8.0 * i as Float / size as Float).sin())
            .collect();
        let db = est.estimate(&samples);
        assert_eq!(db.len(), 32);
        let peak = db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(peak, 8);
        // Tone bin well above a far away bin.
        assert!(db[8] - db[20] > 20.0);
        Ok(())
    }

    #[test]
    fn estimator_rejects_bad_size() {
        assert!(SpectrumEstimator::new(0).is_err());
        assert!(SpectrumEstimator::new(10).is_err());
        assert!(SpectrumEstimator::new(33).is_err());
        assert!(SpectrumEstimator::new(32).is_ok());
    }

    #[test]
    fn accumulator_sums_slots() {
        let mut acc = SpectralAccumulator::new(4);
        assert_almost_equal(acc.aggregate()[0], DB_FLOOR * 8.0);
        acc.insert(&[-10.0, -20.0, -30.0, -40.0]);
        // One fresh slot, seven at the floor.
        assert_almost_equal(acc.aggregate()[0], -10.0 + 7.0 * DB_FLOOR);
        for _ in 0..7 {
            acc.insert(&[-10.0, -20.0, -30.0, -40.0]);
        }
        assert_almost_equal(acc.aggregate()[0], -80.0);
        assert_almost_equal(acc.aggregate()[3], -320.0);
    }

    #[test]
    fn accumulator_replaces_round_robin() {
        let mut acc = SpectralAccumulator::new(1);
        for _ in 0..OVER {
            acc.insert(&[0.0]);
        }
        assert_almost_equal(acc.aggregate()[0], 0.0);
        // The ninth insert must evict one old slot, not append.
        acc.insert(&[-8.0]);
        assert_almost_equal(acc.aggregate()[0], -8.0);
        acc.reset();
        assert_almost_equal(acc.aggregate()[0], DB_FLOOR * 8.0);
    }
}
/* vim: textwidth=80
 */
