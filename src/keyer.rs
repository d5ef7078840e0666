/*! Generate a keyed morse tone.

The transmit side of morse is a much simpler machine than the decoder:
text becomes a grid of key-down/key-up units (a dit is one unit on and
one off, a dah three on and one off, letters and words get longer
gaps), and the grid keys a sine carrier. The element strings come from
the same [`codebook`](crate::codebook) the decoder uses.

Besides sidetone and beacon duty, this is the symmetric reference
signal for the decoder's round-trip tests.
*/
use log::warn;

use crate::block::{Block, BlockRet};
use crate::codebook;
use crate::stream::{Streamp, new_streamp};
use crate::{Float, Result};

const DIT: &[u8] = &[1, 0];
const DAH: &[u8] = &[1, 1, 1, 0];
// Inter-character gap is 3 units; one unit comes with the last element.
const CHAR_GAP: &[u8] = &[0, 0];
// Inter-word gap is 7 units; one unit comes with the last element.
const WORD_GAP: &[u8] = &[0, 0, 0, 0, 0, 0];

/// Encode text into the unit grid of key states.
///
/// Characters without a codebook entry are skipped with a warning.
#[must_use]
pub fn encode(msg: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(msg.len() * 32);
    let mut chars = msg.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            // One unit of gap is already there from the last element.
            out.extend(WORD_GAP);
            continue;
        }
        let Some(code) = codebook::code_for(c) else {
            warn!("morse keyer got invalid character {c:?}. Ignoring");
            continue;
        };
        for sym in code.chars() {
            out.extend(match sym {
                '.' => DIT,
                '-' => DAH,
                other => unreachable!("codebook element {other}"),
            });
        }
        if let Some(next) = chars.peek()
            && *next != ' '
        {
            out.extend(CHAR_GAP);
        }
    }
    out.extend(WORD_GAP);
    out
}

/// Keyed sine source: a fixed message as audio, then EOF.
pub struct KeyedToneSource {
    dst: Streamp<Float>,
    units: Vec<u8>,
    unit_samples: usize,
    amplitude: Float,
    rad_per_sample: f64,
    current: f64,
    done: bool,
}

impl KeyedToneSource {
    /// Create a source producing `msg` at `wpm` words per minute as a
    /// `tone_hz` sine at `samp_rate`.
    #[must_use]
    pub fn new(
        msg: &str,
        wpm: Float,
        tone_hz: Float,
        amplitude: Float,
        samp_rate: Float,
    ) -> (Self, Streamp<Float>) {
        let dst = new_streamp();
        // One unit is 1200/wpm milliseconds.
        let unit_samples = (samp_rate * 1.2 / wpm).round() as usize;
        (
            Self {
                dst: dst.clone(),
                units: encode(msg),
                unit_samples,
                amplitude,
                rad_per_sample: 2.0 * std::f64::consts::PI * (tone_hz as f64)
                    / (samp_rate as f64),
                current: 0.0,
                done: false,
            },
            dst,
        )
    }

    /// Total number of samples this source will produce.
    #[must_use]
    pub fn total_samples(&self) -> usize {
        self.units.len() * self.unit_samples
    }
}

impl Block for KeyedToneSource {
    fn work(&mut self) -> Result<BlockRet> {
        if !self.done {
            for &unit in &self.units {
                for _ in 0..self.unit_samples {
                    self.current = (self.current + self.rad_per_sample)
                        % (2.0 * std::f64::consts::PI);
                    let s = if unit == 1 {
                        self.amplitude * self.current.sin() as Float
                    } else {
                        0.0
                    };
                    self.dst.push(s);
                }
            }
            self.done = true;
        }
        self.dst.set_eof();
        Ok(BlockRet::EOF)
    }

    fn block_name(&self) -> &'static str {
        "KeyedToneSource"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_grid() {
        for (i, want) in &[
            ("", vec![0, 0, 0, 0, 0, 0]),
            ("A", vec![1, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0]),
            (
                "7",
                vec![1, 1, 1, 0, 1, 1, 1, 0, 1, 0, 1, 0, 1, 0, 0, 0, 0, 0, 0, 0],
            ),
            (
                "e e",
                vec![
                    1, 0, // e
                    0, 0, 0, 0, 0, 0, // word gap
                    1, 0, // e
                    0, 0, 0, 0, 0, 0, // trailing gap
                ],
            ),
        ] {
            assert_eq!(&encode(i), want, "for input {i}");
        }
    }

    #[test]
    fn char_gap_between_letters_only() {
        // "et": dit, char gap, dah, word gap.
        assert_eq!(
            encode("et"),
            vec![1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn unknown_characters_are_skipped() {
        assert_eq!(encode("\u{e5}"), encode(""));
    }

    #[test]
    fn source_produces_keyed_sine() -> crate::Result<()> {
        let samp_rate = 8000.0;
        // 20 WPM: one unit is 60 ms, 480 samples.
        let (mut src, out) = KeyedToneSource::new("e", 20.0, 750.0, 0.5, samp_rate);
        assert_eq!(src.unit_samples, 480);
        assert!(matches!(src.work()?, BlockRet::EOF));
        assert!(out.eof());
        // "e" is dit + gap + trailing word gap: 8 units.
        assert_eq!(out.len(), 8 * 480);
        assert_eq!(out.len(), src.total_samples());
        let samples: Vec<Float> = std::iter::from_fn(|| out.pop()).collect();
        // Tone during the first unit, silence after.
        assert!(samples[..480].iter().any(|s| s.abs() > 0.4));
        assert!(samples[480..].iter().all(|s| *s == 0.0));
        assert!(samples.iter().all(|s| s.abs() <= 0.5));
        Ok(())
    }
}
/* vim: textwidth=80
 */
