/*! Adaptive CW (morse code) decoder.

This crate turns a live audio stream into decoded morse text without any
a-priori knowledge of the operator's sending speed. It is meant to be
embedded in transceiver control firmware or SDR applications, where the
surrounding code owns audio capture and the text display.

# Architecture overview

The decoder is a chain of blocks connected by unidirectional streams,
driven synchronously on the audio path:

```text
   [ audio samples (Float) ]
            ↓
      [ ToneDetector ]     spectral tone detection
            ↓
     [ Tick{on, ms} ]      one narrow message type
            ↓
      [ MorseTiming ]      self-calibrating dot/dash classifier
            ↓
   [ Token stream ] → text sink
```

`ToneDetector` reduces a rolling, oversampled power spectrum of the
receiver passband to a single hysteresis-debounced "tone present"
boolean, emitted once per detector interval. `MorseTiming` classifies
the resulting mark/space durations against self-adjusting thresholds
and emits decoded characters through the morse codebook, along with a
words-per-minute estimate.

Both stages are independently testable against synthetic input; see the
unit tests in [`tone_detect`] and [`timing`]. For a whole-pipeline
session object, see [`decoder::CwDecoder`]. For offline decoding and
tests there is a small synchronous [`graph::Graph`] runner.

# Example

```
use rustcw::block::{Block, BlockRet};
use rustcw::blocks::KeyedToneSource;
use rustcw::config::Settings;
use rustcw::decoder::CwDecoder;

let settings = Settings::default();
let mut dec = CwDecoder::new(8000.0, 32, settings)?;
dec.set_passband(300.0, 1800.0);

let (mut src, audio) = KeyedToneSource::new("CQ", 20.0, 750.0, 0.5, 8000.0);
while !matches!(src.work()?, BlockRet::EOF) {}
while let Some(s) = audio.pop() {
    dec.process(&[s])?;
}
let mut text = String::new();
while let Some(tok) = dec.poll() {
    text.push_str(tok.as_str());
}
# Ok::<(), rustcw::Error>(())
```
*/

// Blocks.
pub mod keyer;
pub mod timing;
pub mod tone_detect;
pub mod vector_sink;
pub mod vector_source;

pub mod block;
pub mod blocks;
pub mod codebook;
pub mod config;
pub mod decoder;
pub mod graph;
pub mod spectrum;
pub mod stream;

/// Float type used. Usually f32, but not guaranteed.
pub type Float = f32;

/// Complex (I/Q) data.
pub type Complex = num_complex::Complex<Float>;

/// Errors from this crate.
///
/// The streaming hot path never fails; errors only happen at
/// construction and reconfiguration time.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter is out of its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Wrapped IO error, from file based sources and sinks.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid parameter error from a message.
    pub fn msg<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/* vim: textwidth=80
 */
