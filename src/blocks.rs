//! Convenience re-exports of all the blocks.
pub use crate::keyer::KeyedToneSource;
pub use crate::timing::{MorseTiming, Token};
pub use crate::tone_detect::{Tick, ToneDetector};
pub use crate::vector_sink::VectorSink;
pub use crate::vector_source::VectorSource;
