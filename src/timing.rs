/*! Adaptive morse timing classifier.

Consumes the tone detector's [`Tick`] stream and turns mark/space
durations into decoded text, without any configured sending speed.

Calibration rests on three fixed-size ring buffers of recent long mark,
short mark and preceding space durations. Their dot/dash cut line is
the geometric mean `sqrt(short_avr * long_avr)`, which is less
sensitive to outliers than the arithmetic mean (kept only as a
diagnostic). When a genuine dot/dash pair lands with the cut line
outside the pair's own range, the whole history is overwritten with
that pair: the bootstrap rule. The classifier snaps to a new sending
speed within a single element pair instead of drifting slowly.

Every debounced mark is classified against the current cut line and
appended to the in-progress character. A mark pair only *calibrates*
(words-per-minute update) when it passes the validity gate: the two
marks must differ by [`COMPARE_FACTOR`] and the space before them must
be short. That rejects false pairs formed across letter and word gaps.

Character and word boundaries are pure timeouts on elapsed space,
checked on every tick rather than on edges, each with its own pending
flag so that a long silence emits each boundary exactly once.
*/
use log::{debug, trace};

use crate::block::{Block, BlockRet};
use crate::codebook;
use crate::stream::{Streamp, new_streamp};
use crate::Result;
use crate::tone_detect::Tick;

/// Entries per timing history ring.
pub const HISTORY: usize = 10;

/// Marks shorter than this are discarded as key clicks or noise, ms.
pub const DEBOUNCE_MS: f64 = 15.0;

/// A mark pair calibrates only if the durations differ by this factor.
pub const COMPARE_FACTOR: f64 = 2.0;

/// Word boundary fires at this multiple of the dot/dash cut line.
pub const WORD_FACTOR: f64 = 3.0;

// PARIS is 50 units; with the long+short+space sum that works out to
// this numerator for a words-per-minute estimate.
const WPM_SCALE: f64 = 6000.0 * 1.06;

// History defaults, roughly a 15 WPM fist.
const DEFAULT_LONG_MS: f64 = 240.0;
const DEFAULT_SHORT_MS: f64 = 80.0;
const DEFAULT_SPACE_MS: f64 = 80.0;

// Cap for a runaway element buffer during noise storms.
const MAX_ELEMENTS: usize = 28;

/// One decoded output token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A decoded character (or prosign, or the unknown/error marker).
    Text(&'static str),
    /// A word boundary.
    Space,
}

impl Token {
    /// The token as text, for appending to a display.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Text(s) => s,
            Token::Space => " ",
        }
    }
}

/// Fixed-size ring of recent durations with a running average.
#[derive(Debug, Clone)]
struct RingHistory {
    buf: [f64; HISTORY],
    next: usize,
    avg: f64,
}

impl RingHistory {
    fn new(initial: f64) -> Self {
        Self {
            buf: [initial; HISTORY],
            next: 0,
            avg: initial,
        }
    }

    fn push(&mut self, val: f64) {
        self.buf[self.next] = val;
        self.next += 1;
        // Wrap at index == size.
        if self.next == HISTORY {
            self.next = 0;
        }
        self.avg = self.buf.iter().sum::<f64>() / HISTORY as f64;
    }

    fn fill(&mut self, val: f64) {
        self.buf = [val; HISTORY];
        self.avg = val;
    }

    fn avg(&self) -> f64 {
        self.avg
    }
}

/// The three timing histories and the thresholds derived from them.
#[derive(Debug, Clone)]
pub struct ElementHistory {
    long: RingHistory,
    short: RingHistory,
    space: RingHistory,
}

impl Default for ElementHistory {
    fn default() -> Self {
        Self {
            long: RingHistory::new(DEFAULT_LONG_MS),
            short: RingHistory::new(DEFAULT_SHORT_MS),
            space: RingHistory::new(DEFAULT_SPACE_MS),
        }
    }
}

impl ElementHistory {
    /// Record one observed (dash candidate, dot candidate, preceding
    /// space) triple.
    pub fn push(&mut self, long: f64, short: f64, space: f64) {
        self.long.push(long);
        self.short.push(short);
        self.space.push(space);
    }

    /// Overwrite every history entry with one pair's values. This is
    /// the fast re-lock when the observed pair falls outside what the
    /// averages can explain.
    pub fn bootstrap(&mut self, long: f64, short: f64, space: f64) {
        self.long.fill(long);
        self.short.fill(short);
        self.space.fill(space);
    }

    /// The dot/dash cut line: geometric mean of the two mark averages.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        (self.short.avg() * self.long.avg()).sqrt()
    }

    /// Arithmetic mean cut line. Diagnostic only; more sensitive to
    /// outliers than [`ElementHistory::threshold`].
    #[must_use]
    pub fn mean_threshold(&self) -> f64 {
        (self.short.avg() + self.long.avg()) / 2.0
    }

    /// Average long mark duration, ms.
    #[must_use]
    pub fn long_avr(&self) -> f64 {
        self.long.avg()
    }

    /// Average short mark duration, ms.
    #[must_use]
    pub fn short_avr(&self) -> f64 {
        self.short.avg()
    }

    /// Average preceding space duration, ms.
    #[must_use]
    pub fn space_avr(&self) -> f64 {
        self.space.avg()
    }

    /// Words-per-minute estimate from the current averages.
    #[must_use]
    pub fn wpm(&self) -> u32 {
        (WPM_SCALE / (self.long.avg() + self.short.avg() + self.space.avg())).round() as u32
    }
}

/// Adaptive timing classifier block: [`Tick`]s in, [`Token`]s out,
/// plus a stream of words-per-minute estimates (pushed on change).
pub struct MorseTiming {
    src: Streamp<Tick>,
    dst: Streamp<Token>,
    wpm_dst: Streamp<u32>,

    hist: ElementHistory,
    /// Milliseconds since creation or reset. Monotonic; all duration
    /// arithmetic happens on this one f64 track, never rounded.
    time_track: f64,

    tone: bool,
    mark_start: f64,
    space_start: f64,
    event_prev: f64,

    elements: String,
    pending_char: bool,
    pending_word: bool,
    char_ref: f64,
    word_ref: f64,
    last_wpm: u32,
}

impl MorseTiming {
    /// Create a new classifier reading from `src`.
    #[must_use]
    pub fn new(src: Streamp<Tick>) -> (Self, Streamp<Token>, Streamp<u32>) {
        let dst = new_streamp();
        let wpm_dst = new_streamp();
        (
            Self {
                src,
                dst: dst.clone(),
                wpm_dst: wpm_dst.clone(),
                hist: ElementHistory::default(),
                time_track: 0.0,
                tone: false,
                mark_start: 0.0,
                space_start: 0.0,
                event_prev: DEFAULT_SHORT_MS,
                elements: String::new(),
                pending_char: false,
                pending_word: false,
                char_ref: 0.0,
                word_ref: 0.0,
                last_wpm: 0,
            },
            dst,
            wpm_dst,
        )
    }

    /// Re-initialize everything: histories, timers, flags. Used on
    /// band/mode change and enable toggle.
    pub fn reset(&mut self) {
        self.hist = ElementHistory::default();
        self.time_track = 0.0;
        self.tone = false;
        self.mark_start = 0.0;
        self.space_start = 0.0;
        self.event_prev = DEFAULT_SHORT_MS;
        self.elements.clear();
        self.pending_char = false;
        self.pending_word = false;
        self.char_ref = 0.0;
        self.word_ref = 0.0;
        self.last_wpm = 0;
        debug!("MorseTiming: reset");
    }

    /// The current words-per-minute estimate.
    #[must_use]
    pub fn wpm(&self) -> u32 {
        self.hist.wpm()
    }

    fn key_up(&mut self) {
        let event_new = self.time_track - self.mark_start;
        if event_new < DEBOUNCE_MS {
            // A key click or noise blip. Discard entirely: no event,
            // no state change; the surrounding space just continues.
            trace!("MorseTiming: dropped {event_new:.1} ms blip");
            return;
        }

        // Larger of the two recent marks is the dash candidate,
        // smaller the dot candidate, regardless of arrival order.
        let long_cand = event_new.max(self.event_prev);
        let short_cand = event_new.min(self.event_prev);
        let space_prev = self.mark_start - self.space_start;
        self.hist.push(long_cand, short_cand, space_prev);

        // A pair only calibrates when the marks genuinely contrast and
        // the space before them is elemental, not a letter/word gap.
        let valid = long_cand >= COMPARE_FACTOR * short_cand
            && space_prev <= COMPARE_FACTOR * short_cand;
        if valid {
            let threshold = self.hist.threshold();
            if threshold < short_cand || threshold > long_cand {
                self.hist.bootstrap(long_cand, short_cand, space_prev);
                debug!(
                    "MorseTiming: bootstrap to {short_cand:.0}/{long_cand:.0} ms \
                     (threshold was {threshold:.0})"
                );
            }
            let wpm = self.hist.wpm();
            if wpm != self.last_wpm {
                debug!("MorseTiming: {wpm} WPM (mean threshold {:.0})", self.hist.mean_threshold());
                self.last_wpm = wpm;
                self.wpm_dst.push(wpm);
            }
        }

        // Every accepted mark becomes an element.
        if self.elements.len() < MAX_ELEMENTS {
            self.elements.push(if event_new <= self.hist.threshold() {
                '.'
            } else {
                '-'
            });
        }
        self.pending_char = true;
        self.pending_word = true;

        self.event_prev = event_new;
        self.space_start = self.time_track;
        self.char_ref = self.time_track;
        self.word_ref = self.time_track;
    }

    fn track_space(&mut self) {
        let threshold = self.hist.threshold();
        if self.pending_char && self.time_track - self.char_ref >= threshold {
            let text = codebook::lookup(&self.elements);
            trace!("MorseTiming: '{}' -> {text}", self.elements);
            self.dst.push(Token::Text(text));
            self.elements.clear();
            self.pending_char = false;
            self.char_ref = self.time_track;
        }
        if self.pending_word && self.time_track - self.word_ref >= WORD_FACTOR * threshold {
            self.dst.push(Token::Space);
            self.pending_word = false;
            self.word_ref = self.time_track;
        }
    }

    fn tick(&mut self, t: Tick) {
        self.time_track += t.ms as f64;
        if t.on && !self.tone {
            self.mark_start = self.time_track;
        } else if !t.on && self.tone {
            self.key_up();
        }
        self.tone = t.on;
        if !t.on {
            self.track_space();
        }
    }
}

impl Block for MorseTiming {
    fn block_name(&self) -> &'static str {
        "MorseTiming"
    }

    fn work(&mut self) -> Result<BlockRet> {
        let mut n = 0;
        while let Some(t) = self.src.pop() {
            self.tick(t);
            n += 1;
        }
        if n > 0 {
            Ok(BlockRet::Again)
        } else if self.src.eof() {
            self.dst.set_eof();
            self.wpm_dst.set_eof();
            Ok(BlockRet::EOF)
        } else {
            Ok(BlockRet::Noop)
        }
    }
}

/* vim: textwidth=80
 */
