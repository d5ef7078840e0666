//! Morse code receiver.
//!
//! Decodes CW from a raw audio capture, or from a self-generated keyed
//! tone for a quick demo:
//!
//! ```text
//! cargo run --example cwrx -- --text 'CQ CQ DE M0THC' --wpm 22
//! cargo run --example cwrx -- --read capture.f32 --sample-rate 48k
//! ```
use std::io::Write;

use anyhow::Result;
use clap::Parser;

use rustcw::Float;
use rustcw::block::{Block, BlockRet};
use rustcw::blocks::{KeyedToneSource, MorseTiming, Token, ToneDetector, VectorSource};
use rustcw::config::Settings;
use rustcw::graph::Graph;
use rustcw::stream::Streamp;

#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Opt {
    /// Verbosity level.
    #[arg(short, default_value_t = 1)]
    verbose: usize,

    /// Raw audio file to decode: mono little-endian f32 samples.
    #[arg(long)]
    read: Option<std::path::PathBuf>,

    /// Message to self-generate instead of reading audio.
    #[arg(long)]
    text: Option<String>,

    /// Morse speed for --text, in words per minute.
    #[arg(long, default_value_t = 20.0)]
    wpm: Float,

    /// Audio sample rate.
    #[arg(long, value_parser = parse_frequency, default_value = "8k")]
    sample_rate: f64,

    /// Samples per detector interval.
    #[arg(long, default_value_t = 32)]
    fft_size: usize,

    /// Passband low edge, Hz.
    #[arg(long, value_parser = parse_frequency, default_value = "300")]
    low: f64,

    /// Passband high edge, Hz.
    #[arg(long, value_parser = parse_frequency, default_value = "1.8k")]
    high: f64,

    /// Tone SNR target in dB.
    #[arg(long, default_value_t = 10.0)]
    snr: Float,
}

/// Parse a frequency like `48k` or `1.2m` into Hz.
fn parse_frequency(s: &str) -> std::result::Result<f64, String> {
    let (num, mult) = match s.to_lowercase() {
        x if x.ends_with('k') => (x[..x.len() - 1].to_string(), 1_000.0),
        x if x.ends_with('m') => (x[..x.len() - 1].to_string(), 1_000_000.0),
        x => (x, 1.0),
    };
    num.parse::<f64>()
        .map(|v| v * mult)
        .map_err(|e| format!("{e}"))
}

/// Print decoded tokens as they arrive, and WPM changes on stderr.
struct PrintSink {
    tokens: Streamp<Token>,
    wpm: Streamp<u32>,
}

impl Block for PrintSink {
    fn block_name(&self) -> &'static str {
        "PrintSink"
    }

    fn work(&mut self) -> rustcw::Result<BlockRet> {
        let mut n = 0;
        while let Some(wpm) = self.wpm.pop() {
            log::info!("{wpm} WPM");
        }
        while let Some(tok) = self.tokens.pop() {
            print!("{}", tok.as_str());
            std::io::stdout().flush()?;
            n += 1;
        }
        if n > 0 {
            Ok(BlockRet::Again)
        } else if self.tokens.eof() {
            Ok(BlockRet::EOF)
        } else {
            Ok(BlockRet::Noop)
        }
    }
}

fn read_f32(path: &std::path::Path) -> Result<Vec<Float>> {
    let raw = std::fs::read(path)?;
    Ok(raw
        .chunks_exact(4)
        .map(|b| Float::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    stderrlog::new()
        .module(module_path!())
        .module("rustcw")
        .verbosity(opt.verbose)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let settings = Settings::default();
    settings.update(|c| c.snr_db = opt.snr);

    let mut g = Graph::new();
    let samp_rate = opt.sample_rate as Float;
    let audio = match (&opt.read, &opt.text) {
        (Some(path), None) => {
            let (src, audio) = VectorSource::new(read_f32(path)?);
            g.add(Box::new(src));
            audio
        }
        (None, Some(text)) => {
            let (src, audio) = KeyedToneSource::new(text, opt.wpm, 700.0, 0.5, samp_rate);
            g.add(Box::new(src));
            audio
        }
        _ => return Err(anyhow::Error::msg("pass exactly one of --read and --text")),
    };

    let (mut det, ticks) = ToneDetector::new(audio, samp_rate, opt.fft_size, settings)?;
    det.set_passband(opt.low as Float, opt.high as Float);
    let (timing, tokens, wpm) = MorseTiming::new(ticks);
    g.add(Box::new(det));
    g.add(Box::new(timing));
    g.add(Box::new(PrintSink { tokens, wpm }));

    let cancel = g.cancel_token();
    ctrlc::set_handler(move || {
        cancel.cancel();
    })
    .expect("Error setting Ctrl-C handler");
    g.run()?;
    println!();
    Ok(())
}
