//! End to end decode tests: audio in, text out.
use anyhow::Result;
use rand::{Rng, SeedableRng, rngs::StdRng};

use rustcw::Float;
use rustcw::block::{Block, BlockRet};
use rustcw::blocks::{KeyedToneSource, MorseTiming, Token, ToneDetector, VectorSink};
use rustcw::config::Settings;
use rustcw::decoder::CwDecoder;
use rustcw::graph::Graph;

const SAMP_RATE: Float = 8000.0;
const FFT_SIZE: usize = 32;
const TONE_HZ: Float = 750.0;

fn burst(audio: &mut Vec<Float>, ms: Float) {
    let n = (SAMP_RATE * ms / 1000.0).round() as usize;
    let k = 2.0 * std::f32::consts::PI * TONE_HZ / SAMP_RATE;
    let start = audio.len();
    audio.extend((0..n).map(|i| 0.5 * (k * (start + i) as Float).sin()));
}

fn silence(audio: &mut Vec<Float>, ms: Float) {
    let n = (SAMP_RATE * ms / 1000.0).round() as usize;
    audio.extend(std::iter::repeat(0.0).take(n));
}

fn add_noise(audio: &mut [Float], amplitude: Float, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for s in audio {
        *s += rng.random_range(-amplitude..amplitude);
    }
}

fn decode(audio: &[Float]) -> Result<(String, Vec<u32>)> {
    let mut dec = CwDecoder::new(SAMP_RATE, FFT_SIZE, Settings::default())?;
    dec.set_passband(300.0, 1800.0);
    for chunk in audio.chunks(100) {
        dec.process(chunk)?;
    }
    let mut text = String::new();
    while let Some(tok) = dec.poll() {
        text.push_str(tok.as_str());
    }
    let wpm = std::iter::from_fn(|| dec.poll_wpm()).collect();
    Ok((text, wpm))
}

/// 60 ms dots and 180 ms dashes with 60 ms element gaps is SOS as a
/// prosign at roughly 20 WPM. One word gap after it, one space token
/// out, and never more than one.
#[test]
fn sos_prosign_at_spec_timing() -> Result<()> {
    let mut audio = Vec::new();
    for (i, ms) in [60.0, 60.0, 60.0, 180.0, 180.0, 180.0, 60.0, 60.0, 60.0]
        .iter()
        .enumerate()
    {
        if i > 0 {
            silence(&mut audio, 60.0);
        }
        burst(&mut audio, *ms);
    }
    silence(&mut audio, 420.0);

    let (text, wpm) = decode(&audio)?;
    assert_eq!(text, "SOS ");
    let last = *wpm.last().expect("no WPM estimate");
    assert!((18..=22).contains(&last), "estimated {last} WPM");
    Ok(())
}

/// The same message with 180 ms gaps between the letters decodes as
/// three characters, and the 420 ms word gap as exactly one space.
#[test]
fn sos_letters_at_spec_timing() -> Result<()> {
    let mut audio = Vec::new();
    for (i, marks) in [[60.0; 3], [180.0; 3], [60.0; 3]].iter().enumerate() {
        if i > 0 {
            silence(&mut audio, 180.0);
        }
        for (j, ms) in marks.iter().enumerate() {
            if j > 0 {
                silence(&mut audio, 60.0);
            }
            burst(&mut audio, *ms);
        }
    }
    silence(&mut audio, 420.0);

    let (text, _) = decode(&audio)?;
    assert_eq!(text, "SOS ");
    Ok(())
}

/// Feeding the decoder from the symmetric transmit-side generator must
/// reproduce the text, with a steady noise floor under it.
#[test]
fn round_trip_through_keyer() -> Result<()> {
    for wpm in [15.0, 20.0, 25.0] {
        let (mut src, out) = KeyedToneSource::new("CQ CQ DE M0THC", wpm, TONE_HZ, 0.5, SAMP_RATE);
        assert!(matches!(src.work()?, BlockRet::EOF));
        let mut audio: Vec<Float> = std::iter::from_fn(|| out.pop()).collect();
        add_noise(&mut audio, 0.02, 42);

        let (text, estimates) = decode(&audio)?;
        assert_eq!(text, "CQ CQ DE M0THC ", "at {wpm} WPM");
        let last = *estimates.last().expect("no WPM estimate") as f64;
        assert!(
            (last - wpm as f64).abs() <= 6.0,
            "estimated {last} at {wpm} WPM"
        );
    }
    Ok(())
}

/// The same pipeline, expressed as a flowgraph.
#[test]
fn graph_pipeline() -> Result<()> {
    let (src, audio) = KeyedToneSource::new("cq", 20.0, TONE_HZ, 0.5, SAMP_RATE);
    let (mut det, ticks) = ToneDetector::new(audio, SAMP_RATE, FFT_SIZE, Settings::default())?;
    det.set_passband(300.0, 1800.0);
    let (timing, tokens, _wpm) = MorseTiming::new(ticks);
    let sink = VectorSink::new(tokens);
    let hook = sink.hook();

    let mut g = Graph::new();
    g.add(Box::new(src));
    g.add(Box::new(det));
    g.add(Box::new(timing));
    g.add(Box::new(sink));
    g.run()?;

    let text: String = hook.data().iter().map(Token::as_str).collect();
    assert_eq!(text, "CQ ");
    Ok(())
}

/// A pure noise floor must not decode into anything.
#[test]
fn noise_floor_stays_silent() -> Result<()> {
    let mut audio = vec![0.0; 8 * SAMP_RATE as usize];
    add_noise(&mut audio, 0.05, 7);
    let (text, wpm) = decode(&audio)?;
    assert_eq!(text, "");
    assert!(wpm.is_empty());
    Ok(())
}
