//! Headless CLI: pumps a fixed number of sim tics over an optional WAD map,
//! then (given an SF2 bank) plays a short note sequence through the
//! synthesizer and writes the render to a `.wav` file.
//!
//! ```bash
//! cargo run --bin doomcore-demo -- --wad doom1.wad --map E1M1 --soundfont gm.sf2
//! ```

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use doomcore::sim::TicRunner;
use doomcore::synth::{MessageStatus, Synthesizer};
use doomcore::wad::{load_level, Wad};
use doomcore::world::TextureBank;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// IWAD/PWAD to load a map from; tic pumping is skipped without one
    #[arg(long, value_name = "FILE")]
    wad: Option<PathBuf>,

    /// Map lump to simulate (e.g. E1M1, MAP01)
    #[arg(long, default_value = "E1M1")]
    map: String,

    /// Number of 35Hz tics to pump
    #[arg(long, default_value_t = 350)]
    tics: u64,

    /// SF2 bank to load; audio rendering is skipped without one
    #[arg(long, value_name = "FILE")]
    soundfont: Option<PathBuf>,

    /// Output WAV path
    #[arg(long, default_value = "demo.wav")]
    out: PathBuf,

    /// Output sample rate
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,
}

/// A short rising arpeggio, each note held for this many seconds before
/// release, with a release tail appended after the last note.
const NOTE_SEQUENCE: &[u8] = &[60, 64, 67, 72];
const NOTE_DURATION_SECS: f64 = 0.4;
const RELEASE_TAIL_SECS: f64 = 1.0;

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    if let Some(wad_path) = &opts.wad {
        run_sim(wad_path, &opts.map, opts.tics)?;
    }

    if let Some(sf2_path) = &opts.soundfont {
        let samples = render_demo_tune(sf2_path, opts.sample_rate)?;
        write_wav(&opts.out, &samples, 2, opts.sample_rate)?;
        info!("wrote {} stereo frames to {}", samples.len() / 2, opts.out.display());
    }

    Ok(())
}

fn run_sim(wad_path: &PathBuf, map: &str, tics: u64) -> Result<()> {
    let wad = Wad::from_file(wad_path).with_context(|| format!("loading {}", wad_path.display()))?;
    let marker = wad.find_lump(map).with_context(|| format!("map lump {map} not found"))?;
    let mut bank = TextureBank::new();
    let level = load_level(&wad, marker, &mut bank).with_context(|| format!("parsing map {map}"))?;
    let mut runner = TicRunner::new(level);
    runner.pump(tics);
    info!("pumped {} tics on {}", runner.tic_count(), map);
    Ok(())
}

fn render_demo_tune(sf2_path: &PathBuf, sample_rate: u32) -> Result<Vec<i16>> {
    let mut synth = Synthesizer::new(sample_rate as f64, 16);
    synth.load_soundfont(sf2_path).with_context(|| format!("loading {}", sf2_path.display()))?;
    synth.process_channel_message(MessageStatus::ProgramChange, 0, 0, 0);

    let note_frames = (NOTE_DURATION_SECS * sample_rate as f64) as usize;
    let tail_frames = (RELEASE_TAIL_SECS * sample_rate as f64) as usize;
    let mut out = Vec::with_capacity((NOTE_SEQUENCE.len() * note_frames + tail_frames) * 2);

    for &key in NOTE_SEQUENCE {
        synth.process_channel_message(MessageStatus::NoteOn, 0, key, 100);
        let mut chunk = vec![0i16; note_frames * 2];
        synth.render_s16(&mut chunk);
        out.extend_from_slice(&chunk);
        synth.process_channel_message(MessageStatus::NoteOff, 0, key, 0);
    }

    let mut tail = vec![0i16; tail_frames * 2];
    synth.render_s16(&mut tail);
    out.extend_from_slice(&tail);

    Ok(out)
}

/// Writes 16-bit PCM as a canonical RIFF/WAVE file. Small enough (~11
/// header fields) that pulling in a crate for it isn't worth it.
fn write_wav(path: &PathBuf, samples: &[i16], channels: u16, sample_rate: u32) -> io::Result<()> {
    let bits_per_sample: u16 = 16;
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (samples.len() * 2) as u32;

    let mut file = File::create(path)?;
    file.write_all(b"RIFF")?;
    file.write_all(&(36 + data_size).to_le_bytes())?;
    file.write_all(b"WAVE")?;

    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?; // PCM fmt chunk size
    file.write_all(&1u16.to_le_bytes())?; // PCM format tag
    file.write_all(&channels.to_le_bytes())?;
    file.write_all(&sample_rate.to_le_bytes())?;
    file.write_all(&byte_rate.to_le_bytes())?;
    file.write_all(&block_align.to_le_bytes())?;
    file.write_all(&bits_per_sample.to_le_bytes())?;

    file.write_all(b"data")?;
    file.write_all(&data_size.to_le_bytes())?;
    for sample in samples {
        file.write_all(&sample.to_le_bytes())?;
    }

    Ok(())
}
