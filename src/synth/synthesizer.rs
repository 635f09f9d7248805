//! The top-level synthesizer: owns the loaded soundfonts and MIDI channels,
//! dispatches MIDI and SysEx messages, and mixes every channel down to an
//! interleaved stereo render buffer.

use std::path::Path;
use std::sync::Arc;

use super::channel::Channel;
use super::midi::{cc, join_bytes, MessageStatus, PERCUSSION_CHANNEL};
use super::soundfont::{SoundFont, SoundFontError, PERCUSSION_BANK};
use super::stereo::StereoValue;

pub const DEFAULT_OUTPUT_RATE: f64 = 44100.0;
pub const DEFAULT_NUM_CHANNELS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standard {
    Gm,
    Gs,
    Xg,
}

const GM_SYSTEM_ON: [u8; 6] = [0xf0, 0x7e, 0, 0x09, 0x01, 0xf7];
const GM_SYSTEM_OFF: [u8; 6] = [0xf0, 0x7e, 0, 0x09, 0x02, 0xf7];
const GS_RESET: [u8; 11] = [0xf0, 0x41, 0x10, 0x42, 0x12, 0x40, 0x00, 0x7f, 0x00, 0x41, 0xf7];
const GS_SYSTEM_MODE_SET1: [u8; 11] = [0xf0, 0x41, 0x10, 0x42, 0x12, 0x00, 0x00, 0x7f, 0x00, 0x01, 0xf7];
const GS_SYSTEM_MODE_SET2: [u8; 11] = [0xf0, 0x41, 0x10, 0x42, 0x12, 0x00, 0x00, 0x7f, 0x01, 0x00, 0xf7];
const XG_SYSTEM_ON: [u8; 9] = [0xf0, 0x43, 0, 0x4c, 0x00, 0x00, 0x7e, 0x00, 0xf7];

/// Byte index 2 of every recognized pattern is the device ID, which varies
/// by sender and is never part of the match.
fn matches_sys_ex(data: &[u8], pattern: &[u8]) -> bool {
    data.len() == pattern.len() && data.iter().enumerate().all(|(i, &b)| i == 2 || b == pattern[i])
}

pub struct Synthesizer {
    output_rate: f64,
    channels: Vec<Channel>,
    soundfonts: Vec<Arc<SoundFont>>,
    volume: f64,
    standard: Standard,
    standard_fixed: bool,
}

impl Synthesizer {
    pub fn new(output_rate: f64, num_channels: usize) -> Synthesizer {
        Synthesizer {
            output_rate,
            channels: (0..num_channels).map(|_| Channel::new(output_rate)).collect(),
            soundfonts: Vec::new(),
            volume: 1.0,
            standard: Standard::Gs,
            standard_fixed: false,
        }
    }

    pub fn output_rate(&self) -> f64 {
        self.output_rate
    }

    pub fn load_soundfont<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SoundFontError> {
        self.soundfonts.push(Arc::new(SoundFont::load(path)?));
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.max(0.0);
    }

    pub fn set_midi_standard(&mut self, standard: Standard, fixed: bool) {
        self.standard = standard;
        self.standard_fixed = fixed;
    }

    pub fn process_sys_ex(&mut self, data: &[u8]) {
        if self.standard_fixed {
            return;
        }
        if matches_sys_ex(data, &GM_SYSTEM_ON) {
            self.standard = Standard::Gm;
        } else if matches_sys_ex(data, &GM_SYSTEM_OFF) {
            self.standard = Standard::Gs;
        } else if matches_sys_ex(data, &GS_RESET)
            || matches_sys_ex(data, &GS_SYSTEM_MODE_SET1)
            || matches_sys_ex(data, &GS_SYSTEM_MODE_SET2)
        {
            self.standard = Standard::Gs;
        } else if matches_sys_ex(data, &XG_SYSTEM_ON) {
            self.standard = Standard::Xg;
        }
    }

    pub fn process_channel_message(&mut self, status: MessageStatus, channel: usize, param1: u8, param2: u8) {
        if channel >= self.channels.len() {
            return;
        }
        match status {
            MessageStatus::NoteOff => self.channels[channel].note_off(param1),
            MessageStatus::NoteOn => {
                if !self.channels[channel].has_preset() {
                    let bank = if channel == PERCUSSION_CHANNEL { PERCUSSION_BANK } else { 0 };
                    if let Some((sf, idx)) = self.find_preset(bank, 0) {
                        self.channels[channel].set_preset(sf, idx);
                    }
                }
                self.channels[channel].note_on(param1, param2);
            }
            MessageStatus::KeyPressure => self.channels[channel].key_pressure(param1, param2),
            MessageStatus::ControlChange => self.channels[channel].control_change(param1, param2),
            MessageStatus::ProgramChange => {
                let bank = self.resolve_bank(channel);
                if let Some((sf, idx)) = self.find_preset(bank, param1 as u16) {
                    self.channels[channel].set_preset(sf, idx);
                }
            }
            MessageStatus::ChannelPressure => self.channels[channel].channel_pressure(param1),
            MessageStatus::PitchBend => self.channels[channel].pitch_bend(join_bytes(param2, param1)),
        }
    }

    pub fn pause(&mut self) {
        for ch in &mut self.channels {
            ch.control_change(cc::ALL_NOTES_OFF, 0);
        }
    }

    pub fn stop(&mut self) {
        for ch in &mut self.channels {
            ch.control_change(cc::ALL_SOUND_OFF, 0);
        }
    }

    pub fn render_float(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_mut(2) {
            let sum = self.mix() * self.volume;
            frame[0] = sum.left as f32;
            if frame.len() > 1 {
                frame[1] = sum.right as f32;
            }
        }
    }

    pub fn render_s16(&mut self, buffer: &mut [i16]) {
        for frame in buffer.chunks_mut(2) {
            let sum = self.mix() * self.volume;
            frame[0] = clip_s16(sum.left);
            if frame.len() > 1 {
                frame[1] = clip_s16(sum.right);
            }
        }
    }

    fn mix(&mut self) -> StereoValue {
        let mut sum = StereoValue::ZERO;
        for ch in &mut self.channels {
            sum += ch.render();
        }
        sum
    }

    fn resolve_bank(&self, channel: usize) -> u16 {
        let bank = self.channels[channel].bank();
        match self.standard {
            Standard::Gm => 0,
            Standard::Gs => bank.msb as u16,
            Standard::Xg => {
                if bank.msb == 127 {
                    PERCUSSION_BANK
                } else {
                    bank.lsb as u16
                }
            }
        }
    }

    /// (bank, preset) -> (bank, 0) for a percussion bank with no exact
    /// match -> (0, preset) for a non-zero bank -> (0, 0) as the last
    /// resort. Returns `None` only if not even a GM piano is present.
    fn find_preset(&self, bank: u16, preset_id: u16) -> Option<(Arc<SoundFont>, usize)> {
        let lookup = |b: u16, p: u16| {
            self.soundfonts.iter().find_map(|sf| sf.presets().iter().position(|pr| pr.bank == b && pr.preset_id == p).map(|idx| (sf.clone(), idx)))
        };

        lookup(bank, preset_id)
            .or_else(|| (bank == PERCUSSION_BANK && preset_id != 0).then(|| lookup(PERCUSSION_BANK, 0)).flatten())
            .or_else(|| (bank != 0).then(|| lookup(0, preset_id)).flatten())
            .or_else(|| (preset_id != 0).then(|| lookup(0, 0)).flatten())
    }
}

fn clip_s16(x: f64) -> i16 {
    if x <= -1.00004566 {
        i16::MIN
    } else if x >= 1.00001514 {
        i16::MAX
    } else {
        (x * 32767.5) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_synth_renders_silence() {
        let mut synth = Synthesizer::new(DEFAULT_OUTPUT_RATE, DEFAULT_NUM_CHANNELS);
        let mut buffer = vec![0.0f32; 64];
        synth.render_float(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn gm_system_on_sysex_switches_standard() {
        let mut synth = Synthesizer::new(DEFAULT_OUTPUT_RATE, DEFAULT_NUM_CHANNELS);
        synth.process_sys_ex(&GM_SYSTEM_ON);
        assert_eq!(synth.standard, Standard::Gm);
    }

    #[test]
    fn sysex_device_id_byte_is_ignored() {
        let mut synth = Synthesizer::new(DEFAULT_OUTPUT_RATE, DEFAULT_NUM_CHANNELS);
        let mut variant = GM_SYSTEM_ON;
        variant[2] = 0x42; // arbitrary device id
        synth.process_sys_ex(&variant);
        assert_eq!(synth.standard, Standard::Gm);
    }

    #[test]
    fn fixed_standard_ignores_sysex_resets() {
        let mut synth = Synthesizer::new(DEFAULT_OUTPUT_RATE, DEFAULT_NUM_CHANNELS);
        synth.set_midi_standard(Standard::Xg, true);
        synth.process_sys_ex(&GM_SYSTEM_ON);
        assert_eq!(synth.standard, Standard::Xg);
    }

    #[test]
    fn out_of_range_channel_is_ignored() {
        let mut synth = Synthesizer::new(DEFAULT_OUTPUT_RATE, 4);
        synth.process_channel_message(MessageStatus::NoteOn, 99, 60, 100);
    }

    #[test]
    fn clip_s16_saturates_past_the_canonical_cutoffs() {
        assert_eq!(clip_s16(-2.0), i16::MIN);
        assert_eq!(clip_s16(2.0), i16::MAX);
        assert_eq!(clip_s16(0.0), 0);
    }
}
