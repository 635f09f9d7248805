//! One of the synthesizer's MIDI channels: the active preset, the 128-entry
//! controller table, RPN/NRPN data-entry state, and the voices it has
//! spawned.

use std::sync::Arc;

use super::midi::{cc, join_bytes, Bank, Rpn, NUM_CONTROLLERS};
use super::modulator::{default_parameters, GeneralController};
use super::soundfont::{Preset, SoundFont, PERCUSSION_BANK};
use super::stereo::StereoValue;
use super::voice::{State as VoiceState, Voice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataEntryMode {
    Rpn,
    Nrpn,
}

struct ChannelPreset {
    soundfont: Arc<SoundFont>,
    preset_index: usize,
}

impl ChannelPreset {
    fn preset(&self) -> &Preset {
        &self.soundfont.presets()[self.preset_index]
    }
}

pub struct Channel {
    output_rate: f64,
    preset: Option<ChannelPreset>,
    voices: Vec<Voice>,
    controllers: [u8; NUM_CONTROLLERS],
    rpn_msb: u8,
    rpn_lsb: u8,
    data_entry_mode: DataEntryMode,
    rpn_data: [u16; 3],
    key_pressures: [u8; 128],
    channel_pressure: u8,
    pitch_bend: u16,
    next_note_id: u64,
}

impl Channel {
    pub fn new(output_rate: f64) -> Channel {
        let mut controllers = [0u8; NUM_CONTROLLERS];
        controllers[cc::VOLUME as usize] = 100;
        controllers[cc::PAN as usize] = 64;
        controllers[cc::EXPRESSION as usize] = 127;
        controllers[cc::RPN_LSB as usize] = 127;
        controllers[cc::RPN_MSB as usize] = 127;

        Channel {
            output_rate,
            preset: None,
            voices: Vec::new(),
            controllers,
            rpn_msb: 127,
            rpn_lsb: 127,
            data_entry_mode: DataEntryMode::Rpn,
            rpn_data: [256, 8192, 8192], // 2-semitone bend range, centered fine/coarse tune
            key_pressures: [0; 128],
            channel_pressure: 0,
            pitch_bend: 8192,
            next_note_id: 0,
        }
    }

    pub fn has_preset(&self) -> bool {
        self.preset.is_some()
    }

    pub fn bank(&self) -> Bank {
        Bank { msb: self.controllers[cc::BANK_SELECT_MSB as usize], lsb: self.controllers[cc::BANK_SELECT_LSB as usize] }
    }

    pub fn set_preset(&mut self, soundfont: Arc<SoundFont>, preset_index: usize) {
        self.preset = Some(ChannelPreset { soundfont, preset_index });
    }

    pub fn note_on(&mut self, key: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(key);
            return;
        }
        let Some(channel_preset) = &self.preset else { return };
        let soundfont = channel_preset.soundfont.clone();
        let preset = channel_preset.preset();
        let note_id = self.next_note_id;
        self.next_note_id += 1;
        let is_percussion = preset.bank == PERCUSSION_BANK;

        let mut spawned = Vec::new();
        for preset_zone in &preset.zones {
            if !preset_zone.is_in_range(key as i8, velocity as i8) {
                continue;
            }
            let Some(inst_idx) = preset_zone.instrument_index() else { continue };
            let Some(instrument) = soundfont.instrument(inst_idx) else { continue };

            for inst_zone in &instrument.zones {
                if !inst_zone.is_in_range(key as i8, velocity as i8) {
                    continue;
                }
                let Some(sample_idx) = inst_zone.sample_index() else { continue };
                let Some(sample) = soundfont.sample(sample_idx) else { continue };

                let mut generators = inst_zone.generators.clone();
                generators.add(&preset_zone.generators);

                let mut mod_params = inst_zone.modulator_parameters.clone();
                mod_params.merge_and_add(&preset_zone.modulator_parameters);
                mod_params.merge(default_parameters());

                let mut voice =
                    Voice::new(note_id, self.output_rate, sample.clone(), generators, &mod_params, key as i8, velocity as i8);
                voice.set_percussion(is_percussion);
                spawned.push(voice);
            }
        }

        for voice in spawned {
            self.add_voice(voice);
        }
    }

    pub fn note_off(&mut self, key: u8) {
        let sustain = self.controllers[cc::SUSTAIN as usize] >= 64;
        for voice in &mut self.voices {
            if voice.key() as u8 == key && voice.state() == VoiceState::Playing {
                voice.release(sustain);
            }
        }
    }

    pub fn key_pressure(&mut self, key: u8, value: u8) {
        self.key_pressures[key as usize] = value;
        for voice in &mut self.voices {
            if voice.key() as u8 == key {
                voice.update_sf_controller(GeneralController::PolyPressure, value as f64);
            }
        }
    }

    pub fn channel_pressure(&mut self, value: u8) {
        self.channel_pressure = value;
        for voice in &mut self.voices {
            voice.update_sf_controller(GeneralController::ChannelPressure, value as f64);
        }
    }

    /// `value` is the full 14-bit pitch-bend position (8192 == centered).
    pub fn pitch_bend(&mut self, value: u16) {
        self.pitch_bend = value;
        for voice in &mut self.voices {
            voice.update_sf_controller(GeneralController::PitchWheel, value as f64);
        }
    }

    pub fn control_change(&mut self, controller: u8, value: u8) {
        self.controllers[controller as usize] = value;
        match controller {
            cc::DATA_ENTRY_MSB | cc::DATA_ENTRY_LSB => {
                if self.data_entry_mode == DataEntryMode::Rpn {
                    if let Some(rpn) = Rpn::from_index(join_bytes(self.rpn_msb, self.rpn_lsb)) {
                        let data = join_bytes(
                            self.controllers[cc::DATA_ENTRY_MSB as usize],
                            self.controllers[cc::DATA_ENTRY_LSB as usize],
                        );
                        self.rpn_data[rpn as usize] = data;
                        self.update_rpn(rpn);
                    }
                }
            }
            cc::SUSTAIN => {
                if value < 64 {
                    for voice in &mut self.voices {
                        if voice.state() == VoiceState::Sustained {
                            voice.release(false);
                        }
                    }
                }
            }
            cc::DATA_INCREMENT | cc::DATA_DECREMENT => {
                if let Some(rpn) = Rpn::from_index(join_bytes(self.rpn_msb, self.rpn_lsb)) {
                    let delta: i32 = if controller == cc::DATA_INCREMENT { 128 } else { -128 };
                    let current = self.rpn_data[rpn as usize] as i32;
                    self.rpn_data[rpn as usize] = (current + delta).clamp(0, 0x3fff) as u16;
                    self.update_rpn(rpn);
                }
            }
            cc::NRPN_LSB | cc::NRPN_MSB => {
                self.data_entry_mode = DataEntryMode::Nrpn;
            }
            cc::RPN_LSB => {
                self.data_entry_mode = DataEntryMode::Rpn;
                self.rpn_lsb = value;
            }
            cc::RPN_MSB => {
                self.data_entry_mode = DataEntryMode::Rpn;
                self.rpn_msb = value;
            }
            cc::ALL_SOUND_OFF => {
                self.voices.clear();
            }
            cc::RESET_ALL_CONTROLLERS => {
                self.reset_all_controllers();
            }
            cc::ALL_NOTES_OFF => {
                let sustain = self.controllers[cc::SUSTAIN as usize] >= 64;
                for voice in &mut self.voices {
                    voice.release(sustain);
                }
            }
            _ => {
                for voice in &mut self.voices {
                    voice.update_midi_controller(controller, value as f64);
                }
            }
        }
    }

    pub fn render(&mut self) -> StereoValue {
        let mut out = StereoValue::ZERO;
        for voice in &mut self.voices {
            voice.update();
            if voice.state() != VoiceState::Finished {
                out += voice.render();
            }
        }
        out
    }

    fn fine_tuning(&self) -> f64 {
        (self.rpn_data[Rpn::FineTuning as usize] as f64 - 8192.0) / 81.92
    }

    fn coarse_tuning(&self) -> f64 {
        (self.rpn_data[Rpn::CoarseTuning as usize] as f64 - 8192.0) / 128.0
    }

    fn update_rpn(&mut self, rpn: Rpn) {
        let data = self.rpn_data[rpn as usize] as f64;
        match rpn {
            Rpn::PitchBendSensitivity => {
                let semitones = data / 128.0;
                for voice in &mut self.voices {
                    voice.update_sf_controller(GeneralController::PitchWheelSensitivity, semitones);
                }
            }
            Rpn::FineTuning => {
                let cents = (data - 8192.0) / 81.92;
                for voice in &mut self.voices {
                    voice.update_fine_tuning(cents);
                }
            }
            Rpn::CoarseTuning => {
                let semitones = (data - 8192.0) / 128.0;
                for voice in &mut self.voices {
                    voice.update_coarse_tuning(semitones);
                }
            }
        }
    }

    fn reset_all_controllers(&mut self) {
        self.key_pressures = [0; 128];
        self.channel_pressure = 0;
        self.pitch_bend = 8192;
        for voice in &mut self.voices {
            voice.update_sf_controller(GeneralController::ChannelPressure, 0.0);
            voice.update_sf_controller(GeneralController::PitchWheel, 8192.0);
        }
        for c in 1..=121u8 {
            if (70..=79).contains(&c) || (91..=95).contains(&c) {
                continue;
            }
            let value = if c == cc::EXPRESSION || c == cc::RPN_LSB || c == cc::RPN_MSB { 127 } else { 0 };
            self.controllers[c as usize] = value;
            for voice in &mut self.voices {
                voice.update_midi_controller(c, value as f64);
            }
        }
    }

    fn add_voice(&mut self, mut voice: Voice) {
        voice.update_sf_controller(GeneralController::PolyPressure, self.key_pressures[voice.key() as usize] as f64);
        voice.update_sf_controller(GeneralController::ChannelPressure, self.channel_pressure as f64);
        voice.update_sf_controller(GeneralController::PitchWheel, self.pitch_bend as f64);
        voice.update_sf_controller(
            GeneralController::PitchWheelSensitivity,
            self.rpn_data[Rpn::PitchBendSensitivity as usize] as f64 / 128.0,
        );
        voice.update_fine_tuning(self.fine_tuning());
        voice.update_coarse_tuning(self.coarse_tuning());
        for (cc_num, &value) in self.controllers.iter().enumerate() {
            voice.update_midi_controller(cc_num as u8, value as f64);
        }

        if voice.exclusive_class() != 0 {
            let class = voice.exclusive_class();
            let note_id = voice.note_id();
            for other in &mut self.voices {
                if other.exclusive_class() == class && other.note_id() != note_id {
                    other.release(false);
                }
            }
        }

        if let Some(slot) = self.voices.iter_mut().find(|v| v.state() == VoiceState::Finished) {
            *slot = voice;
        } else {
            self.voices.push(voice);
        }
    }
}
