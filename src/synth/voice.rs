//! A single playing note: one sample, its envelopes and LFOs, and the
//! modulator graph steering them, rendered one stereo sample at a time.

use std::sync::Arc;

use super::conversion::{attenuation_to_amplitude, convex, key_to_hertz};
use super::envelope::{Envelope, Phase};
use super::fixed_point::FixedPoint;
use super::generator::{Generator, GeneratorSet, ALL};
use super::lfo::Lfo;
use super::modulator::{GeneralController, ModulatorParameterSet, RuntimeModulator};
use super::soundfont::Sample;
use super::stereo::StereoValue;

/// Recalculate envelopes/LFOs/pitch/amplitude-ramp once every this many
/// render steps rather than every sample; SF2 synths don't need audio-rate
/// control-rate updates and it keeps the per-sample render loop cheap.
const CALC_INTERVAL: u32 = 64;

/// InitialAttenuation is scaled down before use "for compatibility" with
/// how widely deployed SF2 players actually interpret it.
const ATTEN_FACTOR: f64 = 0.4;

const COARSE_UNIT: i64 = 32768;

/// `200 * log10(i16::MAX + 1)`: a voice past this much combined attenuation
/// is inaudible and gets reaped instead of rendered to silence forever.
const DYNAMIC_RANGE: f64 = 903.089986991944;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Playing,
    Sustained,
    Released,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    UnLooped,
    Looped,
    UnUsed,
    LoopedUntilRelease,
}

impl SampleMode {
    fn from_bits(bits: i16) -> SampleMode {
        match bits & 0b11 {
            1 => SampleMode::Looped,
            2 => SampleMode::UnUsed,
            3 => SampleMode::LoopedUntilRelease,
            _ => SampleMode::UnLooped,
        }
    }
}

struct RuntimeSample {
    pitch: f64,
    start: u32,
    end: u32,
    start_loop: u32,
    end_loop: u32,
    mode: SampleMode,
}

pub struct Voice {
    note_id: u64,
    state: State,
    sample: Arc<Sample>,
    rt_sample: RuntimeSample,
    generators: GeneratorSet,
    modulators: Vec<RuntimeModulator>,
    modulated: [f64; super::generator::NUM_GENERATORS],

    index: FixedPoint,
    delta_index: FixedPoint,
    delta_index_ratio: f64,

    volume: StereoValue,
    amp: f64,
    delta_amp: f64,

    vol_env: Envelope,
    mod_env: Envelope,
    vib_lfo: Lfo,
    mod_lfo: Lfo,

    key_scaling: f64,
    actual_key: i8,
    min_atten: f64,
    voice_pitch: f64,
    coarse_tuning: f64,
    fine_tuning: f64,
    exclusive_class: i32,
    percussion: bool,
    steps: u32,
}

/// The generators whose modulated values need computing right away so the
/// voice's first render produces the right pitch, pan and envelope shape,
/// before any MIDI controller arrives to trigger a recompute itself.
const INIT_GENERATORS: &[Generator] = &[
    Generator::Pan,
    Generator::DelayModLFO,
    Generator::FreqModLFO,
    Generator::DelayVibLFO,
    Generator::FreqVibLFO,
    Generator::DelayModEnv,
    Generator::AttackModEnv,
    Generator::HoldModEnv,
    Generator::DecayModEnv,
    Generator::SustainModEnv,
    Generator::ReleaseModEnv,
    Generator::DelayVolEnv,
    Generator::AttackVolEnv,
    Generator::HoldVolEnv,
    Generator::DecayVolEnv,
    Generator::SustainVolEnv,
    Generator::ReleaseVolEnv,
    Generator::CoarseTune,
];

impl Voice {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        note_id: u64,
        output_rate: f64,
        sample: Arc<Sample>,
        generators: GeneratorSet,
        mod_params: &ModulatorParameterSet,
        key: i8,
        velocity: i8,
    ) -> Voice {
        let mode = SampleMode::from_bits(generators.get_or_default(Generator::SampleModes));
        let overridden_root_key = generators.get_or_default(Generator::OverridingRootKey);
        let pitch = if overridden_root_key > 0 { overridden_root_key as f64 } else { sample.original_key as f64 }
            - 0.01 * sample.correction as f64;

        let buffer_len = sample.buffer.len() as i64;
        let start = (sample.start as i64
            + generators.get_or_default(Generator::StartAddrsCoarseOffset) as i64 * COARSE_UNIT
            + generators.get_or_default(Generator::StartAddrsOffset) as i64)
            .clamp(0, (buffer_len - 2).max(0));
        let end = (sample.end as i64
            + generators.get_or_default(Generator::EndAddrsCoarseOffset) as i64 * COARSE_UNIT
            + generators.get_or_default(Generator::EndAddrsOffset) as i64)
            .clamp(start + 1, buffer_len);
        let start_loop = (sample.start_loop as i64
            + generators.get_or_default(Generator::StartloopAddrsCoarseOffset) as i64 * COARSE_UNIT
            + generators.get_or_default(Generator::StartloopAddrsOffset) as i64)
            .clamp(start, end - 1);
        let end_loop = (sample.end_loop as i64
            + generators.get_or_default(Generator::EndloopAddrsCoarseOffset) as i64 * COARSE_UNIT
            + generators.get_or_default(Generator::EndloopAddrsOffset) as i64)
            .clamp(start_loop + 1, end);

        let rt_sample = RuntimeSample {
            pitch,
            start: start as u32,
            end: end as u32,
            start_loop: start_loop as u32,
            end_loop: end_loop as u32,
            mode,
        };

        let delta_index_ratio = 1.0 / key_to_hertz(pitch) * sample.sample_rate as f64 / output_rate;

        let mut modulators: Vec<RuntimeModulator> =
            mod_params.params().iter().map(|p| RuntimeModulator::new(*p)).collect();

        let gen_velocity = generators.get_or_default(Generator::Velocity);
        let velocity_for_mod = if gen_velocity > 0 { gen_velocity as f64 } else { velocity as f64 };
        for m in &mut modulators {
            m.update_sf_controller(GeneralController::NoteOnVelocity, velocity_for_mod);
        }

        let gen_keynum = generators.get_or_default(Generator::Keynum);
        let overridden_key = if gen_keynum > 0 { gen_keynum as i8 } else { key };
        let key_scaling = 60.0 - overridden_key as f64;
        for m in &mut modulators {
            m.update_sf_controller(GeneralController::NoteOnKeyNumber, overridden_key as f64);
        }

        let initial_attenuation = generators.get_or_default(Generator::InitialAttenuation) as f64;
        let negative_capable_atten: f64 = modulators
            .iter()
            .filter(|m| m.destination() == Generator::InitialAttenuation && m.can_be_negative())
            .map(|m| (m.amount() as f64).abs())
            .sum();
        let min_atten =
            sample.min_atten + (ATTEN_FACTOR * initial_attenuation - negative_capable_atten).max(0.0);

        let mut modulated = [0.0f64; super::generator::NUM_GENERATORS];
        for &g in ALL {
            modulated[g as usize] = generators.get_or_default(g) as f64;
        }

        let exclusive_class = generators.get_or_default(Generator::ExclusiveClass) as i32;

        let mut voice = Voice {
            note_id,
            state: State::Playing,
            sample,
            rt_sample,
            generators,
            modulators,
            modulated,
            index: FixedPoint::from_integer(start as u32),
            delta_index: FixedPoint::default(),
            delta_index_ratio,
            volume: StereoValue::ZERO,
            amp: 0.0,
            delta_amp: 0.0,
            vol_env: Envelope::new(output_rate, CALC_INTERVAL),
            mod_env: Envelope::new(output_rate, CALC_INTERVAL),
            vib_lfo: Lfo::new(output_rate, CALC_INTERVAL),
            mod_lfo: Lfo::new(output_rate, CALC_INTERVAL),
            key_scaling,
            actual_key: overridden_key,
            min_atten,
            voice_pitch: pitch,
            coarse_tuning: 0.0,
            fine_tuning: 0.0,
            exclusive_class,
            percussion: false,
            steps: 0,
        };

        for &g in INIT_GENERATORS {
            voice.update_modulated_params(g);
        }

        voice
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn note_id(&self) -> u64 {
        self.note_id
    }

    pub fn key(&self) -> i8 {
        self.actual_key
    }

    pub fn exclusive_class(&self) -> i32 {
        self.exclusive_class
    }

    pub fn is_percussion(&self) -> bool {
        self.percussion
    }

    pub fn set_percussion(&mut self, percussion: bool) {
        self.percussion = percussion;
    }

    pub fn render(&self) -> StereoValue {
        let buffer = &self.sample.buffer;
        let idx = self.index.integer_part() as usize;
        let frac = self.index.fractional_part();
        let s0 = buffer[idx] as f64;
        let s1 = buffer.get(idx + 1).copied().unwrap_or(0) as f64;
        let interpolated = s0 + frac * (s1 - s0);
        (self.amp * self.volume) * (interpolated / i16::MAX as f64)
    }

    pub fn update(&mut self) {
        if self.state == State::Finished {
            return;
        }
        let calc = self.steps % CALC_INTERVAL == 0;
        self.steps += 1;

        if calc {
            let past_dynamic_range =
                self.vol_env.phase() > Phase::Attack && self.min_atten + 960.0 * (1.0 - self.vol_env.value()) >= DYNAMIC_RANGE;
            if self.vol_env.phase() == Phase::Finished || past_dynamic_range {
                self.state = State::Finished;
                return;
            }
            self.vol_env.update();
        }

        self.index += self.delta_index;

        match self.rt_sample.mode {
            SampleMode::UnLooped | SampleMode::UnUsed => {
                if self.index.integer_part() >= self.rt_sample.end {
                    self.state = State::Finished;
                }
            }
            SampleMode::Looped => {
                if self.index.integer_part() >= self.rt_sample.end_loop {
                    self.index -= FixedPoint::from_diff(self.rt_sample.end_loop - self.rt_sample.start_loop);
                }
            }
            SampleMode::LoopedUntilRelease => {
                if self.state == State::Released {
                    if self.index.integer_part() >= self.rt_sample.end {
                        self.state = State::Finished;
                    }
                } else if self.index.integer_part() >= self.rt_sample.end_loop {
                    self.index -= FixedPoint::from_diff(self.rt_sample.end_loop - self.rt_sample.start_loop);
                }
            }
        }

        self.amp += self.delta_amp;

        if calc {
            self.mod_env.update();
            self.vib_lfo.update();
            self.mod_lfo.update();

            let mod_env_value =
                if self.mod_env.phase() == Phase::Attack { convex(self.mod_env.value()) } else { self.mod_env.value() };

            let pitch = self.voice_pitch
                + 0.01
                    * (self.modulated[Generator::ModEnvToPitch as usize] * mod_env_value
                        + self.modulated[Generator::VibLfoToPitch as usize] * self.vib_lfo.value()
                        + self.modulated[Generator::ModLfoToPitch as usize] * self.mod_lfo.value());
            self.delta_index = FixedPoint::from_real(self.delta_index_ratio * key_to_hertz(pitch));

            let atten_mod_lfo = self.modulated[Generator::ModLfoToVolume as usize] * self.mod_lfo.value();
            let target_amp = if self.vol_env.phase() == Phase::Attack {
                self.vol_env.value() * attenuation_to_amplitude(atten_mod_lfo)
            } else {
                attenuation_to_amplitude(960.0 * (1.0 - self.vol_env.value()) + atten_mod_lfo)
            };
            self.delta_amp = (target_amp - self.amp) / CALC_INTERVAL as f64;
        }
    }

    pub fn release(&mut self, sustained: bool) {
        if !matches!(self.state, State::Playing | State::Sustained) {
            return;
        }
        if sustained {
            self.state = State::Sustained;
        } else {
            self.state = State::Released;
            self.vol_env.release();
            self.mod_env.release();
        }
    }

    pub fn update_sf_controller(&mut self, controller: GeneralController, value: f64) {
        for i in 0..self.modulators.len() {
            if self.modulators[i].update_sf_controller(controller, value) {
                let dest = self.modulators[i].destination();
                self.update_modulated_params(dest);
            }
        }
    }

    pub fn update_midi_controller(&mut self, cc: u8, value: f64) {
        for i in 0..self.modulators.len() {
            if self.modulators[i].update_midi_controller(cc, value) {
                let dest = self.modulators[i].destination();
                self.update_modulated_params(dest);
            }
        }
    }

    pub fn update_fine_tuning(&mut self, cents: f64) {
        self.fine_tuning = cents;
        self.update_modulated_params(Generator::FineTune);
    }

    pub fn update_coarse_tuning(&mut self, semitones: f64) {
        self.coarse_tuning = semitones;
        self.update_modulated_params(Generator::CoarseTune);
    }

    fn calculate_panned_volume(pan: f64) -> StereoValue {
        if pan <= -500.0 {
            StereoValue { left: 1.0, right: 0.0 }
        } else if pan >= 500.0 {
            StereoValue { left: 0.0, right: 1.0 }
        } else {
            let left = (std::f64::consts::PI / 2000.0 * (-pan + 500.0)).sin();
            let right = (std::f64::consts::PI / 2000.0 * (pan + 500.0)).sin();
            StereoValue { left, right }
        }
    }

    fn update_modulated_params(&mut self, destination: Generator) {
        let mut value = self.generators.get_or_default(destination) as f64;
        if destination == Generator::InitialAttenuation {
            value *= ATTEN_FACTOR;
        }
        for m in &self.modulators {
            if m.destination() == destination {
                value += m.value();
            }
        }
        self.modulated[destination as usize] = value;

        match destination {
            Generator::Pan | Generator::InitialAttenuation => {
                let pan = self.modulated[Generator::Pan as usize];
                let atten = self.modulated[Generator::InitialAttenuation as usize];
                self.volume = attenuation_to_amplitude(atten) * Self::calculate_panned_volume(pan);
            }
            Generator::DelayModLFO => self.mod_lfo.set_delay(value),
            Generator::FreqModLFO => self.mod_lfo.set_frequency(value),
            Generator::DelayVibLFO => self.vib_lfo.set_delay(value),
            Generator::FreqVibLFO => self.vib_lfo.set_frequency(value),
            Generator::DelayModEnv => self.mod_env.set_parameter(Phase::Delay, value),
            Generator::AttackModEnv => self.mod_env.set_parameter(Phase::Attack, value),
            Generator::HoldModEnv | Generator::KeynumToModEnvHold => {
                let hold = self.modulated[Generator::HoldModEnv as usize];
                let keynum = self.modulated[Generator::KeynumToModEnvHold as usize];
                self.mod_env.set_parameter(Phase::Hold, hold + keynum * self.key_scaling);
            }
            Generator::DecayModEnv | Generator::KeynumToModEnvDecay => {
                let decay = self.modulated[Generator::DecayModEnv as usize];
                let keynum = self.modulated[Generator::KeynumToModEnvDecay as usize];
                self.mod_env.set_parameter(Phase::Decay, decay + keynum * self.key_scaling);
            }
            Generator::SustainModEnv => self.mod_env.set_parameter(Phase::Sustain, value),
            Generator::ReleaseModEnv => self.mod_env.set_parameter(Phase::Release, value),
            Generator::DelayVolEnv => self.vol_env.set_parameter(Phase::Delay, value),
            Generator::AttackVolEnv => self.vol_env.set_parameter(Phase::Attack, value),
            Generator::HoldVolEnv | Generator::KeynumToVolEnvHold => {
                let hold = self.modulated[Generator::HoldVolEnv as usize];
                let keynum = self.modulated[Generator::KeynumToVolEnvHold as usize];
                self.vol_env.set_parameter(Phase::Hold, hold + keynum * self.key_scaling);
            }
            Generator::DecayVolEnv | Generator::KeynumToVolEnvDecay => {
                let decay = self.modulated[Generator::DecayVolEnv as usize];
                let keynum = self.modulated[Generator::KeynumToVolEnvDecay as usize];
                self.vol_env.set_parameter(Phase::Decay, decay + keynum * self.key_scaling);
            }
            Generator::SustainVolEnv => self.vol_env.set_parameter(Phase::Sustain, value),
            Generator::ReleaseVolEnv => self.vol_env.set_parameter(Phase::Release, value),
            Generator::CoarseTune | Generator::FineTune | Generator::ScaleTuning | Generator::Pitch => {
                self.voice_pitch = self.rt_sample.pitch
                    + 0.01 * self.modulated[Generator::Pitch as usize]
                    + 0.01 * self.modulated[Generator::ScaleTuning as usize] * (self.actual_key as f64 - self.rt_sample.pitch)
                    + self.coarse_tuning
                    + self.modulated[Generator::CoarseTune as usize]
                    + 0.01 * (self.fine_tuning + self.modulated[Generator::FineTune as usize]);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_sample(len: usize) -> Arc<Sample> {
        let buffer: Vec<i16> = (0..len).map(|i| ((i % 2000) as i32 - 1000) as i16).collect();
        Arc::new(Sample {
            name: "test".into(),
            start: 0,
            end: len as u32,
            start_loop: 10,
            end_loop: (len - 10) as u32,
            sample_rate: 44100,
            original_key: 60,
            correction: 0,
            min_atten: 0.0,
            buffer: Arc::new(buffer),
        })
    }

    #[test]
    fn a_fresh_voice_starts_playing_and_silent() {
        let sample = flat_sample(1000);
        let generators = GeneratorSet::new();
        let mods = ModulatorParameterSet::new();
        let voice = Voice::new(1, 44100.0, sample, generators, &mods, 60, 100);
        assert_eq!(voice.state(), State::Playing);
        assert_eq!(voice.render(), StereoValue::ZERO);
    }

    #[test]
    fn releasing_a_playing_voice_starts_its_envelope_release() {
        let sample = flat_sample(1000);
        let generators = GeneratorSet::new();
        let mods = ModulatorParameterSet::new();
        let mut voice = Voice::new(1, 44100.0, sample, generators, &mods, 60, 100);
        voice.release(false);
        assert_eq!(voice.state(), State::Released);
    }

    #[test]
    fn a_sustained_release_keeps_the_voice_alive_until_the_real_release() {
        let sample = flat_sample(1000);
        let generators = GeneratorSet::new();
        let mods = ModulatorParameterSet::new();
        let mut voice = Voice::new(1, 44100.0, sample, generators, &mods, 60, 100);
        voice.release(true);
        assert_eq!(voice.state(), State::Sustained);
        voice.release(false);
        assert_eq!(voice.state(), State::Released);
    }

    #[test]
    fn unlooped_sample_finishes_once_the_index_passes_its_end() {
        let sample = flat_sample(100);
        let mut generators = GeneratorSet::new();
        generators.set(Generator::SampleModes, 0); // UnLooped
        let mods = ModulatorParameterSet::new();
        let mut voice = Voice::new(1, 44100.0, sample, generators, &mods, 60, 100);
        voice.delta_index = FixedPoint::from_integer(200);
        voice.update();
        assert_eq!(voice.state(), State::Finished);
    }
}
