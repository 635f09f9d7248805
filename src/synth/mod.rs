//! A SoundFont 2 synthesizer: loads `.sf2` banks, drives 16 MIDI channels
//! worth of voices, and renders interleaved stereo PCM. Sits next to `sim`
//! as the other half of the engine's runtime, with no dependency between
//! the two beyond sharing this crate.

mod channel;
mod conversion;
mod envelope;
mod fixed_point;
mod generator;
mod lfo;
mod midi;
mod modulator;
mod soundfont;
mod stereo;
mod synthesizer;
mod voice;

pub use generator::{Generator, GeneratorSet};
pub use midi::{cc, Bank, MessageStatus, Rpn, MAX_KEY, NUM_CONTROLLERS, PERCUSSION_CHANNEL};
pub use modulator::{
    GeneralController, ModParam, ModSource, ModSpec, ModulatorParameterSet, RuntimeModulator, SourceDirection,
    SourcePolarity, SourceType,
};
pub use soundfont::{Instrument, Preset, Range, Sample, SoundFont, SoundFontError, Zone, PERCUSSION_BANK};
pub use stereo::StereoValue;
pub use synthesizer::{Standard, Synthesizer, DEFAULT_NUM_CHANNELS, DEFAULT_OUTPUT_RATE};
pub use voice::{SampleMode, State as VoiceState, Voice};
