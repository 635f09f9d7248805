//! SF2 modulators: the source×amount-source×generator graph that lets MIDI
//! controllers (velocity, CC7, pitch bend...) steer a voice's generators in
//! real time, on top of whatever a zone set statically.

use once_cell::sync::Lazy;

use super::generator::Generator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPalette {
    General,
    Midi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDirection {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePolarity {
    Unipolar,
    Bipolar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Linear,
    Concave,
    Convex,
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralController {
    NoController,
    NoteOnVelocity,
    NoteOnKeyNumber,
    PolyPressure,
    ChannelPressure,
    PitchWheel,
    PitchWheelSensitivity,
    Link,
}

/// A modulator source: either one of the ten fixed "general" controllers
/// SF2 §8.2.1 defines, or a raw MIDI CC number (when `palette ==
/// ControllerPalette::Midi`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModSource {
    General(GeneralController),
    Midi(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModSpec {
    pub source: ModSource,
    pub direction: SourceDirection,
    pub polarity: SourcePolarity,
    pub kind: SourceType,
}

impl ModSpec {
    pub const fn general(
        source: GeneralController,
        direction: SourceDirection,
        polarity: SourcePolarity,
        kind: SourceType,
    ) -> Self {
        ModSpec { source: ModSource::General(source), direction, polarity, kind }
    }

    pub const fn midi(cc: u8, direction: SourceDirection, polarity: SourcePolarity, kind: SourceType) -> Self {
        ModSpec { source: ModSource::Midi(cc), direction, polarity, kind }
    }

    fn palette(&self) -> ControllerPalette {
        match self.source {
            ModSource::General(_) => ControllerPalette::General,
            ModSource::Midi(_) => ControllerPalette::Midi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Linear,
    AbsoluteValue,
}

/// One modulator parameter as loaded from a zone's `pmod`/`imod` chunk: a
/// source, a destination generator, an amount, a secondary amount source,
/// and an optional transform on the final product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModParam {
    pub source: ModSpec,
    pub destination: Generator,
    pub amount: i16,
    pub amount_source: ModSpec,
    pub transform: Transform,
}

/// Compares every field except `amount`, mirroring the SF2 rule that two
/// modulators collide (and should be summed, not duplicated) when they
/// share source/destination/amount-source/transform regardless of amount.
pub fn same_modulator(a: &ModParam, b: &ModParam) -> bool {
    a.source == b.source
        && a.destination == b.destination
        && a.amount_source == b.amount_source
        && a.transform == b.transform
}

/// A zone's (or voice's) collection of modulator parameters.
#[derive(Debug, Clone, Default)]
pub struct ModulatorParameterSet {
    params: Vec<ModParam>,
}

impl ModulatorParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[ModParam] {
        &self.params
    }

    /// Appends `param` unless an identical modulator (by `same_modulator`)
    /// is already present, in which case it's dropped.
    pub fn append(&mut self, param: ModParam) {
        if !self.params.iter().any(|p| same_modulator(p, &param)) {
            self.params.push(param);
        }
    }

    /// Appends `param`, summing its amount into a matching existing entry
    /// instead of dropping it.
    pub fn add_or_append(&mut self, param: ModParam) {
        if let Some(existing) = self.params.iter_mut().find(|p| same_modulator(p, &param)) {
            existing.amount = existing.amount.saturating_add(param.amount);
        } else {
            self.params.push(param);
        }
    }

    /// Folds `other`'s modulators into `self` via `append` (global-zone
    /// fill-in: duplicates are dropped, not merged).
    pub fn merge(&mut self, other: &ModulatorParameterSet) {
        for p in &other.params {
            self.append(*p);
        }
    }

    /// Folds `other`'s modulators into `self` via `add_or_append` (preset
    /// zone onto instrument zone: duplicates sum).
    pub fn merge_and_add(&mut self, other: &ModulatorParameterSet) {
        for p in &other.params {
            self.add_or_append(*p);
        }
    }
}

/// SF2 §8.4.2's ten default modulators, built once on first use.
pub fn default_parameters() -> &'static ModulatorParameterSet {
    static DEFAULTS: Lazy<ModulatorParameterSet> = Lazy::new(|| {
        use Generator::*;
        use GeneralController::*;
        use SourceDirection::*;
        use SourcePolarity::*;
        use SourceType::*;
        use Transform::*;

        let unit = ModSpec::general(NoController, Positive, Unipolar, Linear);
        let mut set = ModulatorParameterSet::new();

        set.append(ModParam {
            source: ModSpec::general(NoteOnVelocity, Negative, Unipolar, Concave),
            destination: InitialAttenuation,
            amount: 960,
            amount_source: unit,
            transform: Linear,
        });
        set.append(ModParam {
            source: ModSpec::general(NoteOnVelocity, Negative, Unipolar, Linear),
            destination: InitialFilterFc,
            amount: -2400,
            amount_source: unit,
            transform: Linear,
        });
        set.append(ModParam {
            source: ModSpec::midi(13, Positive, Unipolar, Linear), // ChannelPressure
            destination: VibLfoToPitch,
            amount: 50,
            amount_source: unit,
            transform: Linear,
        });
        set.append(ModParam {
            source: ModSpec::midi(1, Positive, Unipolar, Linear), // Modulation wheel
            destination: VibLfoToPitch,
            amount: 50,
            amount_source: unit,
            transform: Linear,
        });
        set.append(ModParam {
            source: ModSpec::midi(7, Negative, Unipolar, Concave), // Volume
            destination: InitialAttenuation,
            amount: 960,
            amount_source: unit,
            transform: Linear,
        });
        set.append(ModParam {
            source: ModSpec::midi(10, Positive, Bipolar, Linear), // Pan
            destination: Pan,
            amount: 500,
            amount_source: unit,
            transform: Linear,
        });
        set.append(ModParam {
            source: ModSpec::midi(11, Negative, Unipolar, Concave), // Expression
            destination: InitialAttenuation,
            amount: 960,
            amount_source: unit,
            transform: Linear,
        });
        set.append(ModParam {
            source: ModSpec::midi(91, Positive, Unipolar, Linear), // Reverb send
            destination: ReverbEffectsSend,
            amount: 200,
            amount_source: unit,
            transform: Linear,
        });
        set.append(ModParam {
            source: ModSpec::midi(93, Positive, Unipolar, Linear), // Chorus send
            destination: ChorusEffectsSend,
            amount: 200,
            amount_source: unit,
            transform: Linear,
        });
        set.append(ModParam {
            source: ModSpec::general(PitchWheel, Positive, Bipolar, Linear),
            destination: Pitch,
            amount: 12700,
            amount_source: ModSpec::general(PitchWheelSensitivity, Positive, Unipolar, Linear),
            transform: Linear,
        });

        set
    });
    &DEFAULTS
}

/// Maps a raw controller value (velocity, CC, pitch wheel...) through a
/// source spec's direction/polarity/curve to the [-1, 1] (bipolar) or
/// [0, 1] (unipolar) range a modulator multiplies against.
fn map_source(value: f64, spec: &ModSpec) -> f64 {
    use SourceDirection::*;
    use SourcePolarity::*;
    use SourceType::*;

    let full_scale = match spec.source {
        ModSource::General(GeneralController::PitchWheel) => (1 << 14) as f64,
        _ => (1 << 7) as f64,
    };
    let value = value / full_scale;

    if spec.kind == Switch {
        return if value >= 0.5 {
            1.0
        } else if spec.polarity == Unipolar {
            0.0
        } else {
            -1.0
        };
    }

    match spec.polarity {
        Unipolar => {
            let x = if spec.direction == Positive { value } else { 1.0 - value };
            match spec.kind {
                Linear => x,
                Concave => super::conversion::concave(x),
                Convex => super::conversion::convex(x),
                Switch => unreachable!(),
            }
        }
        Bipolar => {
            let dir = if spec.direction == Positive { 1.0 } else { -1.0 };
            let sign = if value > 0.5 { 1.0 } else { -1.0 };
            let x = 2.0 * value - 1.0;
            match spec.kind {
                Linear => dir * x,
                Concave => sign * dir * super::conversion::concave(sign * x),
                Convex => sign * dir * super::conversion::convex(sign * x),
                Switch => unreachable!(),
            }
        }
    }
}

fn transform(value: f64, xform: Transform) -> f64 {
    match xform {
        Transform::Linear => value,
        Transform::AbsoluteValue => value.abs(),
    }
}

/// A per-voice instance of a `ModParam`: tracks the live mapped source and
/// amount-source values and recomputes `value` whenever either changes.
#[derive(Debug, Clone)]
pub struct RuntimeModulator {
    param: ModParam,
    source: f64,
    amount_source: f64,
    value: f64,
}

impl RuntimeModulator {
    pub fn new(param: ModParam) -> Self {
        RuntimeModulator { param, source: 0.0, amount_source: 1.0, value: 0.0 }
    }

    pub fn destination(&self) -> Generator {
        self.param.destination
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn amount(&self) -> i16 {
        self.param.amount
    }

    /// A modulator can only drive a generator negative if its amount is
    /// negative and at least one of source/amount-source is capable of
    /// going negative (bipolar), or its transform doesn't force abs value.
    pub fn can_be_negative(&self) -> bool {
        if self.param.transform == Transform::AbsoluteValue || self.param.amount == 0 {
            return false;
        }
        let src_unipolar_or_none =
            self.param.source.polarity == SourcePolarity::Unipolar || self.param.source.source == ModSource::General(GeneralController::NoController);
        let amt_unipolar_or_none = self.param.amount_source.polarity == SourcePolarity::Unipolar
            || self.param.amount_source.source == ModSource::General(GeneralController::NoController);
        if self.param.amount > 0 {
            !(src_unipolar_or_none && amt_unipolar_or_none)
        } else {
            true
        }
    }

    fn calculate_value(&mut self) {
        self.value = transform(
            self.param.amount as f64 * self.source * self.amount_source,
            self.param.transform,
        );
    }

    /// Updates `source`/`amount_source` if `controller` (a general-palette
    /// controller with its current `value`) matches this modulator's source
    /// or amount-source spec, and recalculates `value` if so. Returns
    /// whether anything changed.
    pub fn update_sf_controller(&mut self, controller: GeneralController, value: f64) -> bool {
        let mut changed = false;
        if self.param.source.palette() == ControllerPalette::General
            && self.param.source.source == ModSource::General(controller)
        {
            self.source = map_source(value, &self.param.source);
            changed = true;
        }
        if self.param.amount_source.palette() == ControllerPalette::General
            && self.param.amount_source.source == ModSource::General(controller)
        {
            self.amount_source = map_source(value, &self.param.amount_source);
            changed = true;
        }
        if changed {
            self.calculate_value();
        }
        changed
    }

    /// Same as `update_sf_controller` but for a raw MIDI CC number.
    pub fn update_midi_controller(&mut self, cc: u8, value: f64) -> bool {
        let mut changed = false;
        if self.param.source.palette() == ControllerPalette::Midi && self.param.source.source == ModSource::Midi(cc) {
            self.source = map_source(value, &self.param.source);
            changed = true;
        }
        if self.param.amount_source.palette() == ControllerPalette::Midi
            && self.param.amount_source.source == ModSource::Midi(cc)
        {
            self.amount_source = map_source(value, &self.param.amount_source);
            changed = true;
        }
        if changed {
            self.calculate_value();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_has_the_ten_sf2_modulators() {
        assert_eq!(default_parameters().params().len(), 10);
    }

    #[test]
    fn append_drops_an_identical_modulator() {
        let mut set = ModulatorParameterSet::new();
        let p = ModParam {
            source: ModSpec::midi(7, SourceDirection::Negative, SourcePolarity::Unipolar, SourceType::Concave),
            destination: Generator::InitialAttenuation,
            amount: 960,
            amount_source: ModSpec::general(
                GeneralController::NoController,
                SourceDirection::Positive,
                SourcePolarity::Unipolar,
                SourceType::Linear,
            ),
            transform: Transform::Linear,
        };
        set.append(p);
        set.append(p);
        assert_eq!(set.params().len(), 1);
    }

    #[test]
    fn bipolar_linear_source_spans_negative_one_to_one() {
        let pan = ModSpec::midi(10, SourceDirection::Positive, SourcePolarity::Bipolar, SourceType::Linear);
        assert!((map_source(0.0, &pan) - -1.0).abs() < 1e-9);
        assert!((map_source(64.0, &pan) - 0.0).abs() < 1e-2);
        assert!(map_source(127.0, &pan) > 0.9);
    }

    #[test]
    fn a_fresh_runtime_modulator_never_driven_stays_at_zero() {
        let rm = RuntimeModulator::new(default_parameters().params()[0]);
        assert_eq!(rm.value(), 0.0);
    }
}
