//! SF2 generators: the 62-slot table of synthesis parameters a zone can set,
//! plus the defaults a preset/instrument falls back to when a generator is
//! never touched.

pub const NUM_GENERATORS: usize = 62;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Generator {
    StartAddrsOffset = 0,
    EndAddrsOffset = 1,
    StartloopAddrsOffset = 2,
    EndloopAddrsOffset = 3,
    StartAddrsCoarseOffset = 4,
    ModLfoToPitch = 5,
    VibLfoToPitch = 6,
    ModEnvToPitch = 7,
    InitialFilterFc = 8,
    InitialFilterQ = 9,
    ModLfoToFilterFc = 10,
    ModEnvToFilterFc = 11,
    EndAddrsCoarseOffset = 12,
    ModLfoToVolume = 13,
    ChorusEffectsSend = 15,
    ReverbEffectsSend = 16,
    Pan = 17,
    DelayModLFO = 21,
    FreqModLFO = 22,
    DelayVibLFO = 23,
    FreqVibLFO = 24,
    DelayModEnv = 25,
    AttackModEnv = 26,
    HoldModEnv = 27,
    DecayModEnv = 28,
    SustainModEnv = 29,
    ReleaseModEnv = 30,
    KeynumToModEnvHold = 31,
    KeynumToModEnvDecay = 32,
    DelayVolEnv = 33,
    AttackVolEnv = 34,
    HoldVolEnv = 35,
    DecayVolEnv = 36,
    SustainVolEnv = 37,
    ReleaseVolEnv = 38,
    KeynumToVolEnvHold = 39,
    KeynumToVolEnvDecay = 40,
    Instrument = 41,
    KeyRange = 43,
    VelRange = 44,
    StartloopAddrsCoarseOffset = 45,
    Keynum = 46,
    Velocity = 47,
    InitialAttenuation = 48,
    EndloopAddrsCoarseOffset = 50,
    CoarseTune = 51,
    FineTune = 52,
    SampleID = 53,
    SampleModes = 54,
    ScaleTuning = 56,
    ExclusiveClass = 57,
    OverridingRootKey = 58,
    EndOper = 60,
    Pitch = 61,
}

impl Generator {
    /// Converts a raw SF2 generator ID as read off disk. Unused/reserved
    /// slots (14, 18-20, 42, 49, 55, 59) have no `Generator` variant and
    /// come back `None`; callers skip those operators.
    pub fn from_raw(raw: u16) -> Option<Generator> {
        use Generator::*;
        Some(match raw {
            0 => StartAddrsOffset,
            1 => EndAddrsOffset,
            2 => StartloopAddrsOffset,
            3 => EndloopAddrsOffset,
            4 => StartAddrsCoarseOffset,
            5 => ModLfoToPitch,
            6 => VibLfoToPitch,
            7 => ModEnvToPitch,
            8 => InitialFilterFc,
            9 => InitialFilterQ,
            10 => ModLfoToFilterFc,
            11 => ModEnvToFilterFc,
            12 => EndAddrsCoarseOffset,
            13 => ModLfoToVolume,
            15 => ChorusEffectsSend,
            16 => ReverbEffectsSend,
            17 => Pan,
            21 => DelayModLFO,
            22 => FreqModLFO,
            23 => DelayVibLFO,
            24 => FreqVibLFO,
            25 => DelayModEnv,
            26 => AttackModEnv,
            27 => HoldModEnv,
            28 => DecayModEnv,
            29 => SustainModEnv,
            30 => ReleaseModEnv,
            31 => KeynumToModEnvHold,
            32 => KeynumToModEnvDecay,
            33 => DelayVolEnv,
            34 => AttackVolEnv,
            35 => HoldVolEnv,
            36 => DecayVolEnv,
            37 => SustainVolEnv,
            38 => ReleaseVolEnv,
            39 => KeynumToVolEnvHold,
            40 => KeynumToVolEnvDecay,
            41 => Instrument,
            43 => KeyRange,
            44 => VelRange,
            45 => StartloopAddrsCoarseOffset,
            46 => Keynum,
            47 => Velocity,
            48 => InitialAttenuation,
            50 => EndloopAddrsCoarseOffset,
            51 => CoarseTune,
            52 => FineTune,
            53 => SampleID,
            54 => SampleModes,
            56 => ScaleTuning,
            57 => ExclusiveClass,
            58 => OverridingRootKey,
            60 => EndOper,
            61 => Pitch,
            _ => return None,
        })
    }
}

/// Every named generator, in discriminant order. Used to seed a voice's
/// modulated-value table from its merged zone generators; the unnamed
/// reserved slots never appear as a modulation destination so they're left
/// out here.
pub const ALL: &[Generator] = &[
    Generator::StartAddrsOffset,
    Generator::EndAddrsOffset,
    Generator::StartloopAddrsOffset,
    Generator::EndloopAddrsOffset,
    Generator::StartAddrsCoarseOffset,
    Generator::ModLfoToPitch,
    Generator::VibLfoToPitch,
    Generator::ModEnvToPitch,
    Generator::InitialFilterFc,
    Generator::InitialFilterQ,
    Generator::ModLfoToFilterFc,
    Generator::ModEnvToFilterFc,
    Generator::EndAddrsCoarseOffset,
    Generator::ModLfoToVolume,
    Generator::ChorusEffectsSend,
    Generator::ReverbEffectsSend,
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
    Generator::KeynumToModEnvHold,
    Generator::KeynumToModEnvDecay,
    Generator::DelayVolEnv,
    Generator::AttackVolEnv,
    Generator::HoldVolEnv,
    Generator::DecayVolEnv,
    Generator::SustainVolEnv,
    Generator::ReleaseVolEnv,
    Generator::KeynumToVolEnvHold,
    Generator::KeynumToVolEnvDecay,
    Generator::Instrument,
    Generator::KeyRange,
    Generator::VelRange,
    Generator::StartloopAddrsCoarseOffset,
    Generator::Keynum,
    Generator::Velocity,
    Generator::InitialAttenuation,
    Generator::EndloopAddrsCoarseOffset,
    Generator::CoarseTune,
    Generator::FineTune,
    Generator::SampleID,
    Generator::SampleModes,
    Generator::ScaleTuning,
    Generator::ExclusiveClass,
    Generator::OverridingRootKey,
    Generator::EndOper,
    Generator::Pitch,
];

/// SF2 §8.1.3's default instrument zone, indexed by raw generator ID (0..62).
/// Slots with no `Generator` variant stay zero, matching every operator's
/// implicit default.
#[rustfmt::skip]
const DEFAULT_GENERATOR_VALUES: [i16; NUM_GENERATORS] = [
    //  0 StartAddrsOffset           1 EndAddrsOffset             2 StartloopAddrsOffset      3 EndloopAddrsOffset
        0,                           0,                           0,                           0,
    //  4 StartAddrsCoarseOffset     5 ModLfoToPitch              6 VibLfoToPitch              7 ModEnvToPitch
        0,                           0,                           0,                           0,
    //  8 InitialFilterFc            9 InitialFilterQ            10 ModLfoToFilterFc          11 ModEnvToFilterFc
        13500,                       0,                           0,                           0,
    // 12 EndAddrsCoarseOffset      13 ModLfoToVolume             14 (reserved)                15 ChorusEffectsSend
        0,                           0,                           0,                           0,
    // 16 ReverbEffectsSend         17 Pan                        18 (reserved)                19 (reserved)
        0,                           0,                           0,                           0,
    // 20 (reserved)                21 DelayModLFO                22 FreqModLFO                23 DelayVibLFO
        0,                           -12000,                      0,                           -12000,
    // 24 FreqVibLFO                25 DelayModEnv                26 AttackModEnv              27 HoldModEnv
        0,                           -12000,                      -12000,                      -12000,
    // 28 DecayModEnv               29 SustainModEnv              30 ReleaseModEnv             31 KeynumToModEnvHold
        -12000,                      0,                           -12000,                      0,
    // 32 KeynumToModEnvDecay       33 DelayVolEnv                34 AttackVolEnv              35 HoldVolEnv
        0,                           -12000,                      -12000,                      -12000,
    // 36 DecayVolEnv               37 SustainVolEnv              38 ReleaseVolEnv             39 KeynumToVolEnvHold
        -12000,                      0,                           -12000,                      0,
    // 40 KeynumToVolEnvDecay       41 Instrument                 42 (reserved)                43 KeyRange
        0,                           0,                           0,                           0,
    // 44 VelRange                  45 StartloopAddrsCoarseOffset 46 Keynum                    47 Velocity
        0,                           0,                           -1,                          -1,
    // 48 InitialAttenuation        49 (reserved)                 50 EndloopAddrsCoarseOffset  51 CoarseTune
        0,                           0,                           0,                           0,
    // 52 FineTune                  53 SampleID                   54 SampleModes               55 (reserved)
        0,                           0,                           0,                           0,
    // 56 ScaleTuning               57 ExclusiveClass             58 OverridingRootKey         59 (reserved)
        100,                         0,                           -1,                          0,
    // 60 EndOper                   61 Pitch
        0,                           0,
];

#[derive(Debug, Clone, Copy, Default)]
struct GenEntry {
    used: bool,
    amount: i16,
}

/// A zone's (or voice's) view of all 62 generators: which were explicitly
/// set, and at what amount. Unset slots read back as the SF2 default.
#[derive(Debug, Clone)]
pub struct GeneratorSet {
    entries: [GenEntry; NUM_GENERATORS],
}

impl Default for GeneratorSet {
    fn default() -> Self {
        let mut entries = [GenEntry::default(); NUM_GENERATORS];
        for (i, e) in entries.iter_mut().enumerate() {
            e.amount = DEFAULT_GENERATOR_VALUES[i];
        }
        GeneratorSet { entries }
    }
}

impl GeneratorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_default(&self, gen: Generator) -> i16 {
        self.entries[gen as usize].amount
    }

    pub fn is_used(&self, gen: Generator) -> bool {
        self.entries[gen as usize].used
    }

    pub fn set(&mut self, gen: Generator, amount: i16) {
        let e = &mut self.entries[gen as usize];
        e.used = true;
        e.amount = amount;
    }

    /// Fills in only the generators `other` has set and `self` does not —
    /// used to apply a global zone's generators to every other zone in the
    /// same instrument/preset without overriding anything already present.
    pub fn merge(&mut self, other: &GeneratorSet) {
        for i in 0..NUM_GENERATORS {
            if other.entries[i].used && !self.entries[i].used {
                self.entries[i] = other.entries[i];
            }
        }
    }

    /// Sums generators `other` has set into `self`, marking the result used.
    /// Used to combine a preset zone's generators on top of an instrument
    /// zone's (SF2 §9.4: preset generators are relative offsets).
    pub fn add(&mut self, other: &GeneratorSet) {
        for i in 0..NUM_GENERATORS {
            if other.entries[i].used {
                self.entries[i].used = true;
                self.entries[i].amount = self.entries[i].amount.saturating_add(other.entries[i].amount);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_generator_reads_back_its_default() {
        let gens = GeneratorSet::new();
        assert_eq!(gens.get_or_default(Generator::InitialFilterFc), 13500);
        assert_eq!(gens.get_or_default(Generator::Pan), 0);
    }

    #[test]
    fn merge_only_fills_unused_slots() {
        let mut zone = GeneratorSet::new();
        zone.set(Generator::Pan, 250);
        let mut global = GeneratorSet::new();
        global.set(Generator::Pan, -500);
        global.set(Generator::ReverbEffectsSend, 100);
        zone.merge(&global);
        assert_eq!(zone.get_or_default(Generator::Pan), 250);
        assert_eq!(zone.get_or_default(Generator::ReverbEffectsSend), 100);
    }

    #[test]
    fn add_sums_only_used_slots() {
        let mut inst = GeneratorSet::new();
        inst.set(Generator::CoarseTune, 2);
        let mut preset = GeneratorSet::new();
        preset.set(Generator::CoarseTune, 3);
        inst.add(&preset);
        assert_eq!(inst.get_or_default(Generator::CoarseTune), 5);
    }

    #[test]
    fn raw_ids_round_trip_and_reserved_slots_are_none() {
        assert_eq!(Generator::from_raw(17), Some(Generator::Pan));
        assert_eq!(Generator::from_raw(61), Some(Generator::Pitch));
        assert_eq!(Generator::from_raw(14), None);
        assert_eq!(Generator::from_raw(200), None);
    }
}
