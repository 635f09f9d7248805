//! Unit conversions shared by the envelope, LFO and voice pitch/amplitude
//! math: timecents/absolute cents to seconds/hertz, centibel attenuation to
//! linear amplitude, and the two modulator transfer curves (concave/convex).
//!
//! The attenuation→amplitude and cent→hertz tables are precomputed once on
//! first use rather than read from a file — there's nothing to load, just a
//! few thousand `pow`/`exp2` calls worth memoizing.

use once_cell::sync::Lazy;

const ATTEN_TABLE_LEN: usize = 1441;
const CENT_TABLE_LEN: usize = 1200;

// -200 instead of -100 for compatibility with the reference decibel scale
// used throughout this synth's centibel math.
static ATTEN_TO_AMP: Lazy<Vec<f64>> =
    Lazy::new(|| (0..ATTEN_TABLE_LEN).map(|i| 10f64.powf(i as f64 / -200.0)).collect());

static CENT_TO_HERTZ: Lazy<Vec<f64>> =
    Lazy::new(|| (0..CENT_TABLE_LEN).map(|i| 6.875 * (i as f64 / 1200.0).exp2()).collect());

pub fn attenuation_to_amplitude(atten: f64) -> f64 {
    if atten <= 0.0 {
        1.0
    } else if atten >= ATTEN_TABLE_LEN as f64 {
        0.0
    } else {
        ATTEN_TO_AMP[atten as usize]
    }
}

pub fn amplitude_to_attenuation(amp: f64) -> f64 {
    -200.0 * amp.log10()
}

/// MIDI key number (fractional, after pitch corrections) to frequency in Hz.
pub fn key_to_hertz(key: f64) -> f64 {
    if key < 0.0 {
        return 1.0;
    }

    let mut offset = 300i32;
    let mut ratio = 1u32;
    let mut threshold = 900i32;
    while threshold <= 14100 {
        if key * 100.0 < threshold as f64 {
            let idx = (key * 100.0) as i32 + offset;
            return ratio as f64 * CENT_TO_HERTZ[idx as usize];
        }
        offset -= 1200;
        ratio *= 2;
        threshold += 1200;
    }
    1.0
}

pub fn timecent_to_second(tc: f64) -> f64 {
    (tc / 1200.0).exp2()
}

pub fn absolute_cent_to_hertz(ac: f64) -> f64 {
    8.176 * (ac / 1200.0).exp2()
}

/// SF2 §8.3's "concave" unipolar transform.
pub fn concave(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else if x >= 1.0 {
        1.0
    } else {
        2.0 * amplitude_to_attenuation(1.0 - x) / 960.0
    }
}

/// SF2 §8.3's "convex" unipolar transform.
pub fn convex(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else if x >= 1.0 {
        1.0
    } else {
        1.0 - 2.0 * amplitude_to_attenuation(x) / 960.0
    }
}
