//! A triangle-wave low-frequency oscillator, used for both the per-voice
//! vibrato (pitch) and modulation (filter/volume) LFOs.

use super::conversion::{absolute_cent_to_hertz, timecent_to_second};

pub struct Lfo {
    output_rate: f64,
    interval: u32,
    steps: u32,
    delay: u32,
    delta: f64,
    value: f64,
    up: bool,
}

impl Lfo {
    pub fn new(output_rate: f64, interval: u32) -> Self {
        Lfo { output_rate, interval, steps: 0, delay: 0, delta: 0.0, value: 0.0, up: true }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_delay(&mut self, delay: f64) {
        self.delay = (self.output_rate * timecent_to_second(delay)) as u32;
    }

    pub fn set_frequency(&mut self, freq: f64) {
        self.delta = 4.0 * self.interval as f64 * absolute_cent_to_hertz(freq) / self.output_rate;
    }

    pub fn update(&mut self) {
        if self.steps <= self.delay {
            self.steps += 1;
            return;
        }
        self.steps += 1;

        if self.up {
            self.value += self.delta;
            if self.value > 1.0 {
                self.value = 2.0 - self.value;
                self.up = false;
            }
        } else {
            self.value -= self.delta;
            if self.value < -1.0 {
                self.value = -2.0 - self.value;
                self.up = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_silent_through_the_delay() {
        let mut lfo = Lfo::new(1000.0, 1);
        lfo.set_delay(0.0); // delay == 1000 samples at this output rate
        for _ in 0..5 {
            lfo.update();
        }
        assert_eq!(lfo.value(), 0.0);
    }

    #[test]
    fn ramps_up_then_reflects_back_down() {
        let mut lfo = Lfo::new(1000.0, 1);
        lfo.set_delay(-12000.0); // ~1ms delay, negligible at this rate
        lfo.set_frequency(0.0); // absoluteCentToHertz(0) == 8.176 Hz
        let mut peak = 0.0f64;
        for _ in 0..2000 {
            lfo.update();
            peak = peak.max(lfo.value());
        }
        assert!(peak <= 1.0);
        assert!(peak > 0.5);
    }
}
