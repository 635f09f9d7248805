//! A stereo sample pair, summed across voices and channels on every render
//! tick.

use std::ops::{Add, AddAssign, Mul};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoValue {
    pub left: f64,
    pub right: f64,
}

impl StereoValue {
    pub const ZERO: StereoValue = StereoValue { left: 0.0, right: 0.0 };
}

impl Add for StereoValue {
    type Output = StereoValue;
    fn add(self, rhs: Self) -> Self {
        StereoValue { left: self.left + rhs.left, right: self.right + rhs.right }
    }
}

impl AddAssign for StereoValue {
    fn add_assign(&mut self, rhs: Self) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl Mul<f64> for StereoValue {
    type Output = StereoValue;
    fn mul(self, b: f64) -> StereoValue {
        StereoValue { left: self.left * b, right: self.right * b }
    }
}

impl Mul<StereoValue> for f64 {
    type Output = StereoValue;
    fn mul(self, b: StereoValue) -> StereoValue {
        StereoValue { left: self * b.left, right: self * b.right }
    }
}
