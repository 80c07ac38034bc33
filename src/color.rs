use std::ops;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::{CrateRng, Texture, Vec3};

/// A linear rgb triple. Each channel ranges from 0.0 to 1.0 for displayable
/// colors; emissive materials may exceed 1.0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Self = Self::new(0., 0., 0.);
    pub const WHITE: Self = Self::new(1., 1., 1.);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn rand(rng: &mut CrateRng) -> Self {
        let rgb = rng.gen::<[f64; 3]>();
        rgb.into()
    }

    pub fn rand_range(rng: &mut CrateRng, low: f64, high: f64) -> Self {
        let distr = Uniform::new(low, high);
        [
            distr.sample(rng),
            distr.sample(rng),
            distr.sample(rng),
        ]
        .into()
    }

    /// Raise every channel to `1 / gamma`.
    pub fn gamma_corrected(&self, gamma: f64) -> Self {
        let exp = 1. / gamma;
        Self::new(self.r.powf(exp), self.g.powf(exp), self.b.powf(exp))
    }

    pub fn is_nan(&self) -> bool {
        self.r.is_nan() || self.g.is_nan() || self.b.is_nan()
    }
}

/// A `Color` is its own constant texture.
impl Texture for Color {
    fn value(&self, _u: f64, _v: f64, _point: Vec3) -> Color {
        *self
    }
}

impl From<[f64; 3]> for Color {
    fn from(rgb: [f64; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

impl Default for Color {
    /// Returns white
    fn default() -> Self {
        Self::WHITE
    }
}

impl ops::Add for Color {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}
impl ops::AddAssign for Color {
    fn add_assign(&mut self, rhs: Self) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}
impl ops::Mul for Color {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}
impl ops::MulAssign for Color {
    fn mul_assign(&mut self, rhs: Self) {
        self.r *= rhs.r;
        self.g *= rhs.g;
        self.b *= rhs.b;
    }
}
impl ops::Mul<f64> for Color {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}
impl ops::Mul<Color> for f64 {
    type Output = Color;

    fn mul(self, rhs: Color) -> Self::Output {
        rhs * self
    }
}
impl ops::MulAssign<f64> for Color {
    fn mul_assign(&mut self, rhs: f64) {
        self.r *= rhs;
        self.g *= rhs;
        self.b *= rhs;
    }
}
impl ops::Div<f64> for Color {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.r / rhs, self.g / rhs, self.b / rhs)
    }
}
impl ops::DivAssign<f64> for Color {
    fn div_assign(&mut self, rhs: f64) {
        self.r /= rhs;
        self.g /= rhs;
        self.b /= rhs;
    }
}
