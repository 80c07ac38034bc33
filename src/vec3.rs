use std::ops;

use anyhow::{ensure, Result};
use rand::Rng;
use rand_distr::{Distribution, Standard, Uniform};

use crate::CrateRng;

/// A point or direction in three dimensions.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

const ERR_UNIT_0: &str = "Tried to normalize a vector of length 0!";

impl Vec3 {
    pub const ORIGIN: Self = Self::new(0., 0., 0.);
    // The standard basis
    pub const UNIT_X: Self = Self::new(1., 0., 0.);
    pub const UNIT_Y: Self = Self::new(0., 1., 0.);
    pub const UNIT_Z: Self = Self::new(0., 0., 1.);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// # Example
    /// ```
    /// # use pathtracing::vec3::Vec3;
    /// let v = Vec3::new(0., 3., 4.);
    /// assert_eq!(v.length(), 5.);
    /// ```
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// # Example
    /// ```
    /// # use pathtracing::vec3::Vec3;
    /// let v = Vec3::unit(Vec3::new(2., 0., 0.));
    /// assert_eq!(v, Vec3::new(1., 0., 0.));
    /// ```
    pub fn unit(v: Vec3) -> Self {
        let unit = v / v.length();
        debug_assert!(!unit.is_nan(), "{}", ERR_UNIT_0);
        unit
    }

    /// # Example
    /// ```
    /// # use pathtracing::vec3::Vec3;
    /// assert!(Vec3::try_unit(Vec3::ORIGIN).is_err());
    /// ```
    pub fn try_unit(v: Vec3) -> Result<Self> {
        let length = v.length();
        ensure!(length != 0., ERR_UNIT_0);
        Ok(v / length)
    }

    /// # Example
    /// ```
    /// # use pathtracing::vec3::Vec3;
    /// let a = Vec3::new(1., 2., 3.);
    /// let b = Vec3::new(4., -5., 6.);
    /// assert_eq!(a.dot(b), 12.);
    /// ```
    pub fn dot(&self, rhs: Vec3) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(&self, rhs: Vec3) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// Mirror reflection of the (normalized) vector about `normal`.
    pub fn reflect(&self, normal: Vec3) -> Self {
        let unit = Vec3::unit(*self);
        unit - 2. * unit.dot(normal) * normal
    }

    /// Snell refraction of the (already normalized) vector through a surface
    /// with the given ratio of refractive indices.
    pub fn refract(&self, normal: Vec3, eta_i_over_eta_t: f64) -> Self {
        let cos_theta = (-*self).dot(normal);
        let out_parallel = eta_i_over_eta_t * (*self + cos_theta * normal);
        let out_perp = -normal * (1. - out_parallel.length_squared()).sqrt();
        out_parallel + out_perp
    }

    /// Apply `f` to each component.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }

    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    /// Samples uniformly from the surface of the unit sphere.
    pub fn rand_unit(rng: &mut CrateRng) -> Self {
        rand_distr::UnitSphere.sample(rng).into()
    }

    /// Samples uniformly from the interior of the unit ball.
    pub fn rand_in_unit_sphere(rng: &mut CrateRng) -> Self {
        rand_distr::UnitBall.sample(rng).into()
    }

    /// Samples uniformly from the unit disk in `x` and `y`. `z` is 0.
    pub fn rand_in_unit_disk(rng: &mut CrateRng) -> Self {
        let p = rand_distr::UnitDisc.sample(rng);
        Self::new(p[0], p[1], 0.)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl ops::Index<Axis> for Vec3 {
    type Output = f64;

    fn index(&self, axis: Axis) -> &Self::Output {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}
impl ops::IndexMut<Axis> for Vec3 {
    fn index_mut(&mut self, axis: Axis) -> &mut Self::Output {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

impl ops::Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl ops::Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}
impl ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
impl ops::SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

/// Componentwise product
impl ops::Mul for Vec3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}
impl ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}
impl ops::Mul<Vec3> for f64 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Self::Output {
        rhs * self
    }
}
impl ops::MulAssign<f64> for Vec3 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

impl ops::Div<f64> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}
impl ops::DivAssign<f64> for Vec3 {
    fn div_assign(&mut self, rhs: f64) {
        self.x /= rhs;
        self.y /= rhs;
        self.z /= rhs;
    }
}

/// A coordinate axis, usable to index a `Vec3`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Distribution<Axis> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Axis {
        let distr = Uniform::new(0u8, 3);
        match distr.sample(rng) {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_follows_right_hand_rule() {
        assert_eq!(Vec3::UNIT_X.cross(Vec3::UNIT_Y), Vec3::UNIT_Z);
        assert_eq!(Vec3::UNIT_Y.cross(Vec3::UNIT_Z), Vec3::UNIT_X);
    }

    #[test]
    fn reflect_about_normal() {
        let incoming = Vec3::new(1., -1., 0.);
        let reflected = incoming.reflect(Vec3::UNIT_Y);
        let expected = Vec3::unit(Vec3::new(1., 1., 0.));
        assert!((reflected - expected).length() < 1e-12);
    }

    #[test]
    fn refract_at_normal_incidence_is_straight() {
        // Entering head-on, the ray must not bend regardless of the index.
        let incoming = -Vec3::UNIT_Y;
        let refracted = incoming.refract(Vec3::UNIT_Y, 1. / 1.5);
        assert!((refracted - incoming).length() < 1e-12);
    }
}
