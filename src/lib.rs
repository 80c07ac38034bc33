pub mod camera;
pub mod color;
pub mod config;
pub mod hit;
pub mod material;
pub mod ray;
pub mod render;
pub mod screen;
pub mod shape;
pub mod texture;
pub mod vec3;

pub use camera::Camera;
pub use color::Color;
pub use hit::{Aabb, Bvh, Hit, HitList, Hittable};
pub use material::Material;
pub use ray::Ray;
pub use render::Background;
pub use screen::Screen;
pub use texture::Texture;
pub use vec3::{Axis, Vec3};

/// The rng used throughout the crate. Every function that needs randomness
/// takes one of these by `&mut`; there is no global generator.
pub type CrateRng = rand::rngs::SmallRng;

/// Interpolation helpers on `f64`.
pub trait F64Ext {
    /// Linearly interpolate between `a` and `b`, treating `self` as the
    /// interpolation parameter.
    fn lerp(self, a: f64, b: f64) -> f64;
    /// Hermite smoothstep of `self`, assumed to lie in `[0, 1]`.
    fn smooth(self) -> f64;
}

impl F64Ext for f64 {
    fn lerp(self, a: f64, b: f64) -> f64 {
        a + self * (b - a)
    }

    fn smooth(self) -> f64 {
        self * self * (3. - 2. * self)
    }
}

#[cfg(test)]
mod tests {
    use super::F64Ext;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(0.0.lerp(2., 8.), 2.);
        assert_eq!(1.0.lerp(2., 8.), 8.);
        assert_eq!(0.5.lerp(2., 8.), 5.);
    }

    #[test]
    fn smooth_is_hermite() {
        assert_eq!(0.0.smooth(), 0.);
        assert_eq!(1.0.smooth(), 1.);
        assert_eq!(0.5.smooth(), 0.5);
    }
}
