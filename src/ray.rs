use crate::Vec3;

/// A half-line `origin + t * dir`. `time` records when the ray was cast,
/// for motion blur against moving geometry. `dir` is not required to be
/// normalized.
#[derive(Clone, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
    pub time: f64,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3, time: f64) -> Self {
        Self { origin, dir, time }
    }

    /// # Example
    /// ```
    /// # use pathtracing::{Ray, Vec3};
    /// let ray = Ray::new(Vec3::ORIGIN, Vec3::new(0., 0., -1.), 0.);
    /// assert_eq!(ray.at(2.), Vec3::new(0., 0., -2.));
    /// ```
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + t * self.dir
    }
}
