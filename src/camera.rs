use std::ops::Range;

use anyhow::{Context, Result};
use rand::distributions::{Distribution, Uniform};

use crate::{CrateRng, Ray, Vec3};

/// Thin-lens camera. Immutable once built; shared read-only across render
/// workers.
#[derive(Debug)]
pub struct Camera {
    pub origin: Vec3,
    pub horiz: Vec3,
    pub vert: Vec3,
    pub lower_left: Vec3,

    /// Used for depth of field. Set to `None` to disable depth of field.
    pub lens_radius: Option<f64>,
    /// Used for motion blur. Set to `None` to disable.
    pub shutter_time: Option<Uniform<f64>>,
    /// Width part of the orthonormal basis.
    pub u: Vec3,
    /// Height part of the orthonormal basis.
    pub v: Vec3,
    /// Depth part of the orthonormal basis.
    pub w: Vec3,
}

impl Camera {
    pub fn builder() -> CameraBuilder {
        CameraBuilder::default()
    }

    /// Fire a ray through the viewport point at normalized screen
    /// coordinates `(s, t)`, both in `[0, 1]`.
    pub fn get_ray(&self, s: f64, t: f64, rng: &mut CrateRng) -> Ray {
        let origin = if let Some(radius) = self.lens_radius {
            let rand_disk = radius * Vec3::rand_in_unit_disk(rng);
            let offset = rand_disk.x * self.u + rand_disk.y * self.v;
            self.origin + offset
        } else {
            self.origin
        };
        let time = self.shutter_time.map_or(0., |shutter| shutter.sample(rng));

        Ray::new(
            origin,
            self.lower_left + s * self.horiz + t * self.vert - origin,
            time,
        )
    }
}

#[derive(Debug)]
pub struct CameraBuilder {
    origin: Vec3,
    look_at: Vec3,
    view_up: Vec3,
    vfov_degrees: f64,
    aspect_ratio: f64,
    /// Used for depth of field. Set to `None` to disable depth of field.
    aperture: Option<f64>,
    /// If None, defaults to the distance between `origin` and `look_at`.
    focus_dist: Option<f64>,
    /// Used for motion blur. Set to `None` to disable.
    shutter_time: Option<Range<f64>>,
}

impl CameraBuilder {
    pub fn build(&self) -> Result<Camera> {
        let lens_radius = self.aperture.map(|a| a / 2.);
        let focus_dist = self
            .focus_dist
            .unwrap_or_else(|| (self.origin - self.look_at).length());
        let shutter_time = self.shutter_time.clone().map(Uniform::from);

        let theta = self.vfov_degrees.to_radians() / 2.;
        let half_height = focus_dist * theta.tan();
        let half_width = self.aspect_ratio * half_height;

        // Project view_up onto the camera plane to form the orthonormal
        // basis, rejecting degenerate configurations.

        let w = Vec3::try_unit(self.origin - self.look_at)
            .with_context(|| {
                format!(
                    "Camera's origin and look_at are the same point: {:?}",
                    self.origin,
                )
            })
            .camera_context(self)?;

        let view_up = Vec3::try_unit(self.view_up)
            .with_context(|| format!("Camera's view_up vector has length 0: {:?}", self.view_up))
            .camera_context(self)?;

        let u = Vec3::try_unit(view_up.cross(w))
            .with_context(|| {
                format!(
                    "Camera's view direction and view_up are parallel.\nResp.: {:?} || {:?}",
                    self.look_at, view_up,
                )
            })
            .camera_context(self)?;

        let v = w.cross(u);
        let lower_left = self.origin - u * half_width - v * half_height - focus_dist * w;
        let horiz = 2. * u * half_width;
        let vert = 2. * v * half_height;

        Ok(Camera {
            origin: self.origin,
            horiz,
            vert,
            lower_left,
            lens_radius,
            shutter_time,
            u,
            v,
            w,
        })
    }

    // ===== Builder Methods =====
    pub fn origin<T: Into<Vec3>>(&mut self, origin: T) -> &mut Self {
        self.origin = origin.into();
        self
    }
    pub fn look_at<T: Into<Vec3>>(&mut self, look_at: T) -> &mut Self {
        self.look_at = look_at.into();
        self
    }
    pub fn view_up<T: Into<Vec3>>(&mut self, view_up: T) -> &mut Self {
        self.view_up = view_up.into();
        self
    }
    pub fn vfov_degrees(&mut self, vfov: f64) -> &mut Self {
        self.vfov_degrees = vfov;
        self
    }
    pub fn aspect_ratio(&mut self, aspect_ratio: f64) -> &mut Self {
        self.aspect_ratio = aspect_ratio;
        self
    }
    /// Used for depth of field. Set to `None` to disable depth of field.
    pub fn aperture<T: Into<Option<f64>>>(&mut self, aperture: T) -> &mut Self {
        self.aperture = aperture.into();
        self
    }
    /// If None, defaults to the distance between `origin` and `look_at`.
    pub fn focus_dist<T: Into<Option<f64>>>(&mut self, dist: T) -> &mut Self {
        self.focus_dist = dist.into();
        self
    }
    /// Used for motion blur. Set to `None` to disable.
    pub fn shutter_time<T: Into<Option<Range<f64>>>>(&mut self, range: T) -> &mut Self {
        self.shutter_time = range.into();
        self
    }
}

impl Default for CameraBuilder {
    fn default() -> Self {
        Self {
            origin: Vec3::ORIGIN,
            look_at: Vec3::new(0., 0., -1.),
            view_up: Vec3::UNIT_Y,
            vfov_degrees: 60.,
            aspect_ratio: 16. / 9.,
            aperture: None,
            focus_dist: None,
            shutter_time: None,
        }
    }
}

trait ResultExt {
    fn camera_context(self, builder: &CameraBuilder) -> Result<Vec3>;
}
impl ResultExt for Result<Vec3> {
    /// Attach the CameraBuilder to the Result as context.
    fn camera_context(self, builder: &CameraBuilder) -> Result<Vec3> {
        self.with_context(|| format!("Invalid Camera configuration.\n{:#?}", builder))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn basis_is_orthonormal() {
        let camera = Camera::builder()
            .origin([13., 2., 3.])
            .look_at([0., 0., 0.])
            .vfov_degrees(20.)
            .build()
            .unwrap();
        assert!(camera.u.dot(camera.v).abs() < 1e-12);
        assert!(camera.u.dot(camera.w).abs() < 1e-12);
        assert!((camera.u.length() - 1.).abs() < 1e-12);
        assert!((camera.v.length() - 1.).abs() < 1e-12);
        assert!((camera.w.length() - 1.).abs() < 1e-12);
    }

    #[test]
    fn look_at_equals_origin_is_rejected() {
        assert!(Camera::builder()
            .origin([1., 1., 1.])
            .look_at([1., 1., 1.])
            .build()
            .is_err());
    }

    #[test]
    fn parallel_view_up_is_rejected() {
        assert!(Camera::builder()
            .origin([0., 5., 0.])
            .look_at([0., 0., 0.])
            .view_up([0., 1., 0.])
            .build()
            .is_err());
    }

    #[test]
    fn center_ray_points_at_look_at() {
        let camera = Camera::builder()
            .origin([0., 0., 0.])
            .look_at([0., 0., -1.])
            .vfov_degrees(90.)
            .aspect_ratio(1.)
            .build()
            .unwrap();
        let mut rng = CrateRng::seed_from_u64(0);
        let ray = camera.get_ray(0.5, 0.5, &mut rng);
        let dir = Vec3::unit(ray.dir);
        assert!((dir - Vec3::new(0., 0., -1.)).length() < 1e-12);
    }

    #[test]
    fn shutterless_rays_are_cast_at_time_zero() {
        let camera = Camera::builder().build().unwrap();
        let mut rng = CrateRng::seed_from_u64(1);
        assert_eq!(camera.get_ray(0.2, 0.8, &mut rng).time, 0.);
    }

    #[test]
    fn shutter_draws_times_inside_the_interval() {
        let camera = Camera::builder().shutter_time(0.25..0.75).build().unwrap();
        let mut rng = CrateRng::seed_from_u64(2);
        for _ in 0..100 {
            let time = camera.get_ray(0.5, 0.5, &mut rng).time;
            assert!((0.25..0.75).contains(&time));
        }
    }
}
