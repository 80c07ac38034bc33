use std::fmt::Debug;
use std::sync::Arc;

use rand::Rng;

use crate::{Color, CrateRng, Hit, Ray, Texture, Vec3};

/// A scattered ray and its color information
pub struct Scatter {
    pub attenuation: Color,
    pub ray: Ray,
}

impl Scatter {
    pub fn new(attenuation: Color, ray: Ray) -> Self {
        Self { attenuation, ray }
    }
}

pub trait Material: Send + Sync + Debug {
    /// A material will either absorb a ray (`None`) or scatter it.
    fn scatter(&self, ray: &Ray, hit: &Hit, rng: &mut CrateRng) -> Option<Scatter>;

    /// Radiance the material emits at the hit point. Black for everything
    /// except light sources.
    fn emitted(&self, _u: f64, _v: f64, _point: Vec3) -> Color {
        Color::BLACK
    }
}

// ===== Blanket Impls ======
impl<M: Material> Material for Arc<M> {
    fn scatter(&self, ray: &Ray, hit: &Hit, rng: &mut CrateRng) -> Option<Scatter> {
        // Use fully qualified syntax to prevent recursion
        <M as Material>::scatter(self, ray, hit, rng)
    }

    fn emitted(&self, u: f64, v: f64, point: Vec3) -> Color {
        <M as Material>::emitted(self, u, v, point)
    }
}

/// Diffuse reflection
#[derive(Clone, Debug)]
pub struct Lambertian<T> {
    pub albedo: T,
}

impl<T> Lambertian<T> {
    pub fn new(albedo: T) -> Self {
        Self { albedo }
    }
}

impl<T: Texture> Material for Lambertian<T> {
    fn scatter(&self, ray: &Ray, hit: &Hit, rng: &mut CrateRng) -> Option<Scatter> {
        let scatter_dir = hit.normal + Vec3::rand_unit(rng);
        let scattered = Ray::new(hit.point, scatter_dir, ray.time);
        let attenuation = self.albedo.value(hit.u, hit.v, hit.point);
        Some(Scatter::new(attenuation, scattered))
    }
}

/// Specular reflection with an optional fuzz radius.
#[derive(Clone, Debug)]
pub struct Metal {
    pub albedo: Color,
    /// The fuzziness of the Metal. Is between `0.0` and `1.0`
    pub fuzz: f64,
}

impl Metal {
    pub fn new(albedo: Color, fuzz: f64) -> Self {
        let fuzz = fuzz.max(0.).min(1.);
        Self { albedo, fuzz }
    }

    pub fn from(rgb: [f64; 3], fuzz: f64) -> Self {
        Self::new(rgb.into(), fuzz)
    }
}

impl Material for Metal {
    fn scatter(&self, ray: &Ray, hit: &Hit, rng: &mut CrateRng) -> Option<Scatter> {
        let fuzz = self.fuzz * Vec3::rand_in_unit_sphere(rng);
        let reflected = ray.dir.reflect(hit.normal) + fuzz;

        // The fuzz can push the reflection below the surface. The ray is
        // absorbed in that case.
        if reflected.dot(hit.normal) <= 0. {
            return None;
        }
        let scattered = Ray::new(hit.point, reflected, ray.time);
        Some(Scatter::new(self.albedo, scattered))
    }
}

/// Clear refractive material like glass or water.
#[derive(Clone, Debug)]
pub struct Dielectric {
    pub ref_index: f64,
}

impl Dielectric {
    pub fn new(ref_index: f64) -> Self {
        Self { ref_index }
    }

    /// Schlick's approximation of the reflection coefficient.
    pub fn schlick(cos: f64, eta_i_over_eta_t: f64) -> f64 {
        let r0 = (1. - eta_i_over_eta_t) / (1. + eta_i_over_eta_t);
        let r0 = r0 * r0;
        r0 + (1. - r0) * (1. - cos).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray: &Ray, hit: &Hit, rng: &mut CrateRng) -> Option<Scatter> {
        let eta_i_over_eta_t = if hit.front_face {
            1. / self.ref_index
        } else {
            self.ref_index
        };
        let unit_dir = Vec3::unit(ray.dir);
        let cos_theta = (-unit_dir).dot(hit.normal).min(1.);
        let sin_theta = (1. - cos_theta * cos_theta).sqrt();

        // Reflect on total internal reflection, or with Schlick probability.
        let dir = if eta_i_over_eta_t * sin_theta > 1.
            || rng.gen::<f64>() < Self::schlick(cos_theta, eta_i_over_eta_t)
        {
            unit_dir.reflect(hit.normal)
        } else {
            unit_dir.refract(hit.normal, eta_i_over_eta_t)
        };

        let scattered = Ray::new(hit.point, dir, ray.time);
        Some(Scatter::new(Color::WHITE, scattered))
    }
}

/// An emitter. Injects radiance into the integrator and never scatters.
#[derive(Clone, Debug)]
pub struct DiffuseLight<T> {
    pub emit: T,
}

impl<T> DiffuseLight<T> {
    pub fn new(emit: T) -> Self {
        Self { emit }
    }
}

impl<T: Texture> Material for DiffuseLight<T> {
    fn scatter(&self, _ray: &Ray, _hit: &Hit, _rng: &mut CrateRng) -> Option<Scatter> {
        None
    }

    fn emitted(&self, u: f64, v: f64, point: Vec3) -> Color {
        self.emit.value(u, v, point)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn head_on_hit<'a>(material: &'a dyn Material) -> (Ray, Hit<'a>) {
        let ray = Ray::new(Vec3::new(0., 1., 0.), -Vec3::UNIT_Y, 0.);
        let hit = Hit::new(Vec3::ORIGIN, Vec3::UNIT_Y, 1., true, material, 0.5, 0.5);
        (ray, hit)
    }

    fn displayable(c: Color) -> bool {
        let bounds = 0.0..=1.0;
        bounds.contains(&c.r) && bounds.contains(&c.g) && bounds.contains(&c.b)
    }

    #[test]
    fn lambertian_attenuation_is_displayable() {
        let mut rng = CrateRng::seed_from_u64(1);
        let material = Lambertian::new(Color::new(0.5, 0.5, 0.5));
        for _ in 0..100 {
            let (ray, hit) = head_on_hit(&material);
            let scatter = material.scatter(&ray, &hit, &mut rng).unwrap();
            assert!(displayable(scatter.attenuation));
        }
    }

    #[test]
    fn lambertian_scatters_into_upper_hemisphere() {
        let mut rng = CrateRng::seed_from_u64(2);
        let material = Lambertian::new(Color::new(0.8, 0.2, 0.2));
        for _ in 0..100 {
            let (ray, hit) = head_on_hit(&material);
            let scatter = material.scatter(&ray, &hit, &mut rng).unwrap();
            // normal + unit vector can graze the surface but never enter it
            assert!(scatter.ray.dir.dot(hit.normal) >= 0.);
        }
    }

    #[test]
    fn polished_metal_reflects_exactly() {
        let mut rng = CrateRng::seed_from_u64(3);
        let material = Metal::from([0.7, 0.6, 0.5], 0.);
        let ray = Ray::new(Vec3::new(-1., 1., 0.), Vec3::new(1., -1., 0.), 0.);
        let hit = Hit::new(Vec3::ORIGIN, Vec3::UNIT_Y, 1., true, &material, 0., 0.);
        let scatter = material.scatter(&ray, &hit, &mut rng).unwrap();
        assert!(displayable(scatter.attenuation));
        let expected = Vec3::unit(Vec3::new(1., 1., 0.));
        assert!((scatter.ray.dir - expected).length() < 1e-12);
    }

    #[test]
    fn metal_fuzz_is_clamped() {
        assert_eq!(Metal::from([1., 1., 1.], 7.).fuzz, 1.);
        assert_eq!(Metal::from([1., 1., 1.], -3.).fuzz, 0.);
    }

    #[test]
    fn dielectric_attenuation_is_always_white() {
        let mut rng = CrateRng::seed_from_u64(4);
        let material = Dielectric::new(1.5);
        for _ in 0..100 {
            let (ray, hit) = head_on_hit(&material);
            let scatter = material.scatter(&ray, &hit, &mut rng).unwrap();
            assert_eq!(scatter.attenuation, Color::WHITE);
        }
    }

    #[test]
    fn dielectric_refracts_at_normal_incidence() {
        // sin(0) = 0 can never exceed the critical angle, so a head-on ray
        // must refract whenever the Schlick draw lets it through.
        let mut rng = CrateRng::seed_from_u64(5);
        let material = Dielectric::new(1.5);
        let mut refracted = 0;
        for _ in 0..1000 {
            let (ray, hit) = head_on_hit(&material);
            let scatter = material.scatter(&ray, &hit, &mut rng).unwrap();
            if scatter.ray.dir.dot(hit.normal) < 0. {
                // Continues straight through, no bend at normal incidence.
                assert!((scatter.ray.dir - Vec3::unit(ray.dir)).length() < 1e-12);
                refracted += 1;
            }
        }
        // Schlick reflectance at normal incidence for 1.5 is only 4%.
        assert!(refracted > 900, "refracted {} of 1000", refracted);
    }

    #[test]
    fn diffuse_light_emits_and_never_scatters() {
        let mut rng = CrateRng::seed_from_u64(6);
        let material = DiffuseLight::new(Color::new(4., 4., 4.));
        let (ray, hit) = head_on_hit(&material);
        assert!(material.scatter(&ray, &hit, &mut rng).is_none());
        assert_eq!(
            material.emitted(hit.u, hit.v, hit.point),
            Color::new(4., 4., 4.)
        );
    }

    #[test]
    fn default_emission_is_black() {
        let material = Lambertian::new(Color::WHITE);
        assert_eq!(material.emitted(0., 0., Vec3::ORIGIN), Color::BLACK);
    }
}
