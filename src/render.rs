use std::sync::atomic::{AtomicUsize, Ordering};

use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::{Camera, Color, CrateRng, Hittable, Ray, Screen, Vec3};

/// Hits closer than this are ignored so a scattered ray can't re-intersect
/// the surface it just left ("shadow acne").
const T_MIN: f64 = 1e-3;

/// What a ray that escapes the scene contributes.
#[derive(Clone, Debug)]
pub enum Background {
    Solid(Color),
    /// Blend from `bottom` to `top` over the ray's vertical direction.
    VerticalGradient { bottom: Color, top: Color },
}

impl Background {
    /// The classic daylight gradient.
    pub const SKY: Self = Background::VerticalGradient {
        bottom: Color::WHITE,
        top: Color::new(0.5, 0.7, 1.0),
    };

    pub fn color(&self, ray: &Ray) -> Color {
        match self {
            Background::Solid(color) => *color,
            Background::VerticalGradient { bottom, top } => {
                let unit = Vec3::unit(ray.dir);
                let t = 0.5 * (unit.y + 1.);
                (1. - t) * *bottom + t * *top
            }
        }
    }
}

/// Estimate the radiance arriving along `ray`. One call is one light path.
///
/// Written as a loop over bounces instead of recursion: `throughput` is the
/// product of attenuations so far, `radiance` the emission collected so
/// far. Exhausting the bounce budget terminates the path with no further
/// contribution.
pub fn ray_color(
    ray: Ray,
    background: &Background,
    world: &dyn Hittable,
    max_depth: u32,
    rng: &mut CrateRng,
) -> Color {
    let mut radiance = Color::BLACK;
    let mut throughput = Color::WHITE;
    let mut ray = ray;

    for _ in 0..max_depth {
        let hit = match world.hit(&ray, &(T_MIN..f64::INFINITY)) {
            Some(hit) => hit,
            None => return radiance + throughput * background.color(&ray),
        };

        radiance += throughput * hit.material.emitted(hit.u, hit.v, hit.point);
        match hit.material.scatter(&ray, &hit, rng) {
            Some(scatter) => {
                throughput *= scatter.attenuation;
                ray = scatter.ray;
            }
            // Absorbed. Emitters land here too: their radiance is already
            // accounted for.
            None => break,
        }
    }

    radiance
}

/// Per-render knobs consumed by the driver.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    pub samples: u16,
    pub max_depth: u32,
    pub gamma: f64,
    /// Jitter sample positions inside each pixel. Off means every sample
    /// goes through the pixel's top-left corner, which is only useful for
    /// reproducible tests and quick previews.
    pub antialias: bool,
    /// Seed for reproducible renders. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            samples: 100,
            max_depth: 50,
            gamma: 2.,
            antialias: true,
            seed: None,
        }
    }
}

/// Render the scene into `screen`, one rayon task per image row.
///
/// The scene is read-only and every worker writes only its own row slice,
/// so the hot path takes no locks. `rows_done` is bumped once per finished
/// row for an (optional) progress reporter to poll.
pub fn render(
    screen: &mut Screen,
    camera: &Camera,
    world: &dyn Hittable,
    background: &Background,
    opts: &RenderOpts,
    rows_done: &AtomicUsize,
) {
    let width = screen.width;
    let height = screen.height;
    assert!(width > 1 && height > 1, "Render target is degenerate");

    screen.par_rows_mut().enumerate().for_each(|(row, pixels)| {
        // Every worker owns its generator. Seeded runs decorrelate rows by
        // mixing the row index into the seed.
        let mut rng = match opts.seed {
            Some(seed) => {
                CrateRng::seed_from_u64(seed ^ (row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
            }
            None => CrateRng::from_entropy(),
        };

        // Buffer row 0 is the top of the image.
        let j = (height - row - 1) as f64;
        for (col, pixel) in pixels.iter_mut().enumerate() {
            let mut sum = Color::BLACK;
            for _ in 0..opts.samples {
                let (di, dj) = if opts.antialias {
                    (rng.gen::<f64>(), rng.gen::<f64>())
                } else {
                    (0., 0.)
                };
                let s = (col as f64 + di) / (width - 1) as f64;
                let t = (j + dj) / (height - 1) as f64;
                let ray = camera.get_ray(s, t, &mut rng);
                sum += ray_color(ray, background, world, opts.max_depth, &mut rng);
            }
            *pixel = (sum / f64::from(opts.samples)).gamma_corrected(opts.gamma);
        }

        rows_done.fetch_add(1, Ordering::Relaxed);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{DiffuseLight, Lambertian};
    use crate::shape::{Sphere, XzRect};
    use crate::HitList;

    fn test_opts() -> RenderOpts {
        RenderOpts {
            samples: 1,
            max_depth: 1,
            gamma: 1.,
            antialias: false,
            seed: Some(0),
        }
    }

    #[test]
    fn depth_budget_of_zero_is_black() {
        let mut rng = CrateRng::seed_from_u64(0);
        let world = HitList::new();
        let ray = Ray::new(Vec3::ORIGIN, -Vec3::UNIT_Z, 0.);
        let color = ray_color(ray, &Background::SKY, &world, 0, &mut rng);
        assert_eq!(color, Color::BLACK);
    }

    #[test]
    fn a_light_is_seen_directly() {
        let mut rng = CrateRng::seed_from_u64(0);
        let mut world = HitList::new();
        world.push(XzRect::new(
            -1.0..1.0,
            -1.0..1.0,
            2.,
            DiffuseLight::new(Color::new(4., 4., 4.)),
        ));
        let ray = Ray::new(Vec3::ORIGIN, Vec3::UNIT_Y, 0.);
        let background = Background::Solid(Color::BLACK);
        let color = ray_color(ray, &background, &world, 5, &mut rng);
        assert_eq!(color, Color::new(4., 4., 4.));
    }

    #[test]
    fn empty_scene_renders_the_background_exactly() {
        let camera = Camera::builder().aspect_ratio(2.).build().unwrap();
        let world = HitList::new();
        let mut screen = Screen::new(8, 4);
        let rows_done = AtomicUsize::new(0);

        render(
            &mut screen,
            &camera,
            &world,
            &Background::SKY,
            &test_opts(),
            &rows_done,
        );
        assert_eq!(rows_done.load(Ordering::Relaxed), 4);

        // Re-derive each pixel's ray: with antialiasing off and no lens or
        // shutter, the driver is deterministic.
        let mut rng = CrateRng::seed_from_u64(0);
        for row in 0..4usize {
            let j = (4 - row - 1) as f64;
            for col in 0..8usize {
                let s = col as f64 / 7.;
                let t = j / 3.;
                let expected = Background::SKY.color(&camera.get_ray(s, t, &mut rng));
                assert_eq!(screen.buffer[row * 8 + col], expected);
            }
        }
    }

    #[test]
    fn top_edge_pixel_of_the_two_sphere_scene_is_sky() {
        let mut world = HitList::new();
        world.push(Sphere::from(
            [0., 0., -1.],
            0.5,
            Lambertian::new(Color::new(0.5, 0.5, 0.5)),
        ));
        world.push(Sphere::from(
            [0., -100.5, -1.],
            100.,
            Lambertian::new(Color::new(0.5, 0.5, 0.5)),
        ));

        let (width, height) = (4usize, 2usize);
        let camera = Camera::builder()
            .origin(Vec3::ORIGIN)
            .look_at([0., 0., -1.])
            .vfov_degrees(90.)
            .aspect_ratio(width as f64 / height as f64)
            .build()
            .unwrap();

        let mut screen = Screen::new(width, height);
        let rows_done = AtomicUsize::new(0);
        render(
            &mut screen,
            &camera,
            &world,
            &Background::SKY,
            &test_opts(),
            &rows_done,
        );

        // The top-left ray clears both spheres, so the pixel must be the
        // sky formula evaluated for exactly that ray.
        let mut rng = CrateRng::seed_from_u64(0);
        let ray = camera.get_ray(0., 1., &mut rng);
        let unit = Vec3::unit(ray.dir);
        let t = 0.5 * (unit.y + 1.);
        let expected = (1. - t) * Color::WHITE + t * Color::new(0.5, 0.7, 1.0);
        assert_eq!(screen.buffer[0], expected);
    }
}
