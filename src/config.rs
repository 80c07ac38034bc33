use std::num::{NonZeroU16, NonZeroU32, NonZeroUsize};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use rand::Rng;
use structopt::StructOpt;
use strum::VariantNames;
use strum_macros::Display as StrumDisplay;
use strum_macros::{EnumString, EnumVariantNames};

use crate::material::{Dielectric, DiffuseLight, Lambertian, Metal};
use crate::render::{Background, RenderOpts};
use crate::shape::{Cuboid, MovingSphere, RotateY, Sphere, Translate, XyRect, XzRect, YzRect};
use crate::texture::{Checkered, ImageTexture, Marble};
use crate::{Bvh, Camera, Color, CrateRng, HitList, Vec3};

static CONFIG: OnceCell<Config> = OnceCell::new();

#[allow(non_snake_case)]
/// Return a `Config` built from command line args
pub fn GLOBAL() -> &'static Config {
    CONFIG.get_or_init(Config::from_args)
}

#[derive(Clone, Debug, StructOpt)]
pub struct Config {
    #[structopt(short, long, default_value = "1024", display_order = 0)]
    /// Width of render
    pub width: NonZeroUsize,

    #[structopt(short, long, default_value = "576", display_order = 1)]
    /// Height of render
    pub height: NonZeroUsize,

    #[structopt(
        help = "Disable antialiasing",
        short = "n",
        long = "no-aa",
        // Disable antialiasing if the flag is given at least once
        parse(from_occurrences = invert_bool),
    )]
    /// Controls antialiasing
    pub antialias: bool,

    #[structopt(short, long, default_value = "100")]
    /// Number of samples per pixel
    pub samples: NonZeroU16,

    #[structopt(short, long, default_value = "50")]
    /// Maximum ray bounce depth
    pub max_depth: NonZeroU32,

    #[structopt(short, long, default_value = "2.0")]
    /// Gamma exponent applied to the averaged samples
    pub gamma: f64,

    #[structopt(short = "r", long = "rng")]
    /// Use a specific seed for the rng.
    pub seed: Option<u64>,

    #[structopt(short, long, default_value = "render.ppm")]
    /// Path of the output image
    pub output: PathBuf,

    #[structopt(short, long)]
    /// Image asset used by the Earth scene
    pub texture: Option<PathBuf>,

    #[structopt(
        default_value = "Random",
        // Using this instead of possible_values because possible_values doesn't wrap properly
        parse(try_from_str = parse_scene),
    )]
    /// The scene to render
    pub scene: Scene,
}

impl Config {
    pub fn render_opts(&self) -> RenderOpts {
        RenderOpts {
            samples: self.samples.get(),
            max_depth: self.max_depth.get(),
            gamma: self.gamma,
            antialias: self.antialias,
            seed: self.seed,
        }
    }

    fn aspect_ratio(&self) -> f64 {
        self.width.get() as f64 / self.height.get() as f64
    }
}

fn parse_scene(s: &str) -> Result<Scene> {
    s.parse::<Scene>().map_err(|_| {
        anyhow!(
            "\"{}\" isn't a Scene.\nPossible values: {:#?}",
            s,
            Scene::VARIANTS
        )
    })
}

fn invert_bool(i: u64) -> bool {
    i == 0
}

#[derive(Copy, Clone, Debug, StrumDisplay, EnumString, EnumVariantNames, PartialEq)]
pub enum Scene {
    Random,
    TwoSpheres,
    PerlinSpheres,
    Earth,
    SimpleLight,
    CornellBox,
}

impl Scene {
    /// Build everything the renderer needs. Fails synchronously on an
    /// invalid camera configuration, before any worker starts.
    pub fn create(
        self,
        config: &Config,
        rng: &mut CrateRng,
    ) -> Result<(Camera, HitList, Background)> {
        let camera = self.camera(config)?;
        Ok((camera, self.world(config, rng), self.background()))
    }

    pub fn camera(self, config: &Config) -> Result<Camera> {
        use Scene::*;
        let aspect = config.aspect_ratio();
        let result = match self {
            Random => Camera::builder()
                .origin([13., 2., 3.])
                .look_at([0., 0., 0.])
                .vfov_degrees(20.)
                .aspect_ratio(aspect)
                .aperture(0.1)
                .focus_dist(10.)
                .shutter_time(0.0..1.0)
                .build(),
            TwoSpheres | PerlinSpheres => Camera::builder()
                .origin([13., 2., 3.])
                .look_at([0., 0., 0.])
                .vfov_degrees(20.)
                .aspect_ratio(aspect)
                .focus_dist(10.)
                .build(),
            Earth => Camera::builder()
                .origin([13., 2., 3.])
                .look_at([0., 0., 0.])
                .vfov_degrees(20.)
                .aspect_ratio(aspect)
                .build(),
            SimpleLight => Camera::builder()
                .origin([26., 3., 6.])
                .look_at([0., 2., 0.])
                .vfov_degrees(20.)
                .aspect_ratio(aspect)
                .build(),
            CornellBox => Camera::builder()
                .origin([278., 278., -800.])
                .look_at([278., 278., 0.])
                .vfov_degrees(40.)
                .aspect_ratio(aspect)
                .build(),
        };

        result.map_err(|err| err.context(self))
    }

    /// Everything here is lit by the sky except the scenes with their own
    /// light sources.
    pub fn background(self) -> Background {
        use Scene::*;
        match self {
            SimpleLight | CornellBox => Background::Solid(Color::BLACK),
            _ => Background::SKY,
        }
    }

    pub fn world(self, config: &Config, rng: &mut CrateRng) -> HitList {
        use Scene::*;

        match self {
            Random => {
                let mut world = HitList::new();
                let checker = Checkered::color(10., [0.2, 0.3, 0.1], [0.9, 0.9, 0.9]);
                world.push(Sphere::from(
                    [0., -1000., 0.],
                    1000.,
                    Lambertian::new(checker),
                ));

                let mut bvh_list = HitList::new();
                for a in -11..11 {
                    for b in -11..11 {
                        let (x, z) = (0.9 * rng.gen::<f64>(), 0.9 * rng.gen::<f64>());
                        let center = Vec3::new(a as f64 + x, 0.2, b as f64 + z);
                        if (center - Vec3::new(4., 0.2, 0.)).length() <= 0.9 {
                            continue;
                        }
                        let material = rng.gen::<f64>();
                        if material < 0.8 {
                            // diffuse
                            let material = Lambertian::new(Color::rand(rng) * Color::rand(rng));
                            let center2 = center + Vec3::new(0., rng.gen_range(0., 0.5), 0.);
                            bvh_list.push(MovingSphere::new(
                                center,
                                center2,
                                0.0..1.0,
                                0.2,
                                material,
                            ));
                        } else if material < 0.95 {
                            // metal
                            let albedo = Color::rand_range(rng, 0.5, 1.);
                            let fuzz = rng.gen_range(0., 0.5);
                            bvh_list.push(Sphere::new(center, 0.2, Metal::new(albedo, fuzz)));
                        } else {
                            // glass
                            bvh_list.push(Sphere::new(center, 0.2, Dielectric::new(1.5)));
                        }
                    }
                }

                bvh_list.push(Sphere::from([0., 1., 0.], 1., Dielectric::new(1.5)));
                bvh_list.push(Sphere::from(
                    [-4., 1., 0.],
                    1.,
                    Lambertian::new(Color::new(0.4, 0.2, 0.1)),
                ));
                bvh_list.push(Sphere::from(
                    [4., 1., 0.],
                    1.,
                    Metal::from([0.7, 0.6, 0.5], 0.0),
                ));

                world.push(Bvh::new(bvh_list, &(0.0..1.0), rng));
                world
            }
            TwoSpheres => {
                let mut world = HitList::new();
                let checker = Checkered::color(10., [0.2, 0.3, 0.1], [0.9, 0.9, 0.9]);
                world.push(Sphere::from(
                    [0., -10., 0.],
                    10.,
                    Lambertian::new(checker.clone()),
                ));
                world.push(Sphere::from([0., 10., 0.], 10., Lambertian::new(checker)));
                world
            }
            PerlinSpheres => {
                let mut world = HitList::new();
                let marble = Marble::new(config.seed, 4.).arc();
                world.push(Sphere::from(
                    [0., -1000., 0.],
                    1000.,
                    Lambertian::new(marble.clone()),
                ));
                world.push(Sphere::from([0., 2., 0.], 2., Lambertian::new(marble)));
                world
            }
            Earth => {
                let mut world = HitList::new();
                let path = config
                    .texture
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("earthmap.jpg"));
                let globe = ImageTexture::open(path);
                world.push(Sphere::from([0., 0., 0.], 2., Lambertian::new(globe)));
                world
            }
            SimpleLight => {
                let mut world = HitList::new();
                let marble = Marble::new(config.seed, 4.).arc();
                world.push(Sphere::from(
                    [0., -1000., 0.],
                    1000.,
                    Lambertian::new(marble.clone()),
                ));
                world.push(Sphere::from([0., 2., 0.], 2., Lambertian::new(marble)));

                let lamp = DiffuseLight::new(Color::new(4., 4., 4.));
                world.push(XyRect::new(3.0..5.0, 1.0..3.0, -2., lamp.clone()));
                world.push(Sphere::from([0., 7., 0.], 2., lamp));
                world
            }
            CornellBox => {
                let mut world = HitList::new();
                let red = Lambertian::new(Color::new(0.65, 0.05, 0.05));
                let white = Lambertian::new(Color::new(0.73, 0.73, 0.73));
                let green = Lambertian::new(Color::new(0.12, 0.45, 0.15));
                let light = DiffuseLight::new(Color::new(15., 15., 15.));

                world.push(YzRect::new(0.0..555.0, 0.0..555.0, 555., green));
                world.push(YzRect::new(0.0..555.0, 0.0..555.0, 0., red));
                world.push(XzRect::new(213.0..343.0, 227.0..332.0, 554., light));
                world.push(XzRect::new(0.0..555.0, 0.0..555.0, 0., white.clone()));
                world.push(XzRect::new(0.0..555.0, 0.0..555.0, 555., white.clone()));
                world.push(XyRect::new(0.0..555.0, 0.0..555.0, 555., white.clone()));

                let tall = Cuboid::new(
                    Vec3::ORIGIN,
                    Vec3::new(165., 330., 165.),
                    white.clone(),
                );
                world.push(Translate::new(
                    RotateY::new(tall, 15.),
                    Vec3::new(265., 0., 295.),
                ));

                let short = Cuboid::new(Vec3::ORIGIN, Vec3::new(165., 165., 165.), white);
                world.push(Translate::new(
                    RotateY::new(short, -18.),
                    Vec3::new(130., 0., 65.),
                ));
                world
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn defaults() -> Config {
        Config::from_iter(&["pathtracing"])
    }

    #[test]
    fn right_case() {
        assert_eq!("Random".parse::<Scene>().unwrap(), Scene::Random);
        assert_eq!("CornellBox".parse::<Scene>().unwrap(), Scene::CornellBox);
    }

    #[test]
    fn wrong_case() {
        "random".parse::<Scene>().unwrap_err();
        "rANDOM".parse::<Scene>().unwrap_err();
        "cornellbox".parse::<Scene>().unwrap_err();
        "cornell-box".parse::<Scene>().unwrap_err();
        "cornell_box".parse::<Scene>().unwrap_err();
    }

    #[test]
    fn every_scene_constructs() {
        let config = defaults();
        let mut rng = CrateRng::seed_from_u64(0);
        for &scene in &[
            Scene::Random,
            Scene::TwoSpheres,
            Scene::PerlinSpheres,
            Scene::Earth,
            Scene::SimpleLight,
            Scene::CornellBox,
        ] {
            let (_, world, _) = scene.create(&config, &mut rng).unwrap();
            assert!(!world.is_empty(), "{} built an empty world", scene);
        }
    }

    #[test]
    fn seeded_config_is_deterministic() {
        let mut config = defaults();
        config.seed = Some(42);
        let mut rng_a = CrateRng::seed_from_u64(42);
        let mut rng_b = CrateRng::seed_from_u64(42);
        let world_a = Scene::Random.world(&config, &mut rng_a);
        let world_b = Scene::Random.world(&config, &mut rng_b);
        assert_eq!(world_a.0.len(), world_b.0.len());
    }
}
