use std::fmt::{self, Debug};
use std::path::Path;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use log::warn;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{Color, CrateRng, F64Ext, Vec3};

/// A pure mapping from surface coordinates to a color. `u`/`v` are the
/// primitive's own parameterization; `point` is the world-space hit point,
/// which the procedural textures use instead.
pub trait Texture: Send + Sync + Debug {
    fn value(&self, u: f64, v: f64, point: Vec3) -> Color;
}

// ===== Blanket Impls ======
impl<T: Texture> Texture for Arc<T> {
    fn value(&self, u: f64, v: f64, point: Vec3) -> Color {
        // Use fully qualified syntax to prevent recursion
        <T as Texture>::value(self, u, v, point)
    }
}

/// Alternates between two sub-textures in a 3D checkerboard pattern.
#[derive(Clone, Debug)]
pub struct Checkered<O, E> {
    pub freq: f64,
    pub odd: O,
    pub even: E,
}

impl<O, E> Checkered<O, E> {
    pub fn new(freq: f64, odd: O, even: E) -> Self {
        Self { freq, odd, even }
    }
}

impl Checkered<Color, Color> {
    pub fn color<T: Into<Color>, U: Into<Color>>(freq: f64, odd: T, even: U) -> Self {
        Self {
            freq,
            odd: odd.into(),
            even: even.into(),
        }
    }
}

impl<O: Texture, E: Texture> Texture for Checkered<O, E> {
    fn value(&self, u: f64, v: f64, point: Vec3) -> Color {
        let mut parity = (point.x * self.freq).sin() < 0.;
        parity ^= (point.y * self.freq).sin() < 0.;
        parity ^= (point.z * self.freq).sin() < 0.;
        if parity {
            self.odd.value(u, v, point)
        } else {
            self.even.value(u, v, point)
        }
    }
}

/// 3D gradient noise: 256 random unit vectors hashed through per-axis
/// permutation tables, trilinearly interpolated with Hermite smoothing.
pub struct Perlin {
    ran_vec: [Vec3; Self::SIZE],
    perm_x: [usize; Self::SIZE],
    perm_y: [usize; Self::SIZE],
    perm_z: [usize; Self::SIZE],
}

impl Perlin {
    const SIZE: usize = 256;
    /// Used for the euclidean remainder by 256.
    const MASK: isize = (Self::SIZE - 1) as isize;

    pub fn new(rng: &mut CrateRng) -> Self {
        let mut ran_vec = [Vec3::ORIGIN; Self::SIZE];
        for v in ran_vec.iter_mut() {
            *v = Vec3::rand_unit(rng);
        }

        Self {
            ran_vec,
            perm_x: Self::rand_perm(rng),
            perm_y: Self::rand_perm(rng),
            perm_z: Self::rand_perm(rng),
        }
    }

    /// Fisher-Yates shuffle of the identity permutation.
    fn rand_perm(rng: &mut CrateRng) -> [usize; Self::SIZE] {
        let mut perm = [0; Self::SIZE];
        for (i, p) in perm.iter_mut().enumerate() {
            *p = i;
        }
        perm.shuffle(rng);
        perm
    }

    /// Signed gradient noise in roughly `[-1, 1]`.
    pub fn noise(&self, p: Vec3) -> f64 {
        let floor_p = p.map(|f| f.floor());
        let t = p - floor_p;

        let i = floor_p.x as isize;
        let j = floor_p.y as isize;
        let k = floor_p.z as isize;

        // The gradient vectors at the 8 corners of the enclosing lattice cube
        let mut corners = [[[Vec3::ORIGIN; 2]; 2]; 2];
        for (di, plane) in corners.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, corner) in row.iter_mut().enumerate() {
                    let hash = self.perm_x[((i + di as isize) & Self::MASK) as usize]
                        ^ self.perm_y[((j + dj as isize) & Self::MASK) as usize]
                        ^ self.perm_z[((k + dk as isize) & Self::MASK) as usize];
                    *corner = self.ran_vec[hash];
                }
            }
        }

        let smooth = t.map(|f| f.smooth());
        let mut accum = 0.;
        for (i, plane) in corners.iter().enumerate() {
            for (j, row) in plane.iter().enumerate() {
                for (k, corner) in row.iter().enumerate() {
                    let (i, j, k) = (i as f64, j as f64, k as f64);
                    let weight = Vec3::new(t.x - i, t.y - j, t.z - k);
                    accum += (i * smooth.x + (1. - i) * (1. - smooth.x))
                        * (j * smooth.y + (1. - j) * (1. - smooth.y))
                        * (k * smooth.z + (1. - k) * (1. - smooth.z))
                        * corner.dot(weight);
                }
            }
        }
        accum
    }

    /// Sum of `octaves` noise layers, each at double the frequency and half
    /// the amplitude of the last.
    pub fn turbulence(&self, p: Vec3, octaves: u32) -> f64 {
        let mut accum = 0.;
        let mut p = p;
        let mut weight = 1.;
        for _ in 0..octaves {
            accum += weight * self.noise(p);
            weight *= 0.5;
            p *= 2.;
        }
        accum.abs()
    }
}

impl Debug for Perlin {
    /// This struct's fields are too large to be printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Perlin { .. }").finish()
    }
}

/// A marbled pattern: a sine wave along `z` with its phase perturbed by
/// turbulence.
#[derive(Debug)]
pub struct Marble {
    noise: Perlin,
    scale: f64,
}

impl Marble {
    const OCTAVES: u32 = 7;

    pub fn new<S: Into<Option<u64>>>(seed: S, scale: f64) -> Self {
        let mut rng = match seed.into() {
            Some(seed) => CrateRng::seed_from_u64(seed),
            None => CrateRng::from_entropy(),
        };
        Self {
            noise: Perlin::new(&mut rng),
            scale,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Texture for Marble {
    fn value(&self, _u: f64, _v: f64, point: Vec3) -> Color {
        let phase = self.scale * point.z + 10. * self.noise.turbulence(point, Self::OCTAVES);
        Color::WHITE * (0.5 * (1. + phase.sin()))
    }
}

/// Samples a decoded rgb raster. A missing or unreadable source image
/// degrades to a fixed fallback color instead of failing the render.
pub struct ImageTexture {
    raster: Option<Raster>,
}

impl ImageTexture {
    /// Returned for every lookup when the source image couldn't be loaded.
    pub const FALLBACK: Color = Color::WHITE;

    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let raster = match Raster::load(path) {
            Ok(raster) => Some(raster),
            Err(err) => {
                warn!(
                    "Couldn't load texture {}: {:#}. Substituting {:?}.",
                    path.display(),
                    err,
                    Self::FALLBACK,
                );
                None
            }
        };
        Self { raster }
    }

    /// Build directly from a decoded raster of tightly packed rgb bytes.
    pub fn from_raster(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        ensure!(
            pixels.len() == width * height * 3,
            "Raster of {}x{} needs {} bytes, got {}",
            width,
            height,
            width * height * 3,
            pixels.len()
        );
        Ok(Self {
            raster: Some(Raster {
                width,
                height,
                pixels,
            }),
        })
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f64, v: f64, _point: Vec3) -> Color {
        let raster = match &self.raster {
            Some(raster) => raster,
            None => return Self::FALLBACK,
        };

        let u = u.max(0.).min(1.);
        // Flip v: raster row 0 is the top of the image.
        let v = 1. - v.max(0.).min(1.);

        let i = ((u * raster.width as f64) as usize).min(raster.width - 1);
        let j = ((v * raster.height as f64) as usize).min(raster.height - 1);

        let pos = 3 * (j * raster.width + i);
        let scale = 1. / 255.;
        Color::new(
            raster.pixels[pos] as f64 * scale,
            raster.pixels[pos + 1] as f64 * scale,
            raster.pixels[pos + 2] as f64 * scale,
        )
    }
}

impl Debug for ImageTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raster {
            Some(raster) => write!(f, "ImageTexture({}x{})", raster.width, raster.height),
            None => write!(f, "ImageTexture(fallback)"),
        }
    }
}

struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Raster {
    fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels: image.into_raw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkered_flips_across_zero() {
        let checker = Checkered::color(1., [0., 0., 0.], [1., 1., 1.]);
        let a = checker.value(0., 0., Vec3::new(0.5, 0.5, 0.5));
        let b = checker.value(0., 0., Vec3::new(-0.5, 0.5, 0.5));
        assert_ne!(a, b);
    }

    #[test]
    fn marble_is_deterministic_under_seed() {
        let a = Marble::new(7, 4.);
        let b = Marble::new(7, 4.);
        let p = Vec3::new(0.3, 1.7, -2.2);
        assert_eq!(a.value(0., 0., p), b.value(0., 0., p));
    }

    #[test]
    fn marble_stays_displayable() {
        let marble = Marble::new(42, 4.);
        for i in 0..100 {
            let p = Vec3::new(i as f64 * 0.37, i as f64 * -0.11, i as f64 * 0.73);
            let c = marble.value(0., 0., p);
            assert!(c.r >= 0. && c.r <= 1., "out of range: {:?}", c);
        }
    }

    #[test]
    fn turbulence_is_non_negative() {
        let mut rng = CrateRng::seed_from_u64(3);
        let perlin = Perlin::new(&mut rng);
        for i in 0..50 {
            let p = Vec3::new(i as f64 * 0.61, i as f64 * 0.29, i as f64 * -0.47);
            assert!(perlin.turbulence(p, 7) >= 0.);
        }
    }

    #[test]
    fn image_samples_the_expected_pixel() {
        // A 2x1 raster: red on the left, blue on the right.
        let tex = ImageTexture::from_raster(2, 1, vec![255, 0, 0, 0, 0, 255]).unwrap();
        assert_eq!(tex.value(0., 0.5, Vec3::ORIGIN), Color::new(1., 0., 0.));
        assert_eq!(tex.value(1., 0.5, Vec3::ORIGIN), Color::new(0., 0., 1.));
    }

    #[test]
    fn image_v_is_flipped() {
        // A 1x2 raster: green on top, red on the bottom.
        let tex = ImageTexture::from_raster(1, 2, vec![0, 255, 0, 255, 0, 0]).unwrap();
        assert_eq!(tex.value(0.5, 1., Vec3::ORIGIN), Color::new(0., 1., 0.));
        assert_eq!(tex.value(0.5, 0., Vec3::ORIGIN), Color::new(1., 0., 0.));
    }

    #[test]
    fn missing_image_degrades_to_fallback() {
        let tex = ImageTexture::open("/definitely/not/a/real/file.png");
        assert_eq!(tex.value(0.5, 0.5, Vec3::ORIGIN), ImageTexture::FALLBACK);
    }

    #[test]
    fn mismatched_raster_size_is_rejected() {
        assert!(ImageTexture::from_raster(2, 2, vec![0; 3]).is_err());
    }
}
