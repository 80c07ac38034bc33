use std::f64::consts::PI;
use std::ops::Range;
use std::sync::Arc;

use crate::{Aabb, Hit, HitList, Hittable, Material, Ray, Vec3};

/// Thickness given to the flat axis of a rect's bounding box so the BVH
/// slab test never divides a zero extent.
const RECT_PAD: f64 = 1e-3;

fn sphere_uv(point: Vec3, center: Vec3, radius: f64) -> (f64, f64) {
    let p: Vec3 = (point - center) / radius;
    let phi = p.z.atan2(p.x);
    let theta = p.y.asin();
    let u = 1. - (phi + PI) / (2. * PI);
    let v = (theta + PI / 2.) / PI;
    (u, v)
}

#[derive(Debug)]
pub struct Sphere<M> {
    pub center: Vec3,
    pub radius: f64,
    pub material: M,
}

impl<M> Sphere<M> {
    pub fn new(center: Vec3, radius: f64, material: M) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    pub fn from(center: [f64; 3], radius: f64, material: M) -> Self {
        Self::new(center.into(), radius, material)
    }
}

impl<M: Material> Hittable for Sphere<M> {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        let oc = ray.origin - self.center;
        let a = ray.dir.length_squared();
        let half_b = oc.dot(ray.dir);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;

        // Strict comparison: a tangent ray counts as a miss.
        if discriminant <= 0. {
            return None;
        }

        let root = discriminant.sqrt();
        let hit = |t| {
            let point = ray.at(t);
            let outward_normal = (point - self.center) / self.radius;
            let (u, v) = sphere_uv(point, self.center, self.radius);
            Some(Hit::oriented(point, outward_normal, t, ray, &self.material, u, v))
        };

        // Prefer the near root, fall back to the far one.
        let t = (-half_b - root) / a;
        if hit_time.contains(&t) {
            return hit(t);
        }
        let t = (-half_b + root) / a;
        if hit_time.contains(&t) {
            return hit(t);
        }

        None
    }

    fn bounding_box(&self, _shutter_time: &Range<f64>) -> Option<Aabb> {
        let rad = Vec3::from([self.radius; 3]);
        Some(Aabb::new(self.center - rad, self.center + rad))
    }
}

/// Sphere whose center moves linearly from `center_0` (at `time_0`) to
/// `center_1` (at `time_1`), sampled at each incoming ray's time.
#[derive(Debug)]
pub struct MovingSphere<M> {
    center_0: Vec3,
    delta_c: Vec3,
    time_0: f64,
    delta_t: f64,
    radius: f64,
    material: M,
}

impl<M> MovingSphere<M> {
    pub fn new(
        center_0: Vec3,
        center_1: Vec3,
        time: Range<f64>,
        radius: f64,
        material: M,
    ) -> Self {
        Self {
            center_0,
            delta_c: center_1 - center_0,
            time_0: time.start,
            delta_t: time.end - time.start,
            radius,
            material,
        }
    }

    /// Returns the center at `time`
    pub fn center(&self, time: f64) -> Vec3 {
        self.center_0 + (time - self.time_0) / self.delta_t * self.delta_c
    }
}

impl<M: Material> Hittable for MovingSphere<M> {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        let center = self.center(ray.time);

        let oc = ray.origin - center;
        let a = ray.dir.length_squared();
        let half_b = oc.dot(ray.dir);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;

        if discriminant <= 0. {
            return None;
        }

        let root = discriminant.sqrt();
        let hit = |t| {
            let point = ray.at(t);
            let outward_normal = (point - center) / self.radius;
            let (u, v) = sphere_uv(point, center, self.radius);
            Some(Hit::oriented(point, outward_normal, t, ray, &self.material, u, v))
        };

        let t = (-half_b - root) / a;
        if hit_time.contains(&t) {
            return hit(t);
        }
        let t = (-half_b + root) / a;
        if hit_time.contains(&t) {
            return hit(t);
        }

        None
    }

    fn bounding_box(&self, shutter_time: &Range<f64>) -> Option<Aabb> {
        let rad = Vec3::from([self.radius; 3]);
        let open = Aabb::new(
            self.center(shutter_time.start) - rad,
            self.center(shutter_time.start) + rad,
        );
        let close = Aabb::new(
            self.center(shutter_time.end) - rad,
            self.center(shutter_time.end) + rad,
        );
        Some(open.surrounding(&close))
    }
}

/// Axis-aligned rectangle in the `z = k` plane.
#[derive(Debug)]
pub struct XyRect<M> {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub k: f64,
    pub material: M,
}

impl<M> XyRect<M> {
    pub fn new(x: Range<f64>, y: Range<f64>, k: f64, material: M) -> Self {
        Self {
            x0: x.start,
            x1: x.end,
            y0: y.start,
            y1: y.end,
            k,
            material,
        }
    }
}

impl<M: Material> Hittable for XyRect<M> {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        // A ray parallel to the plane makes t infinite (or NaN), which
        // `contains` rejects.
        let t = (self.k - ray.origin.z) / ray.dir.z;
        if !hit_time.contains(&t) {
            return None;
        }

        let x = ray.origin.x + t * ray.dir.x;
        let y = ray.origin.y + t * ray.dir.y;
        if x < self.x0 || x > self.x1 || y < self.y0 || y > self.y1 {
            return None;
        }

        let u = (x - self.x0) / (self.x1 - self.x0);
        let v = (y - self.y0) / (self.y1 - self.y0);
        Some(Hit::oriented(ray.at(t), Vec3::UNIT_Z, t, ray, &self.material, u, v))
    }

    fn bounding_box(&self, _shutter_time: &Range<f64>) -> Option<Aabb> {
        Some(Aabb::new(
            Vec3::new(self.x0, self.y0, self.k - RECT_PAD),
            Vec3::new(self.x1, self.y1, self.k + RECT_PAD),
        ))
    }
}

/// Axis-aligned rectangle in the `y = k` plane.
#[derive(Debug)]
pub struct XzRect<M> {
    pub x0: f64,
    pub x1: f64,
    pub z0: f64,
    pub z1: f64,
    pub k: f64,
    pub material: M,
}

impl<M> XzRect<M> {
    pub fn new(x: Range<f64>, z: Range<f64>, k: f64, material: M) -> Self {
        Self {
            x0: x.start,
            x1: x.end,
            z0: z.start,
            z1: z.end,
            k,
            material,
        }
    }
}

impl<M: Material> Hittable for XzRect<M> {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        let t = (self.k - ray.origin.y) / ray.dir.y;
        if !hit_time.contains(&t) {
            return None;
        }

        let x = ray.origin.x + t * ray.dir.x;
        let z = ray.origin.z + t * ray.dir.z;
        if x < self.x0 || x > self.x1 || z < self.z0 || z > self.z1 {
            return None;
        }

        let u = (x - self.x0) / (self.x1 - self.x0);
        let v = (z - self.z0) / (self.z1 - self.z0);
        Some(Hit::oriented(ray.at(t), Vec3::UNIT_Y, t, ray, &self.material, u, v))
    }

    fn bounding_box(&self, _shutter_time: &Range<f64>) -> Option<Aabb> {
        Some(Aabb::new(
            Vec3::new(self.x0, self.k - RECT_PAD, self.z0),
            Vec3::new(self.x1, self.k + RECT_PAD, self.z1),
        ))
    }
}

/// Axis-aligned rectangle in the `x = k` plane.
#[derive(Debug)]
pub struct YzRect<M> {
    pub y0: f64,
    pub y1: f64,
    pub z0: f64,
    pub z1: f64,
    pub k: f64,
    pub material: M,
}

impl<M> YzRect<M> {
    pub fn new(y: Range<f64>, z: Range<f64>, k: f64, material: M) -> Self {
        Self {
            y0: y.start,
            y1: y.end,
            z0: z.start,
            z1: z.end,
            k,
            material,
        }
    }
}

impl<M: Material> Hittable for YzRect<M> {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        let t = (self.k - ray.origin.x) / ray.dir.x;
        if !hit_time.contains(&t) {
            return None;
        }

        let y = ray.origin.y + t * ray.dir.y;
        let z = ray.origin.z + t * ray.dir.z;
        if y < self.y0 || y > self.y1 || z < self.z0 || z > self.z1 {
            return None;
        }

        let u = (z - self.z0) / (self.z1 - self.z0);
        let v = (y - self.y0) / (self.y1 - self.y0);
        Some(Hit::oriented(ray.at(t), Vec3::UNIT_X, t, ray, &self.material, u, v))
    }

    fn bounding_box(&self, _shutter_time: &Range<f64>) -> Option<Aabb> {
        Some(Aabb::new(
            Vec3::new(self.k - RECT_PAD, self.y0, self.z0),
            Vec3::new(self.k + RECT_PAD, self.y1, self.z1),
        ))
    }
}

/// Axis-aligned block assembled from six rects, one per face.
#[derive(Debug)]
pub struct Cuboid {
    min: Vec3,
    max: Vec3,
    sides: HitList,
}

impl Cuboid {
    pub fn new<M: Material + 'static>(p0: Vec3, p1: Vec3, material: M) -> Self {
        let mat = Arc::new(material);
        let mut sides = HitList::new();

        sides.push(XyRect::new(p0.x..p1.x, p0.y..p1.y, p1.z, mat.clone()));
        sides.push(XyRect::new(p0.x..p1.x, p0.y..p1.y, p0.z, mat.clone()));

        sides.push(XzRect::new(p0.x..p1.x, p0.z..p1.z, p1.y, mat.clone()));
        sides.push(XzRect::new(p0.x..p1.x, p0.z..p1.z, p0.y, mat.clone()));

        sides.push(YzRect::new(p0.y..p1.y, p0.z..p1.z, p1.x, mat.clone()));
        sides.push(YzRect::new(p0.y..p1.y, p0.z..p1.z, p0.x, mat));

        Self {
            min: p0,
            max: p1,
            sides,
        }
    }
}

impl Hittable for Cuboid {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        self.sides.hit(ray, hit_time)
    }

    fn bounding_box(&self, _shutter_time: &Range<f64>) -> Option<Aabb> {
        Some(Aabb::new(self.min, self.max))
    }
}

/// Moves a child hittable by a fixed offset by shifting incoming rays the
/// opposite way.
#[derive(Debug)]
pub struct Translate<H> {
    child: H,
    offset: Vec3,
}

impl<H> Translate<H> {
    pub fn new(child: H, offset: Vec3) -> Self {
        Self { child, offset }
    }
}

impl<H: Hittable> Hittable for Translate<H> {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        let local = Ray::new(ray.origin - self.offset, ray.dir, ray.time);
        self.child.hit(&local, hit_time).map(|mut hit| {
            hit.point += self.offset;
            hit
        })
    }

    fn bounding_box(&self, shutter_time: &Range<f64>) -> Option<Aabb> {
        self.child
            .bounding_box(shutter_time)
            .map(|b| Aabb::new(b.min + self.offset, b.max + self.offset))
    }
}

/// Rotates a child hittable around the world `y` axis.
#[derive(Debug)]
pub struct RotateY<H> {
    child: H,
    sin_theta: f64,
    cos_theta: f64,
}

impl<H> RotateY<H> {
    pub fn new(child: H, degrees: f64) -> Self {
        let radians = degrees.to_radians();
        Self {
            child,
            sin_theta: radians.sin(),
            cos_theta: radians.cos(),
        }
    }

    /// Local -> world rotation.
    fn to_world(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * v.x + self.sin_theta * v.z,
            v.y,
            -self.sin_theta * v.x + self.cos_theta * v.z,
        )
    }

    /// World -> local rotation (the inverse of `to_world`).
    fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * v.x - self.sin_theta * v.z,
            v.y,
            self.sin_theta * v.x + self.cos_theta * v.z,
        )
    }
}

impl<H: Hittable> Hittable for RotateY<H> {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        let local = Ray::new(
            self.to_local(ray.origin),
            self.to_local(ray.dir),
            ray.time,
        );
        // Rotation preserves dot products, so the child's front_face
        // classification holds in world space too.
        self.child.hit(&local, hit_time).map(|mut hit| {
            hit.point = self.to_world(hit.point);
            hit.normal = self.to_world(hit.normal);
            hit
        })
    }

    fn bounding_box(&self, shutter_time: &Range<f64>) -> Option<Aabb> {
        let child_box = self.child.bounding_box(shutter_time)?;

        // Rotate all 8 corners and take the extrema.
        let mut min = Vec3::from([f64::INFINITY; 3]);
        let mut max = Vec3::from([f64::NEG_INFINITY; 3]);
        for &x in &[child_box.min.x, child_box.max.x] {
            for &y in &[child_box.min.y, child_box.max.y] {
                for &z in &[child_box.min.z, child_box.max.z] {
                    let corner = self.to_world(Vec3::new(x, y, z));
                    min.x = min.x.min(corner.x);
                    min.y = min.y.min(corner.y);
                    min.z = min.z.min(corner.z);
                    max.x = max.x.max(corner.x);
                    max.y = max.y.max(corner.y);
                    max.z = max.z.max(corner.z);
                }
            }
        }
        Some(Aabb::new(min, max))
    }
}
