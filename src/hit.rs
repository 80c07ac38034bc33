use std::cmp::Ordering;
use std::fmt::Debug;
use std::mem;
use std::ops::Range;
use std::sync::Arc;

use rand::Rng;

use crate::{Axis, CrateRng, Material, Ray, Vec3};

/// Everything the integrator needs to know about one ray-surface
/// intersection. Built fresh per intersection test and discarded once the
/// sample is done.
pub struct Hit<'a> {
    pub point: Vec3,
    /// A unit-length normal vector, always facing against the incident ray
    pub normal: Vec3,
    /// Ray parameter of the hit
    pub t: f64,
    /// Whether the ray arrived from outside the surface
    pub front_face: bool,
    /// The material at the hit point
    pub material: &'a dyn Material,
    pub u: f64,
    pub v: f64,
}

impl<'a> Hit<'a> {
    pub fn new(
        point: Vec3,
        normal: Vec3,
        t: f64,
        front_face: bool,
        material: &'a dyn Material,
        u: f64,
        v: f64,
    ) -> Self {
        Self {
            point,
            normal,
            t,
            front_face,
            material,
            u,
            v,
        }
    }

    /// Build a `Hit` from the geometric outward normal, orienting it
    /// against `ray` and recording which face was struck.
    pub fn oriented(
        point: Vec3,
        outward_normal: Vec3,
        t: f64,
        ray: &Ray,
        material: &'a dyn Material,
        u: f64,
        v: f64,
    ) -> Self {
        // Dot product is negative when the ray hits the front face
        let front_face = ray.dir.dot(outward_normal) < 0.;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };
        Self::new(point, normal, t, front_face, material, u, v)
    }
}

pub trait Hittable: Send + Sync + Debug {
    /// Returns the hit determined by a ray. If there is no hit or the hit's
    /// parameter isn't contained by `hit_time`, returns `None`.
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit>;

    /// Returns the bounding box for the `Hittable`.
    /// `shutter_time` affects the bounding box of moving `Hittable`s.
    fn bounding_box(&self, shutter_time: &Range<f64>) -> Option<Aabb>;
}

/// A flat collection of hittables, scanned linearly.
#[derive(Default, Debug)]
pub struct HitList(pub Vec<Arc<dyn Hittable>>);

impl HitList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push<T: Hittable + 'static>(&mut self, val: T) {
        self.0.push(Arc::new(val))
    }

    pub fn push_shared(&mut self, val: Arc<dyn Hittable>) {
        self.0.push(val)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Hittable for HitList {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        let mut range = hit_time.clone();
        let mut closest = None;
        for obj in &self.0 {
            if let Some(hit) = obj.hit(ray, &range) {
                range.end = hit.t;
                closest = Some(hit);
            }
        }
        closest
    }

    fn bounding_box(&self, shutter_time: &Range<f64>) -> Option<Aabb> {
        if self.0.is_empty() {
            return None;
        }

        let mut whole: Option<Aabb> = None;
        for obj in &self.0 {
            // A single unbounded child makes the whole list unbounded.
            let bound = obj.bounding_box(shutter_time)?;
            whole = Some(match whole {
                Some(so_far) => so_far.surrounding(&bound),
                None => bound,
            });
        }
        whole
    }
}

/// Axis-Aligned Bounding Box
#[derive(Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(
            min.x <= max.x && min.y <= max.y && min.z <= max.z,
            "Inverted Aabb: {:?} / {:?}",
            min,
            max,
        );
        Self { min, max }
    }

    /// The smallest box containing both `self` and `other`.
    pub fn surrounding(&self, other: &Aabb) -> Self {
        let small = Vec3::new(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.min.z.min(other.min.z),
        );
        let big = Vec3::new(
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
            self.max.z.max(other.max.z),
        );
        Aabb::new(small, big)
    }

    /// Slab test: narrow `hit_time` axis by axis, rejecting as soon as the
    /// interval empties.
    pub fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> bool {
        let mut range = hit_time.clone();

        let mut slab = |axis| {
            let inv_dir = 1. / ray.dir[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv_dir;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv_dir;
            if inv_dir < 0. {
                mem::swap(&mut t0, &mut t1);
            }
            range.start = range.start.max(t0);
            range.end = range.end.min(t1);

            range.end > range.start
        };

        slab(Axis::X) && slab(Axis::Y) && slab(Axis::Z)
    }

    fn compare_min(&self, other: &Aabb, axis: Axis) -> Ordering {
        self.min[axis].partial_cmp(&other.min[axis]).unwrap()
    }
}

/// Bounding Volume Hierarchy: a binary tree of `Aabb`s that prunes
/// intersection tests to near-logarithmic cost.
#[derive(Debug)]
pub struct Bvh {
    bound: Aabb,
    left: Arc<dyn Hittable>,
    right: Arc<dyn Hittable>,
}

impl Bvh {
    const ERR_NO_BOX: &'static str = "No bounding box in BVH construction!";

    pub fn new(list: HitList, shutter_time: &Range<f64>, rng: &mut CrateRng) -> Self {
        assert!(!list.is_empty(), "Can't build a BVH over zero objects");
        Self::split(list.0, shutter_time, rng)
    }

    // Recursively build the tree
    fn split(
        mut objects: Vec<Arc<dyn Hittable>>,
        shutter_time: &Range<f64>,
        rng: &mut CrateRng,
    ) -> Self {
        // One axis per node, fixed for the whole sort below.
        let axis: Axis = rng.gen();
        let bound_of = |obj: &Arc<dyn Hittable>| {
            obj.bounding_box(shutter_time).expect(Self::ERR_NO_BOX)
        };

        let (left, right): (Arc<dyn Hittable>, Arc<dyn Hittable>) = match objects.len() {
            0 => unreachable!("Bvh::split on empty list"),
            1 => {
                // A lone object becomes both children of a degenerate leaf.
                let only = objects.pop().unwrap();
                (only.clone(), only)
            }
            2 => {
                let b = objects.pop().unwrap();
                let a = objects.pop().unwrap();
                match bound_of(&a).compare_min(&bound_of(&b), axis) {
                    Ordering::Greater => (b, a),
                    _ => (a, b),
                }
            }
            _ => {
                objects.sort_unstable_by(|a, b| bound_of(a).compare_min(&bound_of(b), axis));
                let second_half = objects.split_off(objects.len() / 2);
                (
                    Arc::new(Self::split(objects, shutter_time, rng)) as Arc<dyn Hittable>,
                    Arc::new(Self::split(second_half, shutter_time, rng)) as Arc<dyn Hittable>,
                )
            }
        };

        let bound = bound_of(&left).surrounding(&bound_of(&right));
        Self { bound, left, right }
    }
}

impl Hittable for Bvh {
    fn hit(&self, ray: &Ray, hit_time: &Range<f64>) -> Option<Hit> {
        if !self.bound.hit(ray, hit_time) {
            return None;
        }

        let mut range = hit_time.clone();
        let left_hit = self.left.hit(ray, &range);
        if let Some(hit) = &left_hit {
            // The right subtree only matters if it beats this hit.
            range.end = hit.t;
        }

        self.right.hit(ray, &range).or(left_hit)
    }

    fn bounding_box(&self, _shutter_time: &Range<f64>) -> Option<Aabb> {
        Some(self.bound.clone())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::material::Lambertian;
    use crate::shape::Sphere;
    use crate::Color;

    fn rand_box(rng: &mut CrateRng) -> Aabb {
        let a = Vec3::new(
            rng.gen_range(-10., 10.),
            rng.gen_range(-10., 10.),
            rng.gen_range(-10., 10.),
        );
        let size = Vec3::new(
            rng.gen_range(0., 5.),
            rng.gen_range(0., 5.),
            rng.gen_range(0., 5.),
        );
        Aabb::new(a, a + size)
    }

    fn contains(outer: &Aabb, inner: &Aabb) -> bool {
        outer.min.x <= inner.min.x
            && outer.min.y <= inner.min.y
            && outer.min.z <= inner.min.z
            && outer.max.x >= inner.max.x
            && outer.max.y >= inner.max.y
            && outer.max.z >= inner.max.z
    }

    #[test]
    fn surrounding_contains_both_inputs() {
        let mut rng = CrateRng::seed_from_u64(11);
        for _ in 0..100 {
            let a = rand_box(&mut rng);
            let b = rand_box(&mut rng);
            let both = a.surrounding(&b);
            assert!(contains(&both, &a));
            assert!(contains(&both, &b));
        }
    }

    #[test]
    fn slab_test_accepts_a_piercing_ray() {
        let cube = Aabb::new(Vec3::new(-1., -1., -1.), Vec3::new(1., 1., 1.));
        let ray = Ray::new(Vec3::new(0., 0., 5.), Vec3::new(0., 0., -1.), 0.);
        assert!(cube.hit(&ray, &(0.001..f64::INFINITY)));
    }

    #[test]
    fn slab_test_rejects_a_passing_ray() {
        let cube = Aabb::new(Vec3::new(-1., -1., -1.), Vec3::new(1., 1., 1.));
        let ray = Ray::new(Vec3::new(0., 5., 5.), Vec3::new(0., 0., -1.), 0.);
        assert!(!cube.hit(&ray, &(0.001..f64::INFINITY)));
    }

    #[test]
    fn slab_test_survives_axis_parallel_rays() {
        let cube = Aabb::new(Vec3::new(-1., -1., -1.), Vec3::new(1., 1., 1.));
        // Parallel to z, outside the x slab: the infinite slab parameters
        // must reject, not poison the interval.
        let outside = Ray::new(Vec3::new(5., 0., 5.), Vec3::new(0., 0., -1.), 0.);
        assert!(!cube.hit(&outside, &(0.001..f64::INFINITY)));
        // Parallel to z but inside the slabs: still a hit.
        let inside = Ray::new(Vec3::new(0.5, 0.5, 5.), Vec3::new(0., 0., -1.), 0.);
        assert!(cube.hit(&inside, &(0.001..f64::INFINITY)));
    }

    fn rand_spheres(count: usize, rng: &mut CrateRng) -> (HitList, HitList) {
        let mut flat = HitList::new();
        let mut for_bvh = HitList::new();
        for _ in 0..count {
            let center = Vec3::new(
                rng.gen_range(-20., 20.),
                rng.gen_range(-20., 20.),
                rng.gen_range(-20., 20.),
            );
            let radius = rng.gen_range(0.1, 2.);
            let sphere = Arc::new(Sphere::new(
                center,
                radius,
                Lambertian::new(Color::new(0.5, 0.5, 0.5)),
            ));
            flat.push_shared(sphere.clone());
            for_bvh.push_shared(sphere);
        }
        (flat, for_bvh)
    }

    #[test]
    fn bvh_agrees_with_linear_scan() {
        let mut rng = CrateRng::seed_from_u64(13);
        let shutter = 0.0..1.0;
        for &count in &[1, 2, 3, 7, 50, 500] {
            let (flat, for_bvh) = rand_spheres(count, &mut rng);
            let bvh = Bvh::new(for_bvh, &shutter, &mut rng);

            for _ in 0..200 {
                let origin = Vec3::new(
                    rng.gen_range(-30., 30.),
                    rng.gen_range(-30., 30.),
                    rng.gen_range(-30., 30.),
                );
                let dir = Vec3::rand_unit(&mut rng);
                let ray = Ray::new(origin, dir, 0.);
                let range = 0.001..f64::INFINITY;

                let linear = flat.hit(&ray, &range);
                let pruned = bvh.hit(&ray, &range);
                match (linear, pruned) {
                    (None, None) => {}
                    (Some(a), Some(b)) => {
                        assert!((a.t - b.t).abs() < 1e-9, "{} vs {}", a.t, b.t)
                    }
                    (a, b) => panic!(
                        "disagreement for {} spheres: linear={:?} bvh={:?}",
                        count,
                        a.map(|h| h.t),
                        b.map(|h| h.t)
                    ),
                }
            }
        }
    }

    #[test]
    fn bvh_bound_covers_the_whole_list() {
        let mut rng = CrateRng::seed_from_u64(17);
        let shutter = 0.0..1.0;
        let (flat, for_bvh) = rand_spheres(40, &mut rng);
        let whole = flat.bounding_box(&shutter).unwrap();
        let bvh = Bvh::new(for_bvh, &shutter, &mut rng);
        assert_eq!(bvh.bounding_box(&shutter).unwrap(), whole);
    }

    #[test]
    #[should_panic(expected = "zero objects")]
    fn bvh_over_nothing_is_a_construction_error() {
        let mut rng = CrateRng::seed_from_u64(19);
        Bvh::new(HitList::new(), &(0.0..1.0), &mut rng);
    }
}
