use foundation::bounds::Aabb3;
use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{Mat4, Vec3};

use crate::instances::InstanceBuffer;
use crate::spatial::{Bvh, Item as BvhItem};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    /// Applies an affine transform to origin and direction.
    pub fn transformed(&self, m: &Mat4) -> Ray {
        Ray::new(m.transform_point(self.origin), m.transform_vector(self.dir))
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub slot: usize,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
    /// Radius of the unscaled marker sphere; each instance scales it.
    pub marker_radius: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
            marker_radius: 0.01,
        }
    }
}

/// Ray picking against marker instances, with a BVH cached per transform
/// version of the buffer.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - If multiple instances are hit at the same distance, the lower slot wins.
///
/// The ray must be in the same space as the instance transforms (scene-local).
#[derive(Debug, Clone, Default)]
pub struct InstancePicker {
    bvh: Bvh,
    built_for: Option<(u64, u64)>,
}

impl InstancePicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pick(
        &mut self,
        instances: &InstanceBuffer,
        ray: Ray,
        opts: PickOptions,
    ) -> Option<PickHit> {
        let dir = ray.dir.try_normalize()?;
        self.refresh(instances, opts.marker_radius);

        let mut best: Option<(f64, usize)> = None;
        for candidate in self.bvh.query_ray(ray.origin, dir, opts.max_distance) {
            // Boxes arrive by entry distance; a sphere can never be hit before its box.
            if best.is_some_and(|(bt, _)| candidate.t > bt) {
                break;
            }
            let Some(instance) = instances.get(candidate.slot) else {
                continue;
            };
            let radius = opts.marker_radius * instance.transform.scale;
            let Some(t) = ray_sphere_hit_t(ray.origin, dir, instance.transform.position, radius)
            else {
                continue;
            };
            if t > opts.max_distance {
                continue;
            }
            let better = match best {
                None => true,
                Some((bt, bs)) => stable_total_cmp_f64(t, bt)
                    .then(candidate.slot.cmp(&bs))
                    .is_lt(),
            };
            if better {
                best = Some((t, candidate.slot));
            }
        }

        let (distance, slot) = best?;
        Some(PickHit {
            slot,
            distance,
            point: ray.origin + dir * distance,
        })
    }

    fn refresh(&mut self, instances: &InstanceBuffer, marker_radius: f64) {
        let key = (instances.transform_version(), marker_radius.to_bits());
        if self.built_for == Some(key) {
            return;
        }
        let items = instances
            .iter()
            .enumerate()
            .map(|(slot, instance)| BvhItem {
                slot,
                bounds: Aabb3::around_sphere(
                    instance.transform.position,
                    marker_radius * instance.transform.scale,
                ),
            })
            .collect();
        self.bvh = Bvh::build(items);
        self.built_for = Some(key);
    }
}

/// Entry distance along a normalized ray, or `0` when starting inside.
fn ray_sphere_hit_t(origin: Vec3, dir: Vec3, center: Vec3, radius: f64) -> Option<f64> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t_far = -b + sq;
    if t_far < 0.0 {
        return None;
    }
    Some((-b - sq).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::{InstancePicker, PickOptions, Ray};
    use crate::instances::{InstanceBuffer, MarkerStyle};
    use crate::transform::SceneRotation;
    use foundation::math::Vec3;
    use layers::Incident;

    fn buffer(incidents: &[Incident]) -> InstanceBuffer {
        let mut buf = InstanceBuffer::new();
        buf.rebuild(incidents, &MarkerStyle::default());
        buf
    }

    #[test]
    fn ray_picks_nearest_hit() {
        // Prime meridian and antimeridian markers sit on the same X axis.
        let buf = buffer(&[
            Incident::new("far", 0.0, 180.0, 1, ""),
            Incident::new("near", 0.0, 0.0, 1, ""),
        ]);
        let ray = Ray::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let hit = InstancePicker::new()
            .pick(&buf, ray, PickOptions::default())
            .expect("hit");
        assert_eq!(hit.slot, 1);
        let expected = 3.0 - 1.02 - 0.01 * 1.2;
        assert!((hit.distance - expected).abs() < 1e-9);
    }

    #[test]
    fn tie_breaks_by_lower_slot() {
        let buf = buffer(&[
            Incident::new("a", 10.0, 10.0, 2, ""),
            Incident::new("b", 10.0, 10.0, 2, ""),
        ]);
        let p = buf.get(0).unwrap().transform.position;
        let ray = Ray::new(p * 3.0, -p);
        let hit = InstancePicker::new()
            .pick(&buf, ray, PickOptions::default())
            .expect("hit");
        assert_eq!(hit.slot, 0);
    }

    #[test]
    fn miss_resolves_to_none() {
        let buf = buffer(&[Incident::new("a", 0.0, 0.0, 1, "")]);
        let ray = Ray::new(Vec3::new(3.0, 0.5, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let mut picker = InstancePicker::new();
        assert!(picker.pick(&buf, ray, PickOptions::default()).is_none());
        assert!(
            picker
                .pick(&InstanceBuffer::new(), ray, PickOptions::default())
                .is_none()
        );
        let zero = Ray::new(Vec3::ZERO, Vec3::ZERO);
        assert!(picker.pick(&buf, zero, PickOptions::default()).is_none());
    }

    #[test]
    fn larger_severity_widens_the_target() {
        let buf = buffer(&[
            Incident::new("small", 0.0, 0.0, 1, ""),
            Incident::new("big", 0.0, 90.0, 5, ""),
        ]);
        let mut picker = InstancePicker::new();
        // Off-center by 0.015: outside the 0.012 small marker, inside the 0.02 big one.
        let small = Ray::new(Vec3::new(3.0, 0.015, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        assert!(picker.pick(&buf, small, PickOptions::default()).is_none());
        let big = Ray::new(Vec3::new(0.0, 0.015, -3.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(
            picker.pick(&buf, big, PickOptions::default()).map(|h| h.slot),
            Some(1)
        );
    }

    #[test]
    fn rotated_scene_is_picked_in_local_space() {
        let buf = buffer(&[Incident::new("a", 0.0, 0.0, 1, "")]);
        let rotation = SceneRotation {
            x: 0.0,
            y: std::f64::consts::FRAC_PI_2,
        };
        // The marker at local +X now sits at world -Z.
        let world = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::new(0.0, 0.0, 1.0));
        let local = world.transformed(&rotation.inverse_matrix());
        let hit = InstancePicker::new()
            .pick(&buf, local, PickOptions::default())
            .expect("hit");
        assert_eq!(hit.slot, 0);
    }

    #[test]
    fn cache_follows_transform_changes() {
        let mut buf = buffer(&[Incident::new("a", 0.0, 0.0, 1, "")]);
        let mut picker = InstancePicker::new();
        let ray = Ray::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        assert!(picker.pick(&buf, ray, PickOptions::default()).is_some());

        let moved = buf
            .get(0)
            .unwrap()
            .transform
            .with_position(Vec3::new(0.0, 1.02, 0.0));
        buf.set_transform(0, moved);
        assert!(picker.pick(&buf, ray, PickOptions::default()).is_none());
    }
}
