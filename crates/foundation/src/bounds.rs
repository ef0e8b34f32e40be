use crate::math::Vec3;

/// Axis-aligned bounding box in 3D.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb3 {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Aabb3 { min, max }
    }

    /// Tight box around a sphere.
    pub fn around_sphere(center: Vec3, radius: f64) -> Self {
        let r = radius.abs();
        Aabb3 {
            min: [center.x - r, center.y - r, center.z - r],
            max: [center.x + r, center.y + r, center.z + r],
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        Aabb3::new(
            [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        )
    }

    pub fn centroid_axis(&self, axis: usize) -> f64 {
        (self.min[axis] + self.max[axis]) * 0.5
    }

    pub fn extent_axis(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    /// Distance along `dir` at which the ray enters the box, clipped to
    /// `[t_min, t_max]`; `None` when the clipped segment misses.
    pub fn ray_entry(&self, origin: Vec3, dir: Vec3, t_min: f64, t_max: f64) -> Option<f64> {
        let (o, d) = (origin.to_array(), dir.to_array());
        let (mut near, mut far) = (t_min, t_max);
        for axis in 0..3 {
            if d[axis].abs() < 1e-12 {
                if o[axis] < self.min[axis] || o[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = d[axis].recip();
            let a = (self.min[axis] - o[axis]) * inv;
            let b = (self.max[axis] - o[axis]) * inv;
            near = near.max(a.min(b));
            far = far.min(a.max(b));
            if far < near {
                return None;
            }
        }
        Some(near)
    }
}
