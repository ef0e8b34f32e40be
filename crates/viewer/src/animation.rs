use foundation::math::Vec3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn get(self, v: Vec3) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    pub fn set(self, v: &mut Vec3, value: f64) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
            Axis::Z => v.z = value,
        }
    }
}

/// Animated engine properties; one tween at a time per key.
///
/// Camera position and target animate per axis so a new move on any axis
/// supersedes exactly that axis of the previous one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prop {
    CameraPosition(Axis),
    CameraTarget(Axis),
    CameraZoom,
    SceneRotationY,
    GlobeDetail,
    /// Deep-zoom ring expansion of one instance slot, 0..1.
    RingProgress(usize),
}

/// Where a deep-zoom member ends up: `origin + offset * progress`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RingPlacement {
    pub origin: Vec3,
    pub offset: Vec3,
}

impl RingPlacement {
    pub fn at(&self, progress: f64) -> Vec3 {
        self.origin + self.offset * progress
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, Prop, RingPlacement};
    use foundation::math::Vec3;

    #[test]
    fn axis_accessors_round_trip() {
        let mut v = Vec3::new(1.0, 2.0, 3.0);
        Axis::Y.set(&mut v, -4.0);
        assert_eq!(Axis::ALL.map(|a| a.get(v)), [1.0, -4.0, 3.0]);
    }

    #[test]
    fn ring_slots_sort_after_scene_props() {
        assert!(Prop::GlobeDetail < Prop::RingProgress(0));
        assert!(Prop::RingProgress(1) < Prop::RingProgress(2));
    }

    #[test]
    fn placement_interpolates_from_origin() {
        let p = RingPlacement {
            origin: Vec3::new(1.0, 0.0, 0.0),
            offset: Vec3::new(0.0, 0.2, 0.0),
        };
        assert_eq!(p.at(0.0), p.origin);
        assert_eq!(p.at(0.5), Vec3::new(1.0, 0.1, 0.0));
    }
}
