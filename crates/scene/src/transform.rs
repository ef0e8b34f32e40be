use foundation::math::{Mat4, Quat, Vec3};

/// Placement of one marker instance in scene-local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f64,
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

impl InstanceTransform {
    /// Instance at `position` whose local +Z axis points at `toward`.
    pub fn facing(position: Vec3, toward: Vec3, scale: f64) -> Self {
        let rotation = match (toward - position).try_normalize() {
            Some(dir) => Quat::from_unit_vectors(Vec3::Z, dir),
            None => Quat::IDENTITY,
        };
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_trs(self.position, self.rotation, self.scale)
    }
}

/// Whole-scene Euler rotation (X then Y), driven by orbit drags, idle spin
/// and deep-zoom choreography.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SceneRotation {
    pub x: f64,
    pub y: f64,
}

impl SceneRotation {
    pub fn matrix(&self) -> Mat4 {
        Mat4::rotation_xy(self.x, self.y)
    }

    /// Inverse of [`SceneRotation::matrix`]; rotations are orthonormal.
    pub fn inverse_matrix(&self) -> Mat4 {
        self.matrix().transpose()
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.matrix().transform_point(local)
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.inverse_matrix().transform_point(world)
    }
}

#[cfg(test)]
mod tests {
    use super::{InstanceTransform, SceneRotation};
    use foundation::math::Vec3;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        let d = (a - b).length();
        assert!(d < 1e-9, "expected {a:?} ~= {b:?}");
    }

    #[test]
    fn facing_points_local_z_at_center() {
        let p = Vec3::new(0.0, 1.02, 0.0);
        let t = InstanceTransform::facing(p, Vec3::ZERO, 1.4);
        assert_vec_close(t.rotation.rotate(Vec3::Z), Vec3::new(0.0, -1.0, 0.0));
        let m = t.matrix();
        assert_vec_close(m.translation(), p);
        assert_vec_close(m.transform_vector(Vec3::Z), Vec3::new(0.0, -1.4, 0.0));
    }

    #[test]
    fn facing_self_keeps_identity() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let t = InstanceTransform::facing(p, p, 1.0);
        assert_vec_close(t.rotation.rotate(Vec3::X), Vec3::X);
    }

    #[test]
    fn scene_rotation_round_trips() {
        let r = SceneRotation { x: 0.4, y: -1.3 };
        let p = Vec3::new(0.3, -0.7, 0.9);
        assert_vec_close(r.to_local(r.to_world(p)), p);
    }

    #[test]
    fn yaw_turns_x_toward_minus_z() {
        let r = SceneRotation {
            x: 0.0,
            y: std::f64::consts::FRAC_PI_2,
        };
        assert_vec_close(r.to_world(Vec3::X), Vec3::new(0.0, 0.0, -1.0));
    }
}
