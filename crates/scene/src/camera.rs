use foundation::math::{Mat4, Vec3};

use crate::picking::Ray;

/// Perspective camera looking from `position` at `target`.
///
/// `zoom` narrows the effective field of view: `tan(fov_eff / 2) = tan(fov / 2) / zoom`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    pub zoom: f64,
    aspect: f64,
}

impl PerspectiveCamera {
    pub fn new(position: Vec3, fov_y_deg: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg,
            near,
            far,
            zoom: 1.0,
            aspect: 1.0,
        }
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    /// Updates the aspect ratio from a surface size in pixels.
    ///
    /// Zero-area or non-finite sizes fall back to `1.0`.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        let ratio = width / height;
        self.aspect = if width > 0.0 && height > 0.0 && ratio.is_finite() {
            ratio
        } else {
            1.0
        };
    }

    pub fn effective_fov_y_rad(&self) -> f64 {
        let half = 0.5 * self.fov_y_deg.to_radians();
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        2.0 * (half.tan() / zoom).atan()
    }

    pub fn distance(&self) -> f64 {
        self.position.distance(self.target)
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Camera basis `(right, up, forward)`, stable when looking along `up`.
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let f = self.forward();
        let mut right = f.cross(self.up);
        if right.dot(right) < 1e-12 {
            right = f.cross(Vec3::Z);
        }
        let right = right.normalize_or_zero();
        (right, right.cross(f), f)
    }

    pub fn view(&self) -> Mat4 {
        let (_, up, _) = self.basis();
        Mat4::look_at_rh(self.position, self.target, up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_z0(self.effective_fov_y_rad(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection().mul(&self.view())
    }

    /// World-space ray through normalized device coordinates (`[-1, 1]`, +y up).
    pub fn ray_from_ndc(&self, ndc_x: f64, ndc_y: f64) -> Option<Ray> {
        if !ndc_x.is_finite() || !ndc_y.is_finite() {
            return None;
        }
        let (right, up, forward) = self.basis();
        if forward == Vec3::ZERO {
            return None;
        }
        let tan_half = (0.5 * self.effective_fov_y_rad()).tan();
        let dir = forward + right * (ndc_x * tan_half * self.aspect) + up * (ndc_y * tan_half);
        Some(Ray::new(self.position, dir.try_normalize()?))
    }

    /// Moves position and target together.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.target += delta;
    }

    /// Position reached by moving `step` units away from the target (negative
    /// moves closer), with the resulting distance clamped to `[min, max]`.
    pub fn dolly_position(&self, step: f64, min: f64, max: f64) -> Vec3 {
        let offset = self.position - self.target;
        let Some(dir) = offset.try_normalize() else {
            return self.position;
        };
        let distance = (offset.length() + step).clamp(min, max);
        self.target + dir * distance
    }
}

#[cfg(test)]
mod tests {
    use super::PerspectiveCamera;
    use foundation::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(Vec3::new(0.0, 0.0, 3.0), 32.0, 0.1, 200.0)
    }

    #[test]
    fn zero_area_viewport_keeps_unit_aspect() {
        let mut cam = camera();
        cam.set_viewport(800.0, 400.0);
        assert_eq!(cam.aspect(), 2.0);
        cam.set_viewport(0.0, 0.0);
        assert_eq!(cam.aspect(), 1.0);
        cam.set_viewport(640.0, 0.0);
        assert_eq!(cam.aspect(), 1.0);
    }

    #[test]
    fn zoom_narrows_field_of_view() {
        let mut cam = camera();
        let base = cam.effective_fov_y_rad();
        assert_close(base, 32.0_f64.to_radians(), 1e-12);
        cam.zoom = 0.5;
        assert!(cam.effective_fov_y_rad() > base);
        cam.zoom = 2.0;
        assert!(cam.effective_fov_y_rad() < base);
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = camera();
        let ray = cam.ray_from_ndc(0.0, 0.0).unwrap();
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 3.0));
        assert_close(ray.dir.z, -1.0, 1e-12);

        let right = cam.ray_from_ndc(1.0, 0.0).unwrap();
        assert!(right.dir.x > 0.0);
        let top = cam.ray_from_ndc(0.0, 1.0).unwrap();
        assert!(top.dir.y > 0.0);
    }

    #[test]
    fn edge_ray_matches_half_fov() {
        let cam = camera();
        let top = cam.ray_from_ndc(0.0, 1.0).unwrap();
        let angle = top.dir.dot(cam.forward()).acos();
        assert_close(angle, 16.0_f64.to_radians(), 1e-9);
    }

    #[test]
    fn projected_target_lands_at_ndc_origin() {
        let mut cam = camera();
        cam.position = Vec3::new(0.0, 1.5, 3.4);
        cam.set_viewport(1280.0, 720.0);
        let vp = cam.view_projection();
        let c = &vp.cols;
        let w = c[3][3];
        assert_close(c[3][0] / w, 0.0, 1e-9);
        assert_close(c[3][1] / w, 0.0, 1e-9);
    }

    #[test]
    fn looking_down_the_pole_stays_well_defined() {
        let mut cam = camera();
        cam.position = Vec3::new(0.0, 2.8, 0.0);
        let ray = cam.ray_from_ndc(0.0, 0.0).unwrap();
        assert_close(ray.dir.y, -1.0, 1e-12);
        let view = cam.view();
        assert!(view.cols.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn dolly_clamps_distance() {
        let cam = camera();
        assert_close(cam.dolly_position(0.35, 1.6, 5.8).z, 3.35, 1e-12);
        assert_close(cam.dolly_position(-10.0, 1.6, 5.8).z, 1.6, 1e-12);
        assert_close(cam.dolly_position(10.0, 1.6, 5.8).z, 5.8, 1e-12);
    }

    #[test]
    fn translate_moves_target_with_position() {
        let mut cam = camera();
        cam.translate(Vec3::new(-0.3, 0.6, 0.0));
        assert_eq!(cam.target, Vec3::new(-0.3, 0.6, 0.0));
        assert_close(cam.distance(), 3.0, 1e-12);
    }
}
