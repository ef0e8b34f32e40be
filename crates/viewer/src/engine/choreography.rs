use std::f64::consts::TAU;

use foundation::math::{Vec3, to_surface_point};
use gpu::RenderBackend;
use layers::Cluster;
use runtime::tween::Tween;
use tracing::debug;

use super::GlobeEngine;
use crate::animation::{Prop, RingPlacement};
use crate::config::CameraMove;

impl<B: RenderBackend> GlobeEngine<B> {
    /// Camera move above `(lat, lng)`. Destinations are globe-space points;
    /// the current scene rotation is not compensated.
    pub(super) fn focus_on(&mut self, lat: f64, lng: f64, mv: CameraMove) {
        if !lat.is_finite() || !lng.is_finite() {
            return;
        }
        let to = to_surface_point(lat, lng, mv.radius);
        self.move_camera(to, mv.duration_s, mv.ease);
    }

    pub fn focus_cluster(&mut self, cluster: Option<&Cluster>) {
        let Some(cluster) = cluster else {
            return;
        };
        debug!(cluster = %cluster.id, size = cluster.size, "focus cluster");
        self.focus_on(cluster.lat, cluster.lng, self.config.choreography.cluster);
    }

    /// Flies into a cluster, turns the scene a quarter and fans its members
    /// out into a ring around the cluster center.
    pub fn deep_zoom(&mut self, cluster: Option<&Cluster>) {
        let Some(cluster) = cluster else {
            return;
        };
        let dz = self.config.choreography.deep_zoom.clone();
        let origin = to_surface_point(cluster.lat, cluster.lng, dz.origin_radius);
        self.move_camera(origin * dz.camera_factor, dz.camera_duration_s, dz.camera_ease);

        let spin_to = self.rotation.y + dz.spin_rad;
        self.animate(Prop::SceneRotationY, spin_to, dz.spin_duration_s, dz.spin_ease);

        let n = cluster.nodes.len();
        let mut placed = 0usize;
        for (i, node) in cluster.nodes.iter().enumerate() {
            let Some(slot) = self.incidents.index_of(&node.id) else {
                continue;
            };
            let phi = TAU * i as f64 / n as f64;
            let r = dz.ring_radius + dz.ring_step * i as f64;
            self.ring.insert(
                slot,
                RingPlacement {
                    origin,
                    offset: Vec3::new(phi.cos() * r, phi.sin() * r, 0.0),
                },
            );
            self.tweens.start(
                Prop::RingProgress(slot),
                Tween::new(0.0, 1.0, dz.member_duration_s, dz.member_ease)
                    .with_delay(dz.stagger_s * i as f64),
            );
            placed += 1;
        }
        debug!(cluster = %cluster.id, members = n, placed, "deep zoom");
    }

    pub fn minimap_jump(&mut self, lat: f64, lng: f64) {
        self.focus_on(lat, lng, self.config.choreography.minimap);
    }
}
