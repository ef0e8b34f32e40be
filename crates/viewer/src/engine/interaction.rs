use foundation::math::Vec3;
use gpu::RenderBackend;
use scene::{PickOptions, Ray};
use tracing::debug;

use super::{GlobeEngine, emit};
use crate::animation::{Axis, Prop};
use crate::input::{DragSession, Key, PointerEvent, WheelEvent};

impl<B: RenderBackend> GlobeEngine<B> {
    /// Instance slot under the pointer, nearest first.
    fn pick_at(&mut self, x: f64, y: f64) -> Option<usize> {
        let (ndc_x, ndc_y) = self.viewport.to_ndc(x, y)?;
        let world: Ray = self.camera.ray_from_ndc(ndc_x, ndc_y)?;
        let local = world.transformed(&self.rotation.inverse_matrix());
        let opts = PickOptions {
            marker_radius: self.marker_style.radius,
            ..PickOptions::default()
        };
        self.picker
            .pick(&self.instances, local, opts)
            .map(|hit| hit.slot)
    }

    pub fn handle_pointer_move(&mut self, e: PointerEvent) {
        match self.pick_at(e.x, e.y) {
            Some(slot) if self.hover != Some(slot) => {
                let previous = self.hover.replace(slot);
                if let Some(prev) = previous {
                    self.refresh_color(prev);
                }
                self.refresh_color(slot);
                let id = self.incidents.get(slot).map(|i| i.id.clone());
                self.highlight_connections_for(id.as_deref());
                emit(&mut self.on_hover, self.incidents.get(slot));
            }
            Some(_) => {}
            None => {
                let Some(prev) = self.hover.take() else {
                    return;
                };
                self.refresh_color(prev);
                // Fall back to the selection's ribbons, if any.
                let id = self
                    .selected
                    .and_then(|s| self.incidents.get(s))
                    .map(|i| i.id.clone());
                self.highlight_connections_for(id.as_deref());
                emit(&mut self.on_hover, None);
            }
        }
    }

    /// Selects the incident under the pointer, or clears the selection on a
    /// miss. Ignored right after a drag that travelled past the threshold.
    pub fn handle_pointer_click(&mut self, e: PointerEvent) {
        if self.drag_delta.abs() > self.config.interaction.drag_threshold_px {
            debug!(drag_delta = self.drag_delta, "click suppressed after drag");
            return;
        }
        match self.pick_at(e.x, e.y) {
            Some(slot) => {
                let previous = self.selected.replace(slot);
                if let Some(prev) = previous {
                    self.refresh_color(prev);
                }
                self.refresh_color(slot);
                let Some(incident) = self.incidents.get(slot) else {
                    return;
                };
                let (id, lat, lng) = (incident.id.clone(), incident.lat, incident.lng);
                self.highlight_connections_for(Some(&id));
                self.focus_on(lat, lng, self.config.choreography.select);
                emit(&mut self.on_select, self.incidents.get(slot));
            }
            None => {
                let previous = self.selected.take();
                if let Some(prev) = previous {
                    self.refresh_color(prev);
                }
                self.highlight_connections_for(None);
                emit(&mut self.on_select, None);
            }
        }
    }

    /// Begins an orbit/pan drag session.
    pub fn start_orbit(&mut self, down: PointerEvent) {
        self.drag = Some(DragSession::begin(down));
        self.drag_delta = 0.0;
    }

    /// Pointer motion while a drag session is active; ignored otherwise.
    pub fn drag_to(&mut self, e: PointerEvent) {
        let Some(session) = self.drag.as_mut() else {
            return;
        };
        let step = session.step(e);
        self.drag_delta += step.travel();

        let ix = &self.config.interaction;
        if step.pan {
            self.camera.translate(Vec3::new(
                -step.dx * ix.pan_units_per_px,
                step.dy * ix.pan_units_per_px,
                0.0,
            ));
        } else {
            self.rotation.y += step.dx * ix.orbit_rad_per_px;
            self.rotation.x = (self.rotation.x + step.dy * ix.orbit_rad_per_px)
                .clamp(-ix.max_pitch_rad, ix.max_pitch_rad);
        }
    }

    /// Ends the drag session. `drag_delta` is kept for the click that follows.
    pub fn end_orbit(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Animated dolly toward (negative delta) or away from the target.
    pub fn handle_wheel(&mut self, e: WheelEvent) {
        if !e.delta_y.is_finite() || e.delta_y == 0.0 {
            return;
        }
        let ix = &self.config.interaction;
        let step = e.delta_y.signum() * ix.wheel_step;
        let (duration_s, ease) = (ix.wheel_duration_s, ix.wheel_ease);
        let to = self
            .camera
            .dolly_position(step, ix.min_distance, ix.max_distance);
        for axis in Axis::ALL {
            self.animate(Prop::CameraPosition(axis), axis.get(to), duration_s, ease);
        }
    }

    /// Escape clears an active selection.
    pub fn handle_key_up(&mut self, key: Key) {
        if key != Key::Escape {
            return;
        }
        let Some(prev) = self.selected.take() else {
            return;
        };
        self.refresh_color(prev);
        emit(&mut self.on_select, None);
        self.highlight_connections_for(None);
    }
}
