//! The incident globe engine: interaction state, choreography and the
//! per-frame tick, generic over the render backend.

mod choreography;
mod interaction;


use std::collections::BTreeMap;

use foundation::math::Vec3;
use foundation::time::Time;
use gpu::{FrameInputs, RenderBackend, RenderSurface, Renderer, SurfaceSize};
use layers::symbology;
use layers::{Connection, Incident, IncidentSet};
use runtime::easing::Ease;
use runtime::frame::FrameClock;
use runtime::tween::{Tween, Tweens};
use scene::{
    ArcSet, ArcStyle, InstanceBuffer, InstancePicker, MarkerStyle, PerspectiveCamera, Quality,
    RenderSettings, SceneDressing, SceneRotation,
};
use tracing::{debug, info, warn};

use crate::animation::{Axis, Prop, RingPlacement};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::input::{DragSession, Viewport};

/// Receives the hovered/selected incident, or `None` when it is cleared.
pub type IncidentCallback = Box<dyn FnMut(Option<&Incident>)>;

#[derive(Default)]
pub struct EngineOptions {
    pub on_hover: Option<IncidentCallback>,
    pub on_select: Option<IncidentCallback>,
    pub reduce_motion: bool,
    pub quality: Quality,
    pub config: EngineConfig,
}

pub struct GlobeEngine<B: RenderBackend> {
    backend: B,
    config: EngineConfig,
    marker_style: MarkerStyle,
    arc_style: ArcStyle,

    incidents: IncidentSet,
    instances: InstanceBuffer,
    picker: InstancePicker,
    arcs: ArcSet,
    uploaded_arc_version: u64,
    uploaded_arc_indices: usize,

    camera: PerspectiveCamera,
    rotation: SceneRotation,
    dressing: SceneDressing,
    settings: RenderSettings,
    viewport: Viewport,
    detail: f64,

    clock: FrameClock,
    tweens: Tweens<Prop>,
    ring: BTreeMap<usize, RingPlacement>,

    hover: Option<usize>,
    selected: Option<usize>,
    highlighted: Option<String>,
    drag: Option<DragSession>,
    drag_delta: f64,

    on_hover: Option<IncidentCallback>,
    on_select: Option<IncidentCallback>,
    failed_frames: u64,
}

impl<B: RenderBackend> GlobeEngine<B> {
    /// Acquires the render backend from `surface` and starts the intro
    /// animation. A surface that cannot provide a context fails immediately.
    pub fn new<S>(surface: S, options: EngineOptions) -> Result<Self, EngineError>
    where
        S: RenderSurface<Backend = B>,
    {
        let EngineOptions {
            on_hover,
            on_select,
            reduce_motion,
            quality,
            config,
        } = options;
        config.validate()?;

        let (css_width, css_height) = surface.css_size();
        let mut settings = RenderSettings::new(surface.device_pixel_ratio(), reduce_motion);
        settings.set_quality(quality);
        let mut backend = surface.acquire_backend()?;

        let cam = &config.camera;
        let [px, py, pz] = cam.position;
        let mut camera = PerspectiveCamera::new(Vec3::new(px, py, pz), cam.fov_y_deg, cam.near, cam.far);
        camera.set_viewport(css_width, css_height);
        backend.resize(SurfaceSize::from_css(css_width, css_height, settings.pixel_ratio()));

        let intro = &config.intro;
        camera.zoom = intro.zoom_from;
        let mut tweens = Tweens::new();
        tweens.start(
            Prop::CameraZoom,
            Tween::new(intro.zoom_from, 1.0, intro.duration_s, intro.ease),
        );
        tweens.start(
            Prop::GlobeDetail,
            Tween::new(intro.detail_from, intro.detail_to, intro.duration_s, intro.ease),
        );

        info!(
            width = css_width,
            height = css_height,
            quality = %settings.quality(),
            reduce_motion,
            "globe engine started"
        );

        Ok(Self {
            backend,
            marker_style: config.markers.style(),
            arc_style: config.ribbons.style(),
            detail: intro.detail_from,
            config,
            incidents: IncidentSet::default(),
            instances: InstanceBuffer::new(),
            picker: InstancePicker::new(),
            arcs: ArcSet::new(),
            uploaded_arc_version: 0,
            uploaded_arc_indices: 0,
            camera,
            rotation: SceneRotation::default(),
            dressing: SceneDressing::default(),
            settings,
            viewport: Viewport::new(css_width, css_height),
            clock: FrameClock::new(),
            tweens,
            ring: BTreeMap::new(),
            hover: None,
            selected: None,
            highlighted: None,
            drag: None,
            drag_delta: 0.0,
            on_hover,
            on_select,
            failed_frames: 0,
        })
    }

    /// Replaces the incident set and rebuilds every marker instance.
    ///
    /// Hover, selection and drag state reset without callbacks; an empty list
    /// leaves the current set in place.
    pub fn update_incidents(&mut self, incidents: Vec<Incident>) -> Result<(), EngineError> {
        if incidents.is_empty() {
            debug!("ignoring empty incident update");
            return Ok(());
        }
        let set = IncidentSet::new(incidents)?;
        self.instances.rebuild(set.as_slice(), &self.marker_style);
        self.incidents = set;

        self.hover = None;
        self.selected = None;
        self.drag = None;
        self.drag_delta = 0.0;
        self.ring.clear();
        self.tweens.cancel_where(|k| matches!(k, Prop::RingProgress(_)));
        self.highlight_connections_for(None);

        info!(count = self.incidents.len(), "incident markers rebuilt");
        Ok(())
    }

    /// Discards every ribbon and builds one per connection. Highlighting is
    /// re-applied for the last highlighted incident.
    pub fn update_connections(&mut self, connections: &[Connection]) {
        self.arcs.rebuild(connections, &self.arc_style);
        let highlighted = self.highlighted.take();
        self.highlight_connections_for(highlighted.as_deref());
        info!(count = self.arcs.len(), "connection ribbons rebuilt");
    }

    /// Colors ribbons touching `incident_id` as related and all others as base.
    pub fn highlight_connections_for(&mut self, incident_id: Option<&str>) {
        let changed = self.arcs.highlight_for(incident_id);
        self.highlighted = incident_id.map(str::to_string);
        if changed > 0 {
            debug!(changed, incident = ?incident_id, "ribbon highlight changed");
        }
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.settings.set_quality(quality);
        self.apply_surface_size();
        info!(%quality, pixel_ratio = self.settings.pixel_ratio(), "render quality changed");
    }

    pub fn set_reduce_motion(&mut self, reduce_motion: bool) {
        self.settings.set_reduce_motion(reduce_motion);
        debug!(reduce_motion, "motion preference changed");
    }

    /// New layout size in CSS pixels. Zero-area sizes keep aspect 1.
    pub fn resize(&mut self, css_width: f64, css_height: f64) {
        self.viewport = Viewport::new(css_width, css_height);
        self.camera.set_viewport(css_width, css_height);
        self.apply_surface_size();
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.settings.set_device_pixel_ratio(dpr);
        self.apply_surface_size();
    }

    fn apply_surface_size(&mut self) {
        self.backend.resize(SurfaceSize::from_css(
            self.viewport.width,
            self.viewport.height,
            self.settings.pixel_ratio(),
        ));
    }

    /// Advances animations to host time `now` and draws one frame.
    ///
    /// A failed draw is logged and counted; the next call renders again from
    /// current state.
    pub fn frame(&mut self, now: Time) {
        let frame = self.clock.tick(now);

        let mut updates = Vec::with_capacity(self.tweens.len());
        self.tweens.advance(frame.dt_s, |prop, value| updates.push((prop, value)));
        for (prop, value) in updates {
            self.apply_prop(prop, value);
        }

        self.arcs.advance(frame.dt_s);
        if !self.tweens.is_running(Prop::SceneRotationY) {
            self.rotation.y += frame.dt_s * self.config.camera.idle_spin_rad_per_s;
        }

        self.upload_dirty();

        let inputs = FrameInputs {
            camera: &self.camera,
            rotation: self.rotation,
            dressing: &self.dressing,
            settings: &self.settings,
            surface: SurfaceSize::from_css(
                self.viewport.width,
                self.viewport.height,
                self.settings.pixel_ratio(),
            ),
            elapsed_s: frame.elapsed.seconds(),
            detail: self.detail,
            arc_time_s: self.arcs.time_s(),
            instance_count: self.instances.len(),
            arc_index_count: self.uploaded_arc_indices,
        };
        let render_frame = Renderer::collect(&inputs);
        if let Err(e) = self.backend.render(&render_frame) {
            self.failed_frames += 1;
            warn!(error = %e, frame = frame.index, "frame render failed");
        }
    }

    fn upload_dirty(&mut self) {
        if self.instances.take_dirty().any() {
            self.backend
                .upload_instances(&Renderer::pack_instances(&self.instances));
        }

        let version = self.arcs.geometry_version();
        let styles_dirty = self.arcs.take_styles_dirty();
        if version != self.uploaded_arc_version {
            let geometry = Renderer::pack_arc_geometry(&self.arcs, &self.arc_style);
            self.backend
                .upload_arc_geometry(&geometry.vertices, &geometry.indices);
            self.backend
                .upload_arc_colors(&Renderer::pack_arc_colors(&self.arcs, &self.arc_style));
            self.uploaded_arc_version = version;
            self.uploaded_arc_indices = geometry.indices.len();
        } else if styles_dirty {
            self.backend
                .upload_arc_colors(&Renderer::pack_arc_colors(&self.arcs, &self.arc_style));
        }
    }

    fn apply_prop(&mut self, prop: Prop, value: f64) {
        match prop {
            Prop::CameraPosition(axis) => axis.set(&mut self.camera.position, value),
            Prop::CameraTarget(axis) => axis.set(&mut self.camera.target, value),
            Prop::CameraZoom => self.camera.zoom = value,
            Prop::SceneRotationY => self.rotation.y = value,
            Prop::GlobeDetail => self.detail = value,
            Prop::RingProgress(slot) => {
                let (Some(placement), Some(instance)) =
                    (self.ring.get(&slot), self.instances.get(slot))
                else {
                    return;
                };
                let transform = instance.transform.with_position(placement.at(value));
                self.instances.set_transform(slot, transform);
            }
        }
    }

    /// Starts a tween on `prop` from its current value.
    fn animate(&mut self, prop: Prop, to: f64, duration_s: f64, ease: Ease) {
        let from = self.prop_value(prop);
        self.tweens.start(prop, Tween::new(from, to, duration_s, ease));
    }

    fn prop_value(&self, prop: Prop) -> f64 {
        match prop {
            Prop::CameraPosition(axis) => axis.get(self.camera.position),
            Prop::CameraTarget(axis) => axis.get(self.camera.target),
            Prop::CameraZoom => self.camera.zoom,
            Prop::SceneRotationY => self.rotation.y,
            Prop::GlobeDetail => self.detail,
            Prop::RingProgress(_) => 0.0,
        }
    }

    /// Tweens the camera to `position`, looking back at the globe center.
    fn move_camera(&mut self, position: Vec3, duration_s: f64, ease: Ease) {
        for axis in Axis::ALL {
            self.animate(Prop::CameraPosition(axis), axis.get(position), duration_s, ease);
            self.animate(Prop::CameraTarget(axis), 0.0, duration_s, ease);
        }
    }

    /// Color an instance should show given hover and selection state.
    fn resting_color(&self, slot: usize) -> symbology::Color {
        if self.hover == Some(slot) || self.selected == Some(slot) {
            symbology::INCIDENT_HOVER
        } else {
            symbology::INCIDENT
        }
    }

    fn refresh_color(&mut self, slot: usize) {
        let color = self.resting_color(slot);
        self.instances.set_color(slot, color);
    }

    /// Releases GPU resources and returns the backend. Host listeners and the
    /// frame loop are owned by the caller and must be torn down alongside.
    pub fn dispose(mut self) -> B {
        self.tweens.clear();
        self.backend.release();
        info!(
            frames = self.clock.frames(),
            failed_frames = self.failed_frames,
            "globe engine disposed"
        );
        self.backend
    }

    pub fn incidents(&self) -> &IncidentSet {
        &self.incidents
    }

    pub fn instances(&self) -> &InstanceBuffer {
        &self.instances
    }

    pub fn arcs(&self) -> &ArcSet {
        &self.arcs
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn rotation(&self) -> SceneRotation {
        self.rotation
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn detail(&self) -> f64 {
        self.detail
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hover
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn drag_delta(&self) -> f64 {
        self.drag_delta
    }

    pub fn is_animating(&self, prop: Prop) -> bool {
        self.tweens.is_running(prop)
    }

    pub fn failed_frames(&self) -> u64 {
        self.failed_frames
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

/// Invokes an optional incident callback.
fn emit(callback: &mut Option<IncidentCallback>, incident: Option<&Incident>) {
    if let Some(cb) = callback.as_mut() {
        cb(incident);
    }
}
