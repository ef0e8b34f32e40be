//! Browser binding for the incident globe.
//!
//! Incidents, clusters and connections cross the boundary as JSON strings;
//! hover/select callbacks receive a plain JS object or `null`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Display;
use std::rc::Rc;

use foundation::math::{lat_lng_to_minimap, minimap_to_lat_lng, to_surface_point};
use layers::symbology::minimap_dot_color;
use layers::{Cluster, Connection, Incident, cluster_by_grid, derive_connections};
use scene::Quality;
use tracing::{info, warn};
use viewer::{EngineConfig, EngineOptions, GlobeEngine, IncidentCallback};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

mod listeners;
mod logging;
mod wgpu;

use listeners::Listeners;
use wgpu::{CanvasSurface, WgpuBackend};

type Engine = GlobeEngine<WgpuBackend>;

enum Notice {
    Hover(Option<Incident>),
    Select(Option<Incident>),
}

/// State shared between the view handle and its DOM listeners.
pub(crate) struct Shared {
    engine: RefCell<Option<Engine>>,
    notices: Rc<RefCell<VecDeque<Notice>>>,
    on_hover: Option<js_sys::Function>,
    on_select: Option<js_sys::Function>,
}

impl Shared {
    /// Runs `f` on the live engine, then delivers the callbacks it queued.
    ///
    /// Callbacks run after the engine borrow ends, so JS handlers may call
    /// back into the view. Returns `None` once the engine is disposed.
    pub(crate) fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
        let out = match self.engine.try_borrow_mut() {
            Ok(mut slot) => slot.as_mut().map(f),
            Err(_) => {
                warn!("engine busy, call dropped");
                None
            }
        };
        self.deliver();
        out
    }

    fn deliver(&self) {
        loop {
            let Some(notice) = self.notices.borrow_mut().pop_front() else {
                break;
            };
            let (callback, incident) = match notice {
                Notice::Hover(incident) => (&self.on_hover, incident),
                Notice::Select(incident) => (&self.on_select, incident),
            };
            let Some(callback) = callback else {
                continue;
            };
            let arg = match incident.as_ref().map(to_js) {
                Some(Ok(value)) => value,
                Some(Err(e)) => {
                    warn!(error = ?e, "incident could not be converted");
                    continue;
                }
                None => JsValue::NULL,
            };
            if let Err(e) = callback.call1(&JsValue::NULL, &arg) {
                warn!(error = ?e, "incident callback threw");
            }
        }
    }
}

fn queue_into(
    notices: &Rc<RefCell<VecDeque<Notice>>>,
    wrap: fn(Option<Incident>) -> Notice,
) -> IncidentCallback {
    let notices = Rc::clone(notices);
    Box::new(move |incident: Option<&Incident>| {
        notices.borrow_mut().push_back(wrap(incident.cloned()));
    })
}

fn js_error(e: impl Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(js_error)?;
    js_sys::JSON::parse(&text)
}

fn parse<T: serde::de::DeserializeOwned>(what: &str, json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| js_error(format!("invalid {what} json: {e}")))
}

/// `None`, `""` and `"null"` all mean "no cluster".
fn parse_cluster(json: Option<String>) -> Result<Option<Cluster>, JsValue> {
    match json.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse("cluster", text),
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    logging::init("info");
    Ok(())
}

/// Replaces the log filter (`EnvFilter` syntax) if no subscriber is installed yet.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(directives: &str) {
    logging::init(directives);
}

/// A globe attached to one canvas. Call `dispose` to detach it.
#[wasm_bindgen]
pub struct GlobeView {
    shared: Rc<Shared>,
    listeners: Option<Listeners>,
}

/// Attaches a globe to the canvas with id `canvas_id`.
///
/// Rejects when the canvas is missing, the config is invalid, or no GPU
/// context can be created.
#[wasm_bindgen(js_name = createGlobe)]
pub async fn create_globe(
    canvas_id: String,
    config_json: Option<String>,
    on_hover: Option<js_sys::Function>,
    on_select: Option<js_sys::Function>,
    reduce_motion: bool,
    quality: Option<String>,
) -> Result<GlobeView, JsValue> {
    let window = web_sys::window().ok_or_else(|| js_error("window missing"))?;
    let document = window
        .document()
        .ok_or_else(|| js_error("document missing"))?;
    let canvas = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| js_error(format!("canvas #{canvas_id} missing")))?
        .dyn_into::<web_sys::HtmlCanvasElement>()?;

    let config = match config_json.as_deref().map(str::trim) {
        None | Some("") => EngineConfig::default(),
        Some(text) => EngineConfig::from_json(text).map_err(js_error)?,
    };
    let quality = match quality {
        Some(q) => q.parse::<Quality>().map_err(js_error)?,
        None => Quality::default(),
    };

    let surface = CanvasSurface::attach(
        canvas.clone(),
        window.device_pixel_ratio(),
        config.markers.style().radius,
    )
    .await;

    let notices = Rc::new(RefCell::new(VecDeque::new()));
    let options = EngineOptions {
        on_hover: Some(queue_into(&notices, Notice::Hover)),
        on_select: Some(queue_into(&notices, Notice::Select)),
        reduce_motion,
        quality,
        config,
    };
    let engine = GlobeEngine::new(surface, options).map_err(js_error)?;

    let shared = Rc::new(Shared {
        engine: RefCell::new(Some(engine)),
        notices,
        on_hover,
        on_select,
    });
    let listeners = Listeners::register(&window, &canvas, Rc::downgrade(&shared))?;
    info!(canvas = %canvas_id, "globe view attached");

    Ok(GlobeView {
        shared,
        listeners: Some(listeners),
    })
}

#[wasm_bindgen]
impl GlobeView {
    fn run<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> Result<R, JsValue> {
        self.shared
            .with_engine(f)
            .ok_or_else(|| js_error("globe view is disposed"))
    }

    /// Replaces the incident set from a JSON array. An empty array is ignored.
    #[wasm_bindgen(js_name = updateIncidents)]
    pub fn update_incidents(&self, json: &str) -> Result<(), JsValue> {
        let incidents: Vec<Incident> = parse("incidents", json)?;
        self.run(|engine| engine.update_incidents(incidents))?
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = updateConnections)]
    pub fn update_connections(&self, json: &str) -> Result<(), JsValue> {
        let connections: Vec<Connection> = parse("connections", json)?;
        self.run(|engine| engine.update_connections(&connections))
    }

    #[wasm_bindgen(js_name = highlightConnectionsFor)]
    pub fn highlight_connections_for(&self, incident_id: Option<String>) -> Result<(), JsValue> {
        self.run(|engine| engine.highlight_connections_for(incident_id.as_deref()))
    }

    #[wasm_bindgen(js_name = focusCluster)]
    pub fn focus_cluster(&self, cluster_json: Option<String>) -> Result<(), JsValue> {
        let cluster = parse_cluster(cluster_json)?;
        self.run(|engine| engine.focus_cluster(cluster.as_ref()))
    }

    #[wasm_bindgen(js_name = deepZoom)]
    pub fn deep_zoom(&self, cluster_json: Option<String>) -> Result<(), JsValue> {
        let cluster = parse_cluster(cluster_json)?;
        self.run(|engine| engine.deep_zoom(cluster.as_ref()))
    }

    #[wasm_bindgen(js_name = minimapJump)]
    pub fn minimap_jump(&self, lat: f64, lng: f64) -> Result<(), JsValue> {
        self.run(|engine| engine.minimap_jump(lat, lng))
    }

    /// Flies to a normalized minimap position (`x` east, `y` south, 0..1).
    #[wasm_bindgen(js_name = minimapClick)]
    pub fn minimap_click(&self, x: f64, y: f64) -> Result<(), JsValue> {
        let at = minimap_to_lat_lng(x, y);
        self.run(|engine| engine.minimap_jump(at.lat, at.lng))
    }

    /// `"low" | "medium" | "high"`.
    #[wasm_bindgen(js_name = setQuality)]
    pub fn set_quality(&self, quality: &str) -> Result<(), JsValue> {
        let quality = quality.parse::<Quality>().map_err(js_error)?;
        self.run(|engine| engine.set_quality(quality))
    }

    #[wasm_bindgen(js_name = setReduceMotion)]
    pub fn set_reduce_motion(&self, reduce_motion: bool) -> Result<(), JsValue> {
        self.run(|engine| engine.set_reduce_motion(reduce_motion))
    }

    /// Removes every listener, stops the frame loop and frees GPU resources.
    /// Later calls on this view fail; a second `dispose` does nothing.
    pub fn dispose(&mut self) {
        let Some(listeners) = self.listeners.take() else {
            return;
        };
        drop(listeners);
        let engine = match self.shared.engine.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                warn!("dispose while the engine is busy");
                None
            }
        };
        if let Some(engine) = engine {
            engine.dispose();
        }
        self.shared.notices.borrow_mut().clear();
    }
}

/// Groups incidents (JSON array) into grid-cell clusters of at least
/// `min_size` members; returns a JSON array.
#[wasm_bindgen(js_name = clusterByGrid)]
pub fn cluster_by_grid_json(
    incidents_json: &str,
    min_size: usize,
    cell_degrees: f64,
) -> Result<String, JsValue> {
    let incidents: Vec<Incident> = parse("incidents", incidents_json)?;
    serde_json::to_string(&cluster_by_grid(&incidents, min_size, cell_degrees)).map_err(js_error)
}

#[wasm_bindgen(js_name = deriveConnections)]
pub fn derive_connections_json(incidents_json: &str) -> Result<String, JsValue> {
    let incidents: Vec<Incident> = parse("incidents", incidents_json)?;
    serde_json::to_string(&derive_connections(&incidents)).map_err(js_error)
}

/// `[x, y, z]` of `(lat, lng)` on a sphere of `radius`.
#[wasm_bindgen(js_name = toSurfacePoint)]
pub fn to_surface_point_js(lat: f64, lng: f64, radius: f64) -> Vec<f64> {
    let p = to_surface_point(lat, lng, radius);
    vec![p.x, p.y, p.z]
}

/// `[lat, lng]` for a normalized minimap position.
#[wasm_bindgen(js_name = minimapToLatLng)]
pub fn minimap_to_lat_lng_js(x: f64, y: f64) -> Vec<f64> {
    let at = minimap_to_lat_lng(x, y);
    vec![at.lat, at.lng]
}

/// `[x, y]` minimap position of `(lat, lng)`.
#[wasm_bindgen(js_name = latLngToMinimap)]
pub fn lat_lng_to_minimap_js(lat: f64, lng: f64) -> Vec<f64> {
    let p = lat_lng_to_minimap(lat, lng);
    vec![p.x, p.y]
}

/// CSS hex color of a minimap dot for an incident of `severity`.
#[wasm_bindgen(js_name = minimapDotColor)]
pub fn minimap_dot_color_js(severity: u8) -> String {
    minimap_dot_color(severity).to_css()
}

#[cfg(test)]
mod tests {
    use super::{cluster_by_grid_json, derive_connections_json, minimap_dot_color_js, parse_cluster};
    use layers::{Cluster, Connection};

    const INCIDENTS: &str = r#"[
        {"id": "a", "lat": 20.0, "lng": -90.0, "severity": 2},
        {"id": "b", "lat": 0.0, "lng": -60.0, "severity": 5, "label": "b"},
        {"id": "c", "lat": -15.0, "lng": -120.0, "severity": 1},
        {"id": "d", "lat": 35.0, "lng": -75.0, "severity": 3}
    ]"#;

    #[test]
    fn missing_or_blank_cluster_is_none() {
        assert!(matches!(parse_cluster(None), Ok(None)));
        assert!(matches!(parse_cluster(Some("  ".into())), Ok(None)));
        assert!(matches!(parse_cluster(Some("null".into())), Ok(None)));
    }

    #[test]
    fn clusters_cross_the_json_boundary() {
        let out = cluster_by_grid_json(INCIDENTS, 2, 18.0).unwrap_or_default();
        let clusters: Vec<Cluster> = serde_json::from_str(&out).unwrap_or_default();
        assert_eq!(clusters.len(), 1);
        let ids: Vec<&str> = clusters[0].nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["a", "d"]);
    }

    #[test]
    fn connections_cross_the_json_boundary() {
        let out = derive_connections_json(INCIDENTS).unwrap_or_default();
        let conns: Vec<Connection> = serde_json::from_str(&out).unwrap_or_default();
        assert_eq!(conns.len(), 4);
    }

    #[test]
    fn minimap_dots_turn_red_above_severity_three() {
        assert_eq!(minimap_dot_color_js(1), "#7FE8FF");
        assert_eq!(minimap_dot_color_js(3), "#7FE8FF");
        assert_eq!(minimap_dot_color_js(4), "#FF2B2B");
        assert_eq!(minimap_dot_color_js(5), "#FF2B2B");
    }
}
