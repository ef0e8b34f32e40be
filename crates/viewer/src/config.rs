use std::f64::consts::FRAC_PI_2;

use runtime::easing::Ease;
use scene::{ArcStyle, MarkerStyle};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Every tunable of the globe engine. Missing JSON fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub camera: CameraConfig,
    pub markers: MarkerConfig,
    pub ribbons: RibbonConfig,
    pub interaction: InteractionConfig,
    pub intro: IntroConfig,
    pub choreography: ChoreographyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    pub position: [f64; 3],
    /// Passive scene spin around Y.
    pub idle_spin_rad_per_s: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 32.0,
            near: 0.1,
            far: 200.0,
            position: [0.0, 1.5, 3.4],
            idle_spin_rad_per_s: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub radius: f64,
    pub surface_radius: f64,
    pub severity_scale: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        let style = MarkerStyle::default();
        Self {
            radius: style.radius,
            surface_radius: style.surface_radius,
            severity_scale: style.severity_scale,
        }
    }
}

impl MarkerConfig {
    pub fn style(&self) -> MarkerStyle {
        MarkerStyle {
            radius: self.radius,
            surface_radius: self.surface_radius,
            severity_scale: self.severity_scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonConfig {
    pub surface_radius: f64,
    pub bulge: f64,
    pub base_radius: f64,
    pub intensity_radius: f64,
    pub tubular_segments: u32,
    pub radial_segments: u32,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        let style = ArcStyle::default();
        Self {
            surface_radius: style.surface_radius,
            bulge: style.bulge,
            base_radius: style.base_radius,
            intensity_radius: style.intensity_radius,
            tubular_segments: style.tubular_segments,
            radial_segments: style.radial_segments,
        }
    }
}

impl RibbonConfig {
    pub fn style(&self) -> ArcStyle {
        ArcStyle {
            surface_radius: self.surface_radius,
            bulge: self.bulge,
            base_radius: self.base_radius,
            intensity_radius: self.intensity_radius,
            tubular_segments: self.tubular_segments,
            radial_segments: self.radial_segments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Drag distance (sum of |dx| + |dy| in CSS pixels) above which a click
    /// is ignored.
    pub drag_threshold_px: f64,
    pub orbit_rad_per_px: f64,
    pub pan_units_per_px: f64,
    pub max_pitch_rad: f64,
    pub wheel_step: f64,
    pub wheel_duration_s: f64,
    pub wheel_ease: Ease,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 6.0,
            orbit_rad_per_px: 0.005,
            pan_units_per_px: 0.003,
            max_pitch_rad: 0.6,
            wheel_step: 0.35,
            wheel_duration_s: 0.6,
            wheel_ease: Ease::Power2Out,
            min_distance: 1.6,
            max_distance: 5.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub duration_s: f64,
    pub ease: Ease,
    pub zoom_from: f64,
    pub detail_from: f64,
    pub detail_to: f64,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            duration_s: 2.2,
            ease: Ease::Power2Out,
            zoom_from: 0.5,
            detail_from: 0.5,
            detail_to: 2.5,
        }
    }
}

/// An animated camera move to `toSurfacePoint(lat, lng, radius)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraMove {
    pub radius: f64,
    pub duration_s: f64,
    pub ease: Ease,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreographyConfig {
    pub select: CameraMove,
    pub cluster: CameraMove,
    pub minimap: CameraMove,
    pub deep_zoom: DeepZoomConfig,
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        Self {
            select: CameraMove {
                radius: 2.8,
                duration_s: 1.6,
                ease: Ease::Power2Out,
            },
            cluster: CameraMove {
                radius: 2.8,
                duration_s: 1.2,
                ease: Ease::Power3Out,
            },
            minimap: CameraMove {
                radius: 2.4,
                duration_s: 1.1,
                ease: Ease::Power2InOut,
            },
            deep_zoom: DeepZoomConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepZoomConfig {
    /// Radius of the ring center above the globe.
    pub origin_radius: f64,
    /// Camera ends at `origin * camera_factor`.
    pub camera_factor: f64,
    pub camera_duration_s: f64,
    pub camera_ease: Ease,
    pub spin_rad: f64,
    pub spin_duration_s: f64,
    pub spin_ease: Ease,
    pub ring_radius: f64,
    /// Added to the ring radius per member index.
    pub ring_step: f64,
    pub stagger_s: f64,
    pub member_duration_s: f64,
    pub member_ease: Ease,
}

impl Default for DeepZoomConfig {
    fn default() -> Self {
        Self {
            origin_radius: 1.1,
            camera_factor: 2.2,
            camera_duration_s: 2.2,
            camera_ease: Ease::Power3InOut,
            spin_rad: FRAC_PI_2,
            spin_duration_s: 2.2,
            spin_ease: Ease::Power2InOut,
            ring_radius: 0.12,
            ring_step: 0.01,
            stagger_s: 0.03,
            member_duration_s: 1.6,
            member_ease: Ease::Power1Out,
        }
    }
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON config and validates it.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(text)
            .map_err(|e| EngineError::Config(format!("invalid config json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let cam = &self.camera;
        if !(cam.fov_y_deg > 0.0 && cam.fov_y_deg < 180.0) {
            return Err(invalid(format!("camera.fov_y_deg {} outside (0, 180)", cam.fov_y_deg)));
        }
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(invalid(format!(
                "camera clip range [{}, {}] is empty",
                cam.near, cam.far
            )));
        }
        if !cam.position.iter().all(|v| v.is_finite()) {
            return Err(invalid("camera.position must be finite".to_string()));
        }

        let ix = &self.interaction;
        if !(ix.min_distance > 0.0 && ix.min_distance <= ix.max_distance) {
            return Err(invalid(format!(
                "interaction distance range [{}, {}] is invalid",
                ix.min_distance, ix.max_distance
            )));
        }
        if !(ix.drag_threshold_px >= 0.0) || !(ix.max_pitch_rad >= 0.0) {
            return Err(invalid(
                "interaction thresholds must be non-negative".to_string(),
            ));
        }
        if !(self.markers.radius > 0.0) || !(self.ribbons.base_radius >= 0.0) {
            return Err(invalid("marker and ribbon radii must be positive".to_string()));
        }

        let c = &self.choreography;
        let durations = [
            ix.wheel_duration_s,
            self.intro.duration_s,
            c.select.duration_s,
            c.cluster.duration_s,
            c.minimap.duration_s,
            c.deep_zoom.camera_duration_s,
            c.deep_zoom.spin_duration_s,
            c.deep_zoom.member_duration_s,
            c.deep_zoom.stagger_s,
        ];
        if durations.iter().any(|d| !(d.is_finite() && *d >= 0.0)) {
            return Err(invalid("durations must be finite and non-negative".to_string()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> EngineError {
    EngineError::Config(msg)
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;
    use crate::error::EngineError;
    use pretty_assertions::assert_eq;
    use runtime::easing::Ease;

    #[test]
    fn defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interaction.drag_threshold_px, 6.0);
        assert_eq!(config.choreography.minimap.radius, 2.4);
        assert_eq!(config.markers.style().scale_for(5), 2.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "interaction": { "wheel_step": 0.5 }, "intro": { "ease": "linear" } }"#,
        )
        .unwrap();
        assert_eq!(config.interaction.wheel_step, 0.5);
        assert_eq!(config.interaction.min_distance, 1.6);
        assert_eq!(config.intro.ease, Ease::Linear);
        assert_eq!(config.intro.duration_s, 2.2);
        assert_eq!(config.camera, super::CameraConfig::default());
    }

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn inverted_distance_range_is_rejected() {
        let err = EngineConfig::from_json(
            r#"{ "interaction": { "min_distance": 6.0, "max_distance": 2.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = EngineConfig::from_json("{ nope").unwrap_err();
        assert!(err.to_string().contains("invalid config json"));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut config = EngineConfig::default();
        config.choreography.cluster.duration_s = -1.0;
        assert!(config.validate().is_err());
    }
}
