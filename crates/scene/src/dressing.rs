use foundation::math::Vec3;
use layers::symbology::{self, Color};

pub const GLOBE_RADIUS: f64 = 1.0;
pub const ATMOSPHERE_RADIUS: f64 = 1.02;
/// Extra shell scale applied in the atmosphere vertex stage.
pub const ATMOSPHERE_SCALE: f64 = 1.06;

/// Surface detail at rest; the entrance animation ramps up to it.
pub const GLOBE_DETAIL: f64 = 2.5;

/// Static look of the scene: clear color, fog and lights.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneDressing {
    pub clear_color: Color,
    pub fog_color: Color,
    /// Exponential-squared fog density.
    pub fog_density: f64,
    pub globe_base: Color,
    pub fresnel: Color,
    pub atmosphere: Color,
    pub ambient: Color,
    pub ambient_intensity: f64,
    pub key_light: Color,
    pub key_intensity: f64,
    pub key_position: Vec3,
}

impl Default for SceneDressing {
    fn default() -> Self {
        Self {
            clear_color: symbology::GLOBE_BASE,
            fog_color: symbology::FOG,
            fog_density: 3.5,
            globe_base: symbology::GLOBE_BASE,
            fresnel: symbology::ATMOSPHERE,
            atmosphere: symbology::ATMOSPHERE,
            ambient: symbology::AMBIENT_LIGHT,
            ambient_intensity: 1.4,
            key_light: symbology::KEY_LIGHT,
            key_intensity: 1.1,
            key_position: Vec3::new(5.0, 3.0, 5.0),
        }
    }
}

impl SceneDressing {
    pub fn key_direction(&self) -> Vec3 {
        self.key_position.normalize_or_zero()
    }
}
