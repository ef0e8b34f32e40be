/// An 8-bit sRGB color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB`.
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
        }
    }

    /// Components in `[0, 1]`, still sRGB encoded.
    pub fn to_srgb_f32(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// Linear-light components for shading into an sRGB target.
    pub fn to_linear_f32(self) -> [f32; 3] {
        self.to_srgb_f32().map(srgb_to_linear)
    }

    pub fn to_linear_rgba(self, alpha: f32) -> [f32; 4] {
        let [r, g, b] = self.to_linear_f32();
        [r, g, b, alpha]
    }

    pub fn scaled_linear(self, factor: f32) -> [f32; 3] {
        self.to_linear_f32().map(|c| c * factor)
    }

    pub fn to_css(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub const INCIDENT: Color = Color::hex(0xFF2B2B);
/// Hovered or selected markers, and ribbons touching them.
pub const INCIDENT_HOVER: Color = Color::hex(0xFF5757);
pub const CONNECTION: Color = INCIDENT;
pub const CONNECTION_RELATED: Color = INCIDENT_HOVER;
pub const ATMOSPHERE: Color = Color::hex(0x0FC6FF);
pub const GLOBE_BASE: Color = Color::hex(0x03060A);
pub const FOG: Color = Color::hex(0x010305);
pub const AMBIENT_LIGHT: Color = Color::hex(0x0D1F2F);
pub const KEY_LIGHT: Color = Color::hex(0x7FE8FF);
pub const MINIMAP_CALM: Color = KEY_LIGHT;

/// Severity above which minimap dots use the incident color.
pub const MINIMAP_ALERT_SEVERITY: u8 = 3;

pub fn minimap_dot_color(severity: u8) -> Color {
    if severity > MINIMAP_ALERT_SEVERITY {
        INCIDENT
    } else {
        MINIMAP_CALM
    }
}

#[cfg(test)]
mod tests {
    use super::{minimap_dot_color, Color, INCIDENT, MINIMAP_CALM};

    #[test]
    fn hex_unpacks_channels() {
        assert_eq!(Color::hex(0xFF2B2B), Color::new(255, 43, 43));
        assert_eq!(Color::hex(0x0FC6FF).to_css(), "#0FC6FF");
    }

    #[test]
    fn linear_conversion_keeps_endpoints() {
        assert_eq!(Color::new(0, 0, 0).to_linear_f32(), [0.0, 0.0, 0.0]);
        let white = Color::new(255, 255, 255).to_linear_f32();
        for c in white {
            assert!((c - 1.0).abs() < 1e-6);
        }
        let mid = Color::new(128, 128, 128).to_linear_f32()[0];
        assert!(mid > 0.2 && mid < 0.23);
    }

    #[test]
    fn minimap_dots_flag_high_severity() {
        assert_eq!(minimap_dot_color(5), INCIDENT);
        assert_eq!(minimap_dot_color(4), INCIDENT);
        assert_eq!(minimap_dot_color(3), MINIMAP_CALM);
        assert_eq!(minimap_dot_color(1), MINIMAP_CALM);
    }
}
