use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User-facing render quality.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownQuality(pub String);

impl std::fmt::Display for UnknownQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown quality level: {:?}", self.0)
    }
}

impl std::error::Error for UnknownQuality {}

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            other => Err(UnknownQuality(other.to_string())),
        }
    }
}

/// Post-processing chain parameters: bloom, FXAA, vignette and chromatic
/// aberration, applied in that order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PostChain {
    pub enabled: bool,
    pub bloom_intensity: f64,
    pub bloom_threshold: f64,
    pub fxaa: bool,
    pub vignette_darkness: f64,
    pub vignette_offset: f64,
    pub chromatic_offset: [f64; 2],
}

pub const BLOOM_ON: f64 = 1.2;
pub const BLOOM_OFF: f64 = 0.3;
pub const CHROMATIC_OFFSET: [f64; 2] = [0.0006, 0.0006];

impl Default for PostChain {
    fn default() -> Self {
        Self {
            enabled: true,
            bloom_intensity: BLOOM_ON,
            bloom_threshold: 0.2,
            fxaa: true,
            vignette_darkness: 0.6,
            vignette_offset: 0.25,
            chromatic_offset: CHROMATIC_OFFSET,
        }
    }
}

impl PostChain {
    /// Switches the effect pass; bloom and chromatic offset follow it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.bloom_intensity = if enabled { BLOOM_ON } else { BLOOM_OFF };
        self.chromatic_offset = if enabled { CHROMATIC_OFFSET } else { [0.0, 0.0] };
    }
}

/// Quality, motion preference, post chain and pixel density as one unit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderSettings {
    quality: Quality,
    reduce_motion: bool,
    device_pixel_ratio: f64,
    pixel_ratio: f64,
    post: PostChain,
}

pub const MAX_PIXEL_RATIO: f64 = 2.0;
pub const MEDIUM_PIXEL_RATIO: f64 = 1.5;

impl RenderSettings {
    /// Post-processing starts enabled unless motion is reduced; density
    /// starts at `min(device_pixel_ratio, 2)`.
    pub fn new(device_pixel_ratio: f64, reduce_motion: bool) -> Self {
        let device_pixel_ratio = sanitize_dpr(device_pixel_ratio);
        let mut post = PostChain::default();
        post.set_enabled(!reduce_motion);
        Self {
            quality: Quality::High,
            reduce_motion,
            device_pixel_ratio,
            pixel_ratio: device_pixel_ratio.min(MAX_PIXEL_RATIO),
            post,
        }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn reduce_motion(&self) -> bool {
        self.reduce_motion
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn post(&self) -> &PostChain {
        &self.post
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
        match quality {
            Quality::Low => {
                self.post.set_enabled(false);
                self.pixel_ratio = 1.0;
            }
            Quality::Medium => {
                self.post.set_enabled(!self.reduce_motion);
                self.pixel_ratio = MEDIUM_PIXEL_RATIO;
            }
            Quality::High => {
                self.post.set_enabled(!self.reduce_motion);
                self.pixel_ratio = self.device_pixel_ratio.min(MAX_PIXEL_RATIO);
            }
        }
    }

    /// Toggles post-processing only; density is left alone.
    pub fn set_reduce_motion(&mut self, reduce_motion: bool) {
        self.reduce_motion = reduce_motion;
        self.post.set_enabled(!reduce_motion);
    }

    /// Records a new device pixel ratio; `high` quality tracks it.
    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.device_pixel_ratio = sanitize_dpr(dpr);
        if self.quality == Quality::High {
            self.pixel_ratio = self.device_pixel_ratio.min(MAX_PIXEL_RATIO);
        }
    }
}

fn sanitize_dpr(dpr: f64) -> f64 {
    if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::{BLOOM_OFF, BLOOM_ON, Quality, RenderSettings};
    use pretty_assertions::assert_eq;

    #[test]
    fn quality_parses_case_insensitively() {
        assert_eq!("low".parse::<Quality>(), Ok(Quality::Low));
        assert_eq!(" Medium ".parse::<Quality>(), Ok(Quality::Medium));
        assert_eq!("HIGH".parse::<Quality>(), Ok(Quality::High));
        assert!("ultra".parse::<Quality>().is_err());
        let q: Quality = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(q, Quality::Medium);
    }

    #[test]
    fn low_disables_post_at_unit_density() {
        let mut s = RenderSettings::new(3.0, false);
        assert_eq!(s.pixel_ratio(), 2.0);
        s.set_quality(Quality::Low);
        assert!(!s.post().enabled);
        assert_eq!(s.post().bloom_intensity, BLOOM_OFF);
        assert_eq!(s.post().chromatic_offset, [0.0, 0.0]);
        assert_eq!(s.pixel_ratio(), 1.0);
    }

    #[test]
    fn medium_respects_reduce_motion() {
        let mut s = RenderSettings::new(1.0, true);
        s.set_quality(Quality::Medium);
        assert!(!s.post().enabled);
        assert_eq!(s.pixel_ratio(), 1.5);

        s.set_reduce_motion(false);
        assert!(s.post().enabled);
        assert_eq!(s.post().bloom_intensity, BLOOM_ON);
        assert_eq!(s.pixel_ratio(), 1.5);
    }

    #[test]
    fn low_then_high_restores_motion_preference() {
        let mut s = RenderSettings::new(1.25, false);
        s.set_quality(Quality::Low);
        s.set_quality(Quality::High);
        assert!(s.post().enabled);
        assert_eq!(s.pixel_ratio(), 1.25);

        s.set_reduce_motion(true);
        s.set_quality(Quality::Low);
        s.set_quality(Quality::High);
        assert!(!s.post().enabled);
    }

    #[test]
    fn set_quality_is_idempotent() {
        let mut s = RenderSettings::new(2.0, false);
        s.set_quality(Quality::Medium);
        let once = s;
        s.set_quality(Quality::Medium);
        assert_eq!(s, once);
    }

    #[test]
    fn bogus_device_ratio_falls_back_to_one() {
        let s = RenderSettings::new(f64::NAN, false);
        assert_eq!(s.pixel_ratio(), 1.0);
        let mut s = RenderSettings::new(0.0, false);
        s.set_device_pixel_ratio(4.0);
        assert_eq!(s.pixel_ratio(), 2.0);
    }
}
