use foundation::math::{Vec3, to_surface_point};
use layers::Incident;
use layers::symbology::{self, Color};

use crate::transform::InstanceTransform;

/// Geometry of incident markers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerStyle {
    /// Radius of the unscaled marker sphere.
    pub radius: f64,
    /// Distance from the globe center to each marker.
    pub surface_radius: f64,
    /// Extra scale per severity point: `scale = 1 + severity * severity_scale`.
    pub severity_scale: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 0.01,
            surface_radius: 1.02,
            severity_scale: 0.2,
        }
    }
}

impl MarkerStyle {
    pub fn scale_for(&self, severity: u8) -> f64 {
        1.0 + f64::from(severity) * self.severity_scale
    }

    pub fn transform_for(&self, incident: &Incident) -> InstanceTransform {
        let position = to_surface_point(incident.lat, incident.lng, self.surface_radius);
        InstanceTransform::facing(position, Vec3::ZERO, self.scale_for(incident.severity))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Instance {
    pub transform: InstanceTransform,
    pub color: Color,
}

/// Which halves of the instance buffer changed since the last upload.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct InstanceDirty {
    pub transforms: bool,
    pub colors: bool,
}

impl InstanceDirty {
    pub fn any(self) -> bool {
        self.transforms || self.colors
    }
}

/// Index-addressed marker instances; slot `i` belongs to incident `i` of the
/// current incident set.
///
/// Setters report whether anything changed so callers can skip redundant
/// uploads.
#[derive(Debug, Clone, Default)]
pub struct InstanceBuffer {
    slots: Vec<Instance>,
    dirty: InstanceDirty,
    transform_version: u64,
}

impl InstanceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every slot with one marker per incident, in order.
    pub fn rebuild(&mut self, incidents: &[Incident], style: &MarkerStyle) {
        self.slots = incidents
            .iter()
            .map(|incident| Instance {
                transform: style.transform_for(incident),
                color: symbology::INCIDENT,
            })
            .collect();
        self.dirty = InstanceDirty {
            transforms: true,
            colors: true,
        };
        self.transform_version += 1;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Instance> {
        self.slots.get(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> + '_ {
        self.slots.iter()
    }

    pub fn set_color(&mut self, slot: usize, color: Color) -> bool {
        let Some(instance) = self.slots.get_mut(slot) else {
            return false;
        };
        if instance.color == color {
            return false;
        }
        instance.color = color;
        self.dirty.colors = true;
        true
    }

    pub fn set_transform(&mut self, slot: usize, transform: InstanceTransform) -> bool {
        let Some(instance) = self.slots.get_mut(slot) else {
            return false;
        };
        if instance.transform == transform {
            return false;
        }
        instance.transform = transform;
        self.dirty.transforms = true;
        self.transform_version += 1;
        true
    }

    /// Bumped whenever any transform changes; pick caches key off it.
    pub fn transform_version(&self) -> u64 {
        self.transform_version
    }

    pub fn dirty(&self) -> InstanceDirty {
        self.dirty
    }

    /// Returns and clears the pending dirty flags.
    pub fn take_dirty(&mut self) -> InstanceDirty {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::{InstanceBuffer, InstanceDirty, MarkerStyle};
    use foundation::math::Vec3;
    use layers::Incident;
    use layers::symbology::{INCIDENT, INCIDENT_HOVER};

    fn incidents() -> Vec<Incident> {
        vec![
            Incident::new("a", 0.0, 0.0, 1, ""),
            Incident::new("b", 45.0, 90.0, 5, ""),
        ]
    }

    #[test]
    fn rebuild_places_markers_on_the_shell() {
        let style = MarkerStyle::default();
        let mut buf = InstanceBuffer::new();
        buf.rebuild(&incidents(), &style);

        assert_eq!(buf.len(), 2);
        for inst in buf.iter() {
            assert!((inst.transform.position.length() - 1.02).abs() < 1e-12);
            assert_eq!(inst.color, INCIDENT);
        }
        assert!((buf.get(0).unwrap().transform.scale - 1.2).abs() < 1e-12);
        assert!((buf.get(1).unwrap().transform.scale - 2.0).abs() < 1e-12);

        let a = buf.get(0).unwrap().transform;
        let toward_center = a.rotation.rotate(Vec3::Z);
        assert!((toward_center - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn unchanged_color_is_not_dirty() {
        let mut buf = InstanceBuffer::new();
        buf.rebuild(&incidents(), &MarkerStyle::default());
        buf.take_dirty();

        assert!(!buf.set_color(0, INCIDENT));
        assert_eq!(buf.dirty(), InstanceDirty::default());

        assert!(buf.set_color(0, INCIDENT_HOVER));
        assert_eq!(
            buf.take_dirty(),
            InstanceDirty {
                transforms: false,
                colors: true
            }
        );
        assert!(!buf.dirty().any());
    }

    #[test]
    fn out_of_range_slots_are_ignored() {
        let mut buf = InstanceBuffer::new();
        buf.rebuild(&incidents(), &MarkerStyle::default());
        assert!(!buf.set_color(9, INCIDENT_HOVER));
        let version = buf.transform_version();
        assert!(!buf.set_transform(9, Default::default()));
        assert_eq!(buf.transform_version(), version);
    }

    #[test]
    fn transform_changes_bump_version() {
        let mut buf = InstanceBuffer::new();
        buf.rebuild(&incidents(), &MarkerStyle::default());
        let v = buf.transform_version();
        let moved = buf.get(0).unwrap().transform.with_position(Vec3::new(0.0, 2.0, 0.0));
        assert!(buf.set_transform(0, moved));
        assert!(buf.transform_version() > v);
        assert!(buf.dirty().transforms);
    }
}
