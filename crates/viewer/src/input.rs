//! Host-agnostic input events. Coordinates are CSS pixels relative to the
//! top-left corner of the render surface.

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    /// Modifier that turns an orbit drag into a pan.
    pub shift: bool,
}

impl PointerEvent {
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, shift: false }
    }

    pub fn with_shift(self) -> Self {
        Self { shift: true, ..self }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WheelEvent {
    pub delta_y: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// Layout size of the surface in CSS pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Normalized device coordinates (`[-1, 1]`, +y up), or `None` for a
    /// zero-area viewport.
    pub fn to_ndc(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        Some((x / self.width * 2.0 - 1.0, 1.0 - y / self.height * 2.0))
    }
}

/// An orbit/pan drag from pointer-down to pointer-up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DragSession {
    last_x: f64,
    last_y: f64,
    shift: bool,
}

/// Pointer motion since the previous drag event.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DragStep {
    pub dx: f64,
    pub dy: f64,
    pub pan: bool,
}

impl DragStep {
    /// Manhattan length, the unit of the click-suppression threshold.
    pub fn travel(&self) -> f64 {
        self.dx.abs() + self.dy.abs()
    }
}

impl DragSession {
    pub fn begin(down: PointerEvent) -> Self {
        Self {
            last_x: down.x,
            last_y: down.y,
            shift: down.shift,
        }
    }

    /// Pans when the modifier was held at pointer-down or is held now.
    pub fn step(&mut self, e: PointerEvent) -> DragStep {
        let step = DragStep {
            dx: e.x - self.last_x,
            dy: e.y - self.last_y,
            pan: self.shift || e.shift,
        };
        self.last_x = e.x;
        self.last_y = e.y;
        step
    }
}

#[cfg(test)]
mod tests {
    use super::{DragSession, Key, PointerEvent, Viewport};

    #[test]
    fn ndc_maps_corners_and_center() {
        let vp = Viewport::new(800.0, 600.0);
        assert_eq!(vp.to_ndc(0.0, 0.0), Some((-1.0, 1.0)));
        assert_eq!(vp.to_ndc(400.0, 300.0), Some((0.0, 0.0)));
        assert_eq!(vp.to_ndc(800.0, 600.0), Some((1.0, -1.0)));
        assert_eq!(Viewport::new(0.0, 600.0).to_ndc(1.0, 1.0), None);
    }

    #[test]
    fn drag_steps_are_incremental() {
        let mut drag = DragSession::begin(PointerEvent::at(10.0, 10.0));
        let a = drag.step(PointerEvent::at(13.0, 8.0));
        assert_eq!((a.dx, a.dy, a.pan), (3.0, -2.0, false));
        assert_eq!(a.travel(), 5.0);
        let b = drag.step(PointerEvent::at(13.0, 9.0).with_shift());
        assert_eq!((b.dx, b.dy, b.pan), (0.0, 1.0, true));
    }

    #[test]
    fn shift_at_pointer_down_pans_the_whole_drag() {
        let mut drag = DragSession::begin(PointerEvent::at(0.0, 0.0).with_shift());
        assert!(drag.step(PointerEvent::at(1.0, 0.0)).pan);
    }

    #[test]
    fn escape_is_recognized() {
        assert_eq!(Key::from_dom("Escape"), Key::Escape);
        assert_eq!(Key::from_dom("Enter"), Key::Other);
    }
}
