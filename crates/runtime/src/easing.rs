use serde::{Deserialize, Serialize};

/// Easing curves for property animations.
///
/// `PowerN` curves use exponent `N + 1`: `Power1` is quadratic, `Power2`
/// cubic and `Power3` quartic.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    #[default]
    Power1Out,
    Power2Out,
    Power2InOut,
    Power3Out,
    Power3InOut,
}

impl Ease {
    /// Maps linear progress `t` to eased progress. Input is clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Ease::Linear => t,
            Ease::Power1Out => ease_out(t, 2),
            Ease::Power2Out => ease_out(t, 3),
            Ease::Power2InOut => ease_in_out(t, 3),
            Ease::Power3Out => ease_out(t, 4),
            Ease::Power3InOut => ease_in_out(t, 4),
        }
    }
}

fn ease_out(t: f64, power: i32) -> f64 {
    1.0 - (1.0 - t).powi(power)
}

fn ease_in_out(t: f64, power: i32) -> f64 {
    if t < 0.5 {
        (2.0 * t).powi(power) * 0.5
    } else {
        1.0 - (2.0 * (1.0 - t)).powi(power) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::Ease;

    const ALL: [Ease; 6] = [
        Ease::Linear,
        Ease::Power1Out,
        Ease::Power2Out,
        Ease::Power2InOut,
        Ease::Power3Out,
        Ease::Power3InOut,
    ];

    #[test]
    fn curves_pin_endpoints() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
            assert_eq!(ease.apply(1.0), 1.0, "{ease:?}");
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for ease in ALL {
            let mut prev = 0.0;
            for i in 1..=100 {
                let v = ease.apply(i as f64 / 100.0);
                assert!(v >= prev, "{ease:?} decreased at step {i}");
                prev = v;
            }
        }
    }

    #[test]
    fn in_out_is_symmetric_about_midpoint() {
        assert!((Ease::Power3InOut.apply(0.5) - 0.5).abs() < 1e-12);
        let a = Ease::Power2InOut.apply(0.2);
        let b = Ease::Power2InOut.apply(0.8);
        assert!((a + b - 1.0).abs() < 1e-12);
    }

    #[test]
    fn out_curves_lead_linear() {
        assert!(Ease::Power2Out.apply(0.3) > 0.3);
        assert!(Ease::Power3Out.apply(0.3) > Ease::Power2Out.apply(0.3));
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(Ease::Power2Out.apply(-3.0), 0.0);
        assert_eq!(Ease::Power2Out.apply(7.0), 1.0);
        assert_eq!(Ease::Linear.apply(f64::NAN), 0.0);
    }

    #[test]
    fn parses_snake_case_names() {
        let e: Ease = serde_json::from_str("\"power3_in_out\"").unwrap();
        assert_eq!(e, Ease::Power3InOut);
    }
}
