//! Globe and minimap projections.
//!
//! The globe uses a unit sphere with +Y through the north pole. The prime
//! meridian faces +X, the antimeridian faces -X and 90° E faces -Z before any
//! scene rotation is applied.

use super::{Vec2, Vec3};

const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Maps `(lat, lng)` in degrees to a point on a sphere of `radius`.
///
/// Uses colatitude `phi = 90 - lat` and azimuth `theta = lng + 180`.
pub fn to_surface_point(lat: f64, lng: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - lat) * DEG2RAD;
    let theta = (lng + 180.0) * DEG2RAD;
    Vec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Forward equirectangular minimap projection into `[0, 1]^2`
/// (x grows eastward, y grows southward).
pub fn lat_lng_to_minimap(lat: f64, lng: f64) -> Vec2 {
    Vec2::new((lng + 180.0) / 360.0, (90.0 - lat) / 180.0)
}

/// Inverse of [`lat_lng_to_minimap`]: normalized minimap click to degrees.
pub fn minimap_to_lat_lng(x: f64, y: f64) -> LatLng {
    LatLng::new((0.5 - y) * 180.0, (x - 0.5) * 360.0)
}

#[cfg(test)]
mod tests {
    use super::{lat_lng_to_minimap, minimap_to_lat_lng, to_surface_point};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn surface_point_has_requested_norm() {
        for lat in [-88.0, -45.5, 0.0, 12.25, 88.0] {
            for lng in [-179.9, -90.0, 0.0, 33.3, 180.0] {
                for r in [1.0, 1.02, 2.8] {
                    let p = to_surface_point(lat, lng, r);
                    assert_close(p.length(), r, 1e-12);
                }
            }
        }
    }

    #[test]
    fn poles_and_meridians() {
        let north = to_surface_point(90.0, 0.0, 1.0);
        assert_close(north.y, 1.0, 1e-12);

        let prime = to_surface_point(0.0, 0.0, 1.0);
        assert_close(prime.x, 1.0, 1e-12);
        assert_close(prime.z, 0.0, 1e-12);

        let east = to_surface_point(0.0, 90.0, 2.0);
        assert_close(east.z, -2.0, 1e-12);
    }

    #[test]
    fn minimap_round_trip() {
        for x in [0.0, 0.1, 0.5, 0.77, 1.0] {
            for y in [0.0, 0.25, 0.5, 0.9, 1.0] {
                let ll = minimap_to_lat_lng(x, y);
                let p = lat_lng_to_minimap(ll.lat, ll.lng);
                assert_close(p.x, x, 1e-12);
                assert_close(p.y, y, 1e-12);
            }
        }
    }

    #[test]
    fn minimap_center_is_null_island() {
        let ll = minimap_to_lat_lng(0.5, 0.5);
        assert_eq!(ll.lat, 0.0);
        assert_eq!(ll.lng, 0.0);
        let top_left = minimap_to_lat_lng(0.0, 0.0);
        assert_eq!((top_left.lat, top_left.lng), (90.0, -180.0));
    }
}
