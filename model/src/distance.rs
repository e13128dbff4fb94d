/// Mean Earth radius used for every distance in this crate
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two points given in degrees, using the haversine
/// formula. Identical points are exactly 0, and the result doesn't depend on argument order.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // Put the points in a fixed order, so floating point error can't make A->B differ from B->A
    let ((lat1, lon1), (lat2, lon2)) = if (lat1, lon1) <= (lat2, lon2) {
        ((lat1, lon1), (lat2, lon2))
    } else {
        ((lat2, lon2), (lat1, lon1))
    };

    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push this a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_km(55.225, 14.245, 55.225, 14.245), 0.0);
        assert_eq!(distance_km(-90.0, 180.0, -90.0, 180.0), 0.0);
        assert_eq!(distance_km(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let points = [
            (55.225, 14.245),
            (55.3, 14.1),
            (-33.86, 151.2),
            (0.0, -180.0),
            (89.99, 0.5),
            (12.345678, -98.7654321),
        ];
        for (lat1, lon1) in points {
            for (lat2, lon2) in points {
                assert_eq!(
                    distance_km(lat1, lon1, lat2, lon2),
                    distance_km(lat2, lon2, lat1, lon1)
                );
            }
        }
    }

    #[test]
    fn test_known_values() {
        // One degree of latitude
        assert!(approx_eq(distance_km(0.0, 0.0, 1.0, 0.0), 111.195, 0.001));
        // Copenhagen to Bornholm (Rønne), roughly 150km
        let d = distance_km(55.6761, 12.5683, 55.1009, 14.7066);
        assert!(approx_eq(d, 150.0, 10.0), "{d}");
    }

    #[test]
    fn test_antipodal() {
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        let d = distance_km(0.0, 0.0, 0.0, 180.0);
        assert!(!d.is_nan());
        assert!(approx_eq(d, half_circumference, 1e-6));
        let d = distance_km(90.0, 0.0, -90.0, 0.0);
        assert!(approx_eq(d, half_circumference, 1e-6));
        let d = distance_km(37.5, -122.25, -37.5, 57.75);
        assert!(!d.is_nan());
        assert!(approx_eq(d, half_circumference, 1e-3));
    }
}
