//! Great-circle distance math used by filtering and route building.

use crate::models::{BaseLocation, Waypoint, Zone};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Anything with a WGS-84 position.
pub trait GeoPoint {
    fn lat(&self) -> f64;
    fn lng(&self) -> f64;
}

impl GeoPoint for BaseLocation {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lng(&self) -> f64 {
        self.lng
    }
}

impl GeoPoint for Zone {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lng(&self) -> f64 {
        self.lng
    }
}

impl GeoPoint for Waypoint {
    fn lat(&self) -> f64 {
        Waypoint::lat(self)
    }
    fn lng(&self) -> f64 {
        Waypoint::lng(self)
    }
}

/// `[lat, lng]` pairs, the shape used for road geometry.
impl GeoPoint for [f64; 2] {
    fn lat(&self) -> f64 {
        self[0]
    }
    fn lng(&self) -> f64 {
        self[1]
    }
}

impl<T: GeoPoint + ?Sized> GeoPoint for &T {
    fn lat(&self) -> f64 {
        (**self).lat()
    }
    fn lng(&self) -> f64 {
        (**self).lng()
    }
}

/// Calculate distance between two points in kilometres (Haversine formula).
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance between two positions in kilometres.
pub fn haversine_km<A: GeoPoint + ?Sized, B: GeoPoint + ?Sized>(a: &A, b: &B) -> f64 {
    haversine_distance(a.lat(), a.lng(), b.lat(), b.lng())
}

/// Sum of consecutive leg distances.
pub fn path_length_km<P: GeoPoint>(points: &[P]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(&pair[0], &pair[1]))
        .sum()
}

/// Latitude in [-90, 90], longitude in [-180, 180], both finite.
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}
