//! Geographic point type shared by gallery items and posts, plus the
//! great-circle distance used by the proximity feed.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// GeoJSON-style point. Coordinates are `[longitude, latitude]`, in that
/// order.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

fn point_type() -> String {
    "Point".to_string()
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self {
            kind: point_type(),
            coordinates: [0.0, 0.0],
        }
    }
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            kind: point_type(),
            coordinates: [lng, lat],
        }
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }
}

/// Haversine distance between two points, in meters.
pub fn distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat_a = a.lat().to_radians();
    let lat_b = b.lat().to_radians();
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lng = (b.lng() - a.lng()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint::new(13.4, 52.52);
        assert_eq!(distance_m(&p, &p), 0.0);
    }

    #[test]
    fn berlin_to_paris_is_about_878_km() {
        let berlin = GeoPoint::new(13.405, 52.52);
        let paris = GeoPoint::new(2.3522, 48.8566);
        let d = distance_m(&berlin, &paris);
        assert!((d - 878_000.0).abs() < 10_000.0, "got {d}");
    }

    #[test]
    fn one_degree_longitude_at_equator() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = distance_m(&a, &b);
        // one degree of longitude at the equator is ~111.2 km
        assert!((d - 111_195.0).abs() < 200.0, "got {d}");
    }

    #[test]
    fn serializes_with_geojson_type_tag() {
        let p = GeoPoint::new(10.0, 20.0);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 10.0);
        assert_eq!(json["coordinates"][1], 20.0);
    }

    #[test]
    fn deserializes_without_type_tag() {
        let p: GeoPoint = serde_json::from_str(r#"{"coordinates":[10.0,20.0]}"#).unwrap();
        assert_eq!(p.kind, "Point");
        assert_eq!(p.lat(), 20.0);
    }
}
