//! City coordinate catalog and great-circle distance.

use std::collections::HashMap;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Fixed mapping from city name to (latitude, longitude).
///
/// Cities outside the catalog degrade to (0, 0), which makes distances
/// computed from them meaningless. Known limitation, not defended against.
#[derive(Debug, Clone)]
pub struct CityCatalog {
    coords: HashMap<String, (f64, f64)>,
    names: Vec<String>,
}

impl CityCatalog {
    /// Catalog of major Indian cities covered by the marketplace.
    pub fn indian_cities() -> Self {
        let entries: [(&str, f64, f64); 25] = [
            ("Mumbai", 19.0760, 72.8777),
            ("Delhi", 28.7041, 77.1025),
            ("Bangalore", 12.9716, 77.5946),
            ("Hyderabad", 17.3850, 78.4867),
            ("Ahmedabad", 23.0225, 72.5714),
            ("Chennai", 13.0827, 80.2707),
            ("Kolkata", 22.5726, 88.3639),
            ("Pune", 18.5204, 73.8567),
            ("Jaipur", 26.9124, 75.7873),
            ("Surat", 21.1702, 72.8311),
            ("Lucknow", 26.8467, 80.9462),
            ("Kanpur", 26.4499, 80.3319),
            ("Nagpur", 21.1458, 79.0882),
            ("Indore", 22.7196, 75.8577),
            ("Thane", 19.2183, 72.9781),
            ("Bhopal", 23.2599, 77.4126),
            ("Visakhapatnam", 17.6868, 83.2185),
            ("Patna", 25.5941, 85.1376),
            ("Vadodara", 22.3072, 73.1812),
            ("Ghaziabad", 28.6692, 77.4538),
            ("Ludhiana", 30.9010, 75.8573),
            ("Agra", 27.1767, 78.0081),
            ("Nashik", 19.9975, 73.7898),
            ("Faridabad", 28.4089, 77.3178),
            ("Meerut", 28.6139, 77.2090),
        ];

        let names = entries.iter().map(|(name, _, _)| name.to_string()).collect();
        let coords = entries
            .iter()
            .map(|&(name, lat, lon)| (name.to_string(), (lat, lon)))
            .collect();
        Self { coords, names }
    }

    /// Coordinates for a city, or (0, 0) when the city is not in the catalog.
    pub fn coords(&self, city: &str) -> (f64, f64) {
        self.coords.get(city).copied().unwrap_or((0.0, 0.0))
    }

    /// City names in catalog insertion order (stable across runs).
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Great-circle distance between two (latitude, longitude) pairs in km.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
