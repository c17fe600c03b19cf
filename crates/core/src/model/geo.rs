use serde::{Deserialize, Serialize};

/// A longitude/latitude pair in degrees.
pub type LonLat = [f64; 2];

/// Closed ring; the first ring of a polygon is its outer boundary.
pub type Ring = Vec<LonLat>;

pub type Polygon = Vec<Ring>;

/// A named boundary decoded from the topology file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    /// Trimmed `properties.NAME`.
    pub name: String,
    pub polygons: Vec<Polygon>,
}

impl GeoFeature {
    pub fn point_count(&self) -> usize {
        self.polygons
            .iter()
            .flat_map(|p| p.iter())
            .map(Vec::len)
            .sum()
    }
}
