//! TopoJSON boundary decoding.
//!
//! Arcs are shared between neighbouring boroughs and stored once. When a
//! `transform` is present the arc positions are quantized and
//! delta-encoded: each position is an offset from the previous one.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::model::geo::{GeoFeature, LonLat, Polygon, Ring};
use crate::model::housing::is_london_borough;

#[derive(Debug, Error)]
pub enum TopologyParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("topology has no objects")]
    NoObjects,
    #[error("object `{0}` not found")]
    MissingObject(String),
    #[error("arc index {0} out of range")]
    ArcIndex(i64),
}

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    objects: BTreeMap<String, Object>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Object {
    GeometryCollection { geometries: Vec<Geometry> },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(flatten)]
    shape: Shape,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Shape {
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(rename = "NAME", default)]
    name: Option<String>,
}

/// Decode the borough boundaries from a TopoJSON document.
///
/// Reads `object` when given, otherwise the first object by key. Only
/// features whose trimmed `NAME` is a London borough are returned.
pub fn parse_boroughs(data: &[u8], object: Option<&str>) -> Result<Vec<GeoFeature>, TopologyParseError> {
    let topo: Topology = serde_json::from_slice(data)?;
    let arcs = decode_arcs(&topo.arcs, topo.transform);

    let collection = match object {
        Some(name) => topo
            .objects
            .get(name)
            .ok_or_else(|| TopologyParseError::MissingObject(name.to_string()))?,
        None => topo
            .objects
            .values()
            .next()
            .ok_or(TopologyParseError::NoObjects)?,
    };
    let Object::GeometryCollection { geometries } = collection else {
        return Ok(Vec::new());
    };

    let mut features = Vec::new();
    for geometry in geometries {
        let Some(name) = geometry
            .properties
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .map(str::trim)
        else {
            continue;
        };
        if !is_london_borough(name) {
            continue;
        }
        let polygons = match &geometry.shape {
            Shape::Polygon { arcs: rings } => vec![polygon(&arcs, rings)?],
            Shape::MultiPolygon { arcs: polys } => polys
                .iter()
                .map(|rings| polygon(&arcs, rings))
                .collect::<Result<Vec<_>, _>>()?,
            Shape::Unsupported => continue,
        };
        features.push(GeoFeature {
            name: name.to_string(),
            polygons,
        });
    }
    Ok(features)
}

/// Absolute positions for every arc.
fn decode_arcs(arcs: &[Vec<Vec<f64>>], transform: Option<Transform>) -> Vec<Vec<LonLat>> {
    arcs.iter()
        .map(|arc| {
            let (mut x, mut y) = (0.0, 0.0);
            arc.iter()
                .filter(|p| p.len() >= 2)
                .map(|p| match transform {
                    Some(t) => {
                        x += p[0];
                        y += p[1];
                        [x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                    }
                    None => [p[0], p[1]],
                })
                .collect()
        })
        .collect()
}

fn polygon(arcs: &[Vec<LonLat>], rings: &[Vec<i64>]) -> Result<Polygon, TopologyParseError> {
    rings.iter().map(|ring| stitch(arcs, ring)).collect()
}

/// Join arcs into one ring. A negative index `i` means arc `!i` reversed;
/// each arc after the first drops its first point, which repeats the
/// previous arc's last.
fn stitch(arcs: &[Vec<LonLat>], indices: &[i64]) -> Result<Ring, TopologyParseError> {
    let mut ring: Ring = Vec::new();
    for &index in indices {
        let (arc_index, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };
        let arc = usize::try_from(arc_index)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or(TopologyParseError::ArcIndex(index))?;

        let mut points: Vec<LonLat> = arc.clone();
        if reversed {
            points.reverse();
        }
        let skip = usize::from(!ring.is_empty());
        ring.extend(points.into_iter().skip(skip));
    }
    Ok(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two unit squares sharing the edge x=1, quantized with scale 0.5.
    const TOPO: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [0.5, 0.5], "translate": [-1.0, 51.0]},
        "objects": {
            "boroughs": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "arcs": [[0, 1]], "properties": {"NAME": "Camden "}},
                    {"type": "MultiPolygon", "arcs": [[[-1, 2]]], "properties": {"NAME": "Islington"}},
                    {"type": "Polygon", "arcs": [[2]], "properties": {"NAME": "Hertfordshire"}},
                    {"type": "Point", "coordinates": [0, 0], "properties": {"NAME": "Barnet"}}
                ]
            }
        },
        "arcs": [
            [[2, 0], [0, 2]],
            [[2, 2], [-2, 0], [0, -2], [2, 0]],
            [[2, 0], [2, 0], [0, 2], [-2, 0]]
        ]
    }"#;

    #[test]
    fn decodes_and_filters() {
        let features = parse_boroughs(TOPO.as_bytes(), None).unwrap();
        let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Camden", "Islington"]);

        let camden = &features[0].polygons[0][0];
        assert_eq!(
            camden,
            &vec![
                [0.0, 51.0],
                [0.0, 52.0],
                [-1.0, 52.0],
                [-1.0, 51.0],
                [0.0, 51.0],
            ]
        );

        let islington = &features[1].polygons[0][0];
        assert_eq!(islington.first(), Some(&[0.0, 52.0]));
        assert_eq!(islington.len(), 5);
        assert_eq!(features[1].point_count(), 5);
    }

    #[test]
    fn untransformed_arcs_are_absolute() {
        let topo = r#"{"objects": {"a": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "arcs": [[0]], "properties": {"NAME": "Camden"}}]}},
            "arcs": [[[-0.1, 51.5], [-0.2, 51.5], [-0.1, 51.5]]]}"#;
        let features = parse_boroughs(topo.as_bytes(), None).unwrap();
        assert_eq!(features[0].polygons[0][0][1], [-0.2, 51.5]);
    }

    #[test]
    fn errors() {
        let bad_arc = r#"{"objects": {"a": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "arcs": [[-4]], "properties": {"NAME": "Camden"}}]}}, "arcs": []}"#;
        assert!(matches!(
            parse_boroughs(bad_arc.as_bytes(), None),
            Err(TopologyParseError::ArcIndex(-4))
        ));
        assert!(matches!(
            parse_boroughs(br#"{"objects": {}}"#, None),
            Err(TopologyParseError::NoObjects)
        ));
        assert!(matches!(
            parse_boroughs(TOPO.as_bytes(), Some("wards")),
            Err(TopologyParseError::MissingObject(_))
        ));
    }
}
