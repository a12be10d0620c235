//! Roads from an Overpass `out geom` JSON response.

use serde::Deserialize;

use crate::data::osm::{MapCoords, OsmId, TagMapping, Way};
use crate::errors::Result;

/// Highway classes that carry no traffic lanes worth editing.
pub const EXCLUDED_HIGHWAYS: [&str; 4] = ["footway", "path", "steps", "cycleway"];

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Deserialize)]
struct Element {
    #[serde(rename = "type")]
    element_type: String,
    id: OsmId,
    #[serde(default)]
    version: Option<u64>,
    #[serde(default)]
    tags: TagMapping,
    #[serde(default)]
    nodes: Vec<OsmId>,
    #[serde(default)]
    geometry: Vec<MapCoords>,
}

/// Lane-bearing roads of the response, in response order.
pub fn parse_roads(json: &str) -> Result<Vec<Way>> {
    let response: Response = serde_json::from_str(json)?;
    let roads = response.elements.into_iter()
        .filter(|element| element.element_type == "way" && element.geometry.len() >= 2)
        .filter(|element| {
            let highway = element.tags.get("highway").map(String::as_str).unwrap_or("");
            !EXCLUDED_HIGHWAYS.contains(&highway)
        })
        .map(|element| Way {
            id: element.id,
            version: element.version.unwrap_or(1),
            tags: element.tags,
            nodes: element.nodes,
            geometry: element.geometry,
        })
        .collect();
    Ok(roads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roads_filters_elements() {
        let json = r#"{
            "version": 0.6,
            "elements": [
                {"type": "way", "id": 1, "tags": {"highway": "primary", "lanes": "2"},
                 "geometry": [{"lat": 51.0, "lon": 0.0}, {"lat": 51.001, "lon": 0.0}]},
                {"type": "way", "id": 2, "tags": {"highway": "footway"},
                 "geometry": [{"lat": 51.0, "lon": 0.0}, {"lat": 51.001, "lon": 0.0}]},
                {"type": "way", "id": 3, "tags": {"highway": "residential"},
                 "geometry": [{"lat": 51.0, "lon": 0.0}]},
                {"type": "node", "id": 4, "lat": 51.0, "lon": 0.0}
            ]
        }"#;
        let roads = parse_roads(json).unwrap();
        assert_eq!(roads.len(), 1);
        assert_eq!(roads[0].id, 1);
        assert_eq!(roads[0].version, 1);
        assert_eq!(roads[0].tag("lanes"), Some("2"));
        assert_eq!(roads[0].geometry.len(), 2);
    }

    #[test]
    fn test_missing_elements_is_empty() {
        assert!(parse_roads("{}").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(parse_roads("not json").is_err());
    }
}
