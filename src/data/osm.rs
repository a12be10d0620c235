use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type OsmId = u64;

/// Attributes of a single map element. Ordered so every serialized form is stable.
pub type TagMapping = BTreeMap<String, String>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MapCoords {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    pub id: OsmId,
    pub lat: f64,
    pub lon: f64,
}

impl From<&Node> for MapCoords {
    fn from(value: &Node) -> Self {
        MapCoords {
            lat: value.lat,
            lon: value.lon,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Way {
    pub id: OsmId,
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default)]
    pub tags: TagMapping,
    #[serde(default)]
    pub nodes: Vec<OsmId>,
    #[serde(default)]
    pub geometry: Vec<MapCoords>,
}

fn default_version() -> u64 {
    1
}

impl Way {
    pub fn new(id: OsmId, tags: TagMapping) -> Self {
        Way {
            id,
            version: default_version(),
            tags,
            nodes: Vec::new(),
            geometry: Vec::new(),
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}
