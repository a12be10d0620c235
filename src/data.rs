use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use self::osm::{Node, OsmId, Way};

pub mod lanes;
pub mod osm;

/// Map data as read from an .osm document. Only nodes and ways are kept; ways carry
/// their resolved geometry.

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct OsmMapData {
    pub nodes: HashMap<OsmId, Node>,
    pub ways: HashMap<OsmId, Way>,
}

impl OsmMapData {
    /// Ways carrying a `highway` tag, ordered by id.
    pub fn highway_ways(&self) -> Vec<Way> {
        let mut ways: Vec<Way> = self.ways.values()
            .filter(|way| way.tags.contains_key("highway"))
            .cloned()
            .collect();
        ways.sort_by_key(|way| way.id);
        ways
    }
}
