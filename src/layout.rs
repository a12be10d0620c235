//! Render plan of a road: one offset path and one icon placement per lane.
//! Drawing it is left to whoever consumes the plan.

use serde::{Deserialize, Serialize};

use crate::{
    config::UserConfig,
    data::{lanes::{LaneSequence, LaneType}, osm::{MapCoords, Way}},
    geometry::{self, Point},
    glyph::{self, Glyph},
};

/// Pixel projection of map coordinates relative to a top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub top_left_lon: f64,
    pub top_left_lat: f64,
    pub px_per_deg_lon: f64,
    pub px_per_deg_lat: f64,
}

impl Projection {
    pub fn project(&self, coords: &MapCoords) -> Point {
        let rel_lon = coords.lon - self.top_left_lon;
        let rel_lat = coords.lat - self.top_left_lat;
        Point {
            x: rel_lon * self.px_per_deg_lon,
            y: -rel_lat * self.px_per_deg_lat,
        }
    }

    pub fn project_all(&self, geometry: &[MapCoords]) -> Vec<Point> {
        geometry.iter().map(|coords| self.project(coords)).collect()
    }
}

impl From<&UserConfig> for Projection {
    fn from(value: &UserConfig) -> Self {
        Projection {
            top_left_lon: value.top_left_lon,
            top_left_lat: value.top_left_lat,
            px_per_deg_lon: value.px_per_deg_lon,
            px_per_deg_lat: value.px_per_deg_lat,
        }
    }
}

/// Stroke of the road axis, chosen from its `highway` class.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RoadStyle {
    pub color: String,
    pub weight: u32,
}

impl RoadStyle {
    pub fn for_highway(highway: Option<&str>) -> Self {
        let (color, weight) = match highway {
            Some("motorway") | Some("trunk") => ("#e74c3c", 5),
            Some("primary") => ("#f39c12", 4),
            Some("secondary") | Some("tertiary") => ("#f1c40f", 3),
            Some("residential") | Some("service") => ("#95a5a6", 2),
            _ => ("#3498db", 3),
        };
        RoadStyle {
            color: color.to_string(),
            weight,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LaneLayout {
    pub index: usize,
    pub lane_type: LaneType,
    pub offset: f64,
    pub path: String,
    pub glyph: Glyph,
    pub anchor: Point,
    pub heading: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RoadLayout {
    pub way_id: u64,
    pub axis_path: String,
    pub style: RoadStyle,
    pub lanes: Vec<LaneLayout>,
}

/// Sideways offset of lane `index` so that `count` lanes are centred on the axis.
pub fn lane_offset(index: usize, count: usize, lane_width: f64) -> f64 {
    (index as f64 - (count as f64 - 1.0) / 2.0) * lane_width
}

pub fn layout_road(way: &Way, axis: &[Point], lanes: &LaneSequence, lane_width: f64) -> RoadLayout {
    let (midpoint, heading) = geometry::midpoint_and_heading(axis);
    let count = lanes.len();

    let lane_layouts = lanes.iter()
        .map(|lane| {
            let offset = lane_offset(lane.index(), count, lane_width);
            LaneLayout {
                index: lane.index(),
                lane_type: lane.lane_type,
                offset,
                path: geometry::to_path_string(&geometry::offset(axis, offset)),
                glyph: glyph::select_glyph(lane, heading),
                anchor: Point::new(midpoint.x + offset, midpoint.y),
                heading,
            }
        })
        .collect();

    RoadLayout {
        way_id: way.id,
        axis_path: geometry::to_path_string(axis),
        style: RoadStyle::for_highway(way.tag("highway")),
        lanes: lane_layouts,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::data::{lanes::{TurnKind, TurnSet}, osm::TagMapping};

    use super::*;

    #[test]
    fn test_lane_offsets_are_centred() {
        assert_eq!(lane_offset(0, 1, 16.0), 0.0);
        assert_eq!(lane_offset(0, 2, 16.0), -8.0);
        assert_eq!(lane_offset(1, 2, 16.0), 8.0);
        assert_eq!(lane_offset(0, 3, 16.0), -16.0);
        assert_eq!(lane_offset(2, 3, 16.0), 16.0);
    }

    #[test]
    fn test_projection_flips_latitude() {
        let projection = Projection {
            top_left_lon: 10.0,
            top_left_lat: 50.0,
            px_per_deg_lon: 100.0,
            px_per_deg_lat: 200.0,
        };
        let point = projection.project(&MapCoords { lat: 49.5, lon: 10.25 });
        assert_relative_eq!(point.x, 25.0);
        assert_relative_eq!(point.y, 100.0);
    }

    #[test]
    fn test_road_style_by_highway() {
        assert_eq!(RoadStyle::for_highway(Some("trunk")).weight, 5);
        assert_eq!(RoadStyle::for_highway(Some("service")).color, "#95a5a6");
        assert_eq!(RoadStyle::for_highway(None), RoadStyle { color: "#3498db".to_string(), weight: 3 });
    }

    #[test]
    fn test_layout_two_lane_road() {
        let mut tags = TagMapping::new();
        tags.insert("highway".to_string(), "primary".to_string());
        let way = Way::new(42, tags);
        let axis = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let lanes = LaneSequence::new([
            (LaneType::General, TurnSet::new([TurnKind::Left])),
            (LaneType::Bus, TurnSet::through()),
        ]);

        let layout = layout_road(&way, &axis, &lanes, 16.0);
        assert_eq!(layout.way_id, 42);
        assert_eq!(layout.axis_path, "M 0 0 L 100 0");
        assert_eq!(layout.style.color, "#f39c12");
        assert_eq!(layout.lanes.len(), 2);

        let first = &layout.lanes[0];
        assert_eq!(first.path, "M 0 -8 L 100 -8");
        assert_eq!(first.glyph, Glyph::Left);
        assert_eq!(first.anchor, Point::new(42.0, 0.0));
        assert_eq!(first.heading, 0.0);

        let second = &layout.lanes[1];
        assert_eq!(second.path, "M 0 8 L 100 8");
        assert_eq!(second.glyph, Glyph::Bus);
        assert_eq!(second.anchor, Point::new(58.0, 0.0));
    }
}
