//! Conversion between a road's tags and its per-lane model.
//!
//! `decode` and `encode` are total: malformed tags degrade to defaults and any
//! `LaneSequence` can be encoded.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::data::{
    lanes::{LaneSequence, LaneType, TurnKind, TurnSet},
    osm::TagMapping,
};

pub const LANES: &str = "lanes";
pub const TURN_LANES: &str = "turn:lanes";
pub const LANES_BUS: &str = "lanes:bus";
pub const LANES_BICYCLE: &str = "lanes:bicycle";

/// Keys written by `encode`, in the order changes are reported.
pub const MANAGED_KEYS: [&str; 4] = [LANES, TURN_LANES, LANES_BUS, LANES_BICYCLE];

pub const DEFAULT_LANE_COUNT: usize = 2;

/// Upper bound on decoded lanes so a corrupt count cannot allocate without limit.
/// Far above any real road, so counts written by `encode` decode unchanged.
pub const MAX_LANE_COUNT: usize = u16::MAX as usize;

const LANE_SEPARATOR: char = '|';
const TURN_SEPARATOR: char = ';';

static LEADING_INTEGER: LazyLock<Regex> = LazyLock::new(|| {
    // ASCII only: other scripts' digits are not a count.
    Regex::new(r"^(?-u:\s)*(?<number>[+-]?[0-9]+)").expect("valid lane count pattern")
});

/// Reads a lane count leniently: leading digits count, trailing text is ignored.
pub fn parse_lane_count(value: &str) -> Option<i64> {
    let captures = LEADING_INTEGER.captures(value)?;
    let number = captures.name("number")?.as_str();
    match number.parse::<i64>() {
        Ok(count) => Some(count),
        // Too many digits to fit; it is certainly not a small count.
        Err(_) if number.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

fn lane_count(tags: &TagMapping) -> usize {
    match tags.get(LANES).and_then(|value| parse_lane_count(value)) {
        Some(count) if count < 1 => 1,
        Some(count) => usize::try_from(count).unwrap_or(MAX_LANE_COUNT).min(MAX_LANE_COUNT),
        None => DEFAULT_LANE_COUNT,
    }
}

fn decode_turn_segment(segment: &str) -> TurnSet {
    TurnSet::new(segment.split(TURN_SEPARATOR).filter_map(TurnKind::from_token))
}

/// Builds the lane model of a road from its tags.
///
/// Lane types always decode as `general`; `lanes:bus` and `lanes:bicycle` are
/// written by `encode` but not read back here.
pub fn decode(tags: &TagMapping) -> LaneSequence {
    let count = lane_count(tags);
    let segments: Vec<&str> = tags.get(TURN_LANES)
        .map(|value| value.split(LANE_SEPARATOR).collect())
        .unwrap_or_default();

    LaneSequence::new((0..count).map(|index| {
        let turns = segments.get(index)
            .map(|segment| decode_turn_segment(segment))
            .unwrap_or_else(TurnSet::through);
        (LaneType::General, turns)
    }))
}

fn per_lane_flag(lanes: &LaneSequence, lane_type: LaneType) -> Option<String> {
    if !lanes.iter().any(|lane| lane.lane_type == lane_type) {
        return None;
    }
    let flags: Vec<&str> = lanes.iter()
        .map(|lane| if lane.lane_type == lane_type { "yes" } else { "no" })
        .collect();
    Some(flags.join("|"))
}

/// Writes `lanes` over a copy of `base_tags`. Keys other than the managed ones
/// pass through untouched.
pub fn encode(lanes: &LaneSequence, base_tags: &TagMapping) -> TagMapping {
    let mut tags = base_tags.clone();

    tags.insert(LANES.to_string(), lanes.len().to_string());

    let turn_lanes: Vec<String> = lanes.iter()
        .map(|lane| lane.turns.to_tag_segment())
        .collect();
    tags.insert(TURN_LANES.to_string(), turn_lanes.join("|"));

    for (key, lane_type) in [(LANES_BUS, LaneType::Bus), (LANES_BICYCLE, LaneType::Bicycle)] {
        match per_lane_flag(lanes, lane_type) {
            Some(value) => {
                tags.insert(key.to_string(), value);
            },
            None => {
                tags.remove(key);
            },
        }
    }

    tags
}

/// One managed key whose value differs between two tag sets.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TagChange {
    pub key: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl fmt::Display for TagChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => write!(f, "{}: {} → {}", self.key, old, new),
            (None, Some(new)) => write!(f, "{}: (new) {}", self.key, new),
            (Some(old), None) => write!(f, "{}: {} → (removed)", self.key, old),
            (None, None) => write!(f, "{}: (unchanged)", self.key),
        }
    }
}

/// Changes to the managed keys only, in `MANAGED_KEYS` order.
pub fn diff(old_tags: &TagMapping, new_tags: &TagMapping) -> Vec<TagChange> {
    MANAGED_KEYS.iter()
        .filter_map(|key| {
            let old = old_tags.get(*key);
            let new = new_tags.get(*key);
            if old == new {
                None
            } else {
                Some(TagChange {
                    key: key.to_string(),
                    old: old.cloned(),
                    new: new.cloned(),
                })
            }
        })
        .collect()
}

/// Human readable form of `changes`, one line per key.
pub fn summarize(changes: &[TagChange]) -> String {
    if changes.is_empty() {
        return "No changes".to_string();
    }
    changes.iter()
        .map(TagChange::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replays `changes` on a tag set fetched later, so removals are kept as removals.
pub fn apply_changes(current_tags: &TagMapping, changes: &[TagChange]) -> TagMapping {
    let mut tags = current_tags.clone();
    for change in changes {
        match &change.new {
            Some(value) => {
                tags.insert(change.key.clone(), value.clone());
            },
            None => {
                tags.remove(&change.key);
            },
        }
    }
    tags
}
