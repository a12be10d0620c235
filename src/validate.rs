//! Checks on a candidate tag set before it is submitted.
//!
//! Schema legality belongs to the validation service; `LocalValidator` carries
//! the same rule set so a candidate can be checked without a round trip.

use serde::{Deserialize, Serialize};

use crate::{
    codec::{LANES, TURN_LANES},
    data::osm::TagMapping,
};

/// Every token the map schema accepts inside `turn:lanes`.
pub const SCHEMA_TURN_TOKENS: [&str; 11] = [
    "left",
    "through",
    "right",
    "reverse",
    "slight_left",
    "slight_right",
    "sharp_left",
    "sharp_right",
    "merge_to_left",
    "merge_to_right",
    "none",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub trait TagValidator {
    fn validate(&self, tags: &TagMapping) -> ValidationReport;
}

pub struct LocalValidator {
    max_lanes: i64,
}

impl LocalValidator {
    pub fn new(max_lanes: i64) -> Self {
        LocalValidator { max_lanes }
    }
}

impl Default for LocalValidator {
    fn default() -> Self {
        LocalValidator::new(12)
    }
}

impl TagValidator for LocalValidator {
    fn validate(&self, tags: &TagMapping) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let lanes_count = tags.get(LANES)
            .filter(|value| !value.is_empty())
            .map(|value| value.trim().parse::<i64>());

        match &lanes_count {
            Some(Ok(count)) if *count <= 0 => errors.push("Lane count must be a positive number".to_string()),
            Some(Ok(count)) if *count > self.max_lanes => {
                warnings.push(format!("Unusually large lane count (>{})", self.max_lanes))
            },
            Some(Err(_)) => errors.push("Lane count must be a number".to_string()),
            _ => (),
        }

        if let Some(turn_lanes) = tags.get(TURN_LANES).filter(|value| !value.is_empty()) {
            if let Some(Ok(count)) = lanes_count {
                let segments = turn_lanes.split('|').count();
                if i64::try_from(segments).map_or(true, |segments| segments != count) {
                    errors.push("Number of turn:lanes entries does not match the lane count".to_string());
                }
            }

            for turn in turn_lanes.split('|').flat_map(|segment| segment.split(';')) {
                if !turn.is_empty() && !SCHEMA_TURN_TOKENS.contains(&turn) {
                    warnings.push(format!("Unknown turn direction: {}", turn));
                }
            }
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}
