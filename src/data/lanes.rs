use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// A movement permitted from a lane, as spelled in `turn:lanes`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Left,
    Through,
    Right,
    Uturn,
}

impl TurnKind {
    pub const ALL: [TurnKind; 4] = [TurnKind::Left, TurnKind::Through, TurnKind::Right, TurnKind::Uturn];

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnKind::Left => "left",
            TurnKind::Through => "through",
            TurnKind::Right => "right",
            TurnKind::Uturn => "uturn",
        }
    }

    /// Recognizes a single `turn:lanes` token. Anything else is not a turn we model.
    pub fn from_token(token: &str) -> Option<TurnKind> {
        match token {
            "left" => Some(TurnKind::Left),
            "through" => Some(TurnKind::Through),
            "right" => Some(TurnKind::Right),
            "uturn" => Some(TurnKind::Uturn),
            _ => None,
        }
    }
}

impl fmt::Display for TurnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LaneType {
    #[default]
    General,
    Bus,
    Bicycle,
    Taxi,
    Parking,
}

impl LaneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneType::General => "general",
            LaneType::Bus => "bus",
            LaneType::Bicycle => "bicycle",
            LaneType::Taxi => "taxi",
            LaneType::Parking => "parking",
        }
    }
}

impl fmt::Display for LaneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-empty, duplicate-free turns of one lane, in the order they were added.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct TurnSet(Vec<TurnKind>);

impl TurnSet {
    /// Builds a set keeping first occurrences. No turns at all means `{through}`.
    pub fn new<I: IntoIterator<Item = TurnKind>>(turns: I) -> Self {
        let mut ordered: Vec<TurnKind> = Vec::new();
        for turn in turns {
            if !ordered.contains(&turn) {
                ordered.push(turn);
            }
        }
        if ordered.is_empty() {
            ordered.push(TurnKind::Through);
        }
        TurnSet(ordered)
    }

    pub fn through() -> Self {
        TurnSet(vec![TurnKind::Through])
    }

    pub fn contains(&self, turn: TurnKind) -> bool {
        self.0.contains(&turn)
    }

    pub fn iter(&self) -> impl Iterator<Item = TurnKind> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Adds `turn` at the end, or removes it when present. Removing the last
    /// remaining turn leaves `{through}`.
    pub fn toggle(&mut self, turn: TurnKind) {
        if let Some(pos) = self.0.iter().position(|t| *t == turn) {
            self.0.remove(pos);
            if self.0.is_empty() {
                self.0.push(TurnKind::Through);
            }
        } else {
            self.0.push(turn);
        }
    }

    /// `;`-joined in stored order, as used inside one `turn:lanes` segment.
    pub fn to_tag_segment(&self) -> String {
        self.0.iter()
            .map(TurnKind::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl<'de> Deserialize<'de> for TurnSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where D: serde::Deserializer<'de> {
        let turns = Vec::<TurnKind>::deserialize(deserializer)?;
        Ok(TurnSet::new(turns))
    }
}

impl Default for TurnSet {
    fn default() -> Self {
        TurnSet::through()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Lane {
    index: usize,
    #[serde(rename = "type")]
    pub lane_type: LaneType,
    pub turns: TurnSet,
}

impl Lane {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Lanes of one road, left to right. There is always at least one lane and each
/// lane's index equals its position.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct LaneSequence {
    lanes: Vec<Lane>,
}

impl LaneSequence {
    /// Builds a sequence from `(type, turns)` pairs. An empty input yields one general lane.
    pub fn new<I: IntoIterator<Item = (LaneType, TurnSet)>>(lanes: I) -> Self {
        let mut lanes: Vec<Lane> = lanes.into_iter()
            .enumerate()
            .map(|(index, (lane_type, turns))| Lane { index, lane_type, turns })
            .collect();
        if lanes.is_empty() {
            lanes.push(Lane { index: 0, lane_type: LaneType::General, turns: TurnSet::through() });
        }
        LaneSequence { lanes }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    fn lane_mut(&mut self, index: usize) -> Result<&mut Lane> {
        let len = self.lanes.len();
        self.lanes.get_mut(index)
            .ok_or_else(|| format!("Lane {} out of range, road has {} lanes", index, len).into())
    }

    /// Appends a general lane going through.
    pub fn add_lane(&mut self) {
        let index = self.lanes.len();
        self.lanes.push(Lane { index, lane_type: LaneType::General, turns: TurnSet::through() });
    }

    /// Drops the rightmost lane. Returns false when only one lane is left.
    pub fn remove_lane(&mut self) -> bool {
        if self.lanes.len() <= 1 {
            return false;
        }
        self.lanes.pop();
        true
    }

    pub fn set_type(&mut self, index: usize, lane_type: LaneType) -> Result<()> {
        self.lane_mut(index)?.lane_type = lane_type;
        Ok(())
    }

    pub fn set_turns(&mut self, index: usize, turns: TurnSet) -> Result<()> {
        self.lane_mut(index)?.turns = turns;
        Ok(())
    }

    pub fn toggle_turn(&mut self, index: usize, turn: TurnKind) -> Result<()> {
        self.lane_mut(index)?.turns.toggle(turn);
        Ok(())
    }
}
