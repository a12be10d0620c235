use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::lanes::{Lane, LaneType, TurnKind};

/// Icon drawn on a lane. The heading only rotates it, it never changes which one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Glyph {
    Bus,
    Bike,
    Parking,
    Uturn,
    ThroughRight,
    ThroughLeft,
    Left,
    Right,
    Through,
}

impl Glyph {
    pub fn id(&self) -> &'static str {
        match self {
            Glyph::Bus => "bus",
            Glyph::Bike => "bike",
            Glyph::Parking => "parking",
            Glyph::Uturn => "uturn",
            Glyph::ThroughRight => "through-right",
            Glyph::ThroughLeft => "through-left",
            Glyph::Left => "left",
            Glyph::Right => "right",
            Glyph::Through => "through",
        }
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// First match wins: dedicated lane types, then turns from most to least specific.
/// Taxi lanes have no icon of their own and fall through to their turns.
pub fn select_glyph(lane: &Lane, _heading: f64) -> Glyph {
    let has = |turn| lane.turns.contains(turn);
    match lane.lane_type {
        LaneType::Bus => Glyph::Bus,
        LaneType::Bicycle => Glyph::Bike,
        LaneType::Parking => Glyph::Parking,
        LaneType::General | LaneType::Taxi => {
            if has(TurnKind::Uturn) {
                Glyph::Uturn
            } else if has(TurnKind::Through) && has(TurnKind::Right) {
                Glyph::ThroughRight
            } else if has(TurnKind::Through) && has(TurnKind::Left) {
                Glyph::ThroughLeft
            } else if has(TurnKind::Left) {
                Glyph::Left
            } else if has(TurnKind::Right) {
                Glyph::Right
            } else {
                Glyph::Through
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::data::lanes::{LaneSequence, TurnSet};

    use super::*;

    fn glyph_of(lane_type: LaneType, turns: &[TurnKind]) -> Glyph {
        let lanes = LaneSequence::new([(lane_type, TurnSet::new(turns.iter().copied()))]);
        let lane = lanes.get(0).unwrap();
        select_glyph(lane, 1.25)
    }

    #[test]
    fn test_lane_type_wins_over_turns() {
        assert_eq!(glyph_of(LaneType::Bus, &[TurnKind::Through]), Glyph::Bus);
        assert_eq!(glyph_of(LaneType::Bus, &[TurnKind::Uturn, TurnKind::Left]), Glyph::Bus);
        assert_eq!(glyph_of(LaneType::Bicycle, &[TurnKind::Right]), Glyph::Bike);
        assert_eq!(glyph_of(LaneType::Parking, &[TurnKind::Uturn]), Glyph::Parking);
    }

    #[test]
    fn test_turn_priority() {
        assert_eq!(glyph_of(LaneType::General, &[TurnKind::Left, TurnKind::Uturn]), Glyph::Uturn);
        assert_eq!(glyph_of(LaneType::General, &[TurnKind::Through, TurnKind::Right]), Glyph::ThroughRight);
        assert_eq!(
            glyph_of(LaneType::General, &[TurnKind::Left, TurnKind::Through, TurnKind::Right]),
            Glyph::ThroughRight
        );
        assert_eq!(glyph_of(LaneType::General, &[TurnKind::Left, TurnKind::Through]), Glyph::ThroughLeft);
        assert_eq!(glyph_of(LaneType::General, &[TurnKind::Left, TurnKind::Right]), Glyph::Left);
        assert_eq!(glyph_of(LaneType::General, &[TurnKind::Right]), Glyph::Right);
        assert_eq!(glyph_of(LaneType::General, &[TurnKind::Through]), Glyph::Through);
    }

    #[test]
    fn test_taxi_uses_turns() {
        assert_eq!(glyph_of(LaneType::Taxi, &[TurnKind::Left]), Glyph::Left);
        assert_eq!(glyph_of(LaneType::Taxi, &[TurnKind::Through]), Glyph::Through);
    }

    #[test]
    fn test_heading_does_not_matter() {
        let lanes = LaneSequence::new([(LaneType::General, TurnSet::new([TurnKind::Right]))]);
        let lane = lanes.get(0).unwrap();
        assert_eq!(select_glyph(lane, 0.0), select_glyph(lane, -3.0));
    }

    #[test]
    fn test_glyph_ids() {
        assert_eq!(Glyph::ThroughRight.id(), "through-right");
        assert_eq!(serde_json::to_string(&Glyph::ThroughLeft).unwrap(), "\"through-left\"");
        assert_eq!(Glyph::Bike.to_string(), "bike");
    }
}
