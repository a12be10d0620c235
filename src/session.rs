//! Editing state of one road, from decoding its tags to submitting the result.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    codec::{self, TagChange},
    data::{
        lanes::{LaneSequence, LaneType, TurnKind, TurnSet},
        osm::{OsmId, TagMapping, Way},
    },
    errors::Result,
};

/// Changed tags of one way inside a changeset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WayChange {
    pub way_id: OsmId,
    pub old_tags: TagMapping,
    pub new_tags: TagMapping,
}

impl WayChange {
    pub fn changes(&self) -> Vec<TagChange> {
        codec::diff(&self.old_tags, &self.new_tags)
    }
}

/// Payload handed to the changeset submission service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChangesetRequest {
    pub comment: String,
    pub changes: Vec<WayChange>,
}

/// A single user action on the lanes of a road.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LaneOp {
    AddLane,
    RemoveLane,
    SetType {
        lane: usize,
        #[serde(rename = "type")]
        lane_type: LaneType,
    },
    SetTurns {
        lane: usize,
        turns: TurnSet,
    },
    ToggleTurn {
        lane: usize,
        turn: TurnKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Submission {
    Idle,
    InFlight,
}

/// One road being edited. Owns the way and its lanes; nothing else holds them.
#[derive(Debug, Clone)]
pub struct EditSession {
    way: Way,
    lanes: LaneSequence,
    submission: Submission,
}

impl EditSession {
    pub fn open(way: Way) -> Self {
        let lanes = codec::decode(&way.tags);
        info!(way_id = way.id, lanes = lanes.len(); "Opened edit session");
        EditSession {
            way,
            lanes,
            submission: Submission::Idle,
        }
    }

    pub fn way(&self) -> &Way {
        &self.way
    }

    pub fn lanes(&self) -> &LaneSequence {
        &self.lanes
    }

    pub fn add_lane(&mut self) {
        self.lanes.add_lane();
    }

    pub fn remove_lane(&mut self) -> bool {
        self.lanes.remove_lane()
    }

    pub fn set_type(&mut self, index: usize, lane_type: LaneType) -> Result<()> {
        self.lanes.set_type(index, lane_type)
    }

    pub fn set_turns(&mut self, index: usize, turns: TurnSet) -> Result<()> {
        self.lanes.set_turns(index, turns)
    }

    pub fn toggle_turn(&mut self, index: usize, turn: TurnKind) -> Result<()> {
        self.lanes.toggle_turn(index, turn)
    }

    pub fn apply(&mut self, op: &LaneOp) -> Result<()> {
        match op {
            LaneOp::AddLane => self.add_lane(),
            LaneOp::RemoveLane => {
                if !self.remove_lane() {
                    warn!(way_id = self.way.id; "Kept the last remaining lane");
                }
            },
            LaneOp::SetType { lane, lane_type } => self.set_type(*lane, *lane_type)?,
            LaneOp::SetTurns { lane, turns } => self.set_turns(*lane, turns.clone())?,
            LaneOp::ToggleTurn { lane, turn } => self.toggle_turn(*lane, *turn)?,
        }
        Ok(())
    }

    /// The way's tags with the current lanes written over them.
    pub fn proposed_tags(&self) -> TagMapping {
        codec::encode(&self.lanes, &self.way.tags)
    }

    pub fn changes(&self) -> Vec<TagChange> {
        codec::diff(&self.way.tags, &self.proposed_tags())
    }

    pub fn has_changes(&self) -> bool {
        !self.changes().is_empty()
    }

    pub fn change_summary(&self) -> String {
        codec::summarize(&self.changes())
    }

    pub fn way_change(&self) -> WayChange {
        WayChange {
            way_id: self.way.id,
            old_tags: self.way.tags.clone(),
            new_tags: self.proposed_tags(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submission == Submission::InFlight
    }

    /// Starts a submission of the current edit. Only one may be in flight per road.
    pub fn begin_submission(&mut self, comment: &str) -> Result<ChangesetRequest> {
        if self.is_submitting() {
            return Err(format!("Way {} already has a submission in flight", self.way.id).into());
        }
        if !self.has_changes() {
            return Err(format!("Way {} has no changes to submit", self.way.id).into());
        }
        self.submission = Submission::InFlight;
        info!(way_id = self.way.id, comment = comment; "Submitting lane changes");
        Ok(ChangesetRequest {
            comment: comment.to_string(),
            changes: vec![self.way_change()],
        })
    }

    /// Ends the in-flight submission. When it was accepted the submitted tags
    /// become the new base, so the session reports no changes afterwards.
    pub fn finish_submission(&mut self, accepted: bool) {
        if !self.is_submitting() {
            warn!(way_id = self.way.id; "Finished a submission that was never started");
            return;
        }
        if accepted {
            self.way.tags = self.proposed_tags();
        }
        self.submission = Submission::Idle;
    }
}
