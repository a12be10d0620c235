use std::{collections::HashMap, fs, path::{Path, PathBuf}};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::osm::{OsmId, Way},
    errors::Result,
    osm_xml,
    session::{ChangesetRequest, EditSession, LaneOp},
    validate::{LocalValidator, TagValidator},
    UserConfig,
};

use super::{parse_osm::ParseOsmEtl, read_json, remove_if_exists, write_json, Etl};

pub const ETL_NAME: &str = "apply_edits";
pub const CHANGESET_FILE_NAME: &str = "changeset.json";
pub const CHANGESET_CREATE_FILE_NAME: &str = "changeset_create.xml";
pub const OSM_CHANGE_FILE_NAME: &str = "osm_change.xml";

/// Changeset id written into the osmChange document until the real one is known.
const PLACEHOLDER_CHANGESET_ID: u64 = 0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WayEdits {
    pub way_id: OsmId,
    pub ops: Vec<LaneOp>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EditScript {
    #[serde(default)]
    pub comment: Option<String>,
    pub edits: Vec<WayEdits>,
}

pub struct Input {
    ways: Vec<Way>,
    script: EditScript,
}

pub struct Output {
    request: ChangesetRequest,
    updated_ways: Vec<Way>,
}

pub struct ApplyEditsEtl<'a> {
    config: &'a UserConfig,
    validator: LocalValidator,
}

impl ApplyEditsEtl<'_> {
    fn output_path(dir: &Path) -> PathBuf {
        dir.join(CHANGESET_FILE_NAME)
    }

    fn edits_path(&self) -> Result<&str> {
        self.config.edits_path.as_deref()
            .ok_or_else(|| "No edits_path configured".into())
    }

    /// Runs the ops of one way. `None` when the edit is unusable or changes nothing.
    fn edit_way(&self, way: &Way, ops: &[LaneOp], comment: &str) -> Option<(ChangesetRequest, Way)> {
        let mut session = EditSession::open(way.clone());
        for op in ops {
            if let Err(err) = session.apply(op) {
                error!(way_id = way.id, err = err.message.as_str(); "Edit could not be applied, skipping way");
                return None;
            }
        }

        let proposed = session.proposed_tags();
        let report = self.validator.validate(&proposed);
        for warning in &report.warnings {
            warn!(way_id = way.id, warning = warning.as_str(); "Validation warning");
        }
        if !report.valid {
            error!(way_id = way.id, errors = report.errors.join("; ").as_str(); "Proposed tags are invalid, skipping way");
            return None;
        }

        info!(way_id = way.id, summary = session.change_summary().as_str(); "Lane changes");
        match session.begin_submission(comment) {
            Ok(request) => {
                let mut updated = way.clone();
                updated.tags = proposed;
                Some((request, updated))
            },
            Err(err) => {
                info!(way_id = way.id, reason = err.message.as_str(); "Nothing to submit");
                None
            },
        }
    }

    pub fn new(config: &UserConfig) -> ApplyEditsEtl {
        ApplyEditsEtl {
            config,
            validator: LocalValidator::new(config.max_lanes),
        }
    }
}

impl Etl for ApplyEditsEtl<'_> {
    type Input = Input;
    type Output = Output;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(Self::output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        remove_if_exists(&Self::output_path(dir))?;
        remove_if_exists(&dir.join(CHANGESET_CREATE_FILE_NAME))?;
        remove_if_exists(&dir.join(OSM_CHANGE_FILE_NAME))
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input> {
        let ways = ParseOsmEtl::read_output(dir)?;
        let script = read_json(Path::new(self.edits_path()?))?;
        Ok(Input { ways, script })
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let comment = input.script.comment.clone()
            .unwrap_or_else(|| self.config.changeset_comment.clone());
        let by_id: HashMap<OsmId, &Way> = input.ways.iter()
            .map(|way| (way.id, way))
            .collect();

        let mut changes = Vec::new();
        let mut updated_ways = Vec::new();
        for edits in tqdm::tqdm(input.script.edits.iter()) {
            let Some(way) = by_id.get(&edits.way_id) else {
                warn!(way_id = edits.way_id; "Edited way not found in input, skipping");
                continue;
            };
            if let Some((request, updated)) = self.edit_way(way, &edits.ops, &comment) {
                changes.extend(request.changes);
                updated_ways.push(updated);
            }
        }

        if changes.is_empty() {
            warn!(etl_name = ETL_NAME; "No way was changed");
        }
        Ok(Output {
            request: ChangesetRequest { comment, changes },
            updated_ways,
        })
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let generator = self.config.created_by.as_str();
        fs::write(
            dir.join(CHANGESET_CREATE_FILE_NAME),
            osm_xml::write_changeset_create(&output.request.comment, generator)?,
        )?;
        fs::write(
            dir.join(OSM_CHANGE_FILE_NAME),
            osm_xml::write_osm_change(&output.updated_ways, PLACEHOLDER_CHANGESET_ID, generator)?,
        )?;
        write_json(&Self::output_path(dir), &output.request)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::data::osm::MapCoords;
    use crate::etl::lane_plan::LanePlanEtl;

    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="51.5000" lon="-0.1000"/>
  <node id="2" lat="51.5000" lon="-0.0990"/>
  <node id="3" lat="51.5010" lon="-0.0990"/>
  <way id="100" version="3">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="primary"/>
    <tag k="lanes" v="2"/>
    <tag k="turn:lanes" v="left|through"/>
  </way>
  <way id="200" version="1">
    <nd ref="2"/>
    <nd ref="3"/>
    <tag k="highway" v="footway"/>
  </way>
  <way id="300" version="7">
    <nd ref="2"/>
    <nd ref="3"/>
    <tag k="highway" v="residential"/>
  </way>
</osm>"#;

    const EDITS: &str = r#"{
        "comment": "Bus lane on the high street",
        "edits": [
            {"way_id": 100, "ops": [{"op": "set_type", "lane": 1, "type": "bus"}]},
            {"way_id": 999, "ops": [{"op": "add_lane"}]}
        ]
    }"#;

    fn config_for(dir: &Path) -> UserConfig {
        let data_path = dir.join("input.osm");
        fs::File::create(&data_path).unwrap().write_all(DOCUMENT.as_bytes()).unwrap();
        let edits_path = dir.join("edits.json");
        fs::write(&edits_path, EDITS).unwrap();

        serde_json::from_value(serde_json::json!({
            "data_path": data_path.to_str().unwrap(),
            "edits_path": edits_path.to_str().unwrap(),
            "top_left_lon": -0.1,
            "top_left_lat": 51.501,
            "px_per_deg_lon": 100000.0,
            "px_per_deg_lat": 100000.0
        })).unwrap()
    }

    #[test]
    fn test_pipeline_produces_changeset() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        ParseOsmEtl::new(&config).process(dir.path()).unwrap();
        let ways = ParseOsmEtl::read_output(dir.path()).unwrap();
        assert_eq!(ways.iter().map(|way| way.id).collect::<Vec<_>>(), vec![100, 300]);
        assert_eq!(ways[0].geometry[1], MapCoords { lat: 51.5, lon: -0.099 });

        LanePlanEtl::new(&config).process(dir.path()).unwrap();
        let plan: serde_json::Value = read_json(&dir.path().join("lane_plan.json")).unwrap();
        assert_eq!(plan[0]["way_id"], 100);
        assert_eq!(plan[0]["layout"]["lanes"][0]["glyph"], "left");
        assert_eq!(plan[0]["validation"]["valid"], true);

        ApplyEditsEtl::new(&config).process(dir.path()).unwrap();
        let request: ChangesetRequest = read_json(&dir.path().join(CHANGESET_FILE_NAME)).unwrap();
        assert_eq!(request.comment, "Bus lane on the high street");
        assert_eq!(request.changes.len(), 1);
        assert_eq!(request.changes[0].way_id, 100);
        assert_eq!(request.changes[0].new_tags.get("lanes:bus").map(String::as_str), Some("no|yes"));

        let osm_change = fs::read_to_string(dir.path().join(OSM_CHANGE_FILE_NAME)).unwrap();
        assert!(osm_change.contains(r#"<way id="100" version="3" changeset="0">"#));
        assert!(osm_change.contains(r#"<tag k="lanes:bus" v="no|yes"/>"#));
        assert!(!osm_change.contains(r#"<way id="300""#));

        let create = fs::read_to_string(dir.path().join(CHANGESET_CREATE_FILE_NAME)).unwrap();
        assert!(create.contains("Bus lane on the high street"));
    }

    #[test]
    fn test_invalid_edit_skips_way() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        ParseOsmEtl::new(&config).process(dir.path()).unwrap();

        let mut etl = ApplyEditsEtl::new(&config);
        let ways = ParseOsmEtl::read_output(dir.path()).unwrap();
        let script = EditScript {
            comment: None,
            edits: vec![WayEdits {
                way_id: 100,
                ops: vec![LaneOp::SetType { lane: 5, lane_type: crate::data::lanes::LaneType::Bus }],
            }],
        };
        let output = etl.transform(Input { ways, script }).unwrap();
        assert!(output.request.changes.is_empty());
        assert!(output.updated_ways.is_empty());
        assert_eq!(output.request.comment, "Update traffic lanes");
    }

    #[test]
    fn test_cached_stage_is_skipped_until_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let mut etl = ParseOsmEtl::new(&config);
        etl.process(dir.path()).unwrap();
        assert!(etl.is_cached(dir.path()).unwrap());

        etl.clean(dir.path()).unwrap();
        assert!(!etl.is_cached(dir.path()).unwrap());
        etl.clean(dir.path()).unwrap();
    }
}
