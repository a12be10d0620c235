use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    codec,
    data::{lanes::LaneSequence, osm::{OsmId, Way}},
    errors::Result,
    layout::{self, Projection, RoadLayout},
    validate::{LocalValidator, TagValidator, ValidationReport},
    UserConfig,
};

use super::{parse_osm::ParseOsmEtl, remove_if_exists, write_json, Etl};

pub const ETL_NAME: &str = "lane_plan";
pub const OUTPUT_FILE_NAME: &str = "lane_plan.json";

/// Everything an editor needs to show one road.
#[derive(Serialize, Debug)]
pub struct WayPlan {
    pub way_id: OsmId,
    pub name: Option<String>,
    pub lanes: LaneSequence,
    pub layout: RoadLayout,
    pub validation: ValidationReport,
}

pub struct LanePlanEtl<'a> {
    config: &'a UserConfig,
    validator: LocalValidator,
}

impl LanePlanEtl<'_> {
    fn output_path(dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }

    fn plan_way(&self, projection: &Projection, way: &Way) -> WayPlan {
        let lanes = codec::decode(&way.tags);
        let axis = projection.project_all(&way.geometry);
        WayPlan {
            way_id: way.id,
            name: way.tag("name").map(str::to_string),
            layout: layout::layout_road(way, &axis, &lanes, self.config.lane_width_px),
            validation: self.validator.validate(&way.tags),
            lanes,
        }
    }

    pub fn new(config: &UserConfig) -> LanePlanEtl {
        LanePlanEtl {
            config,
            validator: LocalValidator::new(config.max_lanes),
        }
    }
}

impl Etl for LanePlanEtl<'_> {
    type Input = Vec<Way>;
    type Output = Vec<WayPlan>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(Self::output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        remove_if_exists(&Self::output_path(dir))
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input> {
        ParseOsmEtl::read_output(dir)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let projection = Projection::from(self.config);
        let plans = tqdm::tqdm(input.iter())
            .map(|way| self.plan_way(&projection, way))
            .collect();
        Ok(plans)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        write_json(&Self::output_path(dir), &output)
    }
}
