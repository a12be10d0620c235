use std::{fs::File, io::BufReader, path::Path};

use serde::Deserialize;

use crate::errors::Result;

#[derive(Deserialize, Debug, Clone)]
pub struct UserConfig {
    /// OSM document to read ways from, `.osm` or `.osm.xz`.
    pub data_path: String,
    /// Optional JSON edit script applied by the `apply_edits` stage.
    #[serde(default)]
    pub edits_path: Option<String>,
    pub top_left_lon: f64,
    pub top_left_lat: f64,
    pub px_per_deg_lon: f64,
    pub px_per_deg_lat: f64,
    #[serde(default = "default_lane_width_px")]
    pub lane_width_px: f64,
    #[serde(default = "default_max_lanes")]
    pub max_lanes: i64,
    #[serde(default = "default_changeset_comment")]
    pub changeset_comment: String,
    #[serde(default = "default_created_by")]
    pub created_by: String,
}

fn default_lane_width_px() -> f64 {
    16.0
}

fn default_max_lanes() -> i64 {
    12
}

fn default_changeset_comment() -> String {
    "Update traffic lanes".to_string()
}

fn default_created_by() -> String {
    "OSM Lane Editor".to_string()
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| format!("Could not open config file {}: {}", path.display(), err))?;
    let config = serde_json::from_reader(BufReader::new(file))?;
    Ok(config)
}
