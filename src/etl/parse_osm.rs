use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::info;
use xz::bufread::XzDecoder;

use crate::UserConfig;
use crate::data::osm::Way;
use crate::errors::Result;
use crate::etl::{read_json, remove_if_exists, write_json, Etl};
use crate::{osm_xml, overpass};

pub const ETL_NAME: &str = "parse_osm";
pub const OUTPUT_FILE_NAME: &str = "ways.json";

pub struct ParseOsmEtl<'a> {
    config: &'a UserConfig,
}

impl ParseOsmEtl<'_> {
    fn output_path(dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }

    fn create_osm_reader(path: &Path) -> Result<Box<dyn BufRead>> {
        let file = fs::File::open(path)
            .map_err(|err| format!("Could not open {}: {}", path.display(), err))?;
        let file_reader = BufReader::new(file);
        if path.extension().is_some_and(|ext| ext == "xz") {
            let xz_reader = XzDecoder::new(file_reader);
            Ok(Box::new(BufReader::new(xz_reader)))
        } else {
            Ok(Box::new(file_reader))
        }
    }

    fn is_overpass_json(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "json")
    }

    /// Previously extracted ways of `dir`.
    pub fn read_output(dir: &Path) -> Result<Vec<Way>> {
        read_json(&Self::output_path(dir))
    }

    pub fn new(config: &UserConfig) -> ParseOsmEtl {
        ParseOsmEtl {
            config
        }
    }
}

impl Etl for ParseOsmEtl<'_> {
    type Input = Vec<Way>;
    type Output = Vec<Way>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(Self::output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        remove_if_exists(&Self::output_path(dir))
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let path = Path::new(&self.config.data_path);
        if Self::is_overpass_json(path) {
            let json = fs::read_to_string(path)?;
            overpass::parse_roads(&json)
        } else {
            let data = osm_xml::parse_document(Self::create_osm_reader(path)?)?;
            info!(nodes = data.nodes.len(), ways = data.ways.len(); "Parsed OSM document");
            Ok(data.highway_ways())
        }
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let mut roads: Vec<Way> = input.into_iter()
            .filter(|way| match way.tag("highway") {
                Some(highway) => !overpass::EXCLUDED_HIGHWAYS.contains(&highway),
                None => false,
            })
            .collect();
        roads.sort_by_key(|way| way.id);
        info!(etl_name = ETL_NAME, roads = roads.len(); "Selected roads");
        Ok(roads)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        write_json(&Self::output_path(dir), &output)
    }
}
