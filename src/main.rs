use std::fs::create_dir_all;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_lanes::config::load_user_config;
use osm_lanes::errors::Result;
use osm_lanes::etl::apply_edits::ApplyEditsEtl;
use osm_lanes::etl::lane_plan::LanePlanEtl;
use osm_lanes::etl::parse_osm::ParseOsmEtl;
use osm_lanes::etl::Etl;
use osm_lanes::UserConfig;

/// Plans and encodes lane edits for the roads of an OSM extract.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, default_value = "config/lanes.json")]
    config: PathBuf,

    /// Directory for stage outputs. Defaults to output/<input file name>.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Drop cached stage outputs before running.
    #[arg(long)]
    clean: bool,
}

fn create_output_dir(config: &UserConfig, output: Option<PathBuf>) -> Result<PathBuf> {
    let output_dir = match output {
        Some(dir) => dir,
        None => {
            let input_fname = Path::new(&config.data_path)
                .file_name()
                .ok_or("Could not get input file name")?;
            Path::new("output").join(input_fname)
        },
    };
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn run_stage(etl: &mut impl Etl, dir: &Path, clean: bool) -> Result<()> {
    if clean {
        etl.clean(dir)?;
    }
    etl.process(dir)
}

fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let user_config = load_user_config(&cli.config)?;
    let output_dir = create_output_dir(&user_config, cli.output)?;

    run_stage(&mut ParseOsmEtl::new(&user_config), &output_dir, cli.clean)?;
    run_stage(&mut LanePlanEtl::new(&user_config), &output_dir, cli.clean)?;
    if user_config.edits_path.is_some() {
        run_stage(&mut ApplyEditsEtl::new(&user_config), &output_dir, cli.clean)?;
    } else {
        info!(etl_name = "apply_edits"; "No edits_path configured, skipping");
    }

    Ok(())
}
