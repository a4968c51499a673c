mod player;
mod script;

use anyhow::Result;
use clap::Parser;
use placement::{PlacementConfig, Session};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::player::Player;
use crate::script::Script;

#[derive(Parser)]
#[command(name = "placement-replay")]
#[command(about = "Replay a scripted AR placement session headlessly", long_about = None)]
struct Cli {
    /// Script file (TOML)
    script: PathBuf,

    /// Placement config file; defaults to the user config location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final scene state as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PlacementConfig::load_from_path(path)?,
        None => PlacementConfig::load(),
    };
    let script = Script::load(&cli.script)?;
    info!(
        "Replaying {} ({} templates, {} steps)",
        cli.script.display(),
        script.templates.len(),
        script.steps.len()
    );

    let mut player = Player::new(Session::new(config)?);
    let steps = player.run(&script);
    let failed = steps.iter().filter(|s| !s.ok).count();
    let report = player.report(steps);

    info!(
        "{} objects, {} surfaces, {} images, planes hidden: {}, {} events, {} failed steps",
        report.objects.len(),
        report.surfaces.len(),
        report.images.len(),
        report.planes_hidden,
        report.events,
        failed
    );
    for object in &report.objects {
        info!(
            "{} {} at {}{}",
            object.id,
            object.template,
            object.pose.w_axis.truncate(),
            if object.highlighted { " (highlighted)" } else { "" }
        );
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
