//! Face Follower - Main Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use pilot::sim::{seed_known_face, SimWorld};
use pilot::{init_logging, input, ControlLoop, PilotConfig};
use std::path::PathBuf;
use tracing::{info, Level};
use vehicle_link::{DryRunLink, VehicleLink};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (any format the config crate reads)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only follow this identity
    #[arg(short, long)]
    target: Option<String>,

    /// Log flight commands instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Control loop rate
    #[arg(long)]
    fps: Option<u32>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(if args.debug { Level::DEBUG } else { Level::INFO });

    let mut config = PilotConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(target) = args.target {
        config.servo.target_name = Some(target);
    }
    if let Some(fps) = args.fps {
        config.control.fps = fps;
    }
    config.vehicle.dry_run |= args.dry_run;
    config.validate().context("validating configuration")?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!("=== Face Follower v{} ===", env!("CARGO_PKG_VERSION"));

    let frame = config.servo.frame;
    let world = SimWorld::new(
        config.sim.clone(),
        frame.width as u32,
        frame.height as u32,
        config.control.fps,
    );
    if let Some(label) = &config.sim.face_label {
        seed_known_face(&config.store.known_dir, label).context("seeding simulated face")?;
    }

    let link: Box<dyn VehicleLink> = if config.vehicle.dry_run {
        Box::new(DryRunLink::new(world.vehicle()))
    } else {
        Box::new(world.vehicle())
    };

    let mut pilot = ControlLoop::new(&config, world.camera(), link, world.recognizer())
        .context("initializing control loop")?;

    info!("Keys: t takeoff, l land, o override, v enroll, w/s a/d r/f q/e axes, target <name>, quit");
    let mut events = input::spawn_stdin_reader(32);
    let summary = pilot.run(&mut events).await.context("running control loop")?;

    info!("Exited after {} cycles ({:?})", summary.cycles, summary.exit);
    Ok(())
}
