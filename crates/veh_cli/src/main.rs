use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use veh_core::{Event, InitialCondition, Tripoint, Vehicle};
use veh_world::{advance, load_content, load_vehicle, save_vehicle, spawn_vehicle, TileGrid};

/// Rows either side of the vehicle covered by `--wall`.
const WALL_HALF_WIDTH: i32 = 4;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "veh_cli", about = "Vehicle subsystem CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn (or load) a vehicle and drive it for a fixed number of ticks.
    Run(RunArgs),
    /// List the prototypes in the content catalog.
    Prototypes {
        #[arg(long, default_value = "./content")]
        content_dir: String,
    },
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    ticks: u64,
    #[arg(long)]
    seed: Option<u64>,
    /// Prototype to spawn. Mutually exclusive with --vehicle.
    #[arg(long, default_value = "sedan", conflicts_with = "vehicle_file")]
    prototype: String,
    /// Load the vehicle from a saved JSON file instead of spawning one.
    #[arg(long = "vehicle")]
    vehicle_file: Option<String>,
    #[arg(long, default_value = "./content")]
    content_dir: String,
    #[arg(long, default_value = "pristine", value_parser = ["pristine", "worn", "wrecked"])]
    condition: String,
    /// Cruise speed in m/s.
    #[arg(long, default_value_t = 10.0)]
    cruise: f32,
    /// Put a wall this many tiles ahead of the vehicle.
    #[arg(long)]
    wall: Option<i32>,
    #[arg(long, default_value_t = 10)]
    print_every: u64,
    /// Write the final vehicle to this JSON file.
    #[arg(long)]
    save: Option<String>,
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn run(args: &RunArgs) -> Result<()> {
    let content = Arc::new(load_content(&args.content_dir)?);
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut veh = if let Some(path) = &args.vehicle_file {
        load_vehicle(Path::new(path), Arc::clone(&content))?
    } else {
        let condition = match args.condition.as_str() {
            "worn" => InitialCondition::Worn,
            "wrecked" => InitialCondition::Wrecked,
            _ => InitialCondition::Pristine,
        };
        spawn_vehicle(&content, &args.prototype, condition, &mut rng)?
    };

    let mut grid = TileGrid::new();
    if let Some(distance) = args.wall {
        let at = veh.global_pos3();
        grid.add_wall(
            Tripoint::new(at.x + distance, at.y - WALL_HALF_WIDTH, at.z),
            at.y + WALL_HALF_WIDTH,
        );
    }

    println!(
        "Starting: vehicle={} ({}) parts={} seed={seed} content_version={}",
        veh.name,
        veh.id,
        veh.part_count(),
        content.content_version,
    );
    println!("{}", "-".repeat(80));

    if veh.start_engines(&mut rng) == 0 {
        println!("*** NO ENGINE STARTED ***");
    }
    veh.cruise_thrust(args.cruise);

    let print_every = args.print_every.max(1);
    let first_tick = veh.last_update_turn() + 1;
    for tick in first_tick..first_tick + args.ticks {
        let collisions = advance(&mut veh, &grid, &mut rng);
        veh.update_time(tick, 1.0);

        for coll in &collisions {
            println!(
                "*** COLLISION with {} at tick={tick:04}: impulse={:.0} damage dealt={} ***",
                coll.target_name, coll.impulse, coll.target_damage,
            );
        }
        for envelope in veh.drain_events() {
            report_event(tick, &envelope.event);
        }

        if tick % print_every == 0 {
            print_status(tick, &veh);
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final state:");
    print_status(veh.last_update_turn(), &veh);

    if let Some(path) = &args.save {
        save_vehicle(&veh, Path::new(path))?;
        println!("Vehicle written to {path}");
    }
    Ok(())
}

fn report_event(tick: u64, event: &Event) {
    match event {
        Event::EngineStopped { part, reason } => {
            println!("*** ENGINE {part} STOPPED ({reason:?}) at tick={tick:04} ***");
        }
        Event::EngineOverspeed { part } => {
            println!("*** ENGINE {part} OVERSPEED at tick={tick:04} ***");
        }
        Event::PartDestroyed { part_type, mount, .. } => {
            println!(
                "*** {part_type} at ({}, {}) DESTROYED at tick={tick:04} ***",
                mount.x, mount.y
            );
        }
        Event::FuelExploded { fuel, amount, .. } => {
            println!("*** {amount} {fuel} EXPLODED at tick={tick:04} ***");
        }
        other => tracing::debug!(tick, event = ?other, "vehicle event"),
    }
}

fn print_status(tick: u64, veh: &Vehicle) {
    let pos = veh.global_pos3();
    let broken = veh
        .parts()
        .iter()
        .filter(|p| !p.is_removed() && p.is_broken())
        .count();
    let fuels: Vec<String> = veh
        .fuels_left()
        .iter()
        .map(|(fuel, qty)| format!("{fuel}={qty}"))
        .collect();

    println!(
        "[tick={tick:04}]  pos=({:4},{:4},{})  v={:5.1} m/s  cruise={:5.1}  \
         engine={}  mass={:.0}kg  broken={broken}  fuel=[{}]",
        pos.x,
        pos.y,
        pos.z,
        veh.velocity,
        veh.cruise_velocity,
        if veh.engine_on() { "on" } else { "off" },
        veh.total_mass(),
        fuels.join(", "),
    );
}

fn list_prototypes(content_dir: &str) -> Result<()> {
    let content = load_content(content_dir)?;
    for prototype in &content.prototypes {
        println!(
            "{:<16} {:<20} parts={}",
            prototype.id.as_str(),
            prototype.name,
            prototype.parts.len()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(&args)?,
        Commands::Prototypes { content_dir } => list_prototypes(&content_dir)?,
    }
    Ok(())
}
