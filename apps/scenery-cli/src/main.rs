use clap::{Parser, Subcommand};
use glam::Vec3;
use scenery_persist::ProjectStore;
use scenery_scene::{
    LightComponent, MeshComponent, OrbitComponent, RotateComponent, Runtime, Scene,
};
use scenery_tools::{SceneInspector, SceneOutline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scenery-cli", about = "CLI tool for scenery scene operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Run the play loop on a demo scene and show the snapshot revert
    Demo {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "60")]
        ticks: u32,
        /// Seconds per frame
        #[arg(short, long, default_value = "0.016")]
        dt: f32,
    },
    /// Save the demo scene into a project store
    Save {
        /// Project directory
        #[arg(short, long)]
        dir: PathBuf,
    },
    /// Load the latest save from a project store and print its hierarchy
    Load {
        /// Project directory
        #[arg(short, long)]
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("scenery-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("persist: {}", scenery_persist::crate_info());
            println!("tools: {}", scenery_tools::crate_info());
        }
        Commands::Demo { ticks, dt } => {
            let mut scene = demo_scene();
            let outline = SceneOutline::new();
            println!("--- before play ---");
            print!("{}", outline.render(&scene));

            let mut runtime = Runtime::new();
            runtime.play(&mut scene);
            for _ in 0..ticks {
                runtime.tick(&mut scene, dt);
            }
            println!("--- after {ticks} frames ({:.2}s) ---", ticks as f32 * dt);
            print!("{}", outline.render(&scene));

            runtime.stop(&mut scene);
            println!("--- after stop (reverted) ---");
            print!("{}", outline.render(&scene));
            println!("{}", SceneInspector::summary(&scene));
        }
        Commands::Save { dir } => {
            let scene = demo_scene();
            let mut store = ProjectStore::open(&dir, "demo")?;
            let index = store.save_scene(&scene.to_record())?;
            let meta = store.meta();
            println!(
                "Saved scene #{index} to {} (project '{}', {} saves)",
                dir.display(),
                meta.name,
                meta.save_count
            );
        }
        Commands::Load { dir } => {
            let store = ProjectStore::open(&dir, "demo")?;
            store.verify_integrity()?;
            let record = store.load_latest()?;
            let scene = Scene::from_record(&record);
            print!("{}", SceneOutline::new().render(&scene));
            println!("{}", SceneInspector::summary(&scene));
        }
    }

    Ok(())
}

/// A small scene with the whole component set: lit spinning cube with a
/// satellite orbiting it.
fn demo_scene() -> Scene {
    let mut scene = Scene::new();

    let cube = scene.create_entity("cube");
    {
        let entity = scene.get_entity_mut(cube).expect("just created");
        entity.add_component(MeshComponent::unit_cube());
        entity.add_component(RotateComponent::new());
    }

    let satellite = scene.create_entity("satellite");
    {
        let entity = scene.get_entity_mut(satellite).expect("just created");
        entity.add_component(MeshComponent::unit_cube());
        let mut orbit = OrbitComponent::new();
        orbit.distance.set(3.0);
        orbit.speed_deg_per_sec.set(90.0);
        entity.add_component(orbit);
    }

    let sun = scene.create_entity("sun");
    scene
        .get_entity_mut(sun)
        .expect("just created")
        .add_component(LightComponent::new());
    scene
        .set_position(sun, Vec3::new(0.0, 10.0, 0.0))
        .expect("sun has a transform");

    scene.set_scale(cube, Vec3::splat(1.5)).expect("cube has a transform");
    scene
}
