//! Headless scene player
//!
//! Loads an engine config and one or more scene documents, runs the
//! simulation loop for a fixed number of ticks against a recording
//! rasterizer and logs what happened.
//!
//! ```text
//! scene_player [--config engine.toml] [scene.json ...] [--ticks N]
//! ```
//!
//! The first scene is the live one; the others are overlaid on top of it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scene_engine::composition::{CompositionState, RenderMode};
use scene_engine::core::config::{Config, EngineConfig};
use scene_engine::dispatch::RecordingSink;
use scene_engine::foundation::logging;
use scene_engine::render::{Rasterizer, RecordingRasterizer};
use scene_engine::scene::{SceneDescriptor, SceneDocument, SceneError};
use clap::Parser;
use scene_engine::{EngineError, SimulationLoop, TickOutcome};
use thiserror::Error;

const TICK: Duration = Duration::from_micros(16_667);

#[derive(Debug, Error)]
enum PlayerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("{0}")]
    Usage(String),
}

/// Plays scene documents headlessly and logs what happened
#[derive(Debug, Parser)]
#[command(name = "scene_player", version, about)]
struct Args {
    /// Engine configuration file (`.toml` or `.ron`)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Scene documents; the first is live, the rest are overlaid
    #[arg(value_name = "SCENE")]
    scenes: Vec<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 300)]
    ticks: u32,
}

impl Args {
    /// Scenes to play, falling back to the bundled demo pair
    fn scene_paths(&self) -> Vec<PathBuf> {
        if !self.scenes.is_empty() {
            return self.scenes.clone();
        }
        let assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        vec![assets.join("demo_scene.json"), assets.join("hud_scene.json")]
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, PlayerError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    EngineConfig::load_from_file(path).map_err(|e| PlayerError::Engine(e.into()))
}

fn run(args: &Args) -> Result<(), PlayerError> {
    let config = load_config(args.config.as_deref())?;
    logging::init(&config.logging);
    log::info!("Starting scene player ({} ticks)", args.ticks);

    let mut engine = SimulationLoop::new(config)?;
    let mut raster = RecordingRasterizer::new();
    let mut sink = RecordingSink::new();

    let mut ids = Vec::new();
    for (layer, path) in args.scene_paths().iter().enumerate() {
        let document = SceneDocument::load(path).map_err(EngineError::from)?;
        log::info!(
            "Loaded '{}' from {} ({} entities)",
            document.id,
            path.display(),
            document.entities.len()
        );
        let id = document.id.clone();
        let scenes = engine.scenes_mut();
        scenes.create_scene(SceneDescriptor::from_document(document));
        if let Some(scene) = scenes.get_scene_mut(&id) {
            scene.composition_mut().layer_priority = i32::try_from(layer).unwrap_or(i32::MAX);
        }
        scenes.load_scene(&id)?;
        scenes.activate_scene(&id)?;

        let mode = if layer == 0 {
            RenderMode::Direct
        } else {
            RenderMode::Offscreen
        };
        engine.create_render_context(&id, 0, mode, &mut raster)?;
        ids.push(id);
    }

    let Some((current, overlays)) = ids.split_first() else {
        return Err(PlayerError::Usage("no scenes to play".into()));
    };
    engine.set_current_scene(Some(current.as_str()));
    engine.set_composition_state(CompositionState::overlay(overlays.iter().cloned()));

    let mut dropped = 0;
    let mut bodies_created = 0;
    let mut draw_calls = 0;
    for tick in 0..args.ticks {
        match engine.tick(TICK * tick, &mut raster, &mut sink) {
            TickOutcome::Ran(report) => {
                bodies_created += report.bodies_created;
                draw_calls += report.render.draw_calls;
                log::debug!(
                    "tick {tick}: {} entities, {} animated, {} dispatched",
                    report.entity_count,
                    report.animations_advanced,
                    report.dispatched
                );
            }
            TickOutcome::Dropped => dropped += 1,
        }
    }

    let stats = engine.scenes().get_scene_stats();
    log::info!(
        "Scenes: {} total, {} active, {} entities",
        stats.total,
        stats.active,
        stats.total_entities
    );
    log::info!(
        "Physics: {} bodies live, {} created, {} steps",
        engine.physics().body_count(),
        bodies_created,
        engine.physics().world().steps()
    );
    log::info!(
        "Render: {} frames at {:?}, {draw_calls} draw calls, {} pending",
        raster.frames(),
        raster.size(),
        engine.compositor().pending()
    );
    log::info!("Dispatch: {} entity updates, {dropped} dropped ticks", sink.updates().len());

    for id in &ids {
        if let Some(scene) = engine.scenes().get_scene(id) {
            for entity in scene.entities().values() {
                log::info!(
                    "  {id}/{}: ({:.1}, {:.1})",
                    entity.id,
                    entity.position.x,
                    entity.position.y
                );
            }
        }
    }

    for id in ids.iter().rev() {
        engine.destroy_scene(id, &mut raster)?;
    }
    log::info!("Scene player finished");
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{e}");
        eprintln!("scene_player: {e}");
        std::process::exit(1);
    }
}
