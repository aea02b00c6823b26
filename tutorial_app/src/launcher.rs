//! Headless tutorial launcher
//!
//! Loads configuration, initializes logging, wires the scene graph, camera
//! and headless renderer together and runs the loop until the frame budget
//! is spent.

use std::path::PathBuf;

use scene_engine::config::{Config, ConfigError};
use scene_engine::core::config::ApplicationConfig;
use scene_engine::foundation::logging;
use scene_engine::render::{Camera, HeadlessRenderer};
use scene_engine::scene::SceneGraph;
use scene_engine::{Application, LoopError, LoopStats, PacedScheduler, RenderLoop};
use thiserror::Error;

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "SCENE_ENGINE_CONFIG";

/// Configuration file used when none is given
const DEFAULT_CONFIG_PATH: &str = "tutorial.toml";

/// Frame budget for headless runs without an explicit `max_frames`
const DEFAULT_FRAME_BUDGET: u64 = 300;

/// Launcher errors
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The render loop failed
    #[error("Render loop error: {0}")]
    Loop(#[from] LoopError),
}

/// Configuration path from the first argument, `SCENE_ENGINE_CONFIG`, or the default
pub fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR))
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Run `app` headlessly with configuration from [`config_path`]
pub fn launch<A: Application>(name: &str, app: &mut A) -> Result<LoopStats, LaunchError> {
    let config = ApplicationConfig::load_or_default(config_path())?;
    logging::init_with_level(&config.engine.log_level);
    run_with_config(name, app, &config)
}

/// Run `app` headlessly with an explicit configuration
pub fn run_with_config<A: Application>(
    name: &str,
    app: &mut A,
    config: &ApplicationConfig,
) -> Result<LoopStats, LaunchError> {
    let (width, height) = (config.engine.viewport_width, config.engine.viewport_height);
    log::info!("Launching '{}' at {}x{}", name, width, height);

    let mut scene = SceneGraph::with_mode(config.scene.propagation);
    let mut camera = Camera::from_config(&config.camera, width, height);
    let mut renderer = HeadlessRenderer::new();
    let mut scheduler = PacedScheduler::new(
        config.engine.target_fps,
        Some(config.engine.max_frames.unwrap_or(DEFAULT_FRAME_BUDGET)),
    );

    let stats = {
        let mut render_loop = RenderLoop::new(app, &mut scene, &mut camera, &mut renderer);
        render_loop.on_resize(width, height);
        render_loop.run(&mut scheduler)?
    };

    log::info!(
        "'{}' finished: {} frames, {} nodes, {} draw items and {} lights in the last frame ({:.3}ms)",
        name,
        stats.frames_rendered,
        scene.len(),
        stats.last_draw_items,
        stats.last_lights,
        stats.last_frame_ms
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_engine::{AppError, FrameContext};

    struct Empty {
        updates: u64,
    }

    impl Application for Empty {
        fn initialize(&mut self, _scene: &mut SceneGraph, _camera: &mut Camera) -> Result<(), AppError> {
            Ok(())
        }

        fn update(&mut self, _frame: &mut FrameContext<'_>) -> Result<(), AppError> {
            self.updates += 1;
            Ok(())
        }
    }

    #[test]
    fn test_run_with_config_honours_frame_budget() {
        let mut config = ApplicationConfig::default();
        config.engine = config.engine.with_target_fps(None).with_max_frames(4);

        let mut app = Empty { updates: 0 };
        let stats = run_with_config("empty", &mut app, &config).unwrap();

        assert_eq!(stats.frames_rendered, 4);
        assert_eq!(app.updates, 4);
    }
}
