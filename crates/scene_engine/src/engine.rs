//! Render loop
//!
//! Cooperative, single-threaded frame driver. The host decides when a frame
//! may run (display sync, a timer, a test) and calls [`RenderLoop::frame`];
//! each frame executes `update → propagate → render` as one unit.
//!
//! ```text
//!            start()              stop() / request_stop()
//!  Stopped ──────────▶ Running ─────────────────────────▶ Stopped (terminal)
//!                        │  ▲
//!                 frame()└──┘
//! ```

use std::thread;
use std::time::{Duration, Instant};

use crate::application::{AppError, Application};
use crate::core::config::EngineConfig;
use crate::foundation::time::{FrameClock, FrameTime, Stopwatch, SystemTimeSource, TimeSource};
use crate::render::{Camera, RenderError, Renderer};
use crate::scene::{DrawItem, LightItem, PropagationStats, SceneError, SceneGraph};
use thiserror::Error;

/// Render loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not producing frames
    Stopped,
    /// Producing a frame each time the host asks
    Running,
}

/// Outcome of a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The host should schedule another frame
    Continue,
    /// A stop was requested during this frame; do not schedule again
    Stopped,
}

/// Render loop errors
#[derive(Error, Debug)]
pub enum LoopError {
    /// `frame` was called while the loop is stopped
    #[error("Render loop is not running")]
    NotRunning,

    /// `start` was called twice
    #[error("Render loop is already running")]
    AlreadyRunning,

    /// `start` was called after the loop stopped
    #[error("Render loop has stopped and cannot be restarted")]
    Terminated,

    /// Scene propagation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// The renderer reported a failure; the frame is not retried
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// The application failed to initialize or update
    #[error("Application error: {0}")]
    Application(#[from] AppError),
}

/// Counters accumulated by the loop
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopStats {
    /// Frames that completed rendering
    pub frames_rendered: u64,
    /// Items submitted in the last rendered frame
    pub last_draw_items: usize,
    /// Lights submitted in the last rendered frame
    pub last_lights: usize,
    /// Propagation counters of the last frame
    pub last_propagation: PropagationStats,
    /// CPU time spent in the last frame, in milliseconds
    pub last_frame_ms: f32,
}

/// Per-frame view handed to [`Application::update`]
pub struct FrameContext<'a> {
    time: FrameTime,
    /// Scene to animate
    pub scene: &'a mut SceneGraph,
    /// Camera to move
    pub camera: &'a mut Camera,
    stop_requested: &'a mut bool,
}

impl FrameContext<'_> {
    /// Timing of the current frame
    pub fn time(&self) -> FrameTime {
        self.time
    }

    /// Seconds since the loop started
    pub fn elapsed_secs(&self) -> f32 {
        self.time.elapsed_secs()
    }

    /// Stop after this frame; propagation and rendering still run
    pub fn request_stop(&mut self) {
        *self.stop_requested = true;
    }

    /// Whether a stop has been requested
    pub fn stop_requested(&self) -> bool {
        *self.stop_requested
    }
}

/// Host-side frame scheduling
pub trait HostScheduler {
    /// Block until the next frame may run; `false` tears the loop down
    fn wait_for_frame(&mut self) -> bool;
}

/// Scheduler pacing frames to a fixed rate with an optional frame budget
#[derive(Debug, Clone)]
pub struct PacedScheduler {
    interval: Option<Duration>,
    max_frames: Option<u64>,
    delivered: u64,
    next_deadline: Option<Instant>,
}

impl PacedScheduler {
    /// Create a scheduler; `target_fps = None` delivers frames back to back
    pub fn new(target_fps: Option<u32>, max_frames: Option<u64>) -> Self {
        Self {
            interval: target_fps
                .filter(|&fps| fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
            max_frames,
            delivered: 0,
            next_deadline: None,
        }
    }

    /// Create a scheduler from engine configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.target_fps, config.max_frames)
    }

    /// Number of frames delivered so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl HostScheduler for PacedScheduler {
    fn wait_for_frame(&mut self) -> bool {
        if self.max_frames.is_some_and(|max| self.delivered >= max) {
            return false;
        }

        if let Some(interval) = self.interval {
            let now = Instant::now();
            match self.next_deadline {
                Some(deadline) if deadline > now => {
                    thread::sleep(deadline - now);
                    self.next_deadline = Some(deadline + interval);
                }
                // First frame, or running behind: do not try to catch up
                _ => self.next_deadline = Some(now + interval),
            }
        }

        self.delivered += 1;
        true
    }
}

/// Frame driver composing an application, a scene, a camera and a renderer
///
/// All collaborators are borrowed for the lifetime of the loop; nothing is
/// global. Resize events are queued and applied at the next frame boundary.
pub struct RenderLoop<'a, A, R, T = SystemTimeSource>
where
    A: Application,
    R: Renderer,
    T: TimeSource,
{
    app: &'a mut A,
    scene: &'a mut SceneGraph,
    camera: &'a mut Camera,
    renderer: &'a mut R,
    time_source: T,
    clock: Option<FrameClock>,
    state: LoopState,
    terminated: bool,
    stop_requested: bool,
    pending_resize: Option<(u32, u32)>,
    draw_list: Vec<DrawItem>,
    light_list: Vec<LightItem>,
    stats: LoopStats,
}

impl<'a, A: Application, R: Renderer> RenderLoop<'a, A, R, SystemTimeSource> {
    /// Create a stopped loop timed by the system clock
    pub fn new(app: &'a mut A, scene: &'a mut SceneGraph, camera: &'a mut Camera, renderer: &'a mut R) -> Self {
        Self::with_time_source(app, scene, camera, renderer, SystemTimeSource::new())
    }
}

impl<'a, A: Application, R: Renderer, T: TimeSource> RenderLoop<'a, A, R, T> {
    /// Create a stopped loop timed by a custom source
    pub fn with_time_source(
        app: &'a mut A,
        scene: &'a mut SceneGraph,
        camera: &'a mut Camera,
        renderer: &'a mut R,
        time_source: T,
    ) -> Self {
        Self {
            app,
            scene,
            camera,
            renderer,
            time_source,
            clock: None,
            state: LoopState::Stopped,
            terminated: false,
            stop_requested: false,
            pending_resize: None,
            draw_list: Vec::new(),
            light_list: Vec::new(),
            stats: LoopStats::default(),
        }
    }

    /// Initialize the application and transition to running
    ///
    /// A failed initialization is terminal: whatever the application already
    /// built stays in the scene, so the loop refuses to initialize it again.
    pub fn start(&mut self) -> Result<(), LoopError> {
        if self.state == LoopState::Running {
            return Err(LoopError::AlreadyRunning);
        }
        if self.terminated {
            return Err(LoopError::Terminated);
        }

        log::info!("Starting render loop...");
        if let Err(err) = self.app.initialize(self.scene, self.camera) {
            log::error!("Application failed to initialize: {}", err);
            self.terminated = true;
            return Err(err.into());
        }
        self.apply_pending_resize();

        self.clock = Some(FrameClock::start(self.time_source.now()));
        self.stop_requested = false;
        self.state = LoopState::Running;
        log::info!("Render loop running ({} nodes)", self.scene.len());
        Ok(())
    }

    /// Run one frame: update, propagate, render
    ///
    /// If the application requests a stop during `update`, propagation and
    /// rendering still complete and the loop transitions to stopped.
    pub fn frame(&mut self) -> Result<FrameStatus, LoopError> {
        if self.state != LoopState::Running {
            return Err(LoopError::NotRunning);
        }
        self.apply_pending_resize();

        let now = self.time_source.now();
        let time = self.clock.as_mut().ok_or(LoopError::NotRunning)?.advance(now);

        let stopwatch = Stopwatch::start_new();
        let result = self.run_frame(time);
        self.stats.last_frame_ms = stopwatch.elapsed_millis();
        log::trace!(
            "Frame {} at {:.3}s (dt {:.2}ms) took {:.3}ms",
            time.frame,
            time.elapsed_secs(),
            time.delta_secs() * 1000.0,
            self.stats.last_frame_ms
        );

        if self.stop_requested {
            self.finish();
            result?;
            return Ok(FrameStatus::Stopped);
        }
        result.map(|()| FrameStatus::Continue)
    }

    /// Stop the loop
    ///
    /// Frames never overlap with this call, so the stop takes effect
    /// immediately. From inside a frame use [`FrameContext::request_stop`].
    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            self.finish();
        }
    }

    /// Queue a viewport change for the next frame boundary
    pub fn on_resize(&mut self, width: u32, height: u32) {
        log::debug!("Resize to {}x{} queued", width, height);
        self.pending_resize = Some((width, height));
    }

    /// Start if needed and drive frames until stopped or the scheduler gives up
    ///
    /// A frame error stops the loop and is returned to the caller.
    pub fn run(&mut self, scheduler: &mut impl HostScheduler) -> Result<LoopStats, LoopError> {
        if self.state == LoopState::Stopped {
            self.start()?;
        }

        while self.state == LoopState::Running {
            if !scheduler.wait_for_frame() {
                log::info!("Host stopped scheduling frames");
                self.stop();
                break;
            }
            if let Err(err) = self.frame() {
                log::error!("Frame failed: {}", err);
                self.stop();
                return Err(err);
            }
        }

        Ok(self.stats)
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Whether frames are being produced
    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Loop counters
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Scene being driven
    pub fn scene(&self) -> &SceneGraph {
        self.scene
    }

    /// Camera being driven
    pub fn camera(&self) -> &Camera {
        self.camera
    }

    /// Renderer being driven
    pub fn renderer(&self) -> &R {
        self.renderer
    }

    fn run_frame(&mut self, time: FrameTime) -> Result<(), LoopError> {
        let mut frame = FrameContext {
            time,
            scene: &mut *self.scene,
            camera: &mut *self.camera,
            stop_requested: &mut self.stop_requested,
        };
        self.app.update(&mut frame)?;

        self.stats.last_propagation = self.scene.propagate()?;

        self.draw_list.clear();
        self.draw_list.extend(self.scene.flatten());
        self.light_list.clear();
        self.light_list.extend(self.scene.lights());
        let view_projection = self.camera.view_projection(self.scene);
        self.renderer.render_frame(&self.draw_list, &self.light_list, &view_projection)?;

        self.stats.frames_rendered += 1;
        self.stats.last_draw_items = self.draw_list.len();
        self.stats.last_lights = self.light_list.len();
        Ok(())
    }

    fn apply_pending_resize(&mut self) {
        if let Some((width, height)) = self.pending_resize.take() {
            match self.camera.resize(width, height) {
                Ok(()) => self.renderer.configure_viewport(width, height),
                Err(err) => log::warn!("Ignoring resize: {}", err),
            }
        }
    }

    fn finish(&mut self) {
        self.state = LoopState::Stopped;
        self.terminated = true;
        self.stop_requested = false;
        self.app.cleanup(self.scene);

        let fps = self.clock.as_ref().map_or(0.0, FrameClock::average_fps);
        log::info!(
            "Render loop stopped after {} frames ({:.1} fps average)",
            self.stats.frames_rendered,
            fps
        );
    }
}

impl<A, R, T> Drop for RenderLoop<'_, A, R, T>
where
    A: Application,
    R: Renderer,
    T: TimeSource,
{
    fn drop(&mut self) {
        if self.state == LoopState::Running {
            log::debug!("Render loop dropped while running");
            self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Transform, Vec3};
    use crate::foundation::time::ManualTimeSource;
    use crate::render::{HeadlessRenderer, MaterialHandle, MeshHandle};
    use crate::scene::{Light, NodeId, Renderable};

    /// Moves one node to x = frame index and optionally stops on a given frame
    #[derive(Default)]
    struct Mover {
        node: Option<NodeId>,
        stop_at: Option<u64>,
        fail_at: Option<u64>,
        seen: Vec<FrameTime>,
        initialized: usize,
        cleanups: usize,
    }

    impl Application for Mover {
        fn initialize(&mut self, scene: &mut SceneGraph, _camera: &mut Camera) -> Result<(), AppError> {
            let node = scene.spawn_root(Transform::identity());
            scene.set_renderable(node, Some(Renderable::new(MeshHandle(1), MaterialHandle(1))))?;
            self.node = Some(node);
            self.initialized += 1;
            Ok(())
        }

        fn update(&mut self, frame: &mut FrameContext<'_>) -> Result<(), AppError> {
            let time = frame.time();
            self.seen.push(time);
            if self.fail_at == Some(time.frame) {
                return Err(AppError::Custom("scripted failure".to_string()));
            }

            let node = self.node.ok_or_else(|| AppError::Custom("not initialized".to_string()))?;
            if let Some(transform) = frame.scene.transform_mut(node) {
                transform.position = Vec3::new(time.frame as f32, 0.0, 0.0);
            }
            if self.stop_at == Some(time.frame) {
                frame.request_stop();
                assert!(frame.stop_requested());
            }
            Ok(())
        }

        fn cleanup(&mut self, _scene: &mut SceneGraph) {
            self.cleanups += 1;
        }
    }

    fn fixture() -> (SceneGraph, Camera, HeadlessRenderer, ManualTimeSource) {
        (
            SceneGraph::new(),
            Camera::default(),
            HeadlessRenderer::with_history(16),
            ManualTimeSource::new(),
        )
    }

    #[test]
    fn test_stop_during_update_finishes_frame_and_schedules_no_more() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover {
            stop_at: Some(5),
            ..Mover::default()
        };

        {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time.clone());
            render_loop.start().unwrap();

            for _ in 0..4 {
                time.advance(Duration::from_millis(16));
                assert_eq!(render_loop.frame().unwrap(), FrameStatus::Continue);
            }
            time.advance(Duration::from_millis(16));
            assert_eq!(render_loop.frame().unwrap(), FrameStatus::Stopped);
            assert_eq!(render_loop.state(), LoopState::Stopped);

            assert!(matches!(render_loop.frame(), Err(LoopError::NotRunning)));
            assert!(matches!(render_loop.start(), Err(LoopError::Terminated)));
        }

        assert_eq!(app.seen.len(), 5);
        assert_eq!(app.cleanups, 1);
        assert_eq!(renderer.frames_rendered(), 5);

        // Frame 5 was propagated and rendered after the stop request
        let last = renderer.last_frame().unwrap();
        assert_eq!(last.draw_list[0].world.translation_part(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_render_sees_this_frames_update() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover::default();

        {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time.clone());
            render_loop.start().unwrap();
            for _ in 0..3 {
                time.advance(Duration::from_millis(10));
                render_loop.frame().unwrap();
            }
            render_loop.stop();
        }

        let xs: Vec<f32> = renderer
            .history()
            .iter()
            .map(|record| record.draw_list[0].world.translation_part().x)
            .collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert_eq!(app.cleanups, 1);
    }

    #[test]
    fn test_elapsed_is_monotonic_with_jittery_host_clock() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover::default();

        {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time.clone());
            time.set(Duration::from_millis(1000));
            render_loop.start().unwrap();

            for stamp in [1016, 1016, 1008, 1040, 990, 1050] {
                time.set(Duration::from_millis(stamp));
                render_loop.frame().unwrap();
            }
        }

        let mut previous = Duration::ZERO;
        for seen in &app.seen {
            assert!(seen.elapsed >= previous);
            previous = seen.elapsed;
        }
        assert_eq!(app.seen[0].delta, Duration::from_millis(16));
        assert_eq!(app.seen[1].delta, Duration::ZERO);
        assert_eq!(app.seen[2].delta, Duration::ZERO);
        assert_eq!(previous, Duration::from_millis(50));
    }

    #[test]
    fn test_resize_applies_at_next_frame_boundary() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover::default();

        {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time.clone());
            render_loop.on_resize(800, 600);
            render_loop.start().unwrap();
            assert_eq!(render_loop.renderer().viewport(), (800, 600));

            render_loop.on_resize(1600, 400);
            assert!((render_loop.camera().aspect() - 800.0 / 600.0).abs() < 1e-6);

            render_loop.frame().unwrap();
            assert!((render_loop.camera().aspect() - 4.0).abs() < 1e-6);
            assert_eq!(render_loop.renderer().viewport(), (1600, 400));

            let projection = *render_loop.camera().projection_matrix();
            render_loop.on_resize(0, 400);
            render_loop.frame().unwrap();
            assert_eq!(*render_loop.camera().projection_matrix(), projection);
            assert_eq!(render_loop.renderer().viewport(), (1600, 400));
        }

        assert_eq!(renderer.viewport_changes(), 2);
    }

    #[test]
    fn test_render_failure_is_reported_and_loop_keeps_running() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover::default();
        renderer.fail_next_frame("device lost");

        {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time.clone());
            render_loop.start().unwrap();

            assert!(matches!(render_loop.frame(), Err(LoopError::Render(_))));
            assert!(render_loop.is_running());
            assert_eq!(render_loop.frame().unwrap(), FrameStatus::Continue);
            assert_eq!(render_loop.stats().frames_rendered, 1);
        }

        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn test_update_failure_skips_render() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover {
            fail_at: Some(2),
            ..Mover::default()
        };

        {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time.clone());
            render_loop.start().unwrap();
            render_loop.frame().unwrap();
            assert!(matches!(render_loop.frame(), Err(LoopError::Application(_))));
            render_loop.frame().unwrap();
        }

        assert_eq!(renderer.frames_rendered(), 2);
    }

    #[test]
    fn test_run_with_paced_scheduler_stops_after_budget() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover::default();
        let mut scheduler = PacedScheduler::new(None, Some(3));

        let stats = {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time.clone());
            let stats = render_loop.run(&mut scheduler).unwrap();
            assert_eq!(render_loop.state(), LoopState::Stopped);
            stats
        };

        assert_eq!(stats.frames_rendered, 3);
        assert_eq!(stats.last_draw_items, 1);
        assert_eq!(scheduler.delivered(), 3);
        assert_eq!(app.initialized, 1);
        assert_eq!(app.cleanups, 1);
    }

    /// Spawns a root, then fails
    struct FailingInit {
        attempts: usize,
    }

    impl Application for FailingInit {
        fn initialize(&mut self, scene: &mut SceneGraph, _camera: &mut Camera) -> Result<(), AppError> {
            self.attempts += 1;
            scene.spawn_root(Transform::identity());
            Err(AppError::Custom("missing asset".to_string()))
        }

        fn update(&mut self, _frame: &mut FrameContext<'_>) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_start_is_not_retried() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = FailingInit { attempts: 0 };

        {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time);
            assert!(matches!(render_loop.start(), Err(LoopError::Application(_))));
            assert_eq!(render_loop.state(), LoopState::Stopped);
            assert!(matches!(render_loop.start(), Err(LoopError::Terminated)));
            assert!(matches!(render_loop.frame(), Err(LoopError::NotRunning)));
            assert_eq!(render_loop.scene().roots().len(), 1);
        }

        assert_eq!(app.attempts, 1);
        assert_eq!(renderer.frames_rendered(), 0);
    }

    #[test]
    fn test_lights_reach_the_renderer() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover::default();
        let lamp = scene.spawn_root(Transform::from_position(Vec3::new(-1.0, 2.0, 4.0)));
        scene.set_light(lamp, Some(Light::white())).unwrap();

        let stats = {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time);
            render_loop.start().unwrap();
            render_loop.frame().unwrap();
            render_loop.stats()
        };

        assert_eq!(stats.last_lights, 1);
        let last = renderer.last_frame().unwrap();
        assert_eq!(last.lights.len(), 1);
        assert_eq!(last.lights[0].node, lamp);
        assert_eq!(last.lights[0].position(), Vec3::new(-1.0, 2.0, 4.0));
        assert_eq!(last.draw_list.len(), 1);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover::default();

        let mut render_loop = RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time);
        render_loop.start().unwrap();
        assert!(matches!(render_loop.start(), Err(LoopError::AlreadyRunning)));
    }

    #[test]
    fn test_dropping_running_loop_cleans_up() {
        let (mut scene, mut camera, mut renderer, time) = fixture();
        let mut app = Mover::default();

        {
            let mut render_loop =
                RenderLoop::with_time_source(&mut app, &mut scene, &mut camera, &mut renderer, time);
            render_loop.start().unwrap();
            render_loop.frame().unwrap();
        }

        assert_eq!(app.cleanups, 1);
    }

    #[test]
    fn test_paced_scheduler_respects_frame_budget() {
        let mut scheduler = PacedScheduler::from_config(&EngineConfig::new().with_target_fps(Some(1000)).with_max_frames(2));
        assert!(scheduler.wait_for_frame());
        assert!(scheduler.wait_for_frame());
        assert!(!scheduler.wait_for_frame());
    }
}
