//! Headless renderer
//!
//! Produces no pixels. It records what it was asked to draw so launchers can
//! report frame statistics and tests can inspect exactly what the loop
//! submitted.

use super::renderer::{RenderError, RenderResult, Renderer};
use crate::foundation::math::Mat4;
use crate::scene::{DrawItem, LightItem};

/// Snapshot of one submitted frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Draw list as submitted
    pub draw_list: Vec<DrawItem>,
    /// Lights as submitted
    pub lights: Vec<LightItem>,
    /// View-projection matrix as submitted
    pub view_projection: Mat4,
    /// Viewport size at submission time
    pub viewport: (u32, u32),
}

/// Renderer that records submissions instead of rasterizing them
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    viewport: (u32, u32),
    viewport_changes: usize,
    frames_rendered: u64,
    history: Vec<FrameRecord>,
    history_limit: usize,
    pending_failure: Option<String>,
}

impl HeadlessRenderer {
    /// Create a renderer that only counts frames
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer that keeps the last `limit` frames
    pub fn with_history(limit: usize) -> Self {
        Self {
            history_limit: limit,
            ..Self::default()
        }
    }

    /// Make the next `render_frame` call fail with a backend error
    pub fn fail_next_frame(&mut self, reason: impl Into<String>) {
        self.pending_failure = Some(reason.into());
    }

    /// Current viewport size
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Number of `configure_viewport` calls received
    pub fn viewport_changes(&self) -> usize {
        self.viewport_changes
    }

    /// Number of frames successfully rendered
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Recorded frames, oldest first
    pub fn history(&self) -> &[FrameRecord] {
        &self.history
    }

    /// Most recent recorded frame
    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.history.last()
    }
}

impl Renderer for HeadlessRenderer {
    fn configure_viewport(&mut self, width: u32, height: u32) {
        log::debug!("Headless viewport set to {}x{}", width, height);
        self.viewport = (width, height);
        self.viewport_changes += 1;
    }

    fn render_frame(&mut self, draw_list: &[DrawItem], lights: &[LightItem], view_projection: &Mat4) -> RenderResult<()> {
        if let Some(reason) = self.pending_failure.take() {
            return Err(RenderError::Backend(reason));
        }

        self.frames_rendered += 1;
        if self.history_limit > 0 {
            if self.history.len() == self.history_limit {
                self.history.remove(0);
            }
            self.history.push(FrameRecord {
                draw_list: draw_list.to_vec(),
                lights: lights.to_vec(),
                view_projection: *view_projection,
                viewport: self.viewport,
            });
        }

        log::trace!(
            "Headless frame {}: {} draw items, {} lights",
            self.frames_rendered,
            draw_list.len(),
            lights.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let mut renderer = HeadlessRenderer::with_history(2);
        for _ in 0..5 {
            renderer.render_frame(&[], &[], &Mat4::identity()).unwrap();
        }

        assert_eq!(renderer.frames_rendered(), 5);
        assert_eq!(renderer.history().len(), 2);
    }

    #[test]
    fn test_injected_failure_applies_once() {
        let mut renderer = HeadlessRenderer::new();
        renderer.fail_next_frame("surface lost");

        assert!(matches!(
            renderer.render_frame(&[], &[], &Mat4::identity()),
            Err(RenderError::Backend(_))
        ));
        assert!(renderer.render_frame(&[], &[], &Mat4::identity()).is_ok());
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn test_boxed_renderer_forwards_calls() {
        let mut renderer: Box<dyn Renderer> = Box::new(HeadlessRenderer::new());
        renderer.configure_viewport(320, 240);
        renderer.render_frame(&[], &[], &Mat4::identity()).unwrap();

        let mut failing: Box<HeadlessRenderer> = Box::new(HeadlessRenderer::new());
        failing.fail_next_frame("device lost");
        let result = Renderer::render_frame(&mut failing, &[], &[], &Mat4::identity());
        assert!(matches!(result, Err(RenderError::Backend(reason)) if reason == "device lost"));
    }

    #[test]
    fn test_viewport_is_recorded() {
        let mut renderer = HeadlessRenderer::new();
        renderer.configure_viewport(800, 600);

        assert_eq!(renderer.viewport(), (800, 600));
        assert_eq!(renderer.viewport_changes(), 1);
    }
}
