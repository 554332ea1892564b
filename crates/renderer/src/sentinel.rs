use std::time::{Duration, Instant};

use tracing::trace;

/// Turns raw container notifications into debounced resize instructions and
/// visibility transitions.
#[derive(Debug, Clone)]
pub struct Sentinel {
    debounce: Duration,
    threshold: f32,
    pending_resize: Option<Instant>,
    visible: Option<bool>,
}

impl Sentinel {
    pub fn new(debounce: Duration, threshold: f32) -> Self {
        Self {
            debounce,
            threshold,
            pending_resize: None,
            visible: None,
        }
    }

    /// Records a size-change notification, restarting the quiet window.
    pub fn observe_resize(&mut self, now: Instant) {
        self.pending_resize = Some(now + self.debounce);
        trace!(debounce_ms = self.debounce.as_millis(), "resize debounce armed");
    }

    /// Returns true exactly once per quiet window, when it has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_resize {
            Some(deadline) if now >= deadline => {
                self.pending_resize = None;
                true
            }
            _ => false,
        }
    }

    /// When the armed debounce timer fires, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending_resize
    }

    /// Drops any armed timer.
    pub fn clear(&mut self) {
        self.pending_resize = None;
    }

    /// Feeds an intersection ratio in [0, 1]. Returns the new visibility when it
    /// flips (or on the first report), `None` otherwise.
    pub fn observe_intersection(&mut self, ratio: f32) -> Option<bool> {
        let visible = ratio >= self.threshold && ratio > 0.0;
        if self.visible == Some(visible) {
            return None;
        }
        self.visible = Some(visible);
        Some(visible)
    }

    pub fn last_visibility(&self) -> Option<bool> {
        self.visible
    }
}
