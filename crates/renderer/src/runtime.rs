use std::time::{Duration, Instant};

use tracing::trace;

/// At most one outstanding frame request, optionally rate-limited.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    pending: bool,
    min_interval: Option<Duration>,
    last_rendered: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(max_fps: Option<f32>) -> Self {
        let min_interval = max_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            pending: false,
            min_interval,
            last_rendered: None,
        }
    }

    /// Requests the next frame. Returns false when one was already pending.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    /// Consumes the pending request, if any.
    pub fn take(&mut self) -> bool {
        self.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// True when a frame is pending and the FPS cap (if any) allows it now.
    pub fn ready_for_frame(&self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        match self.next_deadline() {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    /// Earliest instant the pending frame may be drawn under the cap.
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.pending {
            return None;
        }
        let (interval, last) = (self.min_interval?, self.last_rendered?);
        Some(last + interval)
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        trace!("frame rendered");
        self.last_rendered = Some(now);
    }
}
