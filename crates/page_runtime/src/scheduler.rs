use core::time::Duration;

/// Frame pacer on the page's virtual clock.
///
/// Frames land on multiples of the budget and never twice at the same
/// instant. Requests for a frame made while one is already pending are
/// coalesced into it.
pub struct FrameScheduler {
    /// The virtual time between two frames, in milliseconds.
    budget_ms: u64,
    /// Timestamp of the most recent frame that ran.
    last_frame_start: Option<u64>,
    /// Number of frame requests folded into an already pending frame.
    coalesced_count: u64,
    /// Number of frames run so far.
    frame_count: u64,
}

impl FrameScheduler {
    /// Creates a new frame scheduler with the specified time budget.
    ///
    /// # Arguments
    ///
    /// * `budget` - The virtual duration between frames (at least 1ms).
    #[inline]
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            budget_ms: (budget.as_millis() as u64).max(1),
            last_frame_start: None,
            coalesced_count: 0,
            frame_count: 0,
        }
    }

    /// Returns the configured frame budget duration.
    #[inline]
    #[must_use]
    pub const fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    /// The time of the first frame boundary at or after `now` that has not run yet.
    #[inline]
    #[must_use]
    pub fn next_frame_at(&self, now: u64) -> u64 {
        let candidate = now.div_ceil(self.budget_ms) * self.budget_ms;
        match self.last_frame_start {
            Some(last) if candidate <= last => last + self.budget_ms,
            _ => candidate,
        }
    }

    /// Records that a frame ran at `at`.
    #[inline]
    pub fn begin_frame(&mut self, at: u64) {
        self.last_frame_start = Some(at);
        self.frame_count = self.frame_count.saturating_add(1);
    }

    /// Increments the count of requests folded into a pending frame.
    #[inline]
    pub const fn incr_coalesced(&mut self) {
        self.coalesced_count = self.coalesced_count.saturating_add(1);
    }

    /// Returns how many frame requests were coalesced since creation.
    #[inline]
    #[must_use]
    pub const fn coalesced(&self) -> u64 {
        self.coalesced_count
    }

    /// Returns how many frames ran since creation.
    #[inline]
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frame_count
    }
}
