//! Timelock enforcement between queueing and execution.

use fundament_types::Height;

/// A queued proposal's timelock window.
#[derive(Debug, Clone, Copy)]
pub struct TimelockEntry {
    /// Height when the proposal was queued
    pub queued_at: Height,
    /// Required wait, in blocks, from the category
    pub delay: u64,
}

impl TimelockEntry {
    /// Create an entry for a proposal queued at `queued_at`.
    pub fn new(queued_at: Height, delay: u64) -> Self {
        Self { queued_at, delay }
    }

    /// First height at which execution is permitted.
    pub fn executable_at(&self) -> Height {
        self.queued_at.saturating_add(self.delay)
    }

    /// Whether the mandatory wait has elapsed.
    pub fn is_ready(&self, now: Height) -> bool {
        now >= self.executable_at()
    }
}
