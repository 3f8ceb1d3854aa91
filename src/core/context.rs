//! The frame graph context owned by the frame driver.
//!
//! Earlier engines of this kind tend to stash the rendering session's state in globals.
//! Here the session state is an explicit [`FrameContext`] value: the frame driver creates
//! one when the rendering session starts, passes it by reference into every job execution
//! and drops it when the session ends.

/// Per-session state threaded through job executions.
///
/// Holds the running frame index and statistics about the most recent job execution.
/// Task callbacks never see this type; it belongs to the orchestration layer.
#[derive(Debug, Default)]
pub struct FrameContext {
    frame_index: u64,
    tasks_executed: usize,
}

impl FrameContext {
    /// Create a context for a fresh rendering session, starting at frame zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the frame currently being built or executed.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Number of task callbacks invoked by the most recent job execution.
    pub fn tasks_executed(&self) -> usize {
        self.tasks_executed
    }

    /// Advance to the next frame. Called by the frame driver after presentation.
    pub fn advance_frame(&mut self) {
        self.frame_index += 1;
    }

    pub(crate) fn begin_job(&mut self) {
        self.tasks_executed = 0;
    }

    pub(crate) fn note_task_executed(&mut self) {
        self.tasks_executed += 1;
    }
}
