//! Per-frame orchestration: executing a job each frame and presenting its output.
//!
//! The [`FrameDriver`] is the owner of the rendering session's [`FrameContext`]. Once per
//! frame it submits a [`Job`] for execution and hands the resolved presentable output to a
//! [`PresentSink`], the narrow interface behind which the windowing/presentation
//! collaborator lives. The driver works equally well with a job rebuilt from scratch every
//! frame and with a persistent job whose topology is static: the job's own order cache
//! takes care of not re-sorting an unchanged graph.
//!
//! # Example
//!
//! ```
//! use framegraph::prelude::*;
//!
//! let clear = TaskBuilder::new("clear")
//!     .outputs(1)
//!     .execute_fn(|resources: &mut TaskResources, _: &mut ()| {
//!         resources.bind_output(0, ResourceView::new("backbuffer", ()))?;
//!         Ok(())
//!     })
//!     .build_shared();
//!
//! let mut job = Job::new();
//! let clear_id = job.add_task(&clear);
//! job.set_presentable_output(clear_id, SlotSide::Output, 0)?;
//!
//! // A sink that would normally blit to the swapchain.
//! let mut driver = FrameDriver::new(|_frame: u64, _view: &ResourceView| Ok(()));
//! driver.render_frame(&mut job, &mut ())?;
//! driver.render_frame(&mut job, &mut ())?;
//! assert_eq!(driver.context().frame_index(), 2);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Result;

use crate::core::context::FrameContext;
use crate::graph::job::Job;
use crate::graph::resource::ResourceView;

/// Receives the presentable output of each executed frame. Implemented by the
/// presentation collaborator; how the view reaches the screen is its business entirely.
pub trait PresentSink {
    /// Present the resolved view for the given frame.
    fn present(&mut self, frame_index: u64, view: &ResourceView) -> Result<()>;
}

impl<F> PresentSink for F
where
    F: FnMut(u64, &ResourceView) -> Result<()>,
{
    /// Present the frame by calling the given function.
    fn present(&mut self, frame_index: u64, view: &ResourceView) -> Result<()> {
        self(frame_index, view)
    }
}

/// Drives job execution once per frame on the caller's thread.
#[derive(Debug)]
pub struct FrameDriver<S: PresentSink> {
    context: FrameContext,
    sink: S,
}

impl<S: PresentSink> FrameDriver<S> {
    /// Create a driver for a fresh rendering session.
    pub fn new(sink: S) -> Self {
        FrameDriver {
            context: FrameContext::new(),
            sink,
        }
    }

    /// Get the session context.
    pub fn context(&self) -> &FrameContext {
        &self.context
    }

    /// Execute the job, hand its presentable output to the sink and advance to the next
    /// frame. A failed execution or presentation is a failed frame: the error propagates
    /// and the frame index does not advance.
    pub fn render_frame<U>(&mut self, job: &mut Job<'_, U>, user_data: &mut U) -> Result<()> {
        let view = job.execute(&mut self.context, user_data)?;
        self.sink.present(self.context.frame_index(), &view)?;
        trace!(
            "Presented `{}` for frame {} ({} tasks executed)",
            view.name(),
            self.context.frame_index(),
            self.context.tasks_executed()
        );
        self.context.advance_frame();
        Ok(())
    }

    /// Tear the driver down, returning the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
