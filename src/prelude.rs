//! Re-exports the most commonly used types in the crate.

pub use crate::core::context::FrameContext;
pub use crate::core::error::Error;
pub use crate::frame::{FrameDriver, PresentSink};
pub use crate::graph::job::{
    Connection, ConnectionId, GraphViz, Job, PresentTarget, SlotSide, TaskId, TaskNode,
};
pub use crate::graph::resource::ResourceView;
pub use crate::graph::task::{
    EmptyTaskExecutor, Task, TaskBuilder, TaskExecutor, TaskResources,
};
