//! Exposes the framegraph error type

use thiserror::Error;

use crate::graph::job::{ConnectionId, TaskId};

/// Error type that framegraph can return.
#[derive(Error, Debug)]
pub enum Error {
    /// Task id does not refer to a task registered in this job.
    #[error("Task {0} not found in job.")]
    TaskNotFound(TaskId),
    /// Tried to connect from an output slot the producing task does not declare.
    #[error("Output slot {slot} out of bounds for task `{task}` with {count} outputs.")]
    OutputOutOfBounds {
        task: String,
        slot: usize,
        count: usize,
    },
    /// Tried to connect into an input slot the consuming task does not declare.
    #[error("Input slot {slot} out of bounds for task `{task}` with {count} inputs.")]
    InputOutOfBounds {
        task: String,
        slot: usize,
        count: usize,
    },
    /// An input slot already has a producer. Disconnect the existing connection first if the
    /// rewiring is intentional.
    #[error("Input slot {slot} of task `{task}` already has a producer.")]
    InputAlreadyConnected { task: String, slot: usize },
    /// A task cannot consume its own output in a single hop.
    #[error("Task `{0}` cannot be connected to itself.")]
    SelfReference(String),
    /// Connection id does not refer to a live connection in this job.
    #[error("Connection {0} not found in job.")]
    ConnectionNotFound(ConnectionId),
    /// The job's connections form a cycle and no execution order exists.
    #[error("Frame graph contains a cycle involving tasks: {0}.")]
    GraphHasCycle(String),
    /// Execution was requested without designating a presentable output.
    #[error("No presentable output designated for this job.")]
    NoPresentableOutput,
    /// A task marked an input as required, but execution reached it with the slot unbound.
    #[error("Required input slot {slot} of task `{task}` has no bound resource.")]
    RequiredInputUnbound { task: String, slot: usize },
    /// The presentable slot resolved to no resource after all tasks executed.
    #[error("Presentable slot {slot} of task `{task}` was never produced.")]
    PresentableUnresolved { task: String, slot: usize },
    /// A callback bound an output slot past its task's declared output count.
    #[error("Callback bound output slot {slot}, but the task declares {count} outputs.")]
    OutputSlotOutOfBounds { slot: usize, count: usize },
    /// Uncategorized error.
    #[error("Uncategorized error: `{0}`")]
    Uncategorized(&'static str),
}
