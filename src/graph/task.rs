//! This module mainly exposes the [`TaskBuilder`] struct, used for correctly defining tasks
//! for a [`Job`](crate::graph::job::Job).
//!
//! A task declares a fixed number of input and output slots at construction time and an
//! executor that is invoked once per job execution. Slots are addressed by zero-based index
//! for the lifetime of the task; inputs are optional unless marked required. The task itself
//! is immutable once built, which is what makes it safe to share one task across several
//! jobs (the common case for stable passes like a blur that is reused every frame).
//!
//! # Example
//!
//! A downsample stage with one required input and one output:
//!
//! ```
//! use framegraph::prelude::*;
//!
//! let downsample = TaskBuilder::new("downsample")
//!     .inputs(1)
//!     .outputs(1)
//!     .require_input(0)?
//!     .execute_fn(|resources: &mut TaskResources, _: &mut ()| {
//!         let full_res = resources.input(0).unwrap();
//!         // ... dispatch the downsample using `full_res` ...
//!         let half_res = ResourceView::new(format!("{}/2", full_res.name()), ());
//!         resources.bind_output(0, half_res)?;
//!         Ok(())
//!     })
//!     .build_shared();
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! The second executor argument is job-wide user data, passed through untouched from
//! [`Job::execute`](crate::graph::job::Job::execute). It defaults to `()` and is the place
//! for per-frame state (camera, timings) shared by every task in the job.

use std::sync::Arc;

use anyhow::Result;

use crate::core::error::Error;
use crate::graph::resource::ResourceView;

/// The slot values a task callback works with during one job execution.
///
/// Inputs hold whatever the connected producers bound, resolved by the scheduler before the
/// callback runs; unconnected or unproduced slots are `None`. Outputs start out unbound and
/// are published with [`TaskResources::bind_output`] so that downstream tasks can consume
/// them.
pub struct TaskResources<'a> {
    pub(crate) inputs: &'a [Option<ResourceView>],
    pub(crate) outputs: &'a mut [Option<ResourceView>],
}

impl TaskResources<'_> {
    /// Get the resolved resource for an input slot. Returns `None` for unconnected slots,
    /// slots whose producer bound nothing, and out-of-range indices.
    pub fn input(&self, slot: usize) -> Option<&ResourceView> {
        self.inputs.get(slot).and_then(|view| view.as_ref())
    }

    /// Number of input slots the task declared.
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output slots the task declared.
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Publish a resource for an output slot, making it visible to downstream tasks.
    /// Binding the same slot twice keeps the most recent view.
    /// # Errors
    /// * Fails if `slot` is not below the task's declared output count.
    pub fn bind_output(&mut self, slot: usize, view: ResourceView) -> Result<()> {
        let count = self.outputs.len();
        let bound = self
            .outputs
            .get_mut(slot)
            .ok_or(Error::OutputSlotOutOfBounds {
                slot,
                count,
            })?;
        *bound = Some(view);
        Ok(())
    }
}

/// Defines the executor invoked when a task's turn in the job comes up.
///
/// `U` is the job-wide user data type. Executors are called through a shared reference
/// because one task may be registered in several jobs; state a stage mutates while
/// executing belongs in its own interior-mutable captures, not in the task.
pub trait TaskExecutor<U = ()> {
    /// Perform this task's work with its resolved inputs, binding any outputs it produces.
    fn execute(&self, resources: &mut TaskResources, user_data: &mut U) -> Result<()>;
}

impl<U, F> TaskExecutor<U> for F
where
    F: Fn(&mut TaskResources, &mut U) -> Result<()>,
{
    /// Perform this task's work by calling the given function.
    fn execute(&self, resources: &mut TaskResources, user_data: &mut U) -> Result<()> {
        self(resources, user_data)
    }
}

pub(crate) type BoxedTaskFn<'cb, U> = Box<dyn TaskExecutor<U> + 'cb>;

/// A task executor that does nothing. Useful for structural tasks that only exist to
/// anchor connections, and as the default before an executor is set on a builder.
pub struct EmptyTaskExecutor;

impl EmptyTaskExecutor {
    /// Creates an empty task executor
    pub fn new() -> Self {
        Self {}
    }

    /// Create a new empty task executor in a [`Box`]
    pub fn new_boxed() -> Box<Self> {
        Box::new(Self::new())
    }
}

impl Default for EmptyTaskExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> TaskExecutor<U> for EmptyTaskExecutor {
    /// Execute the empty task executor by doing nothing.
    fn execute(&self, _resources: &mut TaskResources, _user_data: &mut U) -> Result<()> {
        Ok(())
    }
}

/// An immutable unit of rendering work. You can obtain one using a [`TaskBuilder`].
///
/// Whoever builds a task owns it; a job holds only a shared reference for as long as the
/// task is registered. Dropping the last reference releases the executor and everything it
/// captured.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Task<'cb, U = ()> {
    pub(crate) name: String,
    pub(crate) num_inputs: usize,
    pub(crate) num_outputs: usize,
    pub(crate) required_inputs: Vec<bool>,
    #[derivative(Debug = "ignore")]
    pub(crate) execute: BoxedTaskFn<'cb, U>,
}

impl<U> Task<'_, U> {
    /// Get the task name. Diagnostics only, never used for lookup.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of input slots.
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Number of output slots.
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Returns true if the given input slot was marked required.
    pub fn input_required(&self, slot: usize) -> bool {
        self.required_inputs.get(slot).copied().unwrap_or(false)
    }
}

/// Used to create [`Task`] objects correctly.
/// # Example
/// See the [`task`](crate::graph::task) module level documentation.
pub struct TaskBuilder<'cb, U = ()> {
    inner: Task<'cb, U>,
}

impl<'cb, U> TaskBuilder<'cb, U> {
    /// Create a new task with no slots and an empty executor.
    pub fn new(name: impl Into<String>) -> Self {
        TaskBuilder {
            inner: Task {
                name: name.into(),
                num_inputs: 0,
                num_outputs: 0,
                required_inputs: vec![],
                execute: EmptyTaskExecutor::new_boxed(),
            },
        }
    }

    /// Set the number of input slots. Resets any required-input marks.
    pub fn inputs(mut self, count: usize) -> Self {
        self.inner.num_inputs = count;
        self.inner.required_inputs = vec![false; count];
        self
    }

    /// Set the number of output slots.
    pub fn outputs(mut self, count: usize) -> Self {
        self.inner.num_outputs = count;
        self
    }

    /// Mark an input slot as required. Execution fails before invoking the callback if a
    /// required slot is still unbound when the task's turn comes up.
    /// # Errors
    /// * Fails if `slot` is not below the input count set with [`TaskBuilder::inputs`].
    pub fn require_input(mut self, slot: usize) -> Result<Self> {
        let count = self.inner.num_inputs;
        let required = self
            .inner
            .required_inputs
            .get_mut(slot)
            .ok_or(Error::InputOutOfBounds {
                task: self.inner.name.clone(),
                slot,
                count,
            })?;
        *required = true;
        Ok(self)
    }

    /// Set the executor to be called when this task executes.
    pub fn executor(mut self, exec: impl TaskExecutor<U> + 'cb) -> Self {
        self.inner.execute = Box::new(exec);
        self
    }

    /// Set the executor to be called when this task executes. This method can be used to
    /// deduce types when a closure is used as a task executor.
    pub fn execute_fn<F>(mut self, exec: F) -> Self
    where
        F: Fn(&mut TaskResources, &mut U) -> Result<()> + 'cb,
    {
        self.inner.execute = Box::new(exec);
        self
    }

    /// Obtain a built [`Task`] object.
    pub fn build(self) -> Task<'cb, U> {
        self.inner
    }

    /// Obtain a built [`Task`] behind an [`Arc`], ready to be registered into jobs.
    pub fn build_shared(self) -> Arc<Task<'cb, U>> {
        Arc::new(self.inner)
    }
}
