//! The frame graph proper: tasks, jobs and the scheduler that runs them.
//!
//! A [`Task`](task::Task) is an immutable descriptor of one unit of rendering work: a name
//! for diagnostics, a fixed number of input and output slots addressed by index, and an
//! opaque execution callback. Collaborators build tasks with a
//! [`TaskBuilder`](task::TaskBuilder) and keep ownership of them; a [`Job`](job::Job) only
//! registers a shared reference.
//!
//! A job is built incrementally: register tasks with [`Job::add_task`](job::Job::add_task),
//! declare producer/consumer edges with [`Job::connect`](job::Job::connect), and mark the
//! single presentable output with
//! [`Job::set_presentable_output`](job::Job::set_presentable_output). Connections are
//! validated eagerly for slot bounds and the one-producer-per-input rule, but acyclicity is
//! deliberately *not* checked until execution, so wiring may be declared in any order while
//! the graph is still taking shape.
//!
//! Executing a job computes a topological order over the tasks (ties between unordered
//! tasks broken by registration order, so the order is deterministic), walks it strictly
//! sequentially, hands every callback its resolved inputs, records the outputs it binds,
//! and finally resolves the presentable designation to the [`ResourceView`](resource::ResourceView)
//! that gets handed to the presentation path.
//!
//! # Example
//!
//! ```
//! use framegraph::prelude::*;
//!
//! let blur = TaskBuilder::new("blur")
//!     .inputs(1)
//!     .outputs(1)
//!     .execute_fn(|resources: &mut TaskResources, _: &mut ()| {
//!         // A real pass would issue GPU work here; the graph only cares that the
//!         // output slot ends up bound.
//!         let blurred = ResourceView::new("blurred", ());
//!         resources.bind_output(0, blurred)?;
//!         Ok(())
//!     })
//!     .build_shared();
//!
//! let mut job = Job::new();
//! let blur_id = job.add_task(&blur);
//! job.set_presentable_output(blur_id, SlotSide::Output, 0)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Through the [`GraphViz`](job::GraphViz) trait, a job's dependency graph can be exported
//! as a graphviz-compatible dot string for debugging.

pub mod job;
pub mod resource;
pub mod task;

pub(crate) mod schedule;
