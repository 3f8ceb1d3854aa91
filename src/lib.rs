//! Frame graph construction, scheduling and execution for per-frame rendering work.
//!
//! A frame's worth of rendering is rarely one monolithic blob of commands. It is a set of
//! cooperating stages (a background pass, a ray-marched scene pass, downsampling, blur, a
//! final composition) where each stage consumes images produced by earlier stages. This crate
//! models that as a [`Job`]: a directed acyclic graph of [`Task`]s whose output slots are
//! wired to other tasks' input slots through explicit [`Job::connect`] calls.
//!
//! The graph core deliberately knows nothing about any graphics API. The payload that flows
//! along a connection is an opaque [`ResourceView`] handle; each task's work is an opaque
//! callback supplied by whoever built the task. What the crate *does* own is the hard part:
//! validating the wiring (slot bounds, one producer per input, no cycles), computing a
//! deterministic execution order, driving the callbacks in that order, and resolving the one
//! designated presentable output at the end.
//!
//! # Example
//!
//! ```
//! use framegraph::prelude::*;
//!
//! // A task that produces one image and a task that consumes it.
//! let scene = TaskBuilder::new("scene")
//!     .outputs(1)
//!     .execute_fn(|resources: &mut TaskResources, _: &mut ()| {
//!         resources.bind_output(0, ResourceView::new("scene color", 0xAAu32))?;
//!         Ok(())
//!     })
//!     .build_shared();
//! let compose = TaskBuilder::new("compose")
//!     .inputs(1)
//!     .outputs(1)
//!     .require_input(0)?
//!     .execute_fn(|resources: &mut TaskResources, _: &mut ()| {
//!         let color = resources.input(0).unwrap().clone();
//!         resources.bind_output(0, color)?;
//!         Ok(())
//!     })
//!     .build_shared();
//!
//! // Wire them into a job and execute it.
//! let mut job = Job::new();
//! let scene = job.add_task(&scene);
//! let compose_id = job.add_task(&compose);
//! job.connect(scene, 0, compose_id, 0)?;
//! job.set_presentable_output(compose_id, SlotSide::Output, 0)?;
//!
//! let mut context = FrameContext::new();
//! let presented = job.execute(&mut context, &mut ())?;
//! assert_eq!(presented.downcast_ref::<u32>(), Some(&0xAA));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! For per-frame orchestration (executing a job once per frame and handing the presentable
//! output to a presentation collaborator), see the [`frame`] module. For details on wiring
//! rules and the execution contract, see the [`graph`] module documentation.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod core;
pub mod frame;
pub mod graph;
