//! Shared helpers for the frame graph test suite.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use framegraph::prelude::*;

/// Records the order in which task callbacks ran.
pub type ExecutionLog = Rc<RefCell<Vec<&'static str>>>;

pub fn new_log() -> ExecutionLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Build a task that appends its name to `log` when executed and binds a view named
/// `<name>.<slot>` (carrying the slot index) to every one of its output slots.
pub fn tracked_task(
    name: &'static str,
    inputs: usize,
    outputs: usize,
    log: &ExecutionLog,
) -> Arc<Task<'static>> {
    let log = log.clone();
    TaskBuilder::new(name)
        .inputs(inputs)
        .outputs(outputs)
        .execute_fn(move |resources: &mut TaskResources, _: &mut ()| {
            log.borrow_mut().push(name);
            for slot in 0..resources.num_outputs() {
                resources.bind_output(slot, ResourceView::new(format!("{name}.{slot}"), slot))?;
            }
            Ok(())
        })
        .build_shared()
}

/// Build the five-node scenario used across several tests:
/// background and julia have no inputs, downsample reads julia, blur reads downsample and
/// compose reads julia (color + depth), blur and background. Compose output 0 is
/// presentable.
pub fn five_node_job(log: &ExecutionLog) -> anyhow::Result<Job<'static>> {
    let background = tracked_task("background", 0, 1, log);
    let julia = tracked_task("julia", 0, 2, log);
    let downsample = tracked_task("downsample", 1, 1, log);
    let blur = tracked_task("blur", 1, 1, log);
    let compose = tracked_task("compose", 4, 1, log);

    let mut job = Job::new();
    let background = job.add_task(&background);
    let julia = job.add_task(&julia);
    let downsample = job.add_task(&downsample);
    let blur = job.add_task(&blur);
    let compose = job.add_task(&compose);

    job.connect(julia, 0, downsample, 0)?;
    job.connect(downsample, 0, blur, 0)?;
    job.connect(julia, 0, compose, 0)?;
    job.connect(blur, 0, compose, 1)?;
    job.connect(background, 0, compose, 2)?;
    job.connect(julia, 1, compose, 3)?;
    job.set_presentable_output(compose, SlotSide::Output, 0)?;

    Ok(job)
}
