//! Execution-order computation and the sequential job walk.

use std::collections::HashMap;

use anyhow::Result;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::core::context::FrameContext;
use crate::core::error::Error;
use crate::graph::job::{Job, SlotSide, TaskId};
use crate::graph::resource::ResourceView;
use crate::graph::task::TaskResources;

/// Compute a total order over the job's tasks such that every producer precedes its
/// consumers. Kahn's algorithm, except that the next node picked is always the *ready*
/// node that was registered earliest, which makes the order deterministic for a given
/// construction sequence. Node indices in the dependency graph follow registration order.
pub(crate) fn topological_order<U>(job: &Job<'_, U>) -> Result<Vec<TaskId>> {
    let graph = job.dependency_graph();
    let count = graph.node_count();
    let mut indegree = (0..count)
        .map(|i| {
            graph
                .edges_directed(NodeIndex::new(i), Direction::Incoming)
                .count()
        })
        .collect::<Vec<usize>>();
    let mut scheduled = vec![false; count];
    let mut order = Vec::with_capacity(count);

    while let Some(index) = (0..count).find(|&i| !scheduled[i] && indegree[i] == 0) {
        scheduled[index] = true;
        let node = NodeIndex::new(index);
        order.push(*graph.node_weight(node).unwrap());
        for edge in graph.edges_directed(node, Direction::Outgoing) {
            indegree[edge.target().index()] -= 1;
        }
    }

    // A residual set with unsatisfied predecessors means the wiring is cyclic. A task
    // cannot consume data it has not produced yet in the same frame, so this job can
    // never run.
    if order.len() != count {
        let residual = (0..count)
            .filter(|&i| !scheduled[i])
            .map(|i| {
                let id = *graph.node_weight(NodeIndex::new(i)).unwrap();
                match job.task(id) {
                    Some(node) => node.task().name().to_owned(),
                    None => id.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        error!("Frame graph contains a cycle involving tasks: {}", residual);
        return Err(anyhow::Error::from(Error::GraphHasCycle(residual)));
    }

    Ok(order)
}

/// Walk the job once in execution order, invoking every task executor with its resolved
/// inputs, and resolve the presentable designation after the walk completes.
pub(crate) fn execute_job<'cb, U>(
    job: &mut Job<'cb, U>,
    context: &mut FrameContext,
    user_data: &mut U,
) -> Result<ResourceView> {
    // Catch a missing designation before any callback runs.
    job.presentable_output().ok_or(Error::NoPresentableOutput)?;
    let order = job.execution_order()?.to_vec();
    context.begin_job();
    debug!(
        "Executing job with {} tasks (frame {})",
        order.len(),
        context.frame_index()
    );

    // Outputs recorded per executed task, so downstream tasks can resolve them in their
    // own turn. Rebuilt from scratch on every execution.
    let mut produced: HashMap<TaskId, Vec<Option<ResourceView>>> = HashMap::new();
    for id in order {
        let node = job.require_node(id)?;
        let task = node.task();

        let mut inputs: Vec<Option<ResourceView>> = vec![None; task.num_inputs()];
        for connection in job.connections_into(id) {
            // The producer precedes this task in topological order, so its outputs are
            // already recorded. The individual slot may still be unbound if the producer
            // chose not to bind it.
            if let Some(outputs) = produced.get(&connection.src) {
                inputs[connection.dst_input] =
                    outputs.get(connection.src_output).cloned().flatten();
            }
        }

        // An unconnected input is not an error by itself; some inputs are optional side
        // data bound out-of-band. Required slots must be bound before the callback runs.
        for slot in 0..task.num_inputs() {
            if task.input_required(slot) && inputs[slot].is_none() {
                error!(
                    "Required input slot {} of task `{}` ({}) has no bound resource",
                    slot,
                    task.name(),
                    id
                );
                return Err(anyhow::Error::from(Error::RequiredInputUnbound {
                    task: task.name().to_owned(),
                    slot,
                }));
            }
        }

        let mut outputs: Vec<Option<ResourceView>> = vec![None; task.num_outputs()];
        {
            let mut resources = TaskResources {
                inputs: &inputs,
                outputs: &mut outputs,
            };
            trace!("Executing task `{}` ({})", task.name(), id);
            task.execute.execute(&mut resources, user_data)?;
        }
        context.note_task_executed();
        produced.insert(id, outputs);
    }

    resolve_presentable(job, &produced)
}

/// Resolve the presentable designation to the resource view that gets handed to the
/// presentation path. Runs only after every task in the order has executed.
fn resolve_presentable<U>(
    job: &Job<'_, U>,
    produced: &HashMap<TaskId, Vec<Option<ResourceView>>>,
) -> Result<ResourceView> {
    // Checked before execution started.
    let target = job.presentable_output().unwrap();
    let node = job.require_node(target.task)?;
    let view = match target.side {
        SlotSide::Output => produced
            .get(&target.task)
            .and_then(|outputs| outputs.get(target.slot).cloned().flatten()),
        SlotSide::Input => job.producer_of(target.task, target.slot).and_then(|c| {
            produced
                .get(&c.src)
                .and_then(|outputs| outputs.get(c.src_output).cloned().flatten())
        }),
    };
    view.ok_or_else(|| {
        error!(
            "Presentable slot {} of task `{}` ({}) was never produced",
            target.slot,
            node.task().name(),
            target.task
        );
        anyhow::Error::from(Error::PresentableUnresolved {
            task: node.task().name().to_owned(),
            slot: target.slot,
        })
    })
}
