//! The job module holds the frame graph container: registered tasks, the connection table
//! and the presentable-output designation.
//!
//! A job moves through a small lifecycle. While it is being built it accepts
//! [`add_task`](Job::add_task), [`connect`](Job::connect) and
//! [`set_presentable_output`](Job::set_presentable_output) in any order. The first call to
//! [`execute`](Job::execute) computes and caches the execution order; subsequent executions
//! reuse it. Any topology mutation (adding or releasing a task, connecting or
//! disconnecting) marks the cached order dirty rather than being rejected, so persistent
//! jobs can be rewired incrementally between frames and the order is lazily recomputed on
//! the next execution.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use anyhow::Result;
use petgraph::dot::Dot;
use petgraph::graph::{Graph, NodeIndex};

use crate::core::context::FrameContext;
use crate::core::error::Error;
use crate::graph::resource::ResourceView;
use crate::graph::schedule;
use crate::graph::task::Task;

/// Job-local handle to a registered task. Assigned sequentially by [`Job::add_task`] and
/// never reused within the same job, even after the task is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u32);

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a connection, returned by [`Job::connect`] to permit later removal or
/// rewiring through [`Job::disconnect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u32);

impl Display for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a presentable designation names a task's input slot or output slot.
///
/// The usual case is [`SlotSide::Output`]: some task's output is the final image. The
/// symmetric case designates a task *input* as receiving the externally presented surface,
/// which resolves to whatever the wired producer bound for that slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSide {
    Input,
    Output,
}

/// The designated presentable slot of a job.
#[derive(Debug, Clone, Copy)]
pub struct PresentTarget {
    pub(crate) task: TaskId,
    pub(crate) side: SlotSide,
    pub(crate) slot: usize,
}

impl PresentTarget {
    /// The task whose slot is presentable.
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Which side of the task the designation names.
    pub fn side(&self) -> SlotSide {
        self.side
    }

    /// The slot index on that side.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// A directed edge from one task's output slot to another task's input slot.
#[derive(Debug, Clone, Copy)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    pub(crate) src: TaskId,
    pub(crate) src_output: usize,
    pub(crate) dst: TaskId,
    pub(crate) dst_input: usize,
}

impl Connection {
    /// Get the connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The producing task.
    pub fn src(&self) -> TaskId {
        self.src
    }

    /// The producing task's output slot.
    pub fn src_output(&self) -> usize {
        self.src_output
    }

    /// The consuming task.
    pub fn dst(&self) -> TaskId {
        self.dst
    }

    /// The consuming task's input slot.
    pub fn dst_input(&self) -> usize {
        self.dst_input
    }
}

/// A task registered into a job: the job-local id plus a shared reference to the task.
/// The job never owns the task's resources, only this registration entry.
#[derive(Debug)]
pub struct TaskNode<'cb, U = ()> {
    pub(crate) id: TaskId,
    pub(crate) task: Arc<Task<'cb, U>>,
}

impl<'cb, U> TaskNode<'cb, U> {
    /// Get the job-local id of this node.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Get the registered task.
    pub fn task(&self) -> &Arc<Task<'cb, U>> {
        &self.task
    }
}

/// A frame graph: a set of registered tasks, the connections between their slots, and at
/// most one presentable-output designation.
///
/// `U` is the user data type passed through to every task executor during
/// [`Job::execute`].
pub struct Job<'cb, U = ()> {
    /// Registration order is preserved; it is the tie-break order for scheduling.
    nodes: Vec<TaskNode<'cb, U>>,
    connections: Vec<Connection>,
    /// Single-producer index over (consumer, input slot).
    bound_inputs: HashMap<(TaskId, usize), ConnectionId>,
    presentable: Option<PresentTarget>,
    next_task: u32,
    next_connection: u32,
    /// Cached execution order, invalidated by any topology mutation.
    cached_order: Option<Vec<TaskId>>,
}

impl<U> Default for Job<'_, U> {
    fn default() -> Self {
        Job {
            nodes: vec![],
            connections: vec![],
            bound_inputs: Default::default(),
            presentable: None,
            next_task: 0,
            next_connection: 0,
            cached_order: None,
        }
    }
}

impl<'cb, U> Job<'cb, U> {
    /// Create an empty job. Takes no resources beyond its own bookkeeping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task and return its job-local id. The job stores a shared reference;
    /// ownership of the task and everything its executor captured stays with the caller.
    pub fn add_task(&mut self, task: &Arc<Task<'cb, U>>) -> TaskId {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        trace!("Registered task `{}` as {}", task.name(), id);
        self.nodes.push(TaskNode {
            id,
            task: task.clone(),
        });
        self.cached_order = None;
        id
    }

    /// Declare that `dst`'s input slot consumes what `src` binds to its output slot.
    ///
    /// Slot bounds and the one-producer-per-input rule are checked eagerly and a rejected
    /// connection is not applied. Acyclicity is *not* checked here; cycles surface as an
    /// error when the job is executed, so connections may be declared in any order while
    /// building.
    /// # Errors
    /// * Fails if either task id is not registered in this job.
    /// * Fails if `src == dst` (a task cannot consume its own output).
    /// * Fails if either slot index is out of bounds for its task.
    /// * Fails if the destination input already has a producer.
    pub fn connect(
        &mut self,
        src: TaskId,
        src_output: usize,
        dst: TaskId,
        dst_input: usize,
    ) -> Result<ConnectionId> {
        let src_task = self.require_node(src)?.task();
        let dst_task = self.require_node(dst)?.task();
        if src == dst {
            return Err(anyhow::Error::from(Error::SelfReference(
                src_task.name().to_owned(),
            )));
        }
        if src_output >= src_task.num_outputs() {
            return Err(anyhow::Error::from(Error::OutputOutOfBounds {
                task: src_task.name().to_owned(),
                slot: src_output,
                count: src_task.num_outputs(),
            }));
        }
        if dst_input >= dst_task.num_inputs() {
            return Err(anyhow::Error::from(Error::InputOutOfBounds {
                task: dst_task.name().to_owned(),
                slot: dst_input,
                count: dst_task.num_inputs(),
            }));
        }
        if self.bound_inputs.contains_key(&(dst, dst_input)) {
            return Err(anyhow::Error::from(Error::InputAlreadyConnected {
                task: dst_task.name().to_owned(),
                slot: dst_input,
            }));
        }

        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        trace!(
            "Connected {} output {} to {} input {} as connection {}",
            src,
            src_output,
            dst,
            dst_input,
            id
        );
        self.connections.push(Connection {
            id,
            src,
            src_output,
            dst,
            dst_input,
        });
        self.bound_inputs.insert((dst, dst_input), id);
        self.cached_order = None;
        Ok(id)
    }

    /// Remove a connection, freeing its destination input for rewiring.
    /// # Errors
    /// * Fails if the connection id is not live in this job.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Result<()> {
        let index = self
            .connections
            .iter()
            .position(|c| c.id == connection)
            .ok_or(Error::ConnectionNotFound(connection))?;
        let removed = self.connections.remove(index);
        self.bound_inputs.remove(&(removed.dst, removed.dst_input));
        self.cached_order = None;
        Ok(())
    }

    /// Designate the job's presentable slot, overwriting any previous designation.
    /// Exactly one designation must exist by the time the job executes.
    /// # Errors
    /// * Fails if the task id is not registered in this job.
    /// * Fails if the slot index is out of bounds for the named side.
    pub fn set_presentable_output(
        &mut self,
        task: TaskId,
        side: SlotSide,
        slot: usize,
    ) -> Result<()> {
        let node = self.require_node(task)?;
        match side {
            SlotSide::Input => {
                if slot >= node.task().num_inputs() {
                    return Err(anyhow::Error::from(Error::InputOutOfBounds {
                        task: node.task().name().to_owned(),
                        slot,
                        count: node.task().num_inputs(),
                    }));
                }
            }
            SlotSide::Output => {
                if slot >= node.task().num_outputs() {
                    return Err(anyhow::Error::from(Error::OutputOutOfBounds {
                        task: node.task().name().to_owned(),
                        slot,
                        count: node.task().num_outputs(),
                    }));
                }
            }
        }
        self.presentable = Some(PresentTarget {
            task,
            side,
            slot,
        });
        Ok(())
    }

    /// Get the current presentable designation, if any.
    pub fn presentable_output(&self) -> Option<PresentTarget> {
        self.presentable
    }

    /// Remove a task from the job, together with every connection touching it. The task
    /// itself is untouched (the job only drops its registration reference) and the id is
    /// never handed out again by this job.
    /// # Errors
    /// * Fails if the task id is not registered in this job.
    pub fn release_task(&mut self, task: TaskId) -> Result<()> {
        let index = self
            .nodes
            .iter()
            .position(|node| node.id == task)
            .ok_or(Error::TaskNotFound(task))?;
        let node = self.nodes.remove(index);
        trace!("Released task `{}` ({})", node.task().name(), task);
        self.connections.retain(|c| c.src != task && c.dst != task);
        self.bound_inputs
            .retain(|(dst, _), _| *dst != task);
        if let Some(target) = self.presentable {
            if target.task == task {
                warn!(
                    "Presentable output referenced released task {}, dropping the designation",
                    task
                );
                self.presentable = None;
            }
        }
        self.cached_order = None;
        Ok(())
    }

    /// Look up a registered task node by id.
    pub fn task(&self, id: TaskId) -> Option<&TaskNode<'cb, U>> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Iterate over the registered task nodes in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskNode<'cb, U>> {
        self.nodes.iter()
    }

    /// Number of registered tasks.
    pub fn num_tasks(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over the live connections.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    /// Compute the execution order for the current topology, or reuse the cached one.
    /// Tasks with no ordering constraint between them appear in registration order, so the
    /// result is identical across calls for an unchanged job.
    /// # Errors
    /// * Fails if the connections form a cycle.
    pub fn execution_order(&mut self) -> Result<&[TaskId]> {
        if self.cached_order.is_none() {
            debug!("Computing execution order over {} tasks", self.nodes.len());
            let order = schedule::topological_order(self)?;
            self.cached_order = Some(order);
        }
        // Just written above if it was empty.
        Ok(self.cached_order.as_deref().unwrap())
    }

    /// Execute the job: walk every registered task in execution order, invoke its executor
    /// with resolved inputs, and return the resource resolved for the presentable slot.
    ///
    /// All registered tasks execute, reachable from the presentable output or not; a task
    /// with no graph consumers may still have side effects that the frame depends on.
    /// Execution is strictly sequential on the calling thread. A job may be executed any
    /// number of times; resource bindings are re-resolved from scratch on every run.
    /// # Errors
    /// * Fails if no presentable output was designated.
    /// * Fails if the connections form a cycle. No executor is invoked in that case.
    /// * Fails if a required input is unbound when its task's turn comes up.
    /// * Fails if a task executor fails; the remaining tasks are not executed.
    /// * Fails if the presentable slot resolved to no resource.
    pub fn execute(
        &mut self,
        context: &mut FrameContext,
        user_data: &mut U,
    ) -> Result<ResourceView> {
        schedule::execute_job(self, context, user_data)
    }

    pub(crate) fn require_node(&self, id: TaskId) -> Result<&TaskNode<'cb, U>> {
        self.task(id)
            .ok_or_else(|| anyhow::Error::from(Error::TaskNotFound(id)))
    }

    /// The producer wired into an input slot, if any.
    pub(crate) fn producer_of(&self, dst: TaskId, dst_input: usize) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.dst == dst && c.dst_input == dst_input)
    }

    pub(crate) fn connections_into(
        &self,
        dst: TaskId,
    ) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.dst == dst)
    }

    /// Materialize the dependency graph implied by the connection table. Node indices
    /// follow registration order, which the scheduler relies on for tie-breaking.
    pub(crate) fn dependency_graph(&self) -> Graph<TaskId, (usize, usize)> {
        let mut graph = Graph::new();
        let mut indices: HashMap<TaskId, NodeIndex> = HashMap::new();
        for node in &self.nodes {
            let index = graph.add_node(node.id);
            indices.insert(node.id, index);
        }
        for connection in &self.connections {
            // Connections are validated on insert and pruned on release, so both
            // endpoints are always present.
            let src = *indices.get(&connection.src).unwrap();
            let dst = *indices.get(&connection.dst).unwrap();
            graph.add_edge(src, dst, (connection.src_output, connection.dst_input));
        }
        graph
    }
}

/// Trait that is implemented for the job to help with debugging and visualizing the graph.
pub trait GraphViz {
    /// Get the string representation of this graph in `dot` format.
    fn dot(&self) -> Result<String>;
}

impl<U> GraphViz for Job<'_, U> {
    fn dot(&self) -> Result<String> {
        let mut graph: Graph<String, String> = Graph::new();
        let mut indices: HashMap<TaskId, NodeIndex> = HashMap::new();
        for node in &self.nodes {
            let label = format!("{} ({})", node.task().name(), node.id);
            indices.insert(node.id, graph.add_node(label));
        }
        for connection in &self.connections {
            let src = *indices.get(&connection.src).unwrap();
            let dst = *indices.get(&connection.dst).unwrap();
            graph.add_edge(
                src,
                dst,
                format!("{} -> {}", connection.src_output, connection.dst_input),
            );
        }
        Ok(format!("{}", Dot::new(&graph)))
    }
}
