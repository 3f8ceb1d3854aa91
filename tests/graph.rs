use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use layout::gv;

use framegraph::prelude::*;

mod framework;

use framework::{five_node_job, new_log, tracked_task};

#[test]
fn end_to_end_five_node_scenario() -> Result<()> {
    let _ = pretty_env_logger::try_init();

    let log = new_log();
    let mut job = five_node_job(&log)?;
    let mut context = FrameContext::new();

    let presented = job.execute(&mut context, &mut ())?;
    assert_eq!(presented.name(), "compose.0");
    assert_eq!(
        *log.borrow(),
        vec!["background", "julia", "downsample", "blur", "compose"]
    );
    assert_eq!(context.tasks_executed(), 5);
    Ok(())
}

#[test]
fn execution_order_is_deterministic() -> Result<()> {
    let log = new_log();
    let mut job = five_node_job(&log)?;
    let mut context = FrameContext::new();

    job.execute(&mut context, &mut ())?;
    let first = log.borrow().clone();
    log.borrow_mut().clear();
    job.execute(&mut context, &mut ())?;
    let second = log.borrow().clone();
    assert_eq!(first, second);

    // An independently built but logically identical job orders the same way.
    let other_log = new_log();
    let mut other = five_node_job(&other_log)?;
    other.execute(&mut context, &mut ())?;
    assert_eq!(first, *other_log.borrow());
    Ok(())
}

#[test]
fn order_respects_all_connections() -> Result<()> {
    let log = new_log();
    let mut job = five_node_job(&log)?;
    let order = job.execution_order()?.to_vec();

    let position = |id: TaskId| order.iter().position(|o| *o == id).unwrap();
    for connection in job.connections() {
        assert!(
            position(connection.src()) < position(connection.dst()),
            "producer must precede consumer"
        );
    }
    Ok(())
}

#[test]
fn unordered_tasks_keep_registration_order() -> Result<()> {
    let log = new_log();
    let x = tracked_task("x", 0, 1, &log);
    let y = tracked_task("y", 0, 1, &log);

    let mut job = Job::new();
    let _x = job.add_task(&x);
    let y = job.add_task(&y);
    job.set_presentable_output(y, SlotSide::Output, 0)?;

    job.execute(&mut FrameContext::new(), &mut ())?;
    assert_eq!(*log.borrow(), vec!["x", "y"]);
    Ok(())
}

#[test]
fn second_producer_is_rejected_and_original_kept() -> Result<()> {
    let log = new_log();
    let x = tracked_task("x", 0, 1, &log);
    let y = tracked_task("y", 0, 1, &log);

    let seen = Rc::new(RefCell::new(None::<String>));
    let seen_inner = seen.clone();
    let compose = TaskBuilder::new("compose")
        .inputs(1)
        .outputs(1)
        .execute_fn(move |resources: &mut TaskResources, _: &mut ()| {
            *seen_inner.borrow_mut() = resources.input(0).map(|view| view.name().to_owned());
            resources.bind_output(0, ResourceView::new("composed", ()))?;
            Ok(())
        })
        .build_shared();

    let mut job = Job::new();
    let x = job.add_task(&x);
    let y = job.add_task(&y);
    let compose = job.add_task(&compose);
    job.connect(x, 0, compose, 0)?;

    let err = job.connect(y, 0, compose, 0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::InputAlreadyConnected { .. })
    ));

    job.set_presentable_output(compose, SlotSide::Output, 0)?;
    job.execute(&mut FrameContext::new(), &mut ())?;
    assert_eq!(seen.borrow().as_deref(), Some("x.0"));
    Ok(())
}

#[test]
fn cycle_fails_with_zero_callbacks_executed() -> Result<()> {
    let log = new_log();
    let a = tracked_task("a", 1, 1, &log);
    let b = tracked_task("b", 1, 1, &log);

    let mut job = Job::new();
    let a = job.add_task(&a);
    let b = job.add_task(&b);
    job.connect(a, 0, b, 0)?;
    job.connect(b, 0, a, 0)?;
    job.set_presentable_output(a, SlotSide::Output, 0)?;

    let err = job.execute(&mut FrameContext::new(), &mut ()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::GraphHasCycle(_))
    ));
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn presentable_output_resolves_to_declared_view() -> Result<()> {
    let log = new_log();
    let background = tracked_task("background", 0, 1, &log);
    let blur = tracked_task("blur", 1, 1, &log);
    let compose = tracked_task("compose", 2, 1, &log);

    let mut job = Job::new();
    let background = job.add_task(&background);
    let blur = job.add_task(&blur);
    let compose = job.add_task(&compose);
    job.connect(background, 0, blur, 0)?;
    job.connect(blur, 0, compose, 0)?;
    job.connect(background, 0, compose, 1)?;
    job.set_presentable_output(compose, SlotSide::Output, 0)?;

    let presented = job.execute(&mut FrameContext::new(), &mut ())?;
    assert_eq!(presented.name(), "compose.0");
    assert_eq!(presented.downcast_ref::<usize>(), Some(&0));
    Ok(())
}

#[test]
fn input_side_presentable_resolves_to_producer_view() -> Result<()> {
    let log = new_log();
    let producer = tracked_task("producer", 0, 1, &log);
    let present = tracked_task("present", 1, 0, &log);

    let mut job = Job::new();
    let producer = job.add_task(&producer);
    let present = job.add_task(&present);
    job.connect(producer, 0, present, 0)?;
    job.set_presentable_output(present, SlotSide::Input, 0)?;

    let presented = job.execute(&mut FrameContext::new(), &mut ())?;
    assert_eq!(presented.name(), "producer.0");
    Ok(())
}

#[test]
fn connect_validates_slot_bounds() -> Result<()> {
    let log = new_log();
    let src = tracked_task("src", 0, 1, &log);
    let dst = tracked_task("dst", 1, 0, &log);

    let mut job = Job::new();
    let src = job.add_task(&src);
    let dst = job.add_task(&dst);

    let err = job.connect(src, 1, dst, 0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::OutputOutOfBounds { .. })
    ));
    let err = job.connect(src, 0, dst, 3).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::InputOutOfBounds { .. })
    ));
    // Rejected connections are not applied.
    assert_eq!(job.connections().count(), 0);
    Ok(())
}

#[test]
fn self_connection_is_rejected() -> Result<()> {
    let log = new_log();
    let task = tracked_task("loopback", 1, 1, &log);

    let mut job = Job::new();
    let task = job.add_task(&task);
    let err = job.connect(task, 0, task, 0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::SelfReference(_))
    ));
    Ok(())
}

#[test]
fn required_input_unbound_is_fatal() -> Result<()> {
    let log = new_log();
    let producer = tracked_task("producer", 0, 1, &log);

    let ran = Rc::new(RefCell::new(false));
    let ran_inner = ran.clone();
    let consumer = TaskBuilder::new("consumer")
        .inputs(1)
        .outputs(1)
        .require_input(0)?
        .execute_fn(move |_: &mut TaskResources, _: &mut ()| {
            *ran_inner.borrow_mut() = true;
            Ok(())
        })
        .build_shared();

    let mut job = Job::new();
    let producer = job.add_task(&producer);
    let consumer = job.add_task(&consumer);
    job.set_presentable_output(producer, SlotSide::Output, 0)?;

    // Input 0 of the consumer is never connected.
    let _ = consumer;
    let err = job.execute(&mut FrameContext::new(), &mut ()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::RequiredInputUnbound { slot: 0, .. })
    ));
    // The callback was never invoked with an unbound required slot.
    assert!(!*ran.borrow());
    Ok(())
}

#[test]
fn optional_input_may_stay_unbound() -> Result<()> {
    let saw_none = Rc::new(RefCell::new(false));
    let saw_none_inner = saw_none.clone();
    let task = TaskBuilder::new("standalone")
        .inputs(1)
        .outputs(1)
        .execute_fn(move |resources: &mut TaskResources, _: &mut ()| {
            *saw_none_inner.borrow_mut() = resources.input(0).is_none();
            resources.bind_output(0, ResourceView::new("out", ()))?;
            Ok(())
        })
        .build_shared();

    let mut job = Job::new();
    let task = job.add_task(&task);
    job.set_presentable_output(task, SlotSide::Output, 0)?;
    job.execute(&mut FrameContext::new(), &mut ())?;
    assert!(*saw_none.borrow());
    Ok(())
}

#[test]
fn disconnect_frees_the_input_for_rewiring() -> Result<()> {
    let log = new_log();
    let x = tracked_task("x", 0, 1, &log);
    let y = tracked_task("y", 0, 1, &log);

    let seen = Rc::new(RefCell::new(None::<String>));
    let seen_inner = seen.clone();
    let compose = TaskBuilder::new("compose")
        .inputs(1)
        .outputs(1)
        .execute_fn(move |resources: &mut TaskResources, _: &mut ()| {
            *seen_inner.borrow_mut() = resources.input(0).map(|view| view.name().to_owned());
            resources.bind_output(0, ResourceView::new("composed", ()))?;
            Ok(())
        })
        .build_shared();

    let mut job = Job::new();
    let x = job.add_task(&x);
    let y = job.add_task(&y);
    let compose = job.add_task(&compose);
    job.set_presentable_output(compose, SlotSide::Output, 0)?;

    let wire = job.connect(x, 0, compose, 0)?;
    job.disconnect(wire)?;
    job.connect(y, 0, compose, 0)?;

    job.execute(&mut FrameContext::new(), &mut ())?;
    assert_eq!(seen.borrow().as_deref(), Some("y.0"));

    let err = job.disconnect(wire).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::ConnectionNotFound(_))
    ));
    Ok(())
}

#[test]
fn released_task_ids_are_never_reused() -> Result<()> {
    let log = new_log();
    let a = tracked_task("a", 0, 1, &log);
    let b = tracked_task("b", 1, 1, &log);
    let c = tracked_task("c", 0, 1, &log);

    let mut job = Job::new();
    let a_id = job.add_task(&a);
    let b_id = job.add_task(&b);
    job.connect(a_id, 0, b_id, 0)?;

    job.release_task(a_id)?;
    assert_eq!(job.num_tasks(), 1);
    // Connections touching the released task are gone with it.
    assert_eq!(job.connections().count(), 0);

    let c_id = job.add_task(&c);
    assert_ne!(c_id, a_id);

    // The released id is no longer a valid endpoint.
    let err = job.connect(a_id, 0, b_id, 0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::TaskNotFound(_))
    ));
    Ok(())
}

#[test]
fn executor_failure_fails_the_job() -> Result<()> {
    let log = new_log();
    let broken = TaskBuilder::new("broken")
        .outputs(1)
        .execute_fn(|_: &mut TaskResources, _: &mut ()| Err(anyhow!("surface lost")))
        .build_shared();
    let downstream = tracked_task("downstream", 1, 1, &log);

    let mut job = Job::new();
    let broken = job.add_task(&broken);
    let downstream = job.add_task(&downstream);
    job.connect(broken, 0, downstream, 0)?;
    job.set_presentable_output(downstream, SlotSide::Output, 0)?;

    let err = job.execute(&mut FrameContext::new(), &mut ()).unwrap_err();
    assert_eq!(err.to_string(), "surface lost");
    // No partial recovery: the rest of the graph never ran.
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn binding_an_undeclared_output_slot_fails() -> Result<()> {
    let task = TaskBuilder::new("overflow")
        .outputs(1)
        .execute_fn(|resources: &mut TaskResources, _: &mut ()| {
            resources.bind_output(1, ResourceView::new("extra", ()))
        })
        .build_shared();

    let mut job = Job::new();
    let task = job.add_task(&task);
    job.set_presentable_output(task, SlotSide::Output, 0)?;

    let err = job.execute(&mut FrameContext::new(), &mut ()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::OutputSlotOutOfBounds { slot: 1, count: 1 })
    ));
    Ok(())
}

#[test]
fn unreachable_tasks_still_execute() -> Result<()> {
    let log = new_log();
    let presented = tracked_task("presented", 0, 1, &log);
    // Writes a history buffer no other task consumes this frame.
    let history = tracked_task("history", 0, 1, &log);

    let mut job = Job::new();
    let presented = job.add_task(&presented);
    let _history = job.add_task(&history);
    job.set_presentable_output(presented, SlotSide::Output, 0)?;

    job.execute(&mut FrameContext::new(), &mut ())?;
    assert_eq!(*log.borrow(), vec!["presented", "history"]);
    Ok(())
}

#[test]
fn missing_presentable_designation_fails_before_running() -> Result<()> {
    let log = new_log();
    let task = tracked_task("only", 0, 1, &log);

    let mut job = Job::new();
    job.add_task(&task);

    let err = job.execute(&mut FrameContext::new(), &mut ()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::NoPresentableOutput)
    ));
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn presentable_slot_never_produced_is_fatal() -> Result<()> {
    let silent = TaskBuilder::new("silent")
        .outputs(1)
        .executor(EmptyTaskExecutor::new())
        .build_shared();

    let mut job = Job::new();
    let silent = job.add_task(&silent);
    job.set_presentable_output(silent, SlotSide::Output, 0)?;

    let err = job.execute(&mut FrameContext::new(), &mut ()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::PresentableUnresolved { slot: 0, .. })
    ));
    Ok(())
}

#[test]
fn user_data_is_threaded_through_every_task() -> Result<()> {
    let count = |name: &'static str| {
        TaskBuilder::new(name)
            .outputs(1)
            .execute_fn(|resources: &mut TaskResources, frame_state: &mut u32| {
                *frame_state += 1;
                resources.bind_output(0, ResourceView::new("out", ()))?;
                Ok(())
            })
            .build_shared()
    };

    let mut job = Job::new();
    job.add_task(&count("first"));
    job.add_task(&count("second"));
    let last = job.add_task(&count("third"));
    job.set_presentable_output(last, SlotSide::Output, 0)?;

    let mut frame_state = 0u32;
    job.execute(&mut FrameContext::new(), &mut frame_state)?;
    assert_eq!(frame_state, 3);
    Ok(())
}

#[test]
fn dot_export_is_valid_graphviz() -> Result<()> {
    let log = new_log();
    let job = five_node_job(&log)?;

    let dot = job.dot()?;
    assert!(dot.contains("julia"));
    assert!(dot.contains("compose"));

    let mut parser = gv::DotParser::new(&dot);
    match parser.process() {
        Ok(_) => Ok(()),
        Err(e) => {
            parser.print_error();
            panic!("dot parse error: {}", e);
        }
    }
}
