// tests/flow_execution_tests.rs
mod common;

use common::*;
use kirana::flow::SkipCondition;
use kirana::{Flow, FlowData, FlowOutcome, KiranaError, StepControl};
use serial_test::serial;
use std::sync::Arc;

fn record(step: &'static str) -> impl Fn(FlowData<TestContext>) -> std::future::Ready<Result<StepControl, TestError>> {
  move |data: FlowData<TestContext>| {
    let mut guard = data.write();
    guard.steps_executed.push(step.to_string());
    let stop = guard.stop_at.as_deref() == Some(step);
    std::future::ready(Ok(if stop { StepControl::Stop } else { StepControl::Continue }))
  }
}

#[tokio::test]
#[serial]
async fn test_flow_runs_steps_in_order() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("one", false, None), ("two", false, None), ("three", false, None)]);
  flow.on("one", record("one"));
  flow.on("two", record("two"));
  flow.on("three", record("three"));

  let data = FlowData::new(TestContext::default());
  let outcome = flow.run(data.clone()).await.unwrap();

  assert_eq!(outcome, FlowOutcome::Completed);
  assert_eq!(data.read().steps_executed, vec!["one", "two", "three"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_phases_run_in_order() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("only", false, None)]);
  flow.after("only", record("after"));
  flow.on("only", record("on"));
  flow.before("only", record("before"));

  let data = FlowData::new(TestContext::default());
  flow.run(data.clone()).await.unwrap();

  assert_eq!(data.read().steps_executed, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn test_stop_halts_remaining_steps() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("a", false, None), ("b", false, None), ("c", false, None)]);
  flow.on("a", record("a"));
  flow.on("b", record("b"));
  flow.on("c", record("c"));

  let data = FlowData::new(TestContext {
    stop_at: Some("b".into()),
    ..Default::default()
  });
  let outcome = flow.run(data.clone()).await.unwrap();

  assert_eq!(outcome, FlowOutcome::Stopped);
  assert_eq!(data.read().steps_executed, vec!["a", "b"]);
}

#[tokio::test]
#[serial]
async fn test_handler_error_propagates_and_later_steps_do_not_run() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("good", false, None), ("bad", false, None), ("never", false, None)]);
  flow.on("good", record("good"));
  flow.on("bad", |_data: FlowData<TestContext>| async move {
    Err::<StepControl, _>(TestError::Handler("boom".into()))
  });
  flow.on("never", record("never"));

  let data = FlowData::new(TestContext::default());
  let err = flow.run(data.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("boom".into()));
  assert_eq!(data.read().steps_executed, vec!["good"]);
}

#[tokio::test]
#[serial]
async fn test_missing_handler_on_required_step_is_an_error() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("present", false, None), ("absent", false, None)]);
  flow.on("present", record("present"));

  let err = flow.run(FlowData::new(TestContext::default())).await.unwrap_err();

  match err {
    TestError::Kirana(msg) => assert!(msg.contains("absent"), "unexpected message: {msg}"),
    other => panic!("expected engine error, got {other:?}"),
  }
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("first", false, None), ("extra", true, None), ("last", false, None)]);
  flow.on("first", record("first"));
  flow.on("last", record("last"));

  let data = FlowData::new(TestContext::default());
  assert_eq!(flow.run(data.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(data.read().steps_executed, vec!["first", "last"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_sees_current_data() {
  setup_tracing();
  let skip: SkipCondition<TestContext> = Arc::new(|data: &FlowData<TestContext>| data.read().skip_optional);
  let mut flow = Flow::<TestContext, KiranaError>::new(&[("maybe", false, Some(skip)), ("always", false, None)]);
  for step in ["maybe", "always"] {
    flow.on(step, move |data: FlowData<TestContext>| async move {
      data.write().steps_executed.push(step.to_string());
      Ok::<_, KiranaError>(StepControl::Continue)
    });
  }

  let data = FlowData::new(TestContext {
    skip_optional: true,
    ..Default::default()
  });
  flow.run(data.clone()).await.unwrap();
  assert_eq!(data.read().steps_executed, vec!["always"]);
}

#[test]
#[should_panic(expected = "not found in flow definition")]
fn test_registering_unknown_step_panics() {
  let mut flow = Flow::<TestContext, TestError>::new(&[("known", false, None)]);
  flow.on("unknown", record("unknown"));
}
