// kirana/src/flow/step.rs

use std::fmt;
use std::sync::Arc;

use super::FlowData;

/// Predicate checked against the shared data before a step runs.
pub type SkipCondition<T> = Arc<dyn Fn(&FlowData<T>) -> bool + Send + Sync + 'static>;

/// One named stage of a [`Flow`](super::Flow).
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  /// An optional step with no handlers is passed over instead of failing the run.
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> StepDef<T> {
  pub fn new(name: impl Into<String>, optional: bool, skip_if: Option<SkipCondition<T>>) -> Self {
    Self {
      name: name.into(),
      optional,
      skip_if,
    }
  }

  pub(crate) fn skipped_for(&self, data: &FlowData<T>) -> bool {
    self.skip_if.as_ref().is_some_and(|cond| cond(data))
  }
}

impl<T: 'static + Send + Sync> fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "StepDef({}{}{})",
      self.name,
      if self.optional { ", optional" } else { "" },
      if self.skip_if.is_some() { ", conditional" } else { "" }
    )
  }
}
