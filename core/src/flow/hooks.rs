// kirana/src/flow/hooks.rs

//! Registration of `before`, `on` and `after` handlers.

use super::definition::{Flow, Handler};
use super::{FlowData, StepControl};
use crate::error::KiranaError;
use std::collections::HashMap;
use std::future::Future;

fn boxed<T, Err, F, UserErr>(handler_fn: impl Fn(FlowData<T>) -> F + Send + Sync + 'static) -> Handler<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<KiranaError> + Send + Sync + 'static,
  F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
  UserErr: Into<Err> + Send + Sync + 'static,
{
  Box::new(move |data| {
    let user_fut = handler_fn(data);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}

fn push<T, Err>(phase: &mut HashMap<String, Vec<Handler<T, Err>>>, step_name: &str, handler: Handler<T, Err>)
where
  T: 'static + Send + Sync,
{
  phase.entry(step_name.to_string()).or_default().push(handler);
}

impl<T, Err> Flow<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<KiranaError> + Send + Sync + 'static,
{
  pub fn before<F, UserErr>(&mut self, step_name: &str, handler_fn: impl Fn(FlowData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push(&mut self.before, step_name, boxed(handler_fn));
  }

  pub fn on<F, UserErr>(&mut self, step_name: &str, handler_fn: impl Fn(FlowData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push(&mut self.on, step_name, boxed(handler_fn));
  }

  pub fn after<F, UserErr>(&mut self, step_name: &str, handler_fn: impl Fn(FlowData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    push(&mut self.after, step_name, boxed(handler_fn));
  }
}
