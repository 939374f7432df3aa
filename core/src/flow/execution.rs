// kirana/src/flow/execution.rs

//! `Flow::run()`: executes steps in order against the shared data.

use super::definition::{Flow, Handler};
use super::{FlowData, FlowOutcome, StepControl};
use crate::error::KiranaError;
use tracing::{event, info_span, instrument, Instrument, Level};

enum PhaseResult {
  Continue,
  Stopped,
}

impl<T, Err> Flow<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<KiranaError> + Send + Sync + 'static,
{
  /// Runs every step against `data`.
  ///
  /// A non-optional step with no handlers at all fails with
  /// [`KiranaError::HandlerMissing`], converted into `Err`.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(flow_data_type = %std::any::type_name::<T>(), num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, data: FlowData<T>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Flow execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = info_span!("flow_step", step_name, step_index = step_idx, optional = step_def.optional);

      if step_def.skipped_for(&data) {
        event!(parent: &step_span, Level::DEBUG, "Step skipped by its skip condition.");
        continue;
      }

      let phases = [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ];

      if phases.iter().all(|(_, handlers)| handlers.map_or(true, |v| v.is_empty())) {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(KiranaError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      for (phase, handlers) in phases {
        let Some(handlers) = handlers else { continue };
        match run_phase(handlers, &data, phase).instrument(step_span.clone()).await? {
          PhaseResult::Continue => {}
          PhaseResult::Stopped => return Ok(FlowOutcome::Stopped),
        }
      }
    }

    event!(Level::DEBUG, "Flow execution completed.");
    Ok(FlowOutcome::Completed)
  }
}

async fn run_phase<T, Err>(handlers: &[Handler<T, Err>], data: &FlowData<T>, phase: &'static str) -> Result<PhaseResult, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<KiranaError> + Send + Sync + 'static,
{
  for handler in handlers {
    match handler(data.clone()).await {
      Ok(StepControl::Continue) => {}
      Ok(StepControl::Stop) => {
        event!(Level::INFO, phase, "Flow stopped by a handler.");
        return Ok(PhaseResult::Stopped);
      }
      Err(e) => {
        event!(Level::ERROR, phase, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PhaseResult::Continue)
}
