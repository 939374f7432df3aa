// kirana/src/sync/simulator.rs

use crate::error::{KiranaError, KiranaResult};
use crate::lifecycle::demo_next;
use crate::repository::MarketRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

/// Drives demo orders forward one step per tick.
///
/// Writes go through the repository like any owner action, so watchers on
/// the demo repository see the same change events a live account would.
pub struct DemoSimulator {
  repo: Arc<dyn MarketRepository>,
  period: Duration,
}

impl DemoSimulator {
  pub fn new(repo: Arc<dyn MarketRepository>, period: Duration) -> Self {
    DemoSimulator { repo, period }
  }

  pub fn period(&self) -> Duration {
    self.period
  }

  /// One tick: advances every eligible order by exactly one status.
  /// Returns how many orders moved.
  #[instrument(name = "DemoSimulator::step", skip(self), err(Display))]
  pub async fn step(&self) -> KiranaResult<usize> {
    let mut advanced = 0;
    for order in self.repo.all_orders().await? {
      let Some(next) = demo_next(&order) else {
        continue;
      };
      match self.repo.write_status(order.id, order.version, next).await {
        Ok(_) => {
          debug!(order_id = %order.id, from = %order.status, to = %next, "Demo order advanced.");
          advanced += 1;
        }
        Err(KiranaError::VersionConflict { .. }) => {
          debug!(order_id = %order.id, "Order changed during tick; retrying next tick.");
        }
        Err(e) => return Err(e),
      }
    }
    Ok(advanced)
  }

  /// Starts ticking. The first advance happens one full period from now.
  pub fn spawn(self) -> SimulatorHandle {
    let period = self.period;
    info!(period_secs = period.as_secs_f64(), "Demo simulator started.");
    let task = tokio::spawn(async move {
      let mut ticker = interval_at(Instant::now() + period, period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        ticker.tick().await;
        if let Err(e) = self.step().await {
          error!(error = %e, "Demo tick failed.");
        }
      }
    });
    SimulatorHandle { task }
  }
}

/// Stops the simulator when dropped.
pub struct SimulatorHandle {
  task: JoinHandle<()>,
}

impl SimulatorHandle {
  pub fn stop(self) {
    self.task.abort();
  }
}

impl Drop for SimulatorHandle {
  fn drop(&mut self) {
    self.task.abort();
  }
}
