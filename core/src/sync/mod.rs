// kirana/src/sync/mod.rs

//! Keeping every role's view of the order set current: the change hub and
//! re-fetching watcher used by live accounts, and the timer-driven simulator
//! used by demo accounts.

mod feed;
mod simulator;
mod watcher;

pub use feed::{CallbackSubscription, ChangeEvent, ChangeFilter, ChangeHub, ChangeKind, Subscription, SubscriptionHandle, Table};
pub use simulator::{DemoSimulator, SimulatorHandle};
pub use watcher::{OrderSnapshot, OrderWatcher};
