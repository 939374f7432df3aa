// kirana/src/lifecycle/mod.rs

//! Order lifecycle: the closed status set, the per-mode transition table and
//! the progress tracker derived from it.

pub mod progress;
pub mod status;
pub mod transitions;

pub use progress::{demo_next, progress_fraction, progress_index, track, tracker_steps, Tracking, TrackingStep};
pub use status::{FulfillmentMode, OrderStatus, PaymentStatus};
pub use transitions::{allowed_transitions, check_transition, next_forward, TransitionError};
