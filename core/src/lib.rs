// kirana/src/lib.rs

//! Kirana: the order lifecycle core of a hyperlocal grocery marketplace.
//!
//! The crate covers what customers, store owners and the demo simulator
//! share:
//!  - Typed order, inventory, store and profile records, parsed from loosely
//!    shaped remote rows at the boundary.
//!  - The per-mode order status state machine and the customer progress tracker.
//!  - Order placement, run as a step [`Flow`] (validate, snapshot, resolve,
//!    pay, persist).
//!  - A change hub plus re-fetching order watcher for live accounts, and a
//!    fixed-interval simulator for demo accounts.
//!  - The store owner's inventory desk with rollback of failed edits.
//!  - Sessions as a tagged union over role.
//!
//! Everything hangs off an explicitly constructed [`MarketContext`].

pub mod checkout;
pub mod config;
pub mod context;
pub mod error;
pub mod flow;
pub mod geo;
pub mod inventory;
pub mod lifecycle;
pub mod model;
pub mod orders;
pub mod parse;
pub mod repository;
pub mod session;
pub mod sync;

pub use crate::checkout::{Cart, CartLine, Checkout, CheckoutRequest, PaymentChoice, PaymentGateway, ScheduleRequest};
pub use crate::config::{FeeSchedule, MarketConfig};
pub use crate::context::{Backend, MarketContext};
pub use crate::error::{KiranaError, KiranaResult};
pub use crate::flow::{Flow, FlowData, FlowOutcome, StepControl};
pub use crate::inventory::{CustomProduct, InventoryDesk};
pub use crate::lifecycle::{FulfillmentMode, OrderStatus, PaymentStatus, Tracking, TransitionError};
pub use crate::model::{InventoryItem, ListingUpdate, Money, Order, Store};
pub use crate::orders::OrderDesk;
pub use crate::parse::ParseError;
pub use crate::repository::{MarketRepository, MemoryRepository};
pub use crate::session::{AccountMode, OrderScope, Role, Session};
pub use crate::sync::{ChangeEvent, ChangeFilter, ChangeHub, DemoSimulator, OrderSnapshot, OrderWatcher};
