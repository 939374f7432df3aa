// kirana/src/checkout/mod.rs

//! Cart handling and order placement.

mod cart;
mod payment;
mod placement;

pub use cart::{Cart, CartLine};
pub use payment::{PaymentGateway, PaymentReceipt, PaymentRequest};
pub use placement::{
  Checkout, CheckoutData, CheckoutRequest, PaymentChoice, ScheduleRequest, STEP_CONFIRM_PAYMENT, STEP_PAYMENT_SPLIT,
  STEP_PERSIST, STEP_RESOLVE_FULFILLMENT, STEP_RESOLVE_SCHEDULE, STEP_SNAPSHOT_ITEMS, STEP_VALIDATE_CART,
};
