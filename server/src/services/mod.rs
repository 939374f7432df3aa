// kirana_server/src/services/mod.rs

pub mod payment_stub;
