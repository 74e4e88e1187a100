//! Order lifecycle
//!
//! The workflow engine that turns carts into orders and drives status
//! transitions, stock restoration and payment settlement.

pub mod workflow;

#[cfg(test)]
mod tests;

pub use workflow::{cancel_by_customer, checkout, load_detail, update_status};
