//! Core types shared across the alert provisioning crates
//!
//! This crate provides foundational types used by the error, logging and
//! storage layers:
//!
//! - **Operation context**: RequestId, OpContext, CancelHandle, InterruptProbe
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{CancelHandle, InterruptProbe, Interruption, OpContext, RequestId};
