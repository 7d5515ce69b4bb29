//! Structured logging for the provisioning service
//!
//! - `init(profile)` installs the process-wide subscriber once
//! - `log_op_start!` / `log_op_end!` / `log_op_error!` mark operation boundaries
//! - `init_test_capture()` records events in memory for assertions
//!
//! ```rust
//! use alertprov_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
