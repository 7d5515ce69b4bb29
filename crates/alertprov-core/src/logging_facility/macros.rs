//! Operation boundary macros
//!
//! Every service operation emits exactly one `start` event and then either one
//! `end` or one `end_error` event, all carrying `component` and `op`. Extra
//! `key = value` fields are passed through to `tracing` unchanged.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use alertprov_core::log_op_start;
/// log_op_start!("create_alert_rule");
/// log_op_start!("create_alert_rule", org_id = 1_i64);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::EVENT_START,
            $($($field)+)?
        )
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use alertprov_core::log_op_end;
/// log_op_end!("create_alert_rule", duration_ms = 42_u64);
/// log_op_end!("update_alert_group", duration_ms = 3_u64, rows_affected = 2_u64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        $crate::__private::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)+)?
        )
    };
}

/// Log a failed operation with the error's kind and stable code
///
/// `$err` may be a `ProvisioningError` or a reference to one.
///
/// # Example
///
/// ```
/// # use alertprov_core::log_op_error;
/// use alertprov_core::errors::{ProvisioningError, ValidationError};
/// let err = ProvisioningError::from(ValidationError::EmptyTitle);
/// log_op_error!("create_alert_rule", err, duration_ms = 10_u64);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let failure: &$crate::errors::ProvisioningError = &$err;
        $crate::__private::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?failure.kind(),
            err.code = failure.code(),
            error = %failure,
            $($($field)+)?
        )
    }};
}
