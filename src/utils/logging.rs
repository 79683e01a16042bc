//! Conditional logging macros gated on a module-level `ENABLE_LOGS` const.
//!
//! Modules that want switchable verbosity define
//! `const ENABLE_LOGS: bool = true;` and use these macros (exported at the
//! crate root) instead of the bare `log` ones.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
