//! Logging facade.
//!
//! The router never talks to a logging crate directly. Every message goes
//! through one of the macros below, which forward to [`log`](https://docs.rs/log)
//! or [`tracing`](https://docs.rs/tracing) depending on the enabled feature.
//! Enable at most one of them.
//!
//! | Feature    | Backend         | Default |
//! |------------|-----------------|---------|
//! | `log`      | `log` crate     | yes     |
//! | `tracing`  | `tracing` crate | no      |
//!
//! With neither feature the arguments are still type-checked but nothing is
//! emitted. Each macro expands to a `()` block, so it can stand in for an
//! expression such as a match arm.
//!
//! # What gets logged where
//!
//! | Level   | Events                                                   |
//! |---------|----------------------------------------------------------|
//! | `trace` | gate decisions, pipeline steps, cache hits and misses   |
//! | `debug` | dispatches, history writes, pop and link events          |
//! | `info`  | route registration, routers joining or leaving a group   |
//! | `warn`  | dispatches that settle with an unhandled error           |
//! | `error` | percent-decoding failures while extracting parameters    |
//!
//! ```ignore
//! use page_router::{debug_log, warn_log};
//!
//! debug_log!("Dispatching '{}'", path);
//! warn_log!("Dispatch of '{}' failed: {}", path, err);
//! ```

#[cfg(all(feature = "log", feature = "tracing"))]
compile_error!("features `log` and `tracing` are mutually exclusive");

#[doc(hidden)]
#[macro_export]
macro_rules! __router_log {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::$level!($($arg)*);
        #[cfg(feature = "log")]
        ::log::$level!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "tracing")))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Emit a **trace**-level message.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(trace, $($arg)*)
    };
}

/// Emit a **debug**-level message.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(debug, $($arg)*)
    };
}

/// Emit an **info**-level message.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(info, $($arg)*)
    };
}

/// Emit a **warn**-level message.
///
/// Used for failures the router reports but cannot recover from itself.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(warn, $($arg)*)
    };
}

/// Emit an **error**-level message.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(error, $($arg)*)
    };
}
