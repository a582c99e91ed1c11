//! `log_*!` macros
//!
//! Context is written as `"key" => value` pairs after the message; any value
//! implementing Display works.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_pairs {
    ($($key:expr => $value:expr),*) => {
        [$(($key, ::std::string::ToString::to_string(&$value))),*]
    };
}

/// Error with a registered code, an optional `span = ...`, then context pairs
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr, span = $span:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::emit_error(
            $code,
            $message,
            Some($span),
            &$crate::__log_pairs!($($key => $value),*),
        )
    };
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::emit_error(
            $code,
            $message,
            None,
            &$crate::__log_pairs!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::emit_success($code, $message, &$crate::__log_pairs!($($key => $value),*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::emit_info($message, &$crate::__log_pairs!($($key => $value),*))
    };
}

/// Warning, with `code = ...` first when it has a specific code
#[macro_export]
macro_rules! log_warning {
    (code = $code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::emit_warning(
            Some($code),
            $message,
            &$crate::__log_pairs!($($key => $value),*),
        )
    };
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::emit_warning(None, $message, &$crate::__log_pairs!($($key => $value),*))
    };
}

/// Context is only formatted when debug output is enabled
#[macro_export]
macro_rules! log_debug {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        if $crate::logging::debug_enabled() {
            $crate::logging::emit_debug($message, &$crate::__log_pairs!($($key => $value),*))
        }
    };
}

/// Success event with `duration_ms`, only when performance events are enabled
#[macro_export]
macro_rules! log_performance {
    ($code:expr, $message:expr, duration = $duration:expr $(, $key:expr => $value:expr)* $(,)?) => {
        if $crate::logging::config::log_performance_events() {
            $crate::log_success!(
                $code,
                $message,
                "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0)
                $(, $key => $value)*
            )
        }
    };
}
