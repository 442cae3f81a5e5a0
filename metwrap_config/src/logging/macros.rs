//! Code-typed logging macros accepting Display values as context

/// Log error with Code type
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::error($code, &$message),
            vec![],
        )
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_with_context(
                $crate::logging::LogEvent::error($code, &$message),
                context,
            )
        }
    };
}

/// Log warning with Code type
#[macro_export]
macro_rules! log_warning {
    ($code:expr, $message:expr) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::warning_with_code($code, &$message),
            vec![],
        )
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_with_context(
                $crate::logging::LogEvent::warning_with_code($code, &$message),
                context,
            )
        }
    };
}

/// Log success with Code type
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::success($code, &$message),
            vec![],
        )
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_with_context(
                $crate::logging::LogEvent::success($code, &$message),
                context,
            )
        }
    };
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        $crate::logging::log_with_context($crate::logging::LogEvent::debug(&$message), vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_with_context($crate::logging::LogEvent::debug(&$message), context)
        }
    };
}
