pub mod bot;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Conditionally log messages based on turn number when perf_stats feature is enabled.
///
/// This macro logs a message every 100 turns. When the perf_stats feature is disabled,
/// this macro compiles to nothing - zero runtime cost.
///
/// # Example
/// ```ignore
/// profile_log!(turn, "Processed {} pods", pods.len());
/// ```
///
/// # Zero-Cost Abstraction
/// When compiled without the `perf_stats` feature, this expands to an empty block.
/// Even the arguments (e.g., `pods.len()`) are not evaluated.
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($turn:expr, $($arg:tt)*) => {
        if $turn % 100 == 0 {
            ::tracing::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($turn:expr, $($arg:tt)*) => {};
}
