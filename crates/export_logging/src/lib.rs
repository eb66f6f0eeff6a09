#![deny(missing_docs)]
//! `export_*` logging macros for the exporter crates.
//!
//! The macros forward to the `log` facade through this crate, so callers do
//! not need their own `log` dependency to emit records. Records carry the
//! calling module as their target.

#[doc(hidden)]
pub use log as __log;

/// Emits a record at `$level` with the caller's module path as target.
#[doc(hidden)]
#[macro_export]
macro_rules! export_log {
    ($level:ident, $($arg:tt)*) => {
        $crate::__log::$level!(target: module_path!(), $($arg)*)
    };
}

/// Trace-level record; per-element conversion detail.
#[macro_export]
macro_rules! export_trace {
    ($($arg:tt)*) => { $crate::export_log!(trace, $($arg)*) };
}

/// Debug-level record; per-request and per-post detail.
#[macro_export]
macro_rules! export_debug {
    ($($arg:tt)*) => { $crate::export_log!(debug, $($arg)*) };
}

/// Info-level record; one per pipeline milestone.
#[macro_export]
macro_rules! export_info {
    ($($arg:tt)*) => { $crate::export_log!(info, $($arg)*) };
}

/// Warn-level record; recovered problems such as an image URL fallback.
#[macro_export]
macro_rules! export_warn {
    ($($arg:tt)*) => { $crate::export_log!(warn, $($arg)*) };
}

/// Error-level record; failures reported back to the caller.
#[macro_export]
macro_rules! export_error {
    ($($arg:tt)*) => { $crate::export_log!(error, $($arg)*) };
}

/// Installs a `simplelog::TestLogger` at debug level.
///
/// Output goes through the test harness, so it only shows for failing
/// tests. Calling it again, or after another logger was set, does nothing.
pub fn initialize_for_tests() {
    let _ = simplelog::TestLogger::init(log::LevelFilter::Debug, simplelog::Config::default());
}
