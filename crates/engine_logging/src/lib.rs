#![deny(missing_docs)]
//! Shared logging utilities for the research workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a per-thread analysis run context that the dispatch loop tags its log lines
//! with, and a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Run id of the analysis stream currently being driven on this thread.
    static RUN_ID: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Marks the current thread as working on behalf of analysis run `run_id`.
pub fn set_run_id(run_id: u64) {
    RUN_ID.with(|v| v.set(Some(run_id)));
}

/// Clears the run context for the current thread.
pub fn clear_run_id() {
    RUN_ID.with(|v| v.set(None));
}

/// Returns the run id set for the current thread, if any.
pub fn current_run_id() -> Option<u64> {
    RUN_ID.with(|v| v.get())
}

/// Formats the current run context as a log prefix such as `[run 3] `.
///
/// Returns an empty string when no run is active on this thread.
pub fn run_prefix() -> String {
    match current_run_id() {
        Some(run_id) => format!("[run {run_id}] "),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::run_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already own the global logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_prefix_tracks_thread_context() {
        clear_run_id();
        assert_eq!(run_prefix(), "");
        set_run_id(7);
        assert_eq!(current_run_id(), Some(7));
        assert_eq!(run_prefix(), "[run 7] ");
        clear_run_id();
        assert_eq!(current_run_id(), None);
    }
}
