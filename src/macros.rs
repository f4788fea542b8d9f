//! Timestamped progress lines. They go to stderr, stdout is left to the report.

use std::fmt;

use chrono::{DateTime, Local};

/// Logs a line prefixed with the local time.
/// Given a start time first, the seconds elapsed since then are appended.
/// ```
/// use chrono::Local;
/// use saes::info_time;
///
/// info_time!("Loaded {} pages", 3);
/// let start = Local::now();
/// info_time!(start, "Logged in to {}", "escom");
/// ```
#[macro_export]
macro_rules! info_time {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::macros::log_line(None, format_args!($fmt $(, $arg)*))
    };
    ($start:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::macros::log_line(Some($start), format_args!($fmt $(, $arg)*))
    };
}

#[doc(hidden)]
pub fn log_line(start: Option<DateTime<Local>>, message: fmt::Arguments<'_>) {
    eprintln!("{}", render(Local::now(), start, message));
}

fn render(now: DateTime<Local>, start: Option<DateTime<Local>>, message: fmt::Arguments<'_>) -> String {
    let stamp = now.format("%Y-%m-%d %H:%M:%S%.3f");
    match start {
        None => format!("{stamp} {message}"),
        Some(start) => {
            let elapsed = (now - start).num_milliseconds() as f64 / 1000.0;
            format!("{stamp} {message} ({elapsed:.3}s)")
        }
    }
}
