//! Tracing for the tokenizer and render passes, compiled out unless the
//! `html_trace` feature is on.

/// Trace a step of the conversion.  With `html_trace_bt` the message is
/// followed by a backtrace.
macro_rules! html_trace {
    ($($args:tt)*) => {{
        #[cfg(feature = "html_trace_bt")]
        log::trace!("{} at {:?}", format_args!($($args)*), ::backtrace::Backtrace::new());
        #[cfg(all(feature = "html_trace", not(feature = "html_trace_bt")))]
        log::trace!($($args)*);
    }};
}

/// Trace a step, never with a backtrace.
macro_rules! html_trace_quiet {
    ($($args:tt)*) => {{
        #[cfg(feature = "html_trace")]
        log::trace!($($args)*);
    }};
}
