//! Tracing hooks for the matching passes (feature `tracing`).
//!
//! The engine emits a handful of signals: a span around each `stereo` or
//! `fusion` run and the Sobel pass, per-level `coarse_pass` / `refine_pass`
//! summaries from the scheduler, and warnings when the backtrace fallback
//! fires or a pooled task panics. One macro covers all of them:
//!
//! ```ignore
//! let _pass = dp_trace!(span "stereo", skip = cfg.skip);
//! dp_trace!(info "refine_pass", half = half, rows = rows.len());
//! dp_trace!(warn "backtrace_fallback", x = x, y = y, column = column);
//! ```
//!
//! Without the feature, the `span` form yields a unit guard and the other
//! forms only evaluate their field expressions.

#[cfg(feature = "tracing")]
macro_rules! dp_trace {
    (span $name:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info_span!($name $(, $key = $value)*).entered()
    };
    (info $name:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(name: $name $(, $key = $value)*)
    };
    (warn $name:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(name: $name $(, $key = $value)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! dp_trace {
    (span $name:literal $(, $key:ident = $value:expr)* $(,)?) => {{
        $(let _ = &$value;)*
        $crate::trace::PassGuard
    }};
    ($level:ident $name:literal $(, $key:ident = $value:expr)* $(,)?) => {{
        $(let _ = &$value;)*
    }};
}

pub(crate) use dp_trace;

/// Stand-in span guard bound at call sites when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub(crate) struct PassGuard;
