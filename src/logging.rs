//! Crate-internal logging macros.
//!
//! With the `tracing` feature the macros forward to `tracing`; without it they
//! expand to nothing and their arguments are never evaluated.
//!
//! crate 内部日志宏。启用 `tracing` 特性时转发到 `tracing`，
//! 否则展开为空，参数不会被求值。

#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($arg:tt)*) => { ::tracing::trace!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

pub(crate) use {debug, trace};
