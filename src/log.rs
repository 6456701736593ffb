//! Logging facade that delegates to either the `log` crate or the `tracing`
//! crate depending on compile-time features.

macro_rules! error {
    ($($t:tt)+) => {{
        #[cfg(feature = "tracing")]
        ::tracing::error!($($t)*);

        #[cfg(not(feature = "tracing"))]
        ::log::error!($($t)*);
    }};
}

macro_rules! info {
    ($($t:tt)+) => {{
        #[cfg(feature = "tracing")]
        ::tracing::info!($($t)*);

        #[cfg(not(feature = "tracing"))]
        ::log::info!($($t)*);
    }};
}

macro_rules! debug {
    ($($t:tt)+) => {{
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($t)*);

        #[cfg(not(feature = "tracing"))]
        ::log::debug!($($t)*);
    }};
}

macro_rules! trace {
    ($($t:tt)+) => {{
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($t)*);

        #[cfg(not(feature = "tracing"))]
        ::log::trace!($($t)*);
    }};
}
