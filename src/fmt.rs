//! Logging shims.
//!
//! Forwards to `defmt` (feature `defmt-0-3`) or `log` (feature `log`) and
//! compiles to nothing when neither is enabled. Only pass arguments that are
//! both `core::fmt::Display` and `defmt::Format` (integers, `&str`, `bool`).
#![allow(unused_macros)]

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt-0-3")]
        ::defmt::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
        #[cfg(not(any(feature = "defmt-0-3", feature = "log")))]
        let _ = ($($arg)*,);
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt-0-3")]
        ::defmt::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
        #[cfg(not(any(feature = "defmt-0-3", feature = "log")))]
        let _ = ($($arg)*,);
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt-0-3")]
        ::defmt::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
        #[cfg(not(any(feature = "defmt-0-3", feature = "log")))]
        let _ = ($($arg)*,);
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt-0-3")]
        ::defmt::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
        #[cfg(not(any(feature = "defmt-0-3", feature = "log")))]
        let _ = ($($arg)*,);
    }};
}
