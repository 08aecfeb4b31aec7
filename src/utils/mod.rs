pub mod colors;
pub mod config;
pub mod format;
pub mod logging;
pub mod policy;
pub mod race_utils;
pub mod rate_limiter;
pub mod selection;
pub mod state;
