//! Live race dashboard data layer over the OpenF1 API: a resilient resource
//! client, session resolution with previous-race fallback, view assemblers and
//! a polling refresh cache.

pub mod client;
pub mod handlers;
pub mod models;
pub mod refresh;
pub mod testing;
pub mod utils;

pub use client::{QueryParams, Resource, ResourceClient};
pub use handlers::session::{resolve_session, ResolvedSession};
pub use models::{Error, Result};
pub use refresh::{QueryCache, QueryState, SessionView};
pub use utils::{
    config::{Config, RefreshPolicy},
    state::AppState,
};
