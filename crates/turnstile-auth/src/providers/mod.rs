//! Authentication strategy implementations
//!
//! - Basic: `Authorization: Basic` credentials checked against a user directory
//! - Session: cookie sessions over a stack of [`SessionLayer`]s
//!   - [`StoreLayer`]: tokens and records in one session store
//!   - [`ExpiringLayer`]: adds a duration policy
//!   - [`DurableLayer`]: expiring sessions kept in a durable store

pub mod basic;
pub mod durable;
pub mod expiring;
pub mod session;

pub use basic::BasicAuth;
pub use durable::DurableLayer;
pub use expiring::ExpiringLayer;
pub use session::{SessionAuth, SessionLayer, StoreLayer};

/// Cookie sessions that expire
pub type ExpiringSessionAuth = SessionAuth<ExpiringLayer<StoreLayer>>;

/// Cookie sessions that expire and persist to a durable store
pub type DurableSessionAuth = SessionAuth<DurableLayer>;
