//! Pricewall HTTP service
//!
//! Hosts the endpoint-configuration route, the upstream quote proxy, and
//! the read-only pair views the kiosk display polls. Owns the session
//! supervisor for all configured pairs.

pub mod routes;
pub mod supervisor;

pub use routes::{router, AppState};
pub use supervisor::SessionSupervisor;
