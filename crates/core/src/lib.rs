//! Core types for the pricewall kiosk
//!
//! This crate provides the shared vocabulary used across all components:
//! - Trading pair configuration and pool math models
//! - Price derivation from raw pool state
//! - Session state primitives (snapshots, activity log, connection status)
//! - Error taxonomy and feed timing configuration

pub mod config;
pub mod errors;
pub mod pairs;
pub mod pools;
pub mod types;

pub use config::*;
pub use errors::*;
pub use pairs::*;
pub use pools::*;
pub use types::*;
