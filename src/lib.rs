//! WorkStation gate - authorization and session-trust core
//!
//! Password login with a one-time second factor, signed stateless sessions,
//! a fixed role → permission matrix, and per-object visibility for documents,
//! messages, contacts and access requests.

pub mod auth;
pub mod config;
pub mod db;
pub mod services;
pub mod types;
pub mod visibility;

pub use config::{Args, GateConfig};
pub use services::{Workstation, WorkstationBuilder};
pub use types::{AuthError, Result};
