//! Event Source Agent Contracts
//!
//! Wire and domain types shared by the validator, the rule engine, the
//! remote clients and the HTTP surface.

mod audit;
mod de;
mod device;
mod event;
mod rpc;

pub use audit::*;
pub use device::*;
pub use event::*;
pub use rpc::*;

/// Service identifier used in logs, metrics and the health endpoint
pub const SERVICE_NAME: &str = "event-source";

/// Service version (from Cargo.toml)
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
