//! Event Source Agent
//!
//! Normalises raw device telemetry events and dispatches their side effects:
//! a partial update of the device record in the device directory, an audit
//! event in the event store, and for controller network reports an
//! independent per-device fan-out.
//!
//! ## Architecture
//!
//! 1. **Contracts** (`contracts/`): envelope, tag registry, device records,
//!    audit events and the RPC wire types.
//! 2. **Validation** (`validation`): envelope gate; nothing remote happens
//!    before it passes.
//! 3. **Engine** (`engine/`): one pure rule per event tag.
//! 4. **Client** (`client/`): device directory and event store over HTTP
//!    RPC with round-robin endpoint pools.
//! 5. **Pipeline** (`pipeline`): the `save` operation.
//! 6. **Fan-out** (`fanout`): tracked background dispatch of network batches.
//! 7. **Handler** (`handler/`) and `bin/main.rs`: HTTP surface and CLI.
//!
//! ## Example
//!
//! ```rust,no_run
//! use event_source::{config::EventSourceConfig, pipeline::EventSource, telemetry::EventSourceMetricsRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EventSourceConfig::from_env()?;
//!     let registry = EventSourceMetricsRegistry::new()?;
//!     let source = EventSource::from_config(&config, registry.metrics())?;
//!
//!     let response = source
//!         .save(&serde_json::json!({
//!             "eventTag": "EVENT_DEV_MEBOOST_POWERON_REPORT",
//!             "eventData": {"uuid": "d1"}
//!         }))
//!         .await;
//!     println!("{}", serde_json::to_string(&response)?);
//!
//!     source.drain().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod handler;
pub mod pipeline;
pub mod telemetry;
pub mod validation;

// Re-export contracts
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use contracts::*;
pub use error::{EventSourceError, Result, ValidationError};
pub use pipeline::EventSource;
