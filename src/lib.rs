//! `coxiris-link`
//!
//! Host side of the COXIRIS command link. Wraps the protocol core from
//! `coxiris-core` with what a running link needs:
//!
//! - [`config`]: layered configuration (defaults, TOML, `COXIRIS_*` env)
//! - [`logging`]: tracing subscriber setup, always on stderr
//! - [`serial`]: serial port opening and draining
//! - [`service`]: the async serve loop over any reader/writer pair
//! - [`stage`] and [`simulator`]: the motion capability and a simulated
//!   stage implementing it
//!
//! # Example
//!
//! ```no_run
//! use coxiris_link::{bind_stage, build_processor, serve, LinkConfig, SimulatedStage};
//! use std::sync::Arc;
//!
//! # async fn run() -> coxiris_link::LinkResult<()> {
//! let config = LinkConfig::load_validated(None)?;
//! let stage = Arc::new(SimulatedStage::from_config(&config.simulator));
//! let mut processor = build_processor(&config, bind_stage(stage));
//! serve(tokio::io::stdin(), tokio::io::stdout(), &mut processor).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod serial;
pub mod service;
pub mod simulator;
pub mod stage;

pub use config::LinkConfig;
pub use error::{LinkError, LinkResult};
pub use service::{build_processor, serve, write_help_listing, ServiceStats};
pub use simulator::SimulatedStage;
pub use stage::{bind_stage, MotionStage};
