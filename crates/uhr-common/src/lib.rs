#![doc = "Shared foundation for the uhrwerk workspace: instants and ticks, calendar math, session phases, configuration."]

pub mod calendar;
pub mod config;
pub mod error;
pub mod metrics;
pub mod state;
pub mod time;

pub use calendar::*;
pub use config::*;
pub use error::*;
pub use metrics::*;
pub use state::*;
pub use time::*;
