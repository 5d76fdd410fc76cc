//! Integration tests for uhrwerk acceptance testing.
//!
//! These tests drive the full session state machine against simulated
//! collaborators with manually advanced time:
//! - Cold boot through first synchronization to a lit face
//! - Nightly resync across the October DST transition
//! - Network outage handling and forced reacquisition
//! - Configuration loading and validation round-trips

mod common;
mod config_test;
mod outage_test;
mod resync_test;
mod startup_test;
