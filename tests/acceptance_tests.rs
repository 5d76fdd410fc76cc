//! Acceptance tests for the uhrwerk clock runtime.
//!
//! These tests drive the full session state machine against simulated
//! collaborators with manually advanced time:
//! - Cold boot through first synchronization to a lit face
//! - Nightly resync across the October DST transition
//! - Network outage handling and forced reacquisition
//! - Configuration loading and validation round-trips

mod acceptance;
