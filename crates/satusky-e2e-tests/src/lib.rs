//! End-to-end tests for the Satusky deploy pipeline.
//!
//! These tests drive the `deploy` verbs through the real orchestrator and
//! the CLI's response decoding, against an in-memory platform:
//! - Build, upload and resource creation with default flags
//! - Domain collision handling
//! - Machine selection and ownership checks
//! - Quota refusals
//! - Status polling to completion

#![cfg(test)]
