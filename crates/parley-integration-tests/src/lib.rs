//! Integration test crate for Parley components.
//!
//! This crate exists solely to run integration tests that span the core,
//! persistence and agent crates. It has no public API - all functionality
//! is in the test modules.

#![forbid(unsafe_code)]
