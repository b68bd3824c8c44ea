//! Unit tests for the workspace services.
//!
//! Service tests run against the in-memory adapters with a manually driven
//! clock; `mockall` mocks stand in where a test must prove a port is never
//! called.

pub(crate) mod support;
