//! Ephemeral development workspaces.
//!
//! A workspace is one multiplexer session, one clone and one review request
//! per unit of work. Those three external systems are the only source of
//! truth: this module derives the current view from them on demand, caches
//! that view for polling callers, and runs the staged workflows that create
//! and remove workspaces. It follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Discovery, caching, orchestration and handover in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
