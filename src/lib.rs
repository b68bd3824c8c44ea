//! Atelier: ephemeral development workspaces for AI-assisted work.
//!
//! A workspace is a terminal-multiplexer session running a coding assistant
//! inside a dedicated clone, tied to one review request. This crate derives
//! the live view of every workspace from the session host, version control
//! and the review system, keeps that view behind stale-while-revalidate
//! caches, and orchestrates the workflows that create, resume and tear
//! workspaces down.
//!
//! # Architecture
//!
//! Atelier follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external systems
//! - **Adapters**: Concrete implementations of ports
//! - **Services**: Discovery, caching, orchestration and handover
//!
//! # Modules
//!
//! - [`workspace`]: Workspace domain, ports, adapters and services
//! - [`config`]: JSON configuration with environment overrides
//! - [`runtime`]: Composition root wiring ports into services
//! - [`telemetry`]: Structured logging setup

pub mod config;
pub mod runtime;
pub mod telemetry;
pub mod workspace;
