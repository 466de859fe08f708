//! Outbound adapters implementing domain ports.
//!
//! - **rest**: reqwest-backed gateway for the fitness REST API
//! - **memory**: in-process gateway with failure injection, for tests and
//!   demos
//! - **snapshot**: in-memory and directory-backed snapshot repositories
//!
//! Adapters are thin translators between domain types and their transport
//! or storage representation. They contain no slice logic.

pub mod memory;
pub mod rest;
pub mod snapshot;
