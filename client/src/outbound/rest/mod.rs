//! REST outbound adapter.
//!
//! This module provides a thin HTTP implementation of every gateway port
//! against the fitness API's JSON envelope.

mod dto;
mod http_gateway;
mod query;

pub use http_gateway::RestGateway;
