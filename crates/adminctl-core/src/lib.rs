//! Admin client core (session, gateway, endpoints, config).

pub mod api;
pub mod client;
pub mod config;
mod fs_util;
pub mod gateway;
pub mod logging;
pub mod session;

pub use client::Client;
pub use gateway::GatewayError;
