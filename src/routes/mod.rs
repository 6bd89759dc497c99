//! Route configuration.

pub mod bridge;

pub use bridge::create_bridge_router;
