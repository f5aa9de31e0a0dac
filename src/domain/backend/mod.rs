//! Backend client seam - the interface the chain executor calls through

mod client;
mod registry;

pub use client::{BackendClient, HopOutput, HopRequest};
pub use registry::BackendRegistry;

#[cfg(test)]
pub use client::mock;
