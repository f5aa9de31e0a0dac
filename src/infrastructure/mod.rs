//! Infrastructure layer - External service implementations

pub mod backend;
pub mod credentials;
pub mod logging;
pub mod services;
