//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, BackendsConfig, LocalBackendConfig, LogFormat, LoggingConfig, PatternConfig,
    ProviderConfig, RemoteBackendConfig, RouterConfig, SelectionConfig,
};
