//! Settings, precedence merge and the resolution facade.

mod builder;
mod client;
mod merge;
mod resolver;
mod settings;

pub use builder::CloudConfigBuilder;
pub use client::{CloudConfig, ConfigOrigin};
pub use merge::{MergedConfig, merge};
pub use resolver::{EnvResolver, NoFallback, PropertyResolver};
pub use settings::{
    ConnectionSettings, DEFAULT_BASE_URL, DEFAULT_ENV_PREFIX, DEFAULT_LABEL, DEFAULT_TIMEOUT,
    HostInfo,
};
