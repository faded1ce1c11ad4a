//! # cloud-config-client
//!
//! Client for Spring Cloud Config servers: fetch, merge, decrypt, resolve.
//!
//! ## Overview
//!
//! At startup the client:
//! - Fetches the property sources of an application with one HTTP request
//!   (`GET {base}/{application}/{profiles}/{label}`)
//! - Merges them so the most specific source wins
//! - Decrypts every `![<base64>]` value with the configured key
//! - Exposes the result as an immutable [`CloudConfig`](core::CloudConfig)
//!
//! Any failure aborts the whole pipeline. There is no partially initialized state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloud_config_client::prelude::*;
//!
//! # async fn example() -> cloud_config_client::error::Result<()> {
//! let settings = ConnectionSettings::new()
//!     .with_base_url("http://localhost:8888/")
//!     .with_application_name("orders")
//!     .with_profiles("prod,eu")
//!     .with_basic_auth("reader", "s3cret")
//!     .with_encryption_key("0123456789abcdef");
//!
//! let config = CloudConfig::builder()
//!     .with_settings(settings)
//!     .with_fallback(EnvResolver::new())
//!     .build()
//!     .await?;
//!
//! // Merged value, or the fallback's answer
//! let host = config.resolve("db.host");
//!
//! // Everything, decrypted secrets included
//! let dump = config.dump_all();
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `http` (default): `reqwest`-based [`HttpFetcher`](sources::HttpFetcher)
//! - `aes` (default): AES-CBC/ECB [`AesDecryptor`](crypto::AesDecryptor)
//! - `cli`: the `cloud-config-dump` binary

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod crypto;
pub mod error;
pub mod sources;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        CloudConfig, CloudConfigBuilder, ConnectionSettings, EnvResolver, HostInfo, MergedConfig,
        NoFallback, PropertyResolver,
    };
    pub use crate::crypto::{Algorithm, EncryptionSettings, Mode};
    pub use crate::error::{ConfigError, Result};
}
