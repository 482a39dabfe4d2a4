//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! process environment (+ .env)
//!     → credentials.rs (provider keys)
//!     → passed by value into each provider client
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Secrets never live in the config file

pub mod credentials;
pub mod loader;
pub mod schema;
pub mod validation;

pub use credentials::Credentials;
pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    FinancialConfig, GenerativeConfig, ListenerConfig, ObservabilityConfig, ProxyConfig,
    RetryConfig, SecurityConfig, TimeoutConfig,
};
