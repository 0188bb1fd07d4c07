//! Auth configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults, once at startup. The signing secret is immutable afterwards;
//! there is no runtime rotation.

use std::env;

/// Credential layer configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Process-wide secret for signing tokens.
    pub jwt_secret: String,

    /// Token lifetime in seconds (fixed TTL from issue time).
    pub token_ttl_secs: i64,
}

impl AuthConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = AuthConfig {
            jwt_secret: env::var("VIGILIS_JWT_SECRET").unwrap_or_else(|_| {
                // Development fallback only.
                // In production this MUST be set via environment variable.
                "vigilis-dev-secret-change-in-production".to_string()
            }),

            token_ttl_secs: env::var("VIGILIS_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()
                .map_err(|_| ConfigError::InvalidValue("VIGILIS_TOKEN_TTL_SECS".to_string()))?,
        };

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("VIGILIS_JWT_SECRET".to_string()));
        }
        if config.token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("VIGILIS_TOKEN_TTL_SECS".to_string()));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
