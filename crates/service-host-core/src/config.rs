// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::HostError;
use std::env;
use std::str::FromStr;

use crate::event::LogLevel;

/// Configuration for the service host process.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Service type name registered with the runtime.
    pub service_type_name: String,
    /// Log level (e.g., trace, debug, info, warn, error).
    pub log_level: String,
    /// Interval of the stand-in heartbeat service, in seconds.
    pub heartbeat_interval_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            service_type_name: "ServiceHostType".to_string(),
            log_level: "info".to_string(),
            heartbeat_interval_secs: 30,
        }
    }
}

impl HostConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, HostError> {
        let service_type_name =
            env::var("HOST_SERVICE_TYPE").unwrap_or_else(|_| "ServiceHostType".to_string());
        let log_level = env::var("HOST_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());
        let heartbeat_interval_secs = env::var("HOST_HEARTBEAT_INTERVAL_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(30);

        let config = Self {
            service_type_name,
            log_level,
            heartbeat_interval_secs,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), HostError> {
        if self.service_type_name.trim().is_empty() {
            return Err(HostError::InvalidConfig(
                "HOST_SERVICE_TYPE cannot be empty".to_string(),
            ));
        }

        if let Err(e) = LogLevel::from_str(&self.log_level) {
            return Err(HostError::InvalidConfig(e));
        }

        if self.heartbeat_interval_secs == 0 {
            return Err(HostError::InvalidConfig(
                "Heartbeat interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
