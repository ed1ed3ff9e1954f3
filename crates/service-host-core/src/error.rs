// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::runtime::RegistrationError;

/// Errors that can occur while bootstrapping the service host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Service registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Runtime error: {0}")]
    Runtime(String),
}
