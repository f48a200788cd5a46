// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared HTTP session used by every search worker

use reqwest::{redirect, Client};
use thiserror::Error;

use super::config::{ConfigError, HttpConfig};

/// Failure building an [`HttpSession`]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid HTTP configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Caller-owned HTTP clients, read-only once built
///
/// Cloning is cheap; both clients share their connection pools.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    no_redirect: Client,
}

impl HttpSession {
    /// Build the session from configuration
    ///
    /// The configuration is validated first, so a zero timeout is rejected
    /// here rather than failing every request later.
    pub fn new(config: &HttpConfig) -> Result<Self, SessionError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .redirect(redirect::Policy::limited(5))
            .build()?;

        let no_redirect = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            no_redirect,
        })
    }

    /// Client that follows redirects
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Client that returns 3xx responses as-is
    pub fn no_redirect(&self) -> &Client {
        &self.no_redirect
    }
}
