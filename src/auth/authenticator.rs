//! Applies configured credentials to request builders

use super::types::AuthConfig;
use reqwest::RequestBuilder;

/// Attaches an [`AuthConfig`] header to each request it sees
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self.config.header() {
            Some((name, value)) => req.header(name, value),
            None => req,
        }
    }
}
