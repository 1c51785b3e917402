use std::fmt::Debug;
use std::time::Duration;

/// The Stable Diffusion version used when none is configured.
const DEFAULT_VERSION: &str =
    "db21e45d3f7023abc2a46ee38a23973f6dce16bb082a930b0c49861f96d1e5bf";

/// Builder for [`ReplicateConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ReplicateConfigBuilder {
    api_token: String,
    version: Option<String>,
    base_url: Option<String>,
    poll_interval: Option<Duration>,
    max_polls: Option<u32>,
}

impl ReplicateConfigBuilder {
    /// Creates a builder with the given API token.
    #[inline]
    pub fn with_api_token<S: Into<String>>(api_token: S) -> Self {
        Self {
            api_token: api_token.into(),
            version: None,
            base_url: None,
            poll_interval: None,
            max_polls: None,
        }
    }

    /// Sets the model version to run.
    #[inline]
    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets how often a pending prediction is polled.
    #[inline]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = Some(poll_interval);
        self
    }

    /// Sets how many polls a prediction may take before it is
    /// considered failed.
    #[inline]
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> ReplicateConfig {
        ReplicateConfig {
            api_token: self.api_token,
            version: self
                .version
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| "https://api.replicate.com/v1".to_string()),
            poll_interval: self
                .poll_interval
                .unwrap_or(Duration::from_secs(1)),
            max_polls: self.max_polls.unwrap_or(60),
        }
    }
}

impl Debug for ReplicateConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateConfigBuilder")
            .field("api_token", &"<redacted>")
            .field("version", &self.version)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the Replicate image provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ReplicateConfig {
    pub(crate) api_token: String,
    pub(crate) version: String,
    pub(crate) base_url: String,
    pub(crate) poll_interval: Duration,
    pub(crate) max_polls: u32,
}

impl Debug for ReplicateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateConfig")
            .field("api_token", &"<redacted>")
            .field("version", &self.version)
            .field("base_url", &self.base_url)
            .finish()
    }
}
