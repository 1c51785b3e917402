use std::env;

use anyhow::Context;

/// Server configuration, read from the environment at startup.
///
/// Provider credentials live here and nowhere else; they are never
/// accepted from, or echoed to, a client.
pub struct ServerConfig {
    pub bind_addr: String,
    pub openai_api_key: String,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub replicate_api_token: String,
    pub replicate_version: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: env::var("STORYBUDDY_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_owned()),
            openai_api_key: require("OPENAI_API_KEY")?,
            openai_model: env::var("OPENAI_MODEL").ok(),
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            replicate_api_token: require("REPLICATE_API_TOKEN")?,
            replicate_version: env::var("REPLICATE_MODEL_VERSION").ok(),
        })
    }
}

fn require(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .with_context(|| format!("{name} environment variable is not set"))
}
