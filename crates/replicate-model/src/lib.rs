//! An image provider for Replicate-hosted diffusion models.
//!
//! Replicate predictions are asynchronous: a prediction is created,
//! then polled until it settles. The provider hides the polling behind
//! the [`ImageProvider`] interface.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use reqwest::{Client, Response, StatusCode, header};
use storybuddy_model::{ErrorKind, ImageProvider, ProviderError};
use tokio::time::sleep;

pub use config::{ReplicateConfig, ReplicateConfigBuilder};
use proto::PredictionStatus;

/// Error type for [`ReplicateProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = match err.status() {
            Some(StatusCode::TOO_MANY_REQUESTS) => {
                ErrorKind::RateLimitExceeded
            }
            Some(status) if status.is_client_error() => {
                ErrorKind::InvalidInput
            }
            _ => ErrorKind::Other,
        };
        Self::new(format!("{err}"), kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Replicate-hosted diffusion model provider.
#[derive(Clone, Debug)]
pub struct ReplicateProvider {
    client: Client,
    config: Arc<ReplicateConfig>,
}

impl ReplicateProvider {
    /// Creates a new `ReplicateProvider` with the given configuration.
    #[inline]
    pub fn new(config: ReplicateConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ImageProvider for ReplicateProvider {
    type Error = Error;

    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'static
    {
        let request = proto::create_request(prompt, &self.config);
        let client = self.client.clone();
        let config = Arc::clone(&self.config);

        async move {
            let resp = client
                .post(format!("{}{}", config.base_url, "/predictions"))
                .header(
                    header::AUTHORIZATION,
                    format!("Token {}", config.api_token),
                )
                .header(header::CONTENT_TYPE, "application/json")
                .json(&request)
                .send()
                .await
                .and_then(Response::error_for_status)
                .map_err(Error::from_reqwest)?;
            let mut prediction: proto::Prediction =
                resp.json().await.map_err(Error::from_reqwest)?;
            debug!("created prediction {}", prediction.id);

            let mut polls = 0;
            loop {
                match prediction.status {
                    PredictionStatus::Succeeded => {
                        let output = prediction.output.unwrap_or_default();
                        if output.is_empty() {
                            return Err(Error::new(
                                "prediction returned no output",
                                ErrorKind::Other,
                            ));
                        }
                        return Ok(output);
                    }
                    PredictionStatus::Failed
                    | PredictionStatus::Canceled => {
                        let message =
                            prediction.error.unwrap_or_else(|| {
                                "prediction failed".to_owned()
                            });
                        return Err(Error::new(message, ErrorKind::Other));
                    }
                    PredictionStatus::Starting
                    | PredictionStatus::Processing => {}
                }

                if polls >= config.max_polls {
                    return Err(Error::new(
                        "prediction did not finish in time",
                        ErrorKind::Other,
                    ));
                }
                polls += 1;
                sleep(config.poll_interval).await;

                trace!("polling prediction {}", prediction.id);
                prediction = client
                    .get(&prediction.urls.get)
                    .header(
                        header::AUTHORIZATION,
                        format!("Token {}", config.api_token),
                    )
                    .send()
                    .await
                    .and_then(Response::error_for_status)
                    .map_err(Error::from_reqwest)?
                    .json()
                    .await
                    .map_err(Error::from_reqwest)?;
            }
        }
    }
}
