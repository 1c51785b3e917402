//! Providers for OpenAI-compatible chat-completion and speech-to-text
//! APIs.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, Response, StatusCode, header, multipart};
use storybuddy_model::{
    AudioClip, ChatMessage, ChatRequest, CompletionProvider, ErrorKind,
    ProviderError, TranscriptionProvider,
};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};

/// Error type for [`OpenAIProvider`].
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

/// OpenAI-compatible provider for chat completion and transcription.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl CompletionProvider for OpenAIProvider {
    type Error = Error;

    fn complete(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatMessage, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .json(&openai_req)
            .send();

        async move {
            let resp = match resp_fut.await.and_then(Response::error_for_status)
            {
                Ok(resp) => resp,
                Err(err) => return Err(Error::from_reqwest(err)),
            };
            expect_json(&resp)?;

            let completion: proto::ChatCompletion =
                match resp.json().await {
                    Ok(completion) => completion,
                    Err(err) => return Err(Error::from_reqwest(err)),
                };
            trace!("got {} choices", completion.choices.len());

            let Some(choice) = completion.choices.into_iter().next() else {
                return Err(Error::new(
                    "response contains no choices",
                    ErrorKind::Other,
                ));
            };
            Ok(choice.message)
        }
    }
}

impl TranscriptionProvider for OpenAIProvider {
    type Error = Error;

    fn transcribe(
        &self,
        clip: &AudioClip,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let client = self.client.clone();
        let config = Arc::clone(&self.config);
        let clip = clip.clone();

        async move {
            // Multipart forms are consumed on send, so the form is
            // built per call.
            let part = multipart::Part::stream(clip.data)
                .file_name(clip.file_name)
                .mime_str(clip.mime.essence_str())
                .map_err(|err| {
                    Error::new(format!("{err}"), ErrorKind::InvalidInput)
                })?;
            let form = multipart::Form::new()
                .part("file", part)
                .text("model", config.transcription_model.clone());

            let resp = client
                .post(format!(
                    "{}{}",
                    config.base_url, "/audio/transcriptions"
                ))
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", config.api_key),
                )
                .multipart(form)
                .send()
                .await
                .and_then(Response::error_for_status)
                .map_err(Error::from_reqwest)?;
            expect_json(&resp)?;

            let transcription: proto::Transcription =
                resp.json().await.map_err(Error::from_reqwest)?;
            Ok(transcription.text)
        }
    }
}

fn expect_json(resp: &Response) -> Result<(), Error> {
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let is_json = content_type
        .and_then(|v| v.parse::<Mime>().ok())
        .map(|m| {
            m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON)
        })
        .unwrap_or(false);
    if !is_json {
        return Err(Error::new(
            format!("unexpected content type: {content_type:?}"),
            ErrorKind::Other,
        ));
    }
    Ok(())
}
