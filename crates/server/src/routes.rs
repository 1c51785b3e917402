use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use mime::Mime;
use serde::{Deserialize, Serialize};
use storybuddy_model::{
    AudioClip, ChatMessage, ChatRequest, CompletionProvider, ImageProvider,
    TranscriptionProvider,
};
use storybuddy_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use storybuddy_replicate_model::{
    ReplicateConfigBuilder, ReplicateProvider,
};
use tracing::error;

use crate::config::ServerConfig;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    openai: OpenAIProvider,
    replicate: ReplicateProvider,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let mut openai_config =
            OpenAIConfigBuilder::with_api_key(config.openai_api_key);
        if let Some(model) = config.openai_model {
            openai_config = openai_config.with_model(model);
        }
        if let Some(base_url) = config.openai_base_url {
            openai_config = openai_config.with_base_url(base_url);
        }

        let mut replicate_config = ReplicateConfigBuilder::with_api_token(
            config.replicate_api_token,
        );
        if let Some(version) = config.replicate_version {
            replicate_config = replicate_config.with_version(version);
        }

        Self {
            openai: OpenAIProvider::new(openai_config.build()),
            replicate: ReplicateProvider::new(replicate_config.build()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/transcribe", post(transcribe))
        .route("/api/image", post(image))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ChatProxyRequest {
    messages: Vec<ChatMessage>,
}

/// Forwards a transcript to the completion provider and returns the
/// reply message. The model is pinned server-side; a `model` field in
/// the request body is ignored.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatProxyRequest>,
) -> Result<Json<ChatMessage>, ApiError> {
    if req.messages.is_empty() {
        return Err(ApiError::bad_request("messages must not be empty"));
    }
    let reply = state
        .openai
        .complete(&ChatRequest {
            messages: req.messages,
        })
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(reply))
}

#[derive(Debug, Serialize)]
struct TranscribeResponse {
    text: String,
}

/// Forwards an uploaded recording to the transcription provider.
async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut clip = None;
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        ApiError::bad_request(format!("invalid multipart body: {err}"))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name =
            field.file_name().unwrap_or("audio.wav").to_owned();
        let mime = field
            .content_type()
            .and_then(|v| v.parse::<Mime>().ok());
        let data = field.bytes().await.map_err(|err| {
            ApiError::bad_request(format!("invalid audio upload: {err}"))
        })?;
        clip = Some(match mime {
            Some(mime) => AudioClip {
                data,
                mime,
                file_name,
            },
            None => AudioClip::wav(data),
        });
        break;
    }

    let Some(clip) = clip else {
        return Err(ApiError::bad_request("missing `file` part"));
    };
    let text = state
        .openai
        .transcribe(&clip)
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(TranscribeResponse { text }))
}

#[derive(Debug, Deserialize)]
struct ImageProxyRequest {
    value: String,
}

/// Forwards a prompt to the diffusion provider and returns the output
/// URLs. Upstream details are logged, not surfaced.
async fn image(
    State(state): State<AppState>,
    Json(req): Json<ImageProxyRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    if req.value.trim().is_empty() {
        return Err(ApiError::bad_request("prompt must not be empty"));
    }
    match state.replicate.generate(&req.value).await {
        Ok(urls) => Ok(Json(urls)),
        Err(err) => {
            error!("image generation failed: {err}");
            Err(ApiError::internal())
        }
    }
}

// The validation guards run before any provider call, so the routes
// can be exercised with dummy credentials and no network.
#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt as _;

    use super::*;
    use crate::config::ServerConfig;

    fn test_router() -> Router {
        let state = AppState::new(ServerConfig {
            bind_addr: "127.0.0.1:0".to_owned(),
            openai_api_key: "sk-test".to_owned(),
            openai_model: None,
            openai_base_url: None,
            replicate_api_token: "r8-test".to_owned(),
            replicate_version: None,
        });
        router(state)
    }

    async fn error_body(
        resp: axum::response::Response,
    ) -> (StatusCode, String) {
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value =
            serde_json::from_slice(&bytes).unwrap();
        let error = body["error"].as_str().unwrap_or_default().to_owned();
        (status, error)
    }

    #[tokio::test]
    async fn test_chat_rejects_an_empty_transcript() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"messages":[]}"#))
            .unwrap();
        let resp = test_router().oneshot(req).await.unwrap();

        let (status, error) = error_body(resp).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, "messages must not be empty");
    }

    #[tokio::test]
    async fn test_transcribe_rejects_a_missing_file_part() {
        let body = concat!(
            "--boundary\r\n",
            "Content-Disposition: form-data; name=\"other\"\r\n",
            "\r\n",
            "hi\r\n",
            "--boundary--\r\n",
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/transcribe")
            .header(
                header::CONTENT_TYPE,
                "multipart/form-data; boundary=boundary",
            )
            .body(Body::from(body))
            .unwrap();
        let resp = test_router().oneshot(req).await.unwrap();

        let (status, error) = error_body(resp).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, "missing `file` part");
    }

    #[tokio::test]
    async fn test_image_rejects_an_empty_prompt() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/image")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"value":"  "}"#))
            .unwrap();
        let resp = test_router().oneshot(req).await.unwrap();

        let (status, error) = error_body(resp).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, "prompt must not be empty");
    }
}
