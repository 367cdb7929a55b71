use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::api::dto::{
    parse_sources, ChatRequest, ChatResponse, DatabaseStats, ErrorDetail, ExportEntry,
    ExportListResponse, ExportRequest, HistoryResponse, RagHealthResponse, SearchRequest,
    SourceDto, StatsResponse,
};
use crate::models::internal::{
    BackendHealth, ChatReply, ExportFormat, ExportPayload, PaperReference, SearchMode,
};

/// Sentinel the chat-health endpoint reports when the RAG pipeline is usable.
pub const RAG_HEALTHY: &str = "healthy";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),
    #[error("Service unavailable ({status}): {message}")]
    ServiceUnavailable { status: u16, message: String },
    #[error("Endpoint not found: {0}")]
    EndpointMissing(String),
    #[error("Export not supported: {0}")]
    ExportUnsupported(String),
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidUrl(err.to_string())
        } else {
            ApiError::Unreachable(err.to_string())
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Unreachable(_) => FailureKind::Unreachable,
            ApiError::ServiceUnavailable { .. } => FailureKind::ServiceUnavailable,
            ApiError::EndpointMissing(_) => FailureKind::EndpointMissing,
            ApiError::ExportUnsupported(_)
            | ApiError::Status { .. }
            | ApiError::InvalidResponse(_)
            | ApiError::InvalidUrl(_) => FailureKind::GenericFailure,
        }
    }
}

/// Chat failure classes, each with one fixed user-facing explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unreachable,
    ServiceUnavailable,
    EndpointMissing,
    GenericFailure,
}

impl FailureKind {
    pub fn message(self) -> &'static str {
        match self {
            FailureKind::Unreachable => {
                "I couldn't reach the research backend. Please check that the server is \
running and that your network connection is working, then try again."
            }
            FailureKind::ServiceUnavailable => {
                "The research service is temporarily unavailable. The backend reported an \
internal error while generating an answer; please try again in a moment."
            }
            FailureKind::EndpointMissing => {
                "The chat endpoint was not found on the backend. The server may be running an \
incompatible version of the API."
            }
            FailureKind::GenericFailure => {
                "Sorry, something went wrong while processing your question. Please try again."
            }
        }
    }
}

/// The three calls the chat controller depends on.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Never fails: transport problems collapse into `BackendHealth::Offline`.
    async fn check_health(&self) -> BackendHealth;

    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ApiError>;

    async fn export_conversation(
        &self,
        conversation_id: String,
        format: ExportFormat,
        title_hint: String,
    ) -> Result<ExportPayload, ApiError>;
}

/// HTTP client for the paper RAG backend (`/api/v1`).
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// `path` followed by `segments`, each percent-encoded as a single segment.
    fn segment_url(&self, path: &str, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.url(path)).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .extend(segments);
        Ok(url)
    }

    /// Builds the chat request body from the individual turn parameters.
    pub fn chat_request(
        query: &str,
        conversation_id: Option<&str>,
        n_results: u32,
        search_mode: SearchMode,
        max_context_messages: u32,
    ) -> ChatRequest {
        ChatRequest {
            query: query.to_string(),
            conversation_id: conversation_id.map(|s| s.to_string()),
            n_results,
            search_type: search_mode.as_str().to_string(),
            max_context_messages,
        }
    }

    pub async fn search_papers(
        &self,
        query: &str,
        n_results: u32,
        search_mode: SearchMode,
    ) -> Result<Vec<PaperReference>, ApiError> {
        let request = SearchRequest {
            query: query.to_string(),
            n_results,
            search_type: search_mode.as_str().to_string(),
        };

        let response = self
            .client
            .post(self.url("/search"))
            .json(&request)
            .send()
            .await?;
        let sources: Vec<SourceDto> = decode(ensure_success(response).await?).await?;
        parse_sources(sources).map_err(ApiError::InvalidResponse)
    }

    pub async fn conversation_history(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> Result<HistoryResponse, ApiError> {
        let response = self
            .client
            .get(self.segment_url("/chat/history", &[conversation_id])?)
            .query(&[("limit", limit)])
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }

    pub async fn conversation_stats(&self, conversation_id: &str) -> Result<StatsResponse, ApiError> {
        let response = self
            .client
            .get(self.segment_url("/chat/stats", &[conversation_id])?)
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }

    pub async fn database_stats(&self) -> Result<DatabaseStats, ApiError> {
        let response = self.client.get(self.url("/stats")).send().await?;
        decode(ensure_success(response).await?).await
    }

    pub async fn list_exports(&self) -> Result<Vec<ExportEntry>, ApiError> {
        let response = self.client.get(self.url("/chat/exports")).send().await?;
        let listing: ExportListResponse = decode(ensure_success(response).await?).await?;
        Ok(listing.exports)
    }

    pub async fn delete_export(&self, filename: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.segment_url("/chat/exports", &[filename])?)
            .send()
            .await?;
        ensure_success(response).await?;
        tracing::debug!("Deleted export {}", filename);
        Ok(())
    }

    /// Single liveness probe; `None` means the probe failed outright.
    async fn probe(&self, path: &str) -> Option<Response> {
        match self.client.get(self.url(path)).send().await {
            Ok(response) if response.status().is_success() => Some(response),
            Ok(response) => {
                tracing::debug!("Probe {} returned {}", path, response.status());
                None
            }
            Err(e) => {
                tracing::debug!("Probe {} failed: {}", path, e);
                None
            }
        }
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn check_health(&self) -> BackendHealth {
        let (general, rag) = futures::join!(self.probe("/health"), self.probe("/chat/health"));

        let health = match (general, rag) {
            (Some(_), Some(rag)) => match rag.json::<RagHealthResponse>().await {
                Ok(body) if body.rag_service.as_deref() == Some(RAG_HEALTHY) => {
                    BackendHealth::Online
                }
                Ok(_) => BackendHealth::Degraded,
                Err(e) => {
                    tracing::warn!("Unreadable chat health body: {}", e);
                    BackendHealth::Degraded
                }
            },
            _ => BackendHealth::Offline,
        };

        tracing::info!("Backend health at {}: {}", self.base_url, health);
        health
    }

    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ApiError> {
        tracing::debug!(
            "POST /chat (conversation: {:?}, n_results: {}, search_type: {})",
            request.conversation_id,
            request.n_results,
            request.search_type
        );

        let response = self
            .client
            .post(self.url("/chat"))
            .json(&request)
            .send()
            .await?;

        let chat_response: ChatResponse = decode(ensure_success(response).await?).await?;
        if let Some(error) = chat_response.error.as_deref() {
            tracing::warn!("Backend reported a generation error: {}", error);
        }
        chat_response.into_reply().map_err(ApiError::InvalidResponse)
    }

    async fn export_conversation(
        &self,
        conversation_id: String,
        format: ExportFormat,
        title_hint: String,
    ) -> Result<ExportPayload, ApiError> {
        let request = ExportRequest {
            conversation_id: conversation_id.clone(),
            query: title_hint,
        };

        let response = self
            .client
            .post(self.url(&format!("/chat/export/{}", format.as_path())))
            .json(&request)
            .send()
            .await?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorDetail>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            return Err(ApiError::ExportUnsupported(detail));
        }

        let response = ensure_success(response).await?;
        let filename = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| {
                format!("research_report_{}.{}", conversation_id, format.extension())
            });

        let bytes = response.bytes().await?.to_vec();
        tracing::debug!("Downloaded export {} ({} bytes)", filename, bytes.len());
        Ok(ExportPayload { bytes, filename })
    }
}

/// Maps a non-2xx response onto the error taxonomy.
pub fn classify_status(status: StatusCode, path: &str, body: String) -> ApiError {
    let message = serde_json::from_str::<ErrorDetail>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        ApiError::EndpointMissing(path.to_string())
    } else if status.is_server_error() {
        ApiError::ServiceUnavailable {
            status: status.as_u16(),
            message,
        }
    } else {
        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let err = classify_status(status, &path, body);
    tracing::warn!("{}", err);
    Err(err)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Extracts `filename` from a `Content-Disposition` header value.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
