use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::rc::Rc;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::services::session::SessionProvider;
use shared::{CountResponse, EntityKind, ErrorResponse, ReferenceKind, Submission, SubmissionMode};

/// Which slice of a reference collection a search field wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceScope {
    pub kind: ReferenceKind,
    pub consultants_only: bool,
}

impl ReferenceScope {
    pub fn all(kind: ReferenceKind) -> Self {
        Self {
            kind,
            consultants_only: false,
        }
    }

    pub fn consultants() -> Self {
        Self {
            kind: ReferenceKind::Surgeon,
            consultants_only: true,
        }
    }

    /// Path and query for this scope, e.g. `/api/surgeons?consultants_only=true`
    pub fn path(&self) -> String {
        if self.consultants_only {
            format!("/api/{}?consultants_only=true", self.kind.collection())
        } else {
            format!("/api/{}", self.kind.collection())
        }
    }
}

/// Read side of the reference collections
#[async_trait(?Send)]
pub trait ReferenceApi<C> {
    async fn fetch_candidates(&self, scope: &ReferenceScope) -> Result<Vec<C>, ApiError>;
}

/// Write collaborator that receives assembled entities. A rejection carries
/// the message to show next to the still-open form.
#[async_trait(?Send)]
pub trait EntitySubmitter {
    async fn submit(&self, submission: &Submission) -> Result<(), String>;
}

/// Source of the number of records already attached to a parent, used to
/// derive the next identifier in create mode
#[async_trait(?Send)]
pub trait EntityCounter {
    async fn count_entities(&self, kind: EntityKind, parent_id: &str) -> Result<u32, ApiError>;
}

/// API client for communicating with the clinical records server
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Rc<dyn SessionProvider>,
}

impl ApiClient {
    /// Create a new API client from configuration and a session accessor
    pub fn new(config: &ClientConfig, session: Rc<dyn SessionProvider>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn submission_request(&self, submission: &Submission) -> RequestBuilder {
        let kind = submission.payload.kind();
        match submission.mode {
            SubmissionMode::Create => {
                let url = format!("{}/api/{}", self.base_url, kind.collection());
                self.client.post(url)
            }
            SubmissionMode::Edit => {
                let url = format!(
                    "{}/api/{}/{}",
                    self.base_url,
                    kind.collection(),
                    submission.payload.identifier()
                );
                self.client.put(url)
            }
        }
    }
}

#[async_trait(?Send)]
impl<C: DeserializeOwned + 'static> ReferenceApi<C> for ApiClient {
    async fn fetch_candidates(&self, scope: &ReferenceScope) -> Result<Vec<C>, ApiError> {
        let url = format!("{}{}", self.base_url, scope.path());
        let response = self.authorized(self.client.get(&url)).send().await?;
        Self::read_json(response).await
    }
}

#[async_trait(?Send)]
impl EntityCounter for ApiClient {
    async fn count_entities(&self, kind: EntityKind, parent_id: &str) -> Result<u32, ApiError> {
        let url = format!("{}/api/{}/count", self.base_url, kind.collection());
        let request = self
            .client
            .get(&url)
            .query(&[(kind.parent_key(), parent_id)]);

        let response = self.authorized(request).send().await?;
        let body: CountResponse = Self::read_json(response).await?;
        Ok(body.count)
    }
}

#[async_trait(?Send)]
impl EntitySubmitter for ApiClient {
    async fn submit(&self, submission: &Submission) -> Result<(), String> {
        let request = self.authorized(self.submission_request(submission).json(&submission.payload));

        match request.send().await {
            Ok(response) => {
                if response.status().is_success() {
                    Ok(())
                } else {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    Err(format!("Server error {}: {}", status.as_u16(), error_message(&body)))
                }
            }
            Err(e) => Err(format!("Network error: {}", e)),
        }
    }
}

/// Prefer the API's `{"message": ...}` body, fall back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Unknown error".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
