//! REST API client for the project backend
//!
//! Handles the project list and search requests. Every request carries the
//! configured `limit` and, when a stored token exists, a bearer header.

use crate::search::SearchQuery;
use crate::source::ProjectSource;
use async_trait::async_trait;
use charitymap_core::config::ApiConfig;
use charitymap_core::credentials::StoredCredentials;
use charitymap_core::error::ApiError;
use charitymap_core::types::{Project, ProjectPage};
use metrics::counter;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, warn};

const PROJECTS_PATH: &str = "/api/projects";

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    auth_token: Option<String>,
    project_limit: u32,
}

impl ApiClient {
    /// Create a new API client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::transport(&base_url, e.to_string()))?;

        Ok(Self {
            base_url,
            client,
            auth_token: None,
            project_limit: config.project_limit,
        })
    }

    /// Attach the stored token, if there is one
    pub fn with_credentials(self, credentials: &StoredCredentials) -> Self {
        match credentials.bearer_token() {
            Some(token) => self.with_token(token),
            None => self,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Check if a token will be sent
    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn projects_url(&self) -> String {
        format!("{}{}", self.base_url, PROJECTS_PATH)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// List all projects
    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let url = self.projects_url();
        let request = self
            .client
            .get(&url)
            .query(&[("limit", self.project_limit.to_string())]);

        self.fetch_page(&url, request).await
    }

    /// Search projects by free text or by one column
    pub async fn search_projects(&self, query: &SearchQuery) -> Result<Vec<Project>, ApiError> {
        let url = self.projects_url();
        let request = self.client.get(&url).query(&[
            ("limit", self.project_limit.to_string()),
            (query.column.query_param(), query.term().to_string()),
        ]);

        self.fetch_page(&url, request).await
    }

    async fn fetch_page(&self, url: &str, request: RequestBuilder) -> Result<Vec<Project>, ApiError> {
        counter!("charitymap_api_requests_total").increment(1);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| {
                counter!("charitymap_api_errors_total").increment(1);
                ApiError::transport(url, e.to_string())
            })?;

        let response = check_status(url, response).await?;

        let page: ProjectPage = response
            .json()
            .await
            .map_err(|e| ApiError::decode(url, e.to_string()))?;

        debug!(url = %url, count = page.data.len(), "Received projects");
        Ok(page.data)
    }
}

async fn check_status(url: &str, response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    counter!("charitymap_api_errors_total").increment(1);
    warn!(url = %url, status = status.as_u16(), "Project request rejected");

    Err(ApiError::status(url, status.as_u16(), error_text))
}

#[async_trait]
impl ProjectSource for ApiClient {
    async fn fetch_all(&self) -> Result<Vec<Project>, ApiError> {
        self.list_projects().await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Project>, ApiError> {
        self.search_projects(query).await
    }
}
