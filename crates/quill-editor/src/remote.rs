//! HTTP client for the Quill API.
//!
//! Implements both collaborator contracts so an [`Editor`](crate::Editor)
//! can run against a remote server.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use quill_types::api::{
    AuthResponse, CreateDocumentRequest, DocumentListResponse, DocumentResponse, LoginRequest,
    RegisterRequest, TransformRequest, TransformResponse,
};
use quill_types::{
    Document, DocumentId, DocumentPatch, DocumentStore, DocumentSummary, StoreError,
    TransformError, TransformKind, TransformService, User, UserId,
};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    user: Option<User>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            user: None,
        }
    }

    /// Resume a session from a token obtained earlier.
    pub fn with_session(base_url: impl Into<String>, token: String, user: User) -> Self {
        let mut client = Self::new(base_url);
        client.token = Some(token);
        client.user = Some(user);
        client
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Log in with a username or email address.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<&User, StoreError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = send(self.http.post(self.url("/auth/login")).json(&body)).await?;
        self.accept_auth(response).await
    }

    pub async fn register(&mut self, request: &RegisterRequest) -> Result<&User, StoreError> {
        let response = send(self.http.post(self.url("/auth/register")).json(request)).await?;
        self.accept_auth(response).await
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
    }

    async fn accept_auth(&mut self, response: Response) -> Result<&User, StoreError> {
        let auth: AuthResponse = expect_success(response).await?;
        debug!(user_id = %auth.user.id, "Authenticated");
        self.token = Some(auth.token);
        Ok(self.user.insert(auth.user))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<&str, StoreError> {
        self.token.as_deref().ok_or(StoreError::Unauthorized)
    }

    /// The token, provided `owner` is the signed-in user. The server scopes
    /// every request to the token's user, so any other owner is refused here.
    fn authorize(&self, owner: UserId) -> Result<&str, StoreError> {
        let token = self.bearer()?;
        match &self.user {
            Some(user) if user.id == owner => Ok(token),
            Some(_) => Err(StoreError::OwnerMismatch(owner)),
            None => Err(StoreError::Unauthorized),
        }
    }
}

async fn send(request: RequestBuilder) -> Result<Response, StoreError> {
    request
        .send()
        .await
        .map_err(|e| StoreError::Request(e.to_string()))
}

async fn expect_success<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(StoreError::Unauthorized);
    }
    if !status.is_success() {
        return Err(StoreError::Status(status.as_u16()));
    }
    response
        .json()
        .await
        .map_err(|e| StoreError::Request(format!("malformed response: {}", e)))
}

/// `Ok(None)` for 404, which also covers documents owned by someone else.
async fn expect_found<T: DeserializeOwned>(response: Response) -> Result<Option<T>, StoreError> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    expect_success(response).await.map(Some)
}

impl DocumentStore for ApiClient {
    async fn fetch_all(&self, owner: UserId) -> Result<Vec<DocumentSummary>, StoreError> {
        let token = self.authorize(owner)?;
        let response = send(self.http.get(self.url("/documents")).bearer_auth(token)).await?;
        let list: DocumentListResponse = expect_success(response).await?;
        Ok(list.documents)
    }

    async fn fetch_one(
        &self,
        id: DocumentId,
        owner: UserId,
    ) -> Result<Option<Document>, StoreError> {
        let token = self.authorize(owner)?;
        let url = self.url(&format!("/documents/{}", id));
        let response = send(self.http.get(url).bearer_auth(token)).await?;
        let found: Option<DocumentResponse> = expect_found(response).await?;
        Ok(found.map(|r| r.document))
    }

    async fn create(
        &self,
        owner: UserId,
        title: &str,
        content: &str,
    ) -> Result<Document, StoreError> {
        let token = self.authorize(owner)?;
        let body = CreateDocumentRequest {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        };
        let response = send(
            self.http
                .post(self.url("/documents"))
                .bearer_auth(token)
                .json(&body),
        )
        .await?;
        let created: DocumentResponse = expect_success(response).await?;
        Ok(created.document)
    }

    async fn update(
        &self,
        id: DocumentId,
        owner: UserId,
        patch: DocumentPatch,
    ) -> Result<Option<Document>, StoreError> {
        let token = self.authorize(owner)?;
        let url = self.url(&format!("/documents/{}", id));
        let response = send(self.http.put(url).bearer_auth(token).json(&patch)).await?;
        let updated: Option<DocumentResponse> = expect_found(response).await?;
        Ok(updated.map(|r| r.document))
    }

    async fn soft_delete(&self, id: DocumentId, owner: UserId) -> Result<bool, StoreError> {
        let token = self.authorize(owner)?;
        let url = self.url(&format!("/documents/{}", id));
        let response = send(self.http.delete(url).bearer_auth(token)).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::UNAUTHORIZED => Err(StoreError::Unauthorized),
            status if status.is_success() => Ok(true),
            status => Err(StoreError::Status(status.as_u16())),
        }
    }
}

impl TransformService for ApiClient {
    async fn transform(&self, text: &str, kind: TransformKind) -> Result<String, TransformError> {
        if text.trim().is_empty() {
            return Err(TransformError::EmptyInput);
        }
        let token = self
            .bearer()
            .map_err(|e| TransformError::Provider(e.to_string()))?;

        let body = TransformRequest {
            text: text.to_string(),
            kind,
        };
        let response = self
            .http
            .post(self.url("/ai/transform"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransformError::Provider(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            return Err(TransformError::EmptyInput);
        }
        if !status.is_success() {
            warn!(%status, %kind, "Transform request rejected");
            return Err(TransformError::Provider(format!("server returned {}", status)));
        }

        let parsed: TransformResponse = response
            .json()
            .await
            .map_err(|e| TransformError::Provider(format!("malformed response: {}", e)))?;
        if parsed.text.trim().is_empty() {
            return Err(TransformError::EmptyResponse);
        }
        Ok(parsed.text)
    }
}
