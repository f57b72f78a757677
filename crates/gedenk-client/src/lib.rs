//! HTTP binding for the reaction toggle protocol.
//!
//! [`ApiClient`] implements [`gedenk_core::ReactionBackend`] against the
//! Gedenk JSON endpoints, so a [`gedenk_core::ReactionPanel`] drives real
//! requests. The bearer token decides whether the panel sees an
//! authenticated actor; an anonymous client still reads counts.

use anyhow::{Result, anyhow, bail};
use uuid::Uuid;

use gedenk_core::ReactionBackend;
use gedenk_types::api::{Envelope, LoginResponse, MemorialResponse, RegisterResponse};
use gedenk_types::models::{MemorialKind, PrivacyLevel};
use gedenk_types::reaction::{ReactionSnapshot, ReactionType};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            bearer: None,
        }
    }

    /// The same client, now acting as the given authenticated actor.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<RegisterResponse> {
        let response = self
            .http
            .post(format!("{}/auth/register", self.base_url))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;
        unwrap_envelope(response).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;
        unwrap_envelope(response).await
    }

    pub async fn create_memorial(
        &self,
        subject_name: &str,
        kind: MemorialKind,
        privacy: PrivacyLevel,
    ) -> Result<MemorialResponse> {
        let response = self
            .request(self.http.post(format!("{}/memorials", self.base_url)))
            .json(&serde_json::json!({
                "subjectName": subject_name,
                "kind": kind.as_str(),
                "privacy": privacy.as_str(),
            }))
            .send()
            .await?;
        unwrap_envelope(response).await
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl ReactionBackend for ApiClient {
    async fn toggle(&self, memorial_id: Uuid, ty: ReactionType) -> Result<ReactionSnapshot> {
        let response = self
            .request(
                self.http
                    .post(format!("{}/memorials/{}/reactions", self.base_url, memorial_id)),
            )
            .json(&serde_json::json!({ "reactionType": ty.as_str() }))
            .send()
            .await?;
        unwrap_envelope(response).await
    }

    async fn fetch(&self, memorial_id: Uuid) -> Result<ReactionSnapshot> {
        let response = self
            .request(
                self.http
                    .get(format!("{}/memorials/{}/reactions", self.base_url, memorial_id)),
            )
            .send()
            .await?;
        unwrap_envelope(response).await
    }
}

async fn unwrap_envelope<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("server answered {}: {}", status, body);
    }

    let envelope: Envelope<T> = response.json().await?;
    if !envelope.success {
        return Err(anyhow!("server answered success=false"));
    }
    Ok(envelope.data)
}
