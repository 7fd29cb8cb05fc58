use async_trait::async_trait;
use hanja_core::model::{Chapter, Hanja, HanjaId, Namespace, ProgressRecord, ProgressScope, UserId};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ProgressStoreError};
use crate::progress_store::ProgressStore;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// `{"hanja": [...]}` envelope used by the catalog listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HanjaListResponse {
    pub hanja: Vec<Hanja>,
}

/// `{"progress": [...]}` envelope used by the progress listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressListResponse {
    pub progress: Vec<ProgressRecord>,
}

/// Path segment naming a namespace's progress resource (`study-progress`, `practice-progress`).
#[must_use]
pub fn progress_resource(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Study => "study-progress",
        Namespace::Practice => "practice-progress",
    }
}

/// HTTP client for the catalog and progress endpoints.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let parsed =
            Url::parse(base_url).map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url: parsed,
            http: reqwest::Client::new(),
        })
    }

    /// Uses `HANJA_API_BASE_URL`, falling back to `DEFAULT_API_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if the configured value does not parse.
    pub fn from_env() -> Result<Self, ApiError> {
        let base = std::env::var("HANJA_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        Self::new(&base)
    }

    /// Join percent-encoded path segments onto the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn progress_endpoint(&self, namespace: Namespace, user: &UserId, scope: ProgressScope) -> Url {
        let resource = progress_resource(namespace);
        match scope {
            ProgressScope::All => self.endpoint(&["api", resource, user.as_str()]),
            ProgressScope::Chapter(chapter) => {
                let n = chapter.value().to_string();
                self.endpoint(&["api", resource, user.as_str(), "chapter", &n])
            }
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn list_hanja(&self) -> Result<Vec<Hanja>, ApiError> {
        let body: HanjaListResponse = self.get_json(self.endpoint(&["api", "hanja"])).await?;
        Ok(body.hanja)
    }

    /// `Ok(None)` when the backend answers 404.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or any other non-success status.
    pub async fn get_hanja(&self, id: &HanjaId) -> Result<Option<Hanja>, ApiError> {
        match self
            .get_json::<Hanja>(self.endpoint(&["api", "hanja", id.as_str()]))
            .await
        {
            Ok(hanja) => Ok(Some(hanja)),
            Err(ApiError::HttpStatus(StatusCode::NOT_FOUND)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn list_chapter(&self, chapter: Chapter) -> Result<Vec<Hanja>, ApiError> {
        let n = chapter.value().to_string();
        let body: HanjaListResponse = self
            .get_json(self.endpoint(&["api", "hanja", "chapter", &n]))
            .await?;
        Ok(body.hanja)
    }
}

#[async_trait]
impl ProgressStore for ApiClient {
    async fn fetch_progress(
        &self,
        namespace: Namespace,
        user: &UserId,
        scope: ProgressScope,
    ) -> Result<Vec<ProgressRecord>, ProgressStoreError> {
        let body: ProgressListResponse = self
            .get_json(self.progress_endpoint(namespace, user, scope))
            .await?;
        Ok(body.progress)
    }

    async fn save_progress(
        &self,
        namespace: Namespace,
        record: &ProgressRecord,
    ) -> Result<ProgressRecord, ProgressStoreError> {
        let url = self.endpoint(&["api", progress_resource(namespace)]);
        let response = self
            .http
            .post(url)
            .json(record)
            .send()
            .await
            .map_err(ApiError::from)?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()).into());
        }
        Ok(response.json().await.map_err(ApiError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_base_url() {
        assert!(matches!(
            ApiClient::new("localhost"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("mailto:someone@example.com"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(matches!(
            ApiClient::new("ftp://files.example.com/hanja"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(ApiClient::new("HTTPS://example.com").is_ok());
    }

    #[test]
    fn endpoints_join_onto_base_path() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(
            client.endpoint(&["api", "hanja", "chapter", "2"]).as_str(),
            "http://localhost:8000/api/hanja/chapter/2"
        );

        let prefixed = ApiClient::new("https://example.com/hanja").unwrap();
        assert_eq!(
            prefixed.endpoint(&["api", "hanja"]).as_str(),
            "https://example.com/hanja/api/hanja"
        );
    }

    #[test]
    fn progress_endpoints_encode_user_names() {
        let client = ApiClient::new(DEFAULT_API_BASE_URL).unwrap();
        let user = UserId::new("김 민지");
        let url = client.progress_endpoint(
            Namespace::Practice,
            &user,
            ProgressScope::Chapter(Chapter::new(3).unwrap()),
        );
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/practice-progress/%EA%B9%80%20%EB%AF%BC%EC%A7%80/chapter/3"
        );

        let all = client.progress_endpoint(Namespace::Study, &UserId::default(), ProgressScope::All);
        assert_eq!(all.as_str(), "http://localhost:8000/api/study-progress/default");
    }

    #[test]
    fn decodes_backend_progress_listing() {
        let body = r#"{"progress":[
            {"user_id":"default","hanja_id":"3","chapter":1,"is_known":false,
             "updated_at":"2023-11-14T22:13:20Z"},
            {"user_id":"default","hanja_id":"4","chapter":1,"is_known":true}
        ]}"#;
        let parsed: ProgressListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.progress.len(), 2);
        assert_eq!(parsed.progress[0].updated_at, Some(hanja_core::time::fixed_now()));
        assert!(parsed.progress[1].is_known);
    }
}
