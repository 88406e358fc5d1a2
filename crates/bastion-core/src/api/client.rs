// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the remote user API.

use futures::stream::{self, StreamExt};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::{FetchResult, redact_url};
use crate::config::ApiConfig;
use crate::error::{ApiError, RequestFailure};
use crate::users::NewUser;

/// Client for the remote user API.
///
/// Holds one HTTP client with the configured timeout for reuse across
/// requests. Certificate validation is always on and redirects are never
/// followed, so each call issues exactly the requests it documents.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP client with configured timeout.
    http: Client,
    /// Base URL every resource path is built from.
    base: Url,
    /// Field in the primary payload holding the enrichment reference.
    enrichment_field: String,
    /// Field the enrichment payload is merged under.
    details_field: String,
    require_https: bool,
    same_origin_enrichment: bool,
    max_concurrency: usize,
}

impl ApiClient {
    /// Creates a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if:
    /// - `base_url` is missing or not an absolute http(s) URL
    /// - `require_https` is set and the base URL is not `https`
    /// - the timeout is zero
    ///
    /// Returns `ApiError::Client` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let raw = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("api.base_url is not configured"))?;

        let base = Url::parse(raw).map_err(|e| invalid(&format!("api.base_url is invalid ({e})")))?;
        match base.scheme() {
            "https" => {}
            "http" if !config.require_https => {}
            "http" => return Err(invalid("api.base_url must use https")),
            other => return Err(invalid(&format!("unsupported URL scheme '{other}'"))),
        }
        if base.cannot_be_a_base() || base.host_str().is_none() {
            return Err(invalid("api.base_url must be an absolute URL with a host"));
        }
        if config.timeout_seconds == 0 {
            return Err(invalid("api.timeout_seconds must be greater than zero"));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .https_only(config.require_https)
            .redirect(Policy::none())
            .build()
            .map_err(ApiError::Client)?;

        debug!(base = %redact_url(&base), timeout_secs = config.timeout_seconds, "Created API client");

        Ok(Self {
            http,
            base,
            enrichment_field: config.enrichment_field.clone(),
            details_field: config.details_field.clone(),
            require_https: config.require_https,
            same_origin_enrichment: config.same_origin_enrichment,
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    /// Fetches a resource and, if it carries an enrichment reference,
    /// the single payload that reference points at.
    ///
    /// The reference is read from the configured enrichment field; it may be
    /// absolute or relative to the base URL. A missing or `null` reference
    /// means no follow-up request. The follow-up payload is never inspected
    /// for further references.
    ///
    /// # Errors
    ///
    /// - `ApiError::Primary` if the resource request fails or is not a JSON object
    /// - `ApiError::Enrichment` if the reference is malformed, refused by the
    ///   origin policy, or its request fails. No partial result is returned.
    #[instrument(skip(self))]
    pub async fn fetch_enriched(&self, resource_id: &str) -> Result<FetchResult, ApiError> {
        let url = self.user_url(resource_id)?;
        let resource = self
            .get_object(url.clone())
            .await
            .map_err(ApiError::Primary)?;

        let Some(target) = self
            .enrichment_target(&url, &resource)
            .map_err(ApiError::Enrichment)?
        else {
            debug!("No enrichment reference");
            return Ok(FetchResult::new(resource, None, &self.details_field));
        };

        let details = self
            .request_json(Method::GET, target, None::<&()>, |s| s.is_success())
            .await
            .map_err(ApiError::Enrichment)?;

        Ok(FetchResult::new(resource, Some(details), &self.details_field))
    }

    /// Fetches a resource without following any reference.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Primary` if the request fails or the body is not a JSON object.
    #[instrument(skip(self))]
    pub async fn fetch(&self, resource_id: &str) -> Result<Map<String, Value>, ApiError> {
        let url = self.user_url(resource_id)?;
        self.get_object(url).await.map_err(ApiError::Primary)
    }

    /// Fetches several resources with bounded concurrency.
    ///
    /// Results come back in input order, one per id; a failure for one id
    /// does not affect the others.
    #[instrument(skip_all, fields(count = ids.len()))]
    pub async fn fetch_batch<S>(&self, ids: &[S]) -> Vec<Result<Map<String, Value>, ApiError>>
    where
        S: AsRef<str>,
    {
        stream::iter(ids)
            .map(|id| self.fetch(id.as_ref()))
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    /// Creates a user. The server must answer `201 Created`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Primary` on any other status, transport failure or
    /// a response that is not a JSON object.
    #[instrument(skip_all)]
    pub async fn create(&self, user: &NewUser) -> Result<Map<String, Value>, ApiError> {
        let url = self.collection_url()?;
        let value = self
            .request_json(Method::POST, url.clone(), Some(user), |s| {
                s == StatusCode::CREATED
            })
            .await
            .map_err(ApiError::Primary)?;
        into_object(&url, value).map_err(ApiError::Primary)
    }

    /// Replaces a user's record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Primary` on a non-2xx status, transport failure or
    /// a response that is not a JSON object.
    #[instrument(skip(self, user))]
    pub async fn update(
        &self,
        resource_id: &str,
        user: &NewUser,
    ) -> Result<Map<String, Value>, ApiError> {
        let url = self.user_url(resource_id)?;
        let value = self
            .request_json(Method::PUT, url.clone(), Some(user), |s| s.is_success())
            .await
            .map_err(ApiError::Primary)?;
        into_object(&url, value).map_err(ApiError::Primary)
    }

    /// Deletes a user. Accepts `200 OK` or `204 No Content`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Primary` on any other status or transport failure.
    #[instrument(skip(self))]
    pub async fn delete(&self, resource_id: &str) -> Result<(), ApiError> {
        let url = self.user_url(resource_id)?;
        self.request(Method::DELETE, url, None::<&()>, |s| {
            s == StatusCode::OK || s == StatusCode::NO_CONTENT
        })
        .await
        .map_err(ApiError::Primary)?;
        Ok(())
    }

    /// `{base}/users`.
    fn collection_url(&self) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| invalid("api.base_url cannot carry a path"))?
            .pop_if_empty()
            .push("users");
        Ok(url)
    }

    /// `{base}/users/{id}`, with the id encoded as a single path segment.
    fn user_url(&self, resource_id: &str) -> Result<Url, ApiError> {
        let id = resource_id.trim();
        if id.is_empty() {
            return Err(invalid("resource id is empty"));
        }
        if id == "." || id == ".." {
            return Err(invalid("resource id is not a valid path segment"));
        }
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|()| invalid("api.base_url cannot carry a path"))?
            .push(id);
        Ok(url)
    }

    /// Reads the enrichment reference out of `resource` and resolves it.
    ///
    /// Returns `Ok(None)` when the field is absent, `null` or blank.
    fn enrichment_target(
        &self,
        primary: &Url,
        resource: &Map<String, Value>,
    ) -> Result<Option<Url>, RequestFailure> {
        let reference = match resource.get(&self.enrichment_field) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => s.trim(),
            Some(_) => {
                return Err(RequestFailure::UnexpectedShape {
                    url: redact_url(primary),
                    reason: format!("field '{}' is not a string", self.enrichment_field),
                });
            }
        };

        let target = self
            .base
            .join(reference)
            .map_err(|e| RequestFailure::Rejected {
                url: redact_url(primary),
                reason: format!("enrichment reference is not a valid URL ({e})"),
            })?;

        let rejected = |reason: &str| RequestFailure::Rejected {
            url: redact_url(&target),
            reason: reason.to_string(),
        };
        match target.scheme() {
            "https" => {}
            "http" if !self.require_https => {}
            "http" => return Err(rejected("enrichment reference must use https")),
            _ => return Err(rejected("enrichment reference must be http(s)")),
        }
        if self.same_origin_enrichment && target.origin() != self.base.origin() {
            return Err(rejected("enrichment reference is on a different origin"));
        }

        Ok(Some(target))
    }

    async fn get_object(&self, url: Url) -> Result<Map<String, Value>, RequestFailure> {
        let value = self
            .request_json(Method::GET, url.clone(), None::<&()>, |s| s.is_success())
            .await?;
        into_object(&url, value)
    }

    async fn request_json<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        accept: impl Fn(StatusCode) -> bool,
    ) -> Result<Value, RequestFailure>
    where
        B: Serialize + ?Sized,
    {
        let shown = redact_url(&url);
        let bytes = self.request(method, url, body, accept).await?;
        serde_json::from_slice(&bytes).map_err(|source| RequestFailure::Parse { url: shown, source })
    }

    /// Sends one request and returns the body of an accepted response.
    async fn request<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        accept: impl Fn(StatusCode) -> bool,
    ) -> Result<Vec<u8>, RequestFailure>
    where
        B: Serialize + ?Sized,
    {
        let shown = redact_url(&url);
        debug!(method = %method, url = %shown, "Sending request");

        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| transport_failure(&shown, e))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %shown, "Received response");
        if !accept(status) {
            return Err(RequestFailure::Status {
                url: shown,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_failure(&shown, e))?;
        Ok(bytes.to_vec())
    }
}

fn invalid(reason: &str) -> ApiError {
    ApiError::InvalidRequest {
        reason: reason.to_string(),
    }
}

fn transport_failure(url: &str, err: reqwest::Error) -> RequestFailure {
    if err.is_timeout() {
        RequestFailure::Timeout {
            url: url.to_string(),
        }
    } else {
        RequestFailure::Transport {
            url: url.to_string(),
            source: err.without_url(),
        }
    }
}

fn into_object(url: &Url, value: Value) -> Result<Map<String, Value>, RequestFailure> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(RequestFailure::UnexpectedShape {
            url: redact_url(url),
            reason: "expected a JSON object".to_string(),
        }),
    }
}
