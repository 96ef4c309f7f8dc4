// Bridge HTTP client
//
// Wraps `reqwest::Client` with bridge URL construction and error-envelope
// unwrapping. Endpoint groups (lights, groups, sensors, system, auth) are
// implemented as inherent methods in separate files so this module stays
// focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ApiErrorBody, ApiResult};
use crate::transport::TransportConfig;

/// Raw HTTP client for a bridge's v1 API.
///
/// Reads are plain JSON documents unless the bridge answers with an
/// error array; writes always answer with an array of `success` /
/// `error` entries. Both shapes are unwrapped here, so callers only see
/// typed payloads or a typed [`Error`].
pub struct HueClient {
    http: reqwest::Client,
    base_url: Url,
    /// Whitelisted username. Absent until paired or configured.
    username: RwLock<Option<SecretString>>,
}

impl HueClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the bridge root, e.g. `http://192.168.1.20/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            username: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Username management ───────────────────────────────────────────

    /// Adopt a username for all user-scoped requests.
    pub fn set_username(&self, username: SecretString) {
        debug!("adopting bridge username");
        *self.username.write().unwrap_or_else(PoisonError::into_inner) = Some(username);
    }

    pub fn clear_username(&self) {
        *self.username.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn has_username(&self) -> bool {
        self.username
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}` (no username).
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = if path.is_empty() {
            format!("{base}/api")
        } else {
            format!("{base}/api/{path}")
        };
        Ok(Url::parse(&full)?)
    }

    /// Build `{base}/api/{username}/{path}` for an explicit username.
    pub(crate) fn url_for_user(&self, username: &str, path: &str) -> Result<Url, Error> {
        if path.is_empty() {
            self.api_url(username)
        } else {
            self.api_url(&format!("{username}/{path}"))
        }
    }

    /// Build a user-scoped URL with the adopted username.
    pub(crate) fn user_url(&self, path: &str) -> Result<Url, Error> {
        let guard = self.username.read().unwrap_or_else(PoisonError::into_inner);
        let username = guard.as_ref().ok_or(Error::NotAuthenticated)?;
        self.url_for_user(username.expose_secret(), path)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the body, surfacing error arrays.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", redact(&url));

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let body = Self::read_body(resp).await?;

        if let Some(err) = first_error(&body) {
            return Err(Error::from_api_error(err));
        }
        decode(&body)
    }

    /// Send a PUT request with a JSON body and unwrap the result array.
    pub(crate) async fn put(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<Value>, Error> {
        debug!("PUT {}", redact(&url));

        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_results(resp).await
    }

    /// Send a POST request with a JSON body and unwrap the result array.
    pub(crate) async fn post(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<Value>, Error> {
        debug!("POST {}", redact(&url));

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_results(resp).await
    }

    async fn read_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }
        resp.text().await.map_err(Error::Transport)
    }

    /// Parse a write response. The first `error` entry wins; the
    /// `success` payloads are returned otherwise.
    async fn parse_results(resp: reqwest::Response) -> Result<Vec<Value>, Error> {
        let body = Self::read_body(resp).await?;
        let entries: Vec<ApiResult> = decode(&body)?;
        trace!(entries = entries.len(), "write acknowledged");

        let mut successes = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                ApiResult::Success(value) => successes.push(value),
                ApiResult::Error(err) => return Err(Error::from_api_error(err)),
            }
        }
        Ok(successes)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(body)),
            body: body.to_owned(),
        }
    })
}

const BODY_PREVIEW_CHARS: usize = 200;

/// At most `BODY_PREVIEW_CHARS` characters of `body`, cut on a char boundary.
fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

/// Reads answer with `[{"error": {...}}]` instead of the document on
/// failure. Returns the first error object if the body has that shape.
fn first_error(body: &str) -> Option<ApiErrorBody> {
    if !body.trim_start().starts_with('[') {
        return None;
    }
    let entries: Vec<ApiResult> = serde_json::from_str(body).ok()?;
    entries.into_iter().find_map(|entry| match entry {
        ApiResult::Error(err) => Some(err),
        ApiResult::Success(_) => None,
    })
}

/// The username is a path segment; keep it out of the logs.
fn redact(url: &Url) -> String {
    let mut segments = url.path_segments().into_iter().flatten();
    match (segments.next(), segments.next()) {
        (Some("api"), Some(user)) if !user.is_empty() && user != "config" => {
            url.as_str().replacen(user, "***", 1)
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundary() {
        let body = format!("{}ü€", "a".repeat(199));
        let cut = preview(&body);
        assert_eq!(cut.chars().count(), 200);
        assert!(cut.ends_with('ü'));
        assert_eq!(preview("short"), "short");
    }

    fn client() -> HueClient {
        HueClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://10.0.0.2/").unwrap(),
        )
    }

    #[test]
    fn user_url_requires_username() {
        let c = client();
        assert!(matches!(c.user_url("lights"), Err(Error::NotAuthenticated)));

        c.set_username(SecretString::from("abc123".to_owned()));
        assert_eq!(
            c.user_url("lights/4/state").unwrap().as_str(),
            "http://10.0.0.2/api/abc123/lights/4/state"
        );
        assert_eq!(c.user_url("").unwrap().as_str(), "http://10.0.0.2/api/abc123");
    }

    #[test]
    fn error_array_detected_on_reads() {
        let body = r#"[{"error":{"type":1,"address":"/","description":"unauthorized user"}}]"#;
        assert_eq!(first_error(body).unwrap().error_type, 1);
        assert!(first_error(r#"{"1":{"name":"Hall"}}"#).is_none());
    }

    #[test]
    fn redact_hides_username() {
        let url = Url::parse("http://10.0.0.2/api/secretuser/lights").unwrap();
        assert_eq!(redact(&url), "http://10.0.0.2/api/***/lights");
        let url = Url::parse("http://10.0.0.2/api/config").unwrap();
        assert_eq!(redact(&url), "http://10.0.0.2/api/config");
    }
}
