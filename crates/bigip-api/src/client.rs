// Control API HTTP client
//
// Wraps `reqwest::Client` with token header injection, `/mgmt/tm/` URL
// construction, collection envelope unwrapping, and error body parsing.
// Endpoint groups (network, ltm, system) are inherent methods in separate
// files to keep this module focused on transport mechanics.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{Collection, ErrorBody};
use crate::transport::TransportConfig;

pub(crate) const AUTH_HEADER: &str = "X-F5-Auth-Token";

/// Administrative partition every driver-managed object lives in.
pub(crate) const PARTITION: &str = "Common";

/// Raw HTTP client for one appliance.
///
/// Holds the auth token captured by [`login`](Self::login). All endpoint
/// methods fail with [`Error::NotLoggedIn`] until a token is present.
pub struct ApplianceClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
}

impl ApplianceClient {
    /// Create a client for the appliance at `base_url`
    /// (e.g. `https://10.1.1.245`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(None),
        }
    }

    /// The appliance base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Token management ─────────────────────────────────────────────

    pub(crate) fn set_token(&self, token: Option<SecretString>) {
        *self.token.write().expect("token lock poisoned") = token;
    }

    pub(crate) fn token(&self) -> Option<SecretString> {
        self.token.read().expect("token lock poisoned").clone()
    }

    /// Whether a token from a successful login is held.
    pub fn is_logged_in(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let guard = self.token.read().expect("token lock poisoned");
        let token = guard.as_ref().ok_or(Error::NotLoggedIn)?;
        Ok(builder.header(AUTH_HEADER, token.expose_secret()))
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/mgmt/{segments...}` with each segment percent-encoded.
    pub(crate) fn mgmt_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("mgmt")
            .extend(segments);
        Ok(url)
    }

    /// Build `{base}/mgmt/tm/{module}/{kind}`.
    pub(crate) fn collection_url(&self, module: &str, kind: &str) -> Result<Url, Error> {
        self.mgmt_url(&["tm", module, kind])
    }

    /// Build `{base}/mgmt/tm/{module}/{kind}/~Common~{name}`.
    pub(crate) fn object_url(&self, module: &str, kind: &str, name: &str) -> Result<Url, Error> {
        let object = object_id(name);
        self.mgmt_url(&["tm", module, kind, &object])
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET a collection and unwrap its `items`.
    pub(crate) async fn list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        let collection: Collection<T> = self.get(url).await?;
        Ok(collection.items)
    }

    /// GET a single JSON document.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.authorize(self.http.get(url))?.send().await?;
        let body = Self::checked_body(resp).await?;
        decode(&body)
    }

    /// POST a JSON body, discarding the response document.
    pub(crate) async fn post(&self, url: Url, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self.authorize(self.http.post(url).json(body))?.send().await?;
        Self::checked_body(resp).await?;
        Ok(())
    }

    /// DELETE an object.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);
        let resp = self.authorize(self.http.delete(url))?.send().await?;
        Self::checked_body(resp).await?;
        Ok(())
    }

    /// Map non-2xx responses into errors and return the body text.
    pub(crate) async fn checked_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        trace!(%status, len = body.len(), "response received");

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| preview(&body));

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication { message });
        }

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Full-path object identifier, `~Common~{name}`.
pub(crate) fn object_id(name: &str) -> String {
    format!("~{PARTITION}~{name}")
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(body)),
            body: body.to_owned(),
        }
    })
}
