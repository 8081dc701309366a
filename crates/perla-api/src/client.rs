// Status endpoint HTTP client
//
// Wraps `reqwest::Client` with the appliance URL, optional Basic auth,
// and the relaxed body decoding the firmware needs. One call, one GET:
// retry policy belongs to whoever schedules the calls.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Fixed path of the status document on the appliance.
pub const STATUS_PATH: &str = "/api/GetCurrentData";

/// Number of body characters kept when the appliance answers non-200.
const ERROR_BODY_LIMIT: usize = 200;

/// Decoded status document: flat field name -> raw scalar.
pub type StatusPayload = serde_json::Map<String, Value>;

/// HTTP Basic credentials for the appliance's local API.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Raw HTTP client for the appliance status endpoint.
///
/// Stateless apart from its configuration: every [`fetch_status`]
/// issues exactly one request and never touches shared state.
///
/// [`fetch_status`]: PerlaClient::fetch_status
#[derive(Debug, Clone)]
pub struct PerlaClient {
    http: reqwest::Client,
    status_url: Url,
    auth: Option<BasicAuth>,
    timeout: Duration,
}

impl PerlaClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(
        status_url: Url,
        auth: Option<BasicAuth>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            status_url,
            auth,
            timeout: transport.timeout,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        status_url: Url,
        auth: Option<BasicAuth>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            status_url,
            auth,
            timeout,
        }
    }

    /// Build `http://<host>[:<port>]/api/GetCurrentData`.
    ///
    /// Surrounding whitespace and trailing slashes on `host` are ignored.
    pub fn status_url_for(host: &str, port: Option<u16>) -> Result<Url, Error> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(Error::InvalidUrl(url::ParseError::EmptyHost));
        }
        let base = match port {
            Some(port) => format!("http://{host}:{port}"),
            None => format!("http://{host}"),
        };
        Ok(Url::parse(&format!("{base}{STATUS_PATH}"))?)
    }

    /// The URL every fetch targets.
    pub fn status_url(&self) -> &Url {
        &self.status_url
    }

    /// The deadline applied to each fetch.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch and decode the status document.
    ///
    /// The body is decoded as JSON regardless of the declared content
    /// type; the firmware is known to omit or mislabel it.
    pub async fn fetch_status(&self) -> Result<StatusPayload, Error> {
        debug!("GET {}", self.status_url);

        let mut request = self.http.get(self.status_url.clone());
        if let Some(ref auth) = self.auth {
            if !auth.username.is_empty() {
                request = request.basic_auth(&auth.username, Some(auth.password.expose_secret()));
            }
        }

        let exchange = async {
            let resp = request.send().await?;
            let status = resp.status();
            let body = resp.bytes().await?;
            Ok::<_, Error>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout {
                timeout: self.timeout,
            })??;

        trace!(status = status.as_u16(), bytes = body.len(), "status response received");

        if status != StatusCode::OK {
            return Err(Error::Status {
                status: status.as_u16(),
                body: truncate_chars(&String::from_utf8_lossy(&body), ERROR_BODY_LIMIT),
            });
        }

        parse_payload(&body)
    }
}

/// Decode a response body into a flat object.
pub(crate) fn parse_payload(body: &[u8]) -> Result<StatusPayload, Error> {
    let value: Value = serde_json::from_slice(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: String::from_utf8_lossy(body).into_owned(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::UnexpectedPayload {
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
