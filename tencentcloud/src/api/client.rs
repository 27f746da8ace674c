use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::error::ApiError;
use super::signer::{self, Credential};

pub const DEFAULT_DOMAIN: &str = "tencentcloudapi.com";
pub const DEFAULT_PROTOCOL: &str = "https";
const USER_AGENT: &str = concat!("terraform-provider-tencentcloud-rs/", env!("CARGO_PKG_VERSION"));

/// TencentCloud products this provider talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Live,
    Tsf,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Live => "live",
            Service::Tsf => "tsf",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            Service::Live => "2018-08-01",
            Service::Tsf => "2018-03-26",
        }
    }
}

/// One API action with its JSON request body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub service: Service,
    pub action: &'static str,
    pub payload: Value,
}

impl ApiCall {
    pub fn new<T: Serialize>(
        service: Service,
        action: &'static str,
        request: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            service,
            action,
            payload: serde_json::to_value(request)?,
        })
    }
}

/// Anything able to execute an [`ApiCall`]; returns the `Response` object of
/// the envelope on success
#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn invoke(&self, call: &ApiCall) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credential: Credential,
    pub region: String,
    pub protocol: String,
    pub domain: String,
    /// Sends every service to this URL instead of `<service>.<domain>`
    pub endpoint: Option<String>,
    pub timeout: Duration,
    pub language: Option<String>,
}

impl ClientConfig {
    pub fn new(credential: Credential, region: impl Into<String>) -> Self {
        Self {
            credential,
            region: region.into(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            endpoint: None,
            timeout: Duration::from_secs(30),
            language: None,
        }
    }
}

/// TencentCloud API v3 client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: ClientConfig,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                config,
            }),
        })
    }

    pub fn region(&self) -> &str {
        &self.inner.config.region
    }

    /// URL the given service is reached at
    pub fn endpoint(&self, service: Service) -> Result<Url, ApiError> {
        let config = &self.inner.config;
        let raw = match &config.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "{}://{}.{}/",
                config.protocol.to_lowercase(),
                service.name(),
                config.domain
            ),
        };
        Url::parse(&raw).map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", raw, e)))
    }

    async fn execute(&self, call: &ApiCall) -> Result<Value, ApiError> {
        let config = &self.inner.config;
        let url = self.endpoint(call.service)?;
        let host = host_header(&url)?;
        let body = serde_json::to_vec(&call.payload)?;
        let timestamp = chrono::Utc::now().timestamp();
        let authorization = signer::authorization(
            &config.credential,
            call.service.name(),
            &host,
            timestamp,
            &body,
        )?;

        tracing::debug!(
            action = call.action,
            "POST {} request body: {}",
            url,
            String::from_utf8_lossy(&body)
        );

        let mut request = self
            .inner
            .http_client
            .post(url)
            .header(CONTENT_TYPE, signer::CONTENT_TYPE)
            .header(HOST, &host)
            .header(AUTHORIZATION, authorization)
            .header("X-TC-Action", call.action)
            .header("X-TC-Version", call.service.version())
            .header("X-TC-Timestamp", timestamp.to_string());
        if !config.region.is_empty() {
            request = request.header("X-TC-Region", &config.region);
        }
        if let Some(token) = &config.credential.token {
            request = request.header("X-TC-Token", token);
        }
        if let Some(language) = &config.language {
            request = request.header("X-TC-Language", language);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(
            action = call.action,
            status = status.as_u16(),
            "API response body: {}",
            text
        );

        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_envelope(&text)
    }
}

#[async_trait]
impl CloudApi for Client {
    async fn invoke(&self, call: &ApiCall) -> Result<Value, ApiError> {
        self.execute(call).await
    }
}

fn host_header(url: &Url) -> Result<String, ApiError> {
    let host = url
        .host_str()
        .ok_or_else(|| ApiError::InvalidEndpoint(format!("{} has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Unwraps `{"Response": {...}}`, turning an embedded `Error` into
/// [`ApiError::ServiceError`]
fn parse_envelope(text: &str) -> Result<Value, ApiError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
        ApiError::ParseError(format!("invalid response envelope: {}", e))
    })?;
    let response = envelope.response;

    if let Some(error) = response.get("Error") {
        let error: ErrorBody = serde_json::from_value(error.clone())
            .map_err(|e| ApiError::ParseError(format!("invalid error object: {}", e)))?;
        return Err(ApiError::ServiceError {
            code: error.code,
            message: error.message,
            request_id: request_id(&response),
        });
    }

    Ok(response)
}

fn request_id(response: &Value) -> String {
    response
        .get("RequestId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
