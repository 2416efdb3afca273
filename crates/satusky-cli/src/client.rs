//! HTTP client for the Satusky platform API.
//!
//! [`ApiClient`] implements [`PlatformApi`] over `reqwest`. Every request
//! carries the session's `x-satusky-api-key` and `x-satusky-config`
//! headers. Responses are decoded per endpoint straight into the typed
//! payload; the decoding functions are public so that stub platforms can
//! feed canned bodies through the same path.
//!
//! # Example
//!
//! ```rust,no_run
//! use satusky_cli::client::ApiClient;
//! use satusky_deploy::{PlatformApi, SessionContext};
//!
//! # async fn example() -> Result<(), satusky_cli::CliError> {
//! let session = SessionContext::load_default()?;
//! let client = ApiClient::new("https://api.satusky.com/v1/cli", session)?;
//! let deployments = client.list_deployments("acme").await?;
//! println!("{} deployment(s)", deployments.len());
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::debug;

use satusky_deploy::{DeployError, DeployResult, PlatformApi, SessionContext};
use satusky_proto::{
    error_message, ApiEnvelope, Deployment, DeploymentId, Environment, Ingress, IngressId,
    Machine, QuotaErrorBody, Service, ServiceId, StatusReport, UserId, Volume,
};

use crate::error::CliError;

/// Header carrying the API token.
pub const API_KEY_HEADER: &str = "x-satusky-api-key";

/// Header carrying the user config key.
pub const CONFIG_HEADER: &str = "x-satusky-config";

/// HTTP status the platform uses for quota refusals.
pub const UNPROCESSABLE_ENTITY: u16 = 422;

/// Content type of the exported image archive.
const ARCHIVE_MIME: &str = "application/x-tar";

/// Decodes an enveloped response into its typed payload.
///
/// # Errors
///
/// - [`DeployError::ResourceExhausted`] for a 422 carrying a quota body
/// - [`DeployError::Remote`] for any other non-2xx status, or an envelope
///   with its error flag set
/// - [`DeployError::Protocol`] when the body cannot be decoded
pub fn decode<T: DeserializeOwned>(status: u16, body: &[u8]) -> DeployResult<T> {
    check_status(status, body)?;
    let envelope = ApiEnvelope::<T>::from_slice(body)?;
    Ok(envelope.into_data()?)
}

/// Decodes a lookup response, mapping the nil-identifier sentinel and an
/// absent payload to `None`.
///
/// # Errors
///
/// As [`decode`].
pub fn decode_ingress_lookup(status: u16, body: &[u8]) -> DeployResult<Option<Ingress>> {
    check_status(status, body)?;
    let envelope = ApiEnvelope::<Ingress>::from_slice(body)?;
    if envelope.error {
        return Err(DeployError::remote(Some(status), envelope.message));
    }
    Ok(envelope.data.filter(|ingress| !ingress.is_sentinel()))
}

/// Decodes the bare-string identifier returned by the ingress upsert.
///
/// # Errors
///
/// As [`decode`], plus a protocol error when the string is not a UUID.
pub fn decode_ingress_id(status: u16, body: &[u8]) -> DeployResult<IngressId> {
    let raw: String = decode(status, body)?;
    Ok(IngressId::parse(&raw)?)
}

/// Checks the status of a response whose body is not needed.
///
/// # Errors
///
/// As [`decode`], without the decoding step.
pub fn check_status(status: u16, body: &[u8]) -> DeployResult<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    if status == UNPROCESSABLE_ENTITY {
        if let Some(details) = QuotaErrorBody::parse(body) {
            return Err(DeployError::ResourceExhausted(details));
        }
    }
    let message = error_message(body).unwrap_or_else(|| format!("request failed with HTTP {status}"));
    Err(DeployError::remote(Some(status), message))
}

/// Platform API client.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    session: SessionContext,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not an absolute http(s) URL.
    pub fn new(base_url: &str, session: SessionContext) -> Result<Self, CliError> {
        let base = Url::parse(base_url)
            .map_err(|e| CliError::Config(format!("invalid API URL '{base_url}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(CliError::Config(format!(
                "invalid API URL '{base_url}': must be an http or https URL"
            )));
        }
        Ok(Self {
            http: Client::new(),
            base,
            session,
        })
    }

    /// The API root.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// The session whose credentials are sent.
    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Builds the URL for `segments` below the API root, percent-encoding
    /// each segment.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the base URL cannot take a path.
    pub fn endpoint(&self, segments: &[&str]) -> DeployResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| DeployError::protocol(format!("API URL {} cannot take a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.session.token)
            .header(CONFIG_HEADER, &self.session.user_config_key)
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> DeployResult<(u16, Vec<u8>)> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| DeployError::remote(None, format!("request to {url} failed: {e}")))?;
        read_body(response, url).await
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> DeployResult<T> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let (status, body) = self.send(self.http.get(url.clone()), &url).await?;
        decode(status, &body)
    }

    async fn post_raw<B: Serialize + ?Sized>(&self, segments: &[&str], payload: &B) -> DeployResult<(u16, Vec<u8>)> {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        self.send(self.http.post(url.clone()).json(payload), &url).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, segments: &[&str], payload: &B) -> DeployResult<T> {
        let (status, body) = self.post_raw(segments, payload).await?;
        decode(status, &body)
    }
}

async fn read_body(response: Response, url: &Url) -> DeployResult<(u16, Vec<u8>)> {
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| DeployError::remote(Some(status), format!("failed to read response from {url}: {e}")))?;
    debug!(%url, status, len = body.len(), "response");
    Ok((status, body.to_vec()))
}

impl PlatformApi for ApiClient {
    async fn upload_image(&self, archive: &Path, tag: &str, version: &str) -> DeployResult<()> {
        self.session.require_credentials()?;

        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DeployError::upload(None, format!("{} is not a file", archive.display())))?;
        let file = tokio::fs::File::open(archive).await?;
        let size = file.metadata().await?.len();
        debug!(file = %file_name, size, tag, version, "uploading image");

        let body = Body::wrap_stream(ReaderStream::new(file));
        let image = Part::stream_with_length(body, size)
            .file_name(file_name)
            .mime_str(ARCHIVE_MIME)
            .map_err(|e| DeployError::upload(None, e.to_string()))?;
        let form = Form::new()
            .part("image", image)
            .text("tag", tag.to_string())
            .text("version", version.to_string());

        let url = self.endpoint(&["docker", "images", "upload"])?;
        let response = self
            .authorized(self.http.post(url.clone()).multipart(form))
            .send()
            .await
            .map_err(|e| DeployError::upload(None, e.to_string()))?;
        let (status, body) = read_body(response, &url).await?;
        if status != 200 {
            let message = error_message(&body).unwrap_or_else(|| "registry rejected the image".to_string());
            return Err(DeployError::upload(Some(status), message));
        }
        Ok(())
    }

    async fn machines_by_owner(&self, owner: UserId) -> DeployResult<Vec<Machine>> {
        self.get(&["machines", "ownerId", &owner.to_string()]).await
    }

    async fn machine_by_name(&self, name: &str) -> DeployResult<Machine> {
        self.get(&["machines", "name", name]).await
    }

    async fn ingress_by_domain(&self, domain: &str) -> DeployResult<Option<Ingress>> {
        let url = self.endpoint(&["ingresses", "domainName", domain])?;
        let (status, body) = self.send(self.http.get(url.clone()), &url).await?;
        decode_ingress_lookup(status, &body)
    }

    async fn create_deployment(&self, deployment: &Deployment) -> DeployResult<DeploymentId> {
        self.post(
            &["deployments", "upsert", &deployment.namespace, &deployment.app_label],
            deployment,
        )
        .await
    }

    async fn create_service(&self, service: &Service) -> DeployResult<ServiceId> {
        self.post(
            &["services", "upsert", &service.namespace, &service.service_name],
            service,
        )
        .await
    }

    async fn create_ingress(&self, ingress: &Ingress) -> DeployResult<IngressId> {
        let (status, body) = self
            .post_raw(&["ingresses", "upsert", &ingress.namespace, &ingress.app_label], ingress)
            .await?;
        decode_ingress_id(status, &body)
    }

    async fn create_volume(&self, volume: &Volume) -> DeployResult<()> {
        let (status, body) = self.post_raw(&["volumes", "create"], volume).await?;
        check_status(status, &body)
    }

    async fn create_environment(&self, environment: &Environment) -> DeployResult<Environment> {
        self.post(&["environments", "upsert"], environment).await
    }

    async fn deployment_status(&self, id: DeploymentId) -> DeployResult<StatusReport> {
        self.get(&["deployments", "status", &id.to_string()]).await
    }

    async fn list_deployments(&self, namespace: &str) -> DeployResult<Vec<Deployment>> {
        self.get(&["deployments", "namespace", namespace]).await
    }

    async fn get_deployment(&self, id: DeploymentId) -> DeployResult<Deployment> {
        self.get(&["deployments", &id.to_string()]).await
    }
}
