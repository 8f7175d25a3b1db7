//! Transport dispatcher
//!
//! Sends an assembled body as a single POST and maps the exchange onto an
//! [`UploadResult`], with errors converting through `From<UploadError>`:
//!
//! | Send | Status | Result |
//! |------|--------|--------|
//! | transport error | - | `failed("transport error: ...")` |
//! | ok | 2xx | `succeeded(name)` |
//! | ok | other | `failed("server rejected upload: status=...")` |
//! | cancelled | - | `failed("cancelled")` |

use super::multipart::MultipartBody;
use super::{UploadError, UploadResult};
use crate::config::ClientConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// POSTs multipart bodies through a shared HTTP client
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
}

impl HttpDispatcher {
    /// Build a dispatcher from client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, UploadError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());

        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        if config.connect_timeout_secs > 0 {
            builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        }

        let client = builder
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Use an already configured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Send `body` to `uri` and report the outcome for `name`
    ///
    /// `Ok` is always `succeeded(name)`. Every `Err` converts into the
    /// matching `failed(...)` result, which keeps the error kind available
    /// for metrics.
    pub async fn dispatch(
        &self,
        body: MultipartBody,
        name: &str,
        uri: &str,
        cancel: &CancellationToken,
    ) -> Result<UploadResult, UploadError> {
        let status = self.send(body, uri, cancel).await?;
        if status.is_success() {
            Ok(UploadResult::succeeded(name))
        } else {
            Err(UploadError::Rejected {
                status: status.as_u16(),
            })
        }
    }

    /// Perform the exchange and return the response status
    ///
    /// The response body is drained chunk by chunk before returning so the
    /// connection can go back to the pool without buffering the body.
    #[tracing::instrument(
        name = "upload.dispatch",
        skip(self, body, cancel),
        fields(
            http.method = "POST",
            http.url = %uri,
            upload.bytes = body.len(),
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn send(
        &self,
        body: MultipartBody,
        uri: &str,
        cancel: &CancellationToken,
    ) -> Result<StatusCode, UploadError> {
        let request = self
            .client
            .post(uri)
            .header(CONTENT_TYPE, body.content_type())
            .body(body.into_bytes());

        let exchange = async {
            let mut response = request.send().await?;
            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());

            match drain(&mut response).await {
                Ok(drained) => tracing::trace!(bytes = drained, "Drained upload response body"),
                Err(e) => tracing::warn!(
                    status = status.as_u16(),
                    error = %e,
                    "Failed to drain upload response body"
                ),
            }

            Ok::<_, UploadError>(status)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Upload request aborted by cancellation");
                Err(UploadError::Cancelled)
            }
            result = exchange => result,
        }
    }
}

/// Read the response body to the end without keeping it
async fn drain(response: &mut reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut drained = 0u64;
    while let Some(chunk) = response.chunk().await? {
        drained += chunk.len() as u64;
    }
    Ok(drained)
}
