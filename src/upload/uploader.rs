//! Upload orchestrator
//!
//! Ties resource access, assembly and dispatch together:
//!
//! ```text
//! open ─► stat ─► directory? ──yes──► Skipped
//!                    │
//!                    no
//!                    ▼
//!              assemble ─► dispatch ─► UploadResult
//! ```
//!
//! Every failure becomes an [`UploadResult::Failed`]; nothing here panics or
//! ends the process.
//!
//! # Example
//!
//! ```no_run
//! use http_uploadr::accessor::DataAccessor;
//! use http_uploadr::config::ClientConfig;
//! use http_uploadr::scope::Scope;
//! use http_uploadr::upload::{HttpDispatcher, HttpUploader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let uploader = HttpUploader::new(HttpDispatcher::new(&ClientConfig::default())?);
//! let outcome = uploader
//!     .upload(&Scope::default(), &DataAccessor, "hello", "hello.txt", "http://localhost:8080/upload")
//!     .await;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

use super::dispatch::HttpDispatcher;
use super::multipart::assemble;
use super::{UploadError, UploadOutcome, UploadResult};
use crate::accessor::{Accessor, ResourceReader};
use crate::metrics;
use crate::scope::Scope;
use std::time::Instant;

/// Uploads resources as multipart POST requests
#[derive(Debug, Clone)]
pub struct HttpUploader {
    dispatcher: HttpDispatcher,
}

impl HttpUploader {
    pub fn new(dispatcher: HttpDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &HttpDispatcher {
        &self.dispatcher
    }

    /// Open `file` through `accessor` and upload it as `name`
    ///
    /// The opened handle is owned by this call and released on every path.
    #[tracing::instrument(
        name = "upload.http",
        skip(self, scope, accessor),
        fields(upload.source = %file, upload.name = %name, http.url = %uri)
    )]
    pub async fn upload(
        &self,
        scope: &Scope,
        accessor: &dyn Accessor,
        file: &str,
        name: &str,
        uri: &str,
    ) -> UploadOutcome {
        if scope.is_cancelled() {
            return self.finish(Instant::now(), 0, Err(UploadError::Cancelled));
        }

        let mut resource = match accessor.open(file).await {
            Ok(resource) => resource,
            Err(e) => {
                scope.log(format!("upload_http: {}", e));
                return self.finish(Instant::now(), 0, Err(e.into()));
            }
        };

        self.upload_resource(scope, &mut *resource, name, uri).await
    }

    /// Upload an already opened resource as `name`
    ///
    /// The resource stays owned by the caller and is not closed here.
    pub async fn upload_resource<R>(
        &self,
        scope: &Scope,
        resource: &mut R,
        name: &str,
        uri: &str,
    ) -> UploadOutcome
    where
        R: ResourceReader + ?Sized,
    {
        let start = Instant::now();

        if scope.is_cancelled() {
            return self.finish(start, 0, Err(UploadError::Cancelled));
        }

        let info = match resource.stat().await {
            Ok(info) => info,
            Err(e) => {
                scope.log(format!("upload_http: {}", e));
                return self.finish(start, 0, Err(e.into()));
            }
        };

        if info.is_dir {
            tracing::debug!(name = %name, "Resource is a directory, nothing to upload");
            metrics::record_upload_skipped();
            return UploadOutcome::Skipped;
        }

        scope.log(format!("upload_http: Uploading {} to {}", name, uri));

        let cancel = scope.cancellation();
        let body = match assemble(resource, name, cancel).await {
            Ok(body) => body,
            Err(e) => {
                scope.log(format!("upload_http: {}", e));
                return self.finish(start, 0, Err(e));
            }
        };

        let bytes = body.len() as u64;
        let result = self.dispatcher.dispatch(body, name, uri, cancel).await;

        if let Err(e) = &result {
            scope.log(format!("upload_http: {}", e));
        }

        self.finish(start, bytes, result)
    }

    fn finish(
        &self,
        start: Instant,
        bytes: u64,
        result: Result<UploadResult, UploadError>,
    ) -> UploadOutcome {
        let duration = start.elapsed();
        metrics::record_upload_duration(duration.as_secs_f64());

        match result {
            Ok(result) => {
                metrics::record_upload_success(bytes);
                tracing::info!(
                    bytes = bytes,
                    duration_ms = duration.as_millis(),
                    "Upload completed"
                );
                UploadOutcome::Completed(result)
            }
            Err(e) => {
                if matches!(e, UploadError::Cancelled) {
                    metrics::record_upload_cancelled();
                } else {
                    metrics::record_upload_failure();
                }
                metrics::record_error(e.kind());
                tracing::warn!(
                    error = %e,
                    duration_ms = duration.as_millis(),
                    "Upload failed"
                );
                UploadOutcome::Completed(e.into())
            }
        }
    }
}
