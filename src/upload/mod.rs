//! Upload module
//!
//! Turns an open resource into a single `multipart/form-data` POST and maps
//! whatever happens on the way into an [`UploadResult`].
//!
//! - [`multipart`]: request assembler
//! - [`dispatch`]: transport dispatcher
//! - [`uploader`]: orchestration of stat, assemble and dispatch

use crate::accessor::AccessorError;
use serde::Serialize;
use thiserror::Error;

pub mod dispatch;
pub mod multipart;
pub mod uploader;

pub use dispatch::HttpDispatcher;
pub use multipart::{assemble, AssemblyError, MultipartBody, MultipartWriter};
pub use uploader::HttpUploader;

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("resource error: {0}")]
    Resource(#[from] AccessorError),

    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server rejected upload: status={status}")]
    Rejected { status: u16 },

    #[error("cancelled")]
    Cancelled,

    #[error("client configuration error: {0}")]
    Client(String),
}

impl UploadError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Resource(_) => "resource",
            UploadError::Assembly(_) => "assembly",
            UploadError::Transport(_) => "transport",
            UploadError::Rejected { .. } => "rejected",
            UploadError::Cancelled => "cancelled",
            UploadError::Client(_) => "client",
        }
    }
}

/// Outcome of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadResult {
    /// The destination name that was uploaded
    Succeeded { path: String },
    /// Human-readable description of what went wrong
    Failed { error: String },
}

impl UploadResult {
    pub fn succeeded(path: impl Into<String>) -> Self {
        UploadResult::Succeeded { path: path.into() }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        UploadResult::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Succeeded { .. })
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            UploadResult::Succeeded { path } => Some(path),
            UploadResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UploadResult::Succeeded { .. } => None,
            UploadResult::Failed { error } => Some(error),
        }
    }
}

impl From<UploadError> for UploadResult {
    fn from(err: UploadError) -> Self {
        UploadResult::failed(err.to_string())
    }
}

/// What the orchestrator did with a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// An upload was attempted
    Completed(UploadResult),
    /// The resource is a directory; nothing was sent
    Skipped,
}

impl UploadOutcome {
    pub fn result(&self) -> Option<&UploadResult> {
        match self {
            UploadOutcome::Completed(result) => Some(result),
            UploadOutcome::Skipped => None,
        }
    }

    pub fn into_result(self) -> Option<UploadResult> {
        match self {
            UploadOutcome::Completed(result) => Some(result),
            UploadOutcome::Skipped => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, UploadOutcome::Skipped)
    }
}

impl From<UploadResult> for UploadOutcome {
    fn from(result: UploadResult) -> Self {
        UploadOutcome::Completed(result)
    }
}
