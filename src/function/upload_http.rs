//! `upload_http`: upload a file to an HTTP endpoint

use super::{ArgInfo, Function, FunctionInfo};
use crate::accessor::AccessorRegistry;
use crate::config::ClientConfig;
use crate::scope::Scope;
use crate::upload::{HttpDispatcher, HttpUploader, UploadError, UploadOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Name the function is registered under
pub const FUNCTION_NAME: &str = "upload_http";

/// Arguments of `upload_http`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpUploadArgs {
    /// The file to upload
    pub file: String,
    /// Name to store the file under on the server
    #[serde(default)]
    pub name: Option<String>,
    /// Accessor used to open the file
    #[serde(default)]
    pub accessor: Option<String>,
    /// URI to upload to
    #[serde(default)]
    pub uri: Option<String>,
}

impl HttpUploadArgs {
    /// Parse and check a call record
    pub fn from_value(value: serde_json::Value) -> Result<Self, String> {
        let args: Self = serde_json::from_value(value).map_err(|e| e.to_string())?;
        if args.file.is_empty() {
            return Err("file must not be empty".to_string());
        }
        Ok(args)
    }

    /// Destination name, defaulting to the source identifier
    pub fn destination_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.file,
        }
    }

    pub fn accessor(&self) -> &str {
        self.accessor.as_deref().unwrap_or_default()
    }

    pub fn uri(&self) -> &str {
        self.uri.as_deref().unwrap_or_default()
    }
}

/// Host function uploading one resource per call
pub struct HttpUploadFunction {
    accessors: Arc<AccessorRegistry>,
    uploader: HttpUploader,
}

impl HttpUploadFunction {
    pub fn new(accessors: Arc<AccessorRegistry>, client: &ClientConfig) -> Result<Self, UploadError> {
        Ok(Self::with_uploader(
            accessors,
            HttpUploader::new(HttpDispatcher::new(client)?),
        ))
    }

    pub fn with_uploader(accessors: Arc<AccessorRegistry>, uploader: HttpUploader) -> Self {
        Self {
            accessors,
            uploader,
        }
    }
}

#[async_trait]
impl Function for HttpUploadFunction {
    fn info(&self) -> FunctionInfo {
        let arg = |name: &str, doc: &str, required: bool| ArgInfo {
            name: name.to_string(),
            doc: doc.to_string(),
            required,
        };

        FunctionInfo {
            name: FUNCTION_NAME.to_string(),
            doc: "Upload files to http.".to_string(),
            args: vec![
                arg("file", "The file to upload", true),
                arg(
                    "name",
                    "The name of the file that should be stored on the server",
                    false,
                ),
                arg("accessor", "The accessor to use", false),
                arg("uri", "The URI to upload to", false),
            ],
        }
    }

    async fn call(&self, scope: &Scope, args: serde_json::Value) -> serde_json::Value {
        let args = match HttpUploadArgs::from_value(args) {
            Ok(args) => args,
            Err(e) => {
                scope.log(format!("{}: {}", FUNCTION_NAME, e));
                return serde_json::Value::Null;
            }
        };

        let accessor = match self.accessors.get(args.accessor()) {
            Ok(accessor) => accessor,
            Err(e) => {
                scope.log(format!("{}: {}", FUNCTION_NAME, e));
                return serde_json::Value::Null;
            }
        };

        let outcome = self
            .uploader
            .upload(
                scope,
                accessor.as_ref(),
                &args.file,
                args.destination_name(),
                args.uri(),
            )
            .await;

        match outcome {
            UploadOutcome::Completed(result) => {
                serde_json::to_value(result).unwrap_or(serde_json::Value::Null)
            }
            UploadOutcome::Skipped => serde_json::Value::Null,
        }
    }
}
