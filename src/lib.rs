//! HTTP Uploadr Library
//!
//! Uploads a single named byte stream to an HTTP endpoint as a
//! `multipart/form-data` POST and reports the outcome as a typed result.
//!
//! # Features
//!
//! - **One part, exact framing**: a single `file` part per request
//! - **Pluggable accessors**: local files, in-memory data, or your own backend
//! - **Never fatal**: every failure is returned as a value
//! - **Cancellable**: stream reads and in-flight requests honor a token
//!
//! # Example
//!
//! ```no_run
//! use http_uploadr::accessor::FileAccessor;
//! use http_uploadr::config::ClientConfig;
//! use http_uploadr::scope::Scope;
//! use http_uploadr::upload::{HttpDispatcher, HttpUploader, UploadOutcome};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let uploader = HttpUploader::new(HttpDispatcher::new(&ClientConfig::default())?);
//!     let outcome = uploader
//!         .upload(
//!             &Scope::default(),
//!             &FileAccessor::default(),
//!             "/var/log/syslog",
//!             "syslog.txt",
//!             "http://localhost:8080/upload",
//!         )
//!         .await;
//!
//!     if let UploadOutcome::Completed(result) = outcome {
//!         println!("{:?}", result);
//!     }
//!     Ok(())
//! }
//! ```

pub mod accessor;
pub mod config;
pub mod function;
pub mod logging;
pub mod metrics;
pub mod scope;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use scope::Scope;
pub use upload::{UploadOutcome, UploadResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
