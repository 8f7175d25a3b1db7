//! Host-callable functions
//!
//! A [`Function`] takes a JSON call record and returns a JSON value; `null`
//! means "nothing to report". Functions are added to a [`FunctionRegistry`]
//! by whatever code composes the host, never by the function itself.
//!
//! # Example
//!
//! ```no_run
//! use http_uploadr::accessor::AccessorRegistry;
//! use http_uploadr::config::Config;
//! use http_uploadr::function::{FunctionRegistry, HttpUploadFunction};
//! use http_uploadr::scope::Scope;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let accessors = Arc::new(AccessorRegistry::from_config(&config.accessors));
//!
//! let mut registry = FunctionRegistry::new();
//! registry.register(Arc::new(HttpUploadFunction::new(accessors, &config.client)?));
//!
//! let args = serde_json::json!({"file": "/tmp/report.txt", "uri": "http://localhost:8080/upload"});
//! let value = registry.call("upload_http", &Scope::default(), args).await;
//! println!("{}", value);
//! # Ok(())
//! # }
//! ```

use crate::scope::Scope;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod upload_http;

pub use upload_http::{HttpUploadArgs, HttpUploadFunction};

/// Description of one function argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgInfo {
    pub name: String,
    pub doc: String,
    pub required: bool,
}

/// Description of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub doc: String,
    pub args: Vec<ArgInfo>,
}

/// A function the host can call by name
#[async_trait]
pub trait Function: Send + Sync {
    fn info(&self) -> FunctionInfo;

    async fn call(&self, scope: &Scope, args: serde_json::Value) -> serde_json::Value;
}

/// Name-indexed set of functions
#[derive(Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under the name its info reports
    ///
    /// Returns the function previously registered under that name, if any.
    pub fn register(&mut self, function: Arc<dyn Function>) -> Option<Arc<dyn Function>> {
        let name = function.info().name;
        tracing::debug!(function = %name, "Registered function");
        self.functions.insert(name, function)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(name).cloned()
    }

    /// Descriptions of every registered function, ordered by name
    pub fn describe(&self) -> Vec<FunctionInfo> {
        self.functions.values().map(|f| f.info()).collect()
    }

    /// Call a function by name; unknown names log and yield `null`
    pub async fn call(
        &self,
        name: &str,
        scope: &Scope,
        args: serde_json::Value,
    ) -> serde_json::Value {
        match self.get(name) {
            Some(function) => function.call(scope, args).await,
            None => {
                scope.log(format!("Unknown function {}", name));
                serde_json::Value::Null
            }
        }
    }
}
