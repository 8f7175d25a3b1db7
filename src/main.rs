//! HTTP Uploadr - upload one resource as a multipart POST
//!
//! Prints the JSON result on stdout (`null` when the resource is a
//! directory) and exits non-zero when the arguments are invalid or the
//! upload failed.

use clap::Parser;
use http_uploadr::accessor::AccessorRegistry;
use http_uploadr::config::Config;
use http_uploadr::function::upload_http::{HttpUploadArgs, FUNCTION_NAME};
use http_uploadr::function::{FunctionRegistry, HttpUploadFunction};
use http_uploadr::logging::init_logging;
use http_uploadr::scope::{Scope, TracingSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// HTTP Uploadr - multipart upload of a single file
#[derive(Parser, Debug)]
#[command(name = "http-uploadr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The file to upload
    #[arg(short, long)]
    file: String,

    /// Name of the file as stored on the server (defaults to --file)
    #[arg(short, long)]
    name: Option<String>,

    /// Accessor used to open the file (file, data)
    #[arg(short, long)]
    accessor: Option<String>,

    /// URI to upload to
    #[arg(short, long)]
    uri: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print Prometheus metrics to stderr after the upload
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    init_logging(&config.logging, args.log_level.as_deref())?;

    info!("Starting HTTP Uploadr v{}", http_uploadr::VERSION);
    if let Some(path) = &args.config {
        info!("Loaded configuration from {:?}", path);
    }

    let accessors = Arc::new(AccessorRegistry::from_config(&config.accessors));
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(HttpUploadFunction::new(
        Arc::clone(&accessors),
        &config.client,
    )?));

    let scope = Scope::new(Arc::new(TracingSink));
    let cancel = scope.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling upload");
            cancel.cancel();
        }
    });

    let mut call = serde_json::json!({ "file": args.file });
    if let Some(name) = args.name {
        call["name"] = name.into();
    }
    if let Some(accessor) = args.accessor {
        call["accessor"] = accessor.into();
    }
    if let Some(uri) = args.uri {
        call["uri"] = uri.into();
    }

    // Reject bad arguments here so that `null` on stdout only ever means a
    // directory was skipped.
    let upload_args = HttpUploadArgs::from_value(call.clone()).map_err(anyhow::Error::msg)?;
    accessors.get(upload_args.accessor())?;

    let value = registry.call(FUNCTION_NAME, &scope, call).await;
    println!("{}", value);

    if args.print_metrics && config.metrics.enabled {
        eprint!("{}", http_uploadr::metrics::encode_text()?);
    }

    if value["status"] == "failed" {
        std::process::exit(1);
    }

    Ok(())
}
