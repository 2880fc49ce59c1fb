//! Demo service built from the capsules.
//!
//! ```text
//! GET /hello?name=<name>  → {"message": "Hello, <name>!"}
//! GET /httpbin            → echo of an upstream httpbin call, via Client
//! GET /health /live /ready, swagger (when the file exists)
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::Level;

use capsules::config::{AppConfig, ClientConfig, ServerConfig};
use capsules::http::handler_fn;
use capsules::http::middleware::span_context;
use capsules::lifecycle::{signals, Shutdown};
use capsules::observability::{metrics, Logger, LoggerBuilder, TraceContextTracer, Tracer};
use capsules::{Client, ClientFactory, ServerFactory};

#[derive(Parser)]
#[command(name = "capsules-demo")]
#[command(about = "Example service built on the capsules server and client", long_about = None)]
struct Cli {
    /// Base configuration file (.json or .toml), config.json when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the config
    #[arg(short, long)]
    port: Option<u16>,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    /// Human-readable logs instead of JSON
    #[arg(long)]
    pretty: bool,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,

    /// Upstream called by /httpbin
    #[arg(long, default_value = "https://httpbin.org/get?foo=bar")]
    httpbin_url: String,
}

#[derive(Serialize)]
struct Greeting {
    message: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HttpbinBody {
    #[serde(rename = "args", default)]
    arguments: HashMap<String, String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    origin: String,
    #[serde(default)]
    url: String,
}

async fn hello(Query(query): Query<HashMap<String, String>>) -> Json<Greeting> {
    let name = query.get("name").map(String::as_str).unwrap_or("World");
    Json(Greeting {
        message: format!("Hello, {name}!"),
    })
}

async fn httpbin(client: Client, url: String, request: Request) -> Response {
    let parent = span_context(&request).cloned();
    let upstream = match client.get(url.as_str()).build() {
        Ok(upstream) => upstream,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let response = match client.execute_with_parent(parent.as_ref(), upstream).await {
        Ok(response) => response,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    match response.json::<HttpbinBody>().await {
        Ok(body) => Json(body).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let tracer: Arc<dyn Tracer> = Arc::new(TraceContextTracer::new("capsules-demo"));
    let logger: Arc<dyn Logger> = Arc::new(
        LoggerBuilder::new(tracer.clone())
            .with_level(cli.log_level)
            .with_json(!cli.pretty)
            .with_host("host")
            .with_pid("pid")
            .init()?,
    );

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr)?;
    }

    let app_config = match &cli.config {
        Some(path) => AppConfig::from_sources(path, std::env::vars())?,
        None => AppConfig::load()?,
    };
    let mut server_config = ServerConfig::default();
    app_config.value(&mut server_config)?;
    let mut client_config = ClientConfig::default();
    app_config.value(&mut client_config)?;

    let server_factory = ServerFactory::new()
        .with_logger(logger.clone())
        .with_tracer(tracer.clone())
        .with_config(&server_config);
    let client_factory = ClientFactory::new()
        .with_logger(logger.clone())
        .with_tracer(tracer.clone())
        .with_config(&client_config);

    let mut builder = server_factory.create();
    if let Some(port) = cli.port {
        builder = builder.port(port);
    }
    let mut server = builder.build();
    let client = client_factory.create().build()?;

    server.router_mut().handle("/hello", get(hello));
    let httpbin_url = cli.httpbin_url;
    server.handle_func(
        "/httpbin",
        handler_fn(move |request| httpbin(client.clone(), httpbin_url.clone(), request)),
    );

    let terminate = signals::terminate()?;
    let shutdown = Shutdown::new();
    let signal = shutdown.signalled();
    let trigger = shutdown.clone();
    let signal_logger = logger.clone();
    tokio::spawn(async move {
        let received = terminate.await;
        signal_logger.info(None, "shutdown requested", &[("signal", &received)]);
        trigger.trigger();
    });

    server.serve(signal).await?;
    Ok(())
}
