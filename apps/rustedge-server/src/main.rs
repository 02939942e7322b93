//! RustEdge Server - S3-backed edge delivery endpoint.
//!
//! Serves objects from a single bucket behind a CDN, resizing images on the
//! fly when `w` / `h` query parameters are present. Responses carry an
//! immutable cache policy and an open CORS policy.
//!
//! # Usage
//!
//! ```text
//! EDGE_BUCKET=assets GATEWAY_LISTEN=0.0.0.0:8080 rustedge-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `EDGE_STORE` | `s3` | `s3` or `memory` |
//! | `EDGE_BUCKET` | `assets` | Bucket objects are served from |
//! | `AWS_REGION` | `us-east-1` | Store region (`DEFAULT_REGION` also accepted) |
//! | `S3_ENDPOINT_URL` | *(unset)* | Custom S3-compatible endpoint |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style bucket addressing |
//! | `EDGE_CA_BUNDLE` | *(unset)* | Extra CA bundle, exported as `SSL_CERT_FILE` |
//! | `EDGE_DEFAULT_QUALITY` | `80` | Quality when `q` is absent |
//! | `EDGE_MAX_DIMENSION` | `4096` | Upper bound for `w` / `h` and both output sides |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rustedge_core::config::{EdgeConfig, LogFormat, StoreKind};
use rustedge_core::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use rustedge_http::request::HEALTH_CHECK_PATH;
use rustedge_http::service::{EdgeHttpConfig, EdgeHttpService};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }

    Ok(())
}

/// Check the configured CA bundle and export it as `SSL_CERT_FILE`.
///
/// Must run before any other thread exists.
fn export_ca_bundle(config: &EdgeConfig) -> Result<()> {
    let Some(path) = config.ca_bundle_path.as_deref() else {
        return Ok(());
    };
    validate_ca_bundle(Path::new(path))?;

    // SAFETY: called from `main` before the tokio runtime (or any other
    // thread) is started, so nothing can read the environment concurrently.
    unsafe {
        std::env::set_var("SSL_CERT_FILE", path);
    }
    Ok(())
}

fn validate_ca_bundle(path: &Path) -> Result<()> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("CA bundle not readable: {}", path.display()))?;
    anyhow::ensure!(meta.is_file(), "CA bundle is not a file: {}", path.display());
    Ok(())
}

/// Accept connections until Ctrl-C, then drain the ones still open.
async fn serve<S: ObjectStore>(listener: TcpListener, service: EdgeHttpService<S>) -> Result<()> {
    let watcher = hyper_util::server::graceful::GracefulShutdown::new();
    let conn_builder = HttpConnBuilder::new(TokioExecutor::new());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let (stream, peer_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            },
            _ = &mut ctrl_c => {
                info!("shutdown requested, no longer accepting connections");
                break;
            }
        };

        let conn = conn_builder.serve_connection(TokioIo::new(stream), service.clone());
        let conn = watcher.watch(conn.into_owned());
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                error!(%peer_addr, error = %e, "connection terminated with error");
            }
        });
    }

    // Open streams finish before the process exits.
    watcher.shutdown().await;
    info!("connections drained");
    Ok(())
}

/// Send one `GET` for the health path and return the raw HTTP/1.1 reply.
async fn fetch_health(addr: &str) -> Result<String> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;
    let request =
        format!("GET {HEALTH_CHECK_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut reply = String::new();
    stream.read_to_string(&mut reply).await?;
    Ok(reply)
}

/// Probe a running server. Any connection failure counts as unhealthy.
async fn run_health_check(addr: &str) -> bool {
    fetch_health(addr)
        .await
        .is_ok_and(|reply| is_healthy_response(&reply))
}

fn is_healthy_response(response: &str) -> bool {
    response.starts_with("HTTP/1.1 200") && response.contains(r#""status":"running""#)
}

/// Address the health check connects to.
fn health_check_address(gateway_listen: &str) -> String {
    gateway_listen.replace("0.0.0.0", "127.0.0.1")
}

async fn run(config: EdgeConfig) -> Result<()> {
    info!(
        gateway_listen = %config.gateway_listen,
        store = ?config.store,
        bucket = %config.bucket,
        region = %config.region,
        endpoint_url = ?config.endpoint_url,
        ca_bundle = ?config.ca_bundle_path,
        version = VERSION,
        "starting RustEdge Server",
    );

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    let http_config = EdgeHttpConfig::from(&config);
    match config.store {
        StoreKind::S3 => {
            let store = S3ObjectStore::from_config(&config).await;
            serve(listener, EdgeHttpService::new(store, http_config)).await
        }
        StoreKind::Memory => {
            warn!("serving from an empty in-memory store");
            let store = MemoryObjectStore::with_chunk_size(config.stream_chunk_size);
            serve(listener, EdgeHttpService::new(store, http_config)).await
        }
    }
}

fn main() -> Result<()> {
    let config = EdgeConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build health check runtime")?;
        let addr = health_check_address(&config.gateway_listen);
        let healthy = runtime.block_on(run_health_check(&addr));
        std::process::exit(i32::from(!healthy));
    }

    export_ca_bundle(&config)?;
    init_tracing(&config.log_level, config.log_format)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run(config))
}
