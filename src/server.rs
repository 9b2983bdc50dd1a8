//! Connection handling and the sequential listener loop.
//!
//! Each accepted connection gets exactly one request/response cycle and is
//! then closed. The next `accept` only happens after the previous handler
//! has returned.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::backend::GenerationBackend;
use crate::config::Config;
use crate::error::RequestError;
use crate::generation::collapse_blank_lines;
use crate::resolver::Resolver;
use crate::transport::{recv_line, send_line, InboundRequest};

/// Pause after a failed `accept` so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Bind the configured address and serve until `shutdown` resolves.
///
/// Failing to bind is the only fatal error; everything after that is
/// handled per connection.
pub async fn run<B, F>(config: &Config, resolver: Arc<Resolver<B>>, shutdown: F) -> Result<()>
where
    B: GenerationBackend + 'static,
    F: Future<Output = ()>,
{
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    info!(addr = %config.listen_addr, "Server listening");
    info!("Handling math problems, general questions and blood pressure readings");

    serve(listener, config, resolver, shutdown).await
}

/// Accept connections one at a time until `shutdown` resolves.
///
/// An in-flight connection is dropped (closed) when shutdown fires.
pub async fn serve<B, F>(
    listener: TcpListener,
    config: &Config,
    resolver: Arc<Resolver<B>>,
    shutdown: F,
) -> Result<()>
where
    B: GenerationBackend + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            () = accept_one(&listener, config, &resolver) => {}
        }
    }

    drop(listener);
    info!("Server closed");
    Ok(())
}

async fn accept_one<B>(listener: &TcpListener, config: &Config, resolver: &Arc<Resolver<B>>)
where
    B: GenerationBackend + 'static,
{
    // Accept errors are per-connection; keep the loop alive
    let (stream, peer): (_, SocketAddr) = match listener.accept().await {
        Ok(accepted) => accepted,
        Err(e) => {
            error!(error = %e, "Accept failed");
            tokio::time::sleep(ACCEPT_BACKOFF).await;
            return;
        }
    };

    info!(%peer, "Connection accepted");
    if let Err(e) = handle_connection(stream, resolver, config).await {
        warn!(%peer, error = %e, "Connection failed");
    }
    info!(%peer, "Connection closed");
}

/// Run one request/response cycle on `stream`, then close it.
pub async fn handle_connection<S, B>(
    mut stream: S,
    resolver: &Arc<Resolver<B>>,
    config: &Config,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    B: GenerationBackend + 'static,
{
    // Read the request line, under the optional deadline
    let read = recv_line(&mut stream, config.max_request_bytes);
    let line = match config.read_timeout {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| anyhow::anyhow!("Timed out reading request after {limit:?}"))??,
        None => read.await?,
    };
    debug!(request = %line, "Received request");

    let response = respond(resolver, &line).await;
    debug!(%response, "Sending response");

    // Exactly one reply per connection, then close our side
    send_line(&mut stream, &response)
        .await
        .context("Failed to send response")?;
    if let Err(e) = stream.shutdown().await {
        debug!(error = %e, "Shutdown after response failed");
    }
    Ok(())
}

/// Turn one request line into the response text (without terminator).
pub async fn respond<B>(resolver: &Arc<Resolver<B>>, line: &str) -> String
where
    B: GenerationBackend + 'static,
{
    let request = match InboundRequest::parse(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected request");
            return e.to_string();
        }
    };

    // Resolution runs as its own task so a panic inside it becomes an error
    // line instead of taking down the listener.
    let resolver = Arc::clone(resolver);
    let task = tokio::spawn(async move { resolver.respond(&request).await });
    let _abort = AbortOnDrop(task.abort_handle());

    match task.await {
        Ok(text) => collapse_blank_lines(&text),
        Err(e) => {
            let err = RequestError::Internal(e.to_string());
            error!(error = %err, "Resolution failed");
            err.to_string()
        }
    }
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
