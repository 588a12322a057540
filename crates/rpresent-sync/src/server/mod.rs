//! Websocket accept loop: one task per TCP connection, routed by path.


use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

use crate::handlers::{handle_presenter, handle_viewer, SyncContext};
use crate::protocol::Endpoint;

/// Accept connections forever, spawning a handler task for each.
pub async fn serve(listener: TcpListener, ctx: SyncContext) {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("rpresent relay listening on {}", addr);
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let ctx = ctx.clone();
                tokio::spawn(handle_stream(stream, addr, ctx));
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}

/// Upgrade one TCP stream and hand it to the handler for its endpoint.
async fn handle_stream(stream: TcpStream, addr: SocketAddr, ctx: SyncContext) {
    let mut endpoint = None;
    let route = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        match Endpoint::from_path(req.uri().path()) {
            Some(found) => {
                endpoint = Some(found);
                Ok(response)
            }
            None => {
                let mut rejection = ErrorResponse::new(None);
                *rejection.status_mut() = StatusCode::NOT_FOUND;
                Err(rejection)
            }
        }
    };

    let upgrade = tokio::time::timeout(ctx.timeouts.handshake, accept_hdr_async(stream, route));
    let ws = match upgrade.await {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => {
            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
            return;
        }
        Err(_) => {
            tracing::debug!(peer = %addr, "WS handshake timed out");
            return;
        }
    };

    match endpoint {
        Some(Endpoint::Presenter) => handle_presenter(ws, addr, ctx).await,
        Some(Endpoint::Viewer) => handle_viewer(ws, addr, ctx).await,
        None => tracing::warn!(peer = %addr, "upgrade accepted without an endpoint"),
    }
}
