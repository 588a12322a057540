//! Viewer side: identify, subscribe, then deliver updates or probe liveness.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, trace};

use rpresent_common::new_correlation_id;

use super::SyncContext;
use crate::protocol::{read_reply_until, read_text, send_text, send_text_until, SessionEnd, PING};
use crate::registry::Subscription;

/// Drive one viewer connection until it ends.
///
/// The mailbox is registered for exactly as long as the subscription guard
/// lives, so it leaves the registry on every exit path.
pub async fn handle_viewer<S>(mut ws: WebSocketStream<S>, peer: SocketAddr, ctx: SyncContext)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let conn = new_correlation_id();

    let presentation_id = match identify(&mut ws, &ctx).await {
        Ok(id) => id,
        Err(end) => {
            debug!(peer = %peer, conn = %conn, reason = %end, "viewer rejected");
            return;
        }
    };

    let subscription = ctx.registry.subscribe(&presentation_id);
    info!(peer = %peer, conn = %conn, presentation = %presentation_id, "viewer subscribed");

    let end = deliver_updates(&mut ws, &ctx, &subscription).await;
    drop(subscription);
    info!(
        peer = %peer,
        conn = %conn,
        presentation = %presentation_id,
        reason = %end,
        "viewer disconnected"
    );
}

async fn identify<S>(ws: &mut WebSocketStream<S>, ctx: &SyncContext) -> Result<String, SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let claimed = read_text(ws, ctx.timeouts.handshake).await?;
    ctx.index
        .resolve_presentation_id(&claimed)
        .ok_or(SessionEnd::UnknownIdentity)
}

async fn deliver_updates<S>(
    ws: &mut WebSocketStream<S>,
    ctx: &SyncContext,
    subscription: &Subscription,
) -> SessionEnd
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let timeouts = ctx.timeouts;
    loop {
        let step = match subscription.mailbox().await_update(timeouts.viewer_wait).await {
            Some(slide) => send_text(ws, &slide.to_string(), timeouts.send).await,
            None => probe(ws, timeouts.send).await,
        };
        if let Err(end) = step {
            return end;
        }
    }
}

/// Send a ping and wait for any reply, all within `bound`.
async fn probe<S>(ws: &mut WebSocketStream<S>, bound: std::time::Duration) -> Result<(), SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let deadline = Instant::now() + bound;
    send_text_until(ws, PING, deadline).await?;
    let bytes = read_reply_until(ws, deadline).await?;
    trace!(bytes, "liveness probe answered");
    Ok(())
}
