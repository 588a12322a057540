//! Presenter side: identify, then stream slide numbers into the registry.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info};

use rpresent_common::new_correlation_id;

use super::SyncContext;
use crate::protocol::{read_text, SessionEnd, SlideNumber};

/// Drive one presenter connection until it ends.
pub async fn handle_presenter<S>(mut ws: WebSocketStream<S>, peer: SocketAddr, ctx: SyncContext)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let conn = new_correlation_id();

    let presentation_id = match identify(&mut ws, &ctx).await {
        Ok(id) => id,
        Err(end) => {
            debug!(peer = %peer, conn = %conn, reason = %end, "presenter rejected");
            return;
        }
    };

    info!(peer = %peer, conn = %conn, presentation = %presentation_id, "presenter streaming");
    let end = stream_slides(&mut ws, &ctx, &presentation_id).await;
    info!(
        peer = %peer,
        conn = %conn,
        presentation = %presentation_id,
        reason = %end,
        "presenter disconnected"
    );
}

/// Only a registered presentation id is accepted; a viewer id is refused.
async fn identify<S>(ws: &mut WebSocketStream<S>, ctx: &SyncContext) -> Result<String, SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let claimed = read_text(ws, ctx.timeouts.handshake).await?;
    ctx.index
        .resolve_pair(&claimed)
        .map(|pair| pair.presentation_id)
        .ok_or(SessionEnd::UnknownIdentity)
}

async fn stream_slides<S>(
    ws: &mut WebSocketStream<S>,
    ctx: &SyncContext,
    presentation_id: &str,
) -> SessionEnd
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let text = match read_text(ws, ctx.timeouts.presenter_idle).await {
            Ok(text) => text,
            Err(end) => return end,
        };
        let slide: SlideNumber = match text.parse() {
            Ok(slide) => slide,
            Err(e) => return SessionEnd::Malformed(e.to_string()),
        };

        let reached = ctx.registry.broadcast(presentation_id, slide);
        debug!(presentation = %presentation_id, %slide, viewers = reached, "slide changed");
    }
}
