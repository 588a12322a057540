//! Wire protocol: plain text frames carrying identifiers, slide numbers
//! and the liveness probe.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Liveness probe sent to idle viewers.
pub const PING: &str = "ping";

/// A 1-based slide number. Zero is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlideNumber(NonZeroU32);

impl SlideNumber {
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SlideNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid slide number {0:?}")]
pub struct ParseSlideError(String);

impl FromStr for SlideNumber {
    type Err = ParseSlideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ParseSlideError(s.to_string()))
    }
}

/// Which side of a presentation a socket speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Presenter,
    Viewer,
}

impl Endpoint {
    /// Map a websocket upgrade path to an endpoint.
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/p" => Some(Endpoint::Presenter),
            "/v" => Some(Endpoint::Viewer),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Presenter => "/p",
            Endpoint::Viewer => "/v",
        }
    }

    /// Short role tag embedded into served pages.
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Presenter => "p",
            Endpoint::Viewer => "v",
        }
    }
}

/// Why a connection ended. Logged, never sent to the peer.
#[derive(Debug, thiserror::Error)]
pub enum SessionEnd {
    #[error("timed out")]
    Timeout,

    #[error("closed by peer")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown identifier")]
    UnknownIdentity,
}

/// Read the next data frame as text within `bound`.
pub async fn read_text<S>(
    ws: &mut WebSocketStream<S>,
    bound: Duration,
) -> Result<String, SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    read_text_until(ws, Instant::now() + bound).await
}

/// Read the next data frame as text before `deadline`.
///
/// Control frames are skipped; tungstenite answers pings on its own.
pub async fn read_text_until<S>(
    ws: &mut WebSocketStream<S>,
    deadline: Instant,
) -> Result<String, SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::time::timeout_at(deadline, ws.next())
            .await
            .map_err(|_| SessionEnd::Timeout)?;

        match frame {
            Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
            Some(Ok(Message::Binary(data))) => {
                return String::from_utf8(data.to_vec())
                    .map_err(|_| SessionEnd::Malformed("binary frame is not utf-8".into()));
            }
            Some(Ok(Message::Close(_))) | None => return Err(SessionEnd::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(SessionEnd::Transport(e.to_string())),
        }
    }
}

/// Wait for any data frame before `deadline` and return its payload size.
///
/// The payload is not decoded, so binary replies of any content count.
pub async fn read_reply_until<S>(
    ws: &mut WebSocketStream<S>,
    deadline: Instant,
) -> Result<usize, SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::time::timeout_at(deadline, ws.next())
            .await
            .map_err(|_| SessionEnd::Timeout)?;

        match frame {
            Some(Ok(Message::Text(text))) => return Ok(text.len()),
            Some(Ok(Message::Binary(data))) => return Ok(data.len()),
            Some(Ok(Message::Close(_))) | None => return Err(SessionEnd::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(SessionEnd::Transport(e.to_string())),
        }
    }
}

/// Send a text frame, giving up after `bound`.
pub async fn send_text<S>(
    ws: &mut WebSocketStream<S>,
    text: &str,
    bound: Duration,
) -> Result<(), SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    send_text_until(ws, text, Instant::now() + bound).await
}

/// Send a text frame before `deadline`.
pub async fn send_text_until<S>(
    ws: &mut WebSocketStream<S>,
    text: &str,
    deadline: Instant,
) -> Result<(), SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tokio::time::timeout_at(deadline, ws.send(Message::text(text.to_owned())))
        .await
        .map_err(|_| SessionEnd::Timeout)?
        .map_err(|e| SessionEnd::Transport(e.to_string()))
}
