//! WebSocket transport for the progress stream.
//!
//! Connects to the server's per-job progress endpoint and spawns a
//! reader task that parses frames in arrival order and forwards them
//! to the controller through a [`Subscription`].

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use glyphify_core::error::ConvertError;

use crate::messages::{parse_message, StreamMessage};
use crate::subscription::{StreamError, Subscription, SUBSCRIPTION_BUFFER};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the progress stream for one job.
///
/// * `ws_url` - WebSocket base URL, e.g. `ws://host:5000`.
/// * `job_id` - the server-assigned correlation key.
pub async fn open_progress_stream(
    ws_url: &str,
    job_id: &str,
) -> Result<Subscription, ConvertError> {
    let url = format!("{ws_url}/api/progress/{job_id}");

    let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
        ConvertError::Transport(format!("failed to open progress stream at {url}: {e}"))
    })?;

    tracing::info!(job_id, "Progress stream connected at {url}");

    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
    tokio::spawn(read_frames(
        ws_stream,
        job_id.to_string(),
        tx,
        cancel.clone(),
    ));

    Ok(Subscription::new(rx, cancel))
}

/// Forward parsed frames until the socket closes, a fatal error
/// occurs, or the subscription is cancelled.
async fn read_frames(
    mut ws_stream: WsStream,
    job_id: String,
    tx: mpsc::Sender<Result<StreamMessage, StreamError>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws_stream.send(Message::Close(None)).await;
                tracing::debug!(job_id, "Progress stream closed by client");
                return;
            }
            frame = ws_stream.next() => {
                if !handle_frame(frame, &job_id, &tx).await {
                    return;
                }
            }
        }
    }
}

/// Process one frame. Returns `false` when the reader should stop.
async fn handle_frame(
    frame: Option<Result<Message, tokio_tungstenite::tungstenite::Error>>,
    job_id: &str,
    tx: &mpsc::Sender<Result<StreamMessage, StreamError>>,
) -> bool {
    match frame {
        Some(Ok(Message::Text(text))) => {
            let item = parse_message(&text)
                .map_err(|e| StreamError::Malformed(format!("{e}: {text}")));
            let fatal = item.is_err();
            if tx.send(item).await.is_err() {
                // Controller dropped the subscription.
                return false;
            }
            !fatal
        }
        Some(Ok(Message::Binary(_))) => {
            tracing::trace!(job_id, "Ignoring binary frame on progress stream");
            true
        }
        Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => true,
        Some(Ok(Message::Close(frame))) => {
            tracing::info!(job_id, ?frame, "Progress stream closed by server");
            false
        }
        Some(Err(e)) => {
            let _ = tx.send(Err(StreamError::Transport(e.to_string()))).await;
            false
        }
        None => false,
    }
}
