use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::engine::{now_micros, Engine};
use crate::feed::message;

/// Handle over the single long-lived feed connection.
///
/// The spawned task connects to the stream URL, applies inbound frames to
/// the engine in arrival order, and on close or error sleeps the fixed
/// reconnect delay before trying again, indefinitely. The stream is
/// receive-only; no outbound frames are sent.
pub struct FeedConnection {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FeedConnection {
    /// Spawn the feed task against the engine's configured stream URL.
    pub fn spawn(engine: Engine) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_feed(engine, shutdown_rx));
        Self { shutdown_tx, task }
    }

    /// Tear the connection down: the socket is closed and a pending
    /// reconnect timer is cancelled. No reconnect fires afterwards.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

async fn run_feed(engine: Engine, mut shutdown_rx: watch::Receiver<bool>) {
    let url = engine.config().ws_url.clone();
    let delay = Duration::from_millis(engine.config().reconnect_delay_ms);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // The dial itself races the shutdown signal, so teardown never
        // waits on a hung handshake.
        tokio::select! {
            result = connect_async(url.as_str()) => match result {
                Ok((stream, _response)) => {
                    info!("feed connected to {url}");
                    read_frames(&engine, stream, &mut shutdown_rx).await;
                }
                Err(err) => {
                    warn!("feed connect to {url} failed: {err}");
                }
            },
            _ = shutdown_rx.changed() => break,
        }

        if *shutdown_rx.borrow() {
            break;
        }
        engine.metrics().record_reconnect();
        debug!("feed reconnecting in {} ms", delay.as_millis());
        tokio::select! {
            _ = sleep(delay) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    debug!("feed task terminated");
}

async fn read_frames(
    engine: &Engine,
    mut ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            frame = ws.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => handle_text(engine, &text),
                    Some(Ok(Message::Close(_))) => {
                        debug!("feed closed by server");
                        return;
                    }
                    // Binary, ping and pong frames are not part of the feed.
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!("feed stream error: {err}");
                        return;
                    }
                    None => {
                        debug!("feed stream ended");
                        return;
                    }
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    let _ = ws.close(None).await;
                    return;
                }
            }
        }
    }
}

/// A malformed payload is dropped and counted; the connection stays open.
fn handle_text(engine: &Engine, text: &str) {
    match message::parse_frame(text) {
        Ok(Some(message)) => engine.apply(message, now_micros()),
        Ok(None) => {}
        Err(err) => {
            warn!("dropping feed frame: {err}");
            engine.metrics().record_malformed();
        }
    }
}
