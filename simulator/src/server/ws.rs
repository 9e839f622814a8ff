use futures_util::{SinkExt, StreamExt};
use log::debug;
use serde_json::json;
use shotcore::model::{GunshotEvent, Sensor};
use tokio::sync::broadcast;
use warp::ws::{Message, WebSocket};

const CHANNEL_CAPACITY: usize = 64;

/// Fan-out of JSON frames to every connected stream client. Sending with
/// no subscribers just drops the frame.
#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<String>,
}

impl Broadcaster {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn send_sensor_update(&self, sensors: &[Sensor]) {
        self.send(json!({ "type": "sensor_update", "sensors": sensors }));
    }

    pub fn send_gunshot_events(&self, events: &[GunshotEvent]) {
        self.send(json!({ "gunshot_events": events }));
    }

    fn send(&self, value: serde_json::Value) {
        let _ = self.tx.send(value.to_string());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve one stream client: forward every broadcast frame. The feed is
/// push-only, so the inbound side is drained and ignored until close.
pub async fn client_connected(ws: WebSocket, broadcaster: Broadcaster) {
    let (mut sink, mut stream) = ws.split();
    let mut frames = broadcaster.subscribe();
    debug!("stream client connected");

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(text) => {
                    if sink.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("stream client lagged, skipped {skipped} frames");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(message)) if message.is_close() => break,
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
        }
    }

    debug!("stream client disconnected");
}
