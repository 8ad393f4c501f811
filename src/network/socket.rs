// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Async WebSocket client for the persistent reading feed.
//!
//! The connection is opened once at startup and never retried: an open
//! failure or a dropped connection leaves the handle closed for the rest
//! of the process. Sends are best-effort and readings offered while the
//! socket is not open are dropped without error. Shutdown is explicit via
//! a cancellation token and also wired into Drop.

use log::{debug, error, info, warn};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::model::Reading;
use crate::status::{ConnectionStatus, SharedSystemStatus};

/// Lifecycle state of the socket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Handshake in progress.
    Connecting,
    /// Connected and accepting outbound readings.
    Open,
    /// Closed for the life of the process (open failure, peer close, or shutdown).
    Closed,
}

/// Handle to the background socket task.
///
/// Readings are forwarded through a bounded channel; `send_reading` never
/// blocks the caller.
pub struct SocketHandle {
    reading_tx: mpsc::Sender<Reading>,
    state_rx: watch::Receiver<SocketState>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for SocketHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketHandle")
            .field("state", &*self.state_rx.borrow())
            .finish_non_exhaustive()
    }
}

impl SocketHandle {
    /// Spawn the connection task on the given runtime.
    ///
    /// Returns immediately; the handshake completes in the background and
    /// the handle reports `Closed` if it fails.
    #[must_use]
    pub fn spawn(
        runtime: &tokio::runtime::Handle,
        url: String,
        status: SharedSystemStatus,
    ) -> Self {
        let (reading_tx, reading_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(SocketState::Connecting);
        let cancel_token = CancellationToken::new();

        let task_cancel = cancel_token.clone();
        runtime.spawn(async move {
            socket_task(url, reading_rx, state_tx, status, task_cancel).await;
        });

        Self {
            reading_tx,
            state_rx,
            cancel_token,
        }
    }

    /// Whether the connection is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.state_rx.borrow() == SocketState::Open
    }

    /// Offer a reading to the socket, best-effort.
    ///
    /// Returns `true` if the reading was queued for sending. Readings
    /// offered while the socket is not open are dropped and `false` is
    /// returned; this is not an error.
    pub fn send_reading(&self, reading: &Reading) -> bool {
        if !self.is_open() {
            return false;
        }
        self.reading_tx.try_send(reading.clone()).is_ok()
    }

    /// Wait until the handshake has settled one way or the other.
    #[allow(dead_code)]
    pub async fn settled_state(&self) -> SocketState {
        let mut rx = self.state_rx.clone();
        loop {
            let state = *rx.borrow();
            if state != SocketState::Connecting {
                return state;
            }
            if rx.changed().await.is_err() {
                return SocketState::Closed;
            }
        }
    }

    /// Close the connection and stop the background task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn socket_task(
    url: String,
    mut reading_rx: mpsc::Receiver<Reading>,
    state_tx: watch::Sender<SocketState>,
    status: SharedSystemStatus,
    cancel_token: CancellationToken,
) {
    status
        .lock()
        .expect("System status mutex poisoned")
        .set_socket_status(ConnectionStatus::Connecting);

    info!("Opening WebSocket connection to {}...", url);

    let connect = tokio::select! {
        result = connect_async(url.as_str()) => result,
        () = cancel_token.cancelled() => {
            info!("Socket connection cancelled during handshake");
            let _ = state_tx.send(SocketState::Closed);
            return;
        }
    };

    let ws_stream = match connect {
        Ok((stream, _response)) => stream,
        Err(e) => {
            // No retry: the socket stays closed for the life of the process
            error!("WebSocket connection failed: {}", e);
            let _ = state_tx.send(SocketState::Closed);
            status
                .lock()
                .expect("System status mutex poisoned")
                .set_socket_error(e.to_string());
            return;
        }
    };

    info!("WebSocket connection established");
    let _ = state_tx.send(SocketState::Open);
    status
        .lock()
        .expect("System status mutex poisoned")
        .set_socket_status(ConnectionStatus::Connected);

    let (mut ws_sink, mut ws_source) = ws_stream.split();

    loop {
        tokio::select! {
            // Forward queued readings as JSON text frames
            reading = reading_rx.recv() => {
                let Some(reading) = reading else {
                    // All senders gone, nothing left to forward
                    break;
                };

                let payload = match serde_json::to_string(&reading) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("Failed to encode reading: {}", e);
                        continue;
                    }
                };

                if let Err(e) = ws_sink.send(Message::Text(payload)).await {
                    error!("WebSocket send error: {}", e);
                    let _ = state_tx.send(SocketState::Closed);
                    status
                        .lock()
                        .expect("System status mutex poisoned")
                        .set_socket_error(e.to_string());
                    return;
                }
            }

            // Inbound traffic is drained for lifecycle handling only
            inbound = ws_source.next() => {
                match inbound {
                    Some(Ok(Message::Close(frame))) => {
                        info!("WebSocket closed by server: {:?}", frame);
                        break;
                    }
                    Some(Ok(msg)) => {
                        debug!("Ignoring inbound frame: {:?}", msg);
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        let _ = state_tx.send(SocketState::Closed);
                        status
                            .lock()
                            .expect("System status mutex poisoned")
                            .set_socket_error(e.to_string());
                        return;
                    }
                    None => {
                        info!("WebSocket stream ended");
                        break;
                    }
                }
            }

            () = cancel_token.cancelled() => {
                info!("Closing WebSocket connection");
                let _ = ws_sink.send(Message::Close(None)).await;
                break;
            }
        }
    }

    let _ = state_tx.send(SocketState::Closed);
    status
        .lock()
        .expect("System status mutex poisoned")
        .set_socket_status(ConnectionStatus::Disconnected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::SystemStatus;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn test_status() -> SharedSystemStatus {
        Arc::new(Mutex::new(SystemStatus::new()))
    }

    #[tokio::test]
    async fn test_reading_sent_as_json_text_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => text,
                other => panic!("expected text frame, got {other:?}"),
            }
        });

        let handle = SocketHandle::spawn(
            &tokio::runtime::Handle::current(),
            format!("ws://{addr}"),
            test_status(),
        );

        assert_eq!(handle.settled_state().await, SocketState::Open);
        assert!(handle.send_reading(&Reading::new(87, "14:03:07".to_string())));

        let text = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["speed"], 87);
        assert_eq!(value["timestamp"], "14:03:07");
    }

    #[tokio::test]
    async fn test_send_is_dropped_when_connection_refused() {
        // Grab a port that nothing is listening on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let status = test_status();
        let handle = SocketHandle::spawn(
            &tokio::runtime::Handle::current(),
            format!("ws://{addr}"),
            status.clone(),
        );

        assert_eq!(handle.settled_state().await, SocketState::Closed);
        assert!(!handle.send_reading(&Reading::new(50, "12:00:00".to_string())));
        assert_eq!(
            status.lock().unwrap().socket_status,
            ConnectionStatus::Error
        );
    }

    #[tokio::test]
    async fn test_shutdown_sends_close_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            // Drain until the close frame (or stream end) arrives
            while let Some(Ok(msg)) = ws.next().await {
                if matches!(msg, Message::Close(_)) {
                    return true;
                }
            }
            false
        });

        let handle = SocketHandle::spawn(
            &tokio::runtime::Handle::current(),
            format!("ws://{addr}"),
            test_status(),
        );

        assert_eq!(handle.settled_state().await, SocketState::Open);
        handle.shutdown();

        let saw_close = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(saw_close);
    }
}
