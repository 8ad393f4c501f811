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

//! Timer-driven reading generator.
//!
//! Once started, the generator draws one random speed reading per tick and
//! fans it out to the HTTP endpoint and the WebSocket feed before appending
//! it to the display window. The two sinks are independent: an HTTP failure
//! is logged and swallowed, and readings offered to a closed socket are
//! dropped. Neither stops the timer.
//!
//! Start is idempotent (at most one task runs at a time) and stop is an
//! explicit cancellation, usable from both the UI and app teardown.

use log::{error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::model::{Reading, SharedReadingWindow};
use crate::network::http::HttpSink;
use crate::network::socket::SocketHandle;
use crate::status::SharedSystemStatus;

/// Generator timing and sampling parameters.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Period between readings.
    pub tick_interval: Duration,
    /// Inclusive lower bound for sampled speeds.
    pub speed_min: u32,
    /// Exclusive upper bound for sampled speeds.
    pub speed_max: u32,
}

impl From<&AppConfig> for GeneratorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            speed_min: config.speed_min,
            speed_max: config.speed_max,
        }
    }
}

/// Draw one speed sample, uniform over `[min, max)`.
pub fn sample_speed<R: Rng>(rng: &mut R, min: u32, max: u32) -> u32 {
    rng.gen_range(min..max)
}

/// Wall-clock time-of-day stamp, e.g. "14:03:07".
#[must_use]
pub fn local_timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Owns the generator lifecycle: {idle, running}, nothing else.
pub struct Generator {
    config: GeneratorConfig,
    window: SharedReadingWindow,
    status: SharedSystemStatus,
    socket: Arc<SocketHandle>,
    http: Arc<HttpSink>,
    running: Arc<AtomicBool>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Generator {
    pub fn new(
        config: GeneratorConfig,
        window: SharedReadingWindow,
        status: SharedSystemStatus,
        socket: Arc<SocketHandle>,
        http: Arc<HttpSink>,
    ) -> Self {
        Self {
            config,
            window,
            status,
            socket,
            http,
            running: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the generator task. No-op if already running.
    ///
    /// Returns `true` if a new task was started.
    pub fn start(&self, runtime: &tokio::runtime::Handle) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            info!("Generator already running, ignoring start");
            return false;
        }

        let token = CancellationToken::new();
        *self
            .cancel
            .lock()
            .expect("Generator cancel mutex poisoned") = Some(token.clone());

        let config = self.config.clone();
        let window = self.window.clone();
        let status = self.status.clone();
        let socket = self.socket.clone();
        let http = self.http.clone();
        let running = self.running.clone();

        runtime.spawn(async move {
            generator_loop(config, window, status, socket, http, token).await;
            running.store(false, Ordering::SeqCst);
        });

        true
    }

    /// Stop the generator task. No-op if idle.
    pub fn stop(&self) {
        if let Some(token) = self
            .cancel
            .lock()
            .expect("Generator cancel mutex poisoned")
            .take()
        {
            info!("Stopping generator");
            token.cancel();
        }
    }
}

async fn generator_loop(
    config: GeneratorConfig,
    window: SharedReadingWindow,
    status: SharedSystemStatus,
    socket: Arc<SocketHandle>,
    http: Arc<HttpSink>,
    cancel_token: CancellationToken,
) {
    info!(
        "Generator started: one reading every {} ms",
        config.tick_interval.as_millis()
    );

    {
        let mut status = status.lock().expect("System status mutex poisoned");
        status.generator_running = true;
        status.add_diagnostic(
            crate::status::DiagnosticLevel::Info,
            format!(
                "Generator started ({} ms tick)",
                config.tick_interval.as_millis()
            ),
        );
    }

    let mut rng = StdRng::from_entropy();

    // First reading lands one full period after start, like the original
    let mut interval = interval_at(
        Instant::now() + config.tick_interval,
        config.tick_interval,
    );
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_tick(&config, &mut rng, &window, &status, &socket, &http).await;
            }

            () = cancel_token.cancelled() => {
                break;
            }
        }
    }

    info!("Generator stopped");
    let mut status = status.lock().expect("System status mutex poisoned");
    status.generator_running = false;
    status.add_diagnostic(
        crate::status::DiagnosticLevel::Info,
        "Generator stopped".to_string(),
    );
}

async fn run_tick(
    config: &GeneratorConfig,
    rng: &mut StdRng,
    window: &SharedReadingWindow,
    status: &SharedSystemStatus,
    socket: &SocketHandle,
    http: &HttpSink,
) {
    let speed = sample_speed(rng, config.speed_min, config.speed_max);
    let reading = Reading::new(speed, local_timestamp());

    // Sink 1: HTTP POST, awaited. Failure is logged and swallowed so the
    // timer and the socket path are unaffected.
    match http.post_reading(&reading).await {
        Ok(body) => {
            info!("Data sent to backend: {}", body);
            status
                .lock()
                .expect("System status mutex poisoned")
                .record_http_delivered();
        }
        Err(e) => {
            error!("Error sending data: {}", e);
            status
                .lock()
                .expect("System status mutex poisoned")
                .record_http_failed(&e.to_string());
        }
    }

    // Sink 2: best-effort socket push, dropped without error when closed
    if socket.send_reading(&reading) {
        status
            .lock()
            .expect("System status mutex poisoned")
            .record_socket_sent();
    } else {
        status
            .lock()
            .expect("System status mutex poisoned")
            .record_socket_dropped();
    }

    window
        .lock()
        .expect("Reading window mutex poisoned")
        .push(reading);
    status
        .lock()
        .expect("System status mutex poisoned")
        .record_tick();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReadingWindow;
    use crate::status::SystemStatus;
    use tokio::net::TcpListener;

    #[test]
    fn test_sample_speed_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let speed = sample_speed(&mut rng, 20, 120);
            assert!((20..120).contains(&speed));
        }
    }

    #[test]
    fn test_local_timestamp_is_time_of_day() {
        let ts = local_timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(&ts[2..3], ":");
        assert_eq!(&ts[5..6], ":");
    }

    async fn unreachable_addr() -> std::net::SocketAddr {
        // Bind-then-drop to find a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    async fn test_generator(tick_ms: u64) -> (Generator, SharedReadingWindow, SharedSystemStatus) {
        let status: SharedSystemStatus = Arc::new(Mutex::new(SystemStatus::new()));
        let window: SharedReadingWindow = Arc::new(Mutex::new(ReadingWindow::new(20)));

        // Both sinks point at dead endpoints: every tick must still land
        // in the window
        let socket_addr = unreachable_addr().await;
        let socket = Arc::new(SocketHandle::spawn(
            &tokio::runtime::Handle::current(),
            format!("ws://{socket_addr}"),
            status.clone(),
        ));
        socket.settled_state().await;

        let http_addr = unreachable_addr().await;
        let http = Arc::new(HttpSink::new(format!("http://{http_addr}/send")));

        let config = GeneratorConfig {
            tick_interval: Duration::from_millis(tick_ms),
            speed_min: 20,
            speed_max: 120,
        };

        let generator = Generator::new(config, window.clone(), status.clone(), socket, http);
        (generator, window, status)
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (generator, window, _status) = test_generator(20).await;
        let runtime = tokio::runtime::Handle::current();

        assert!(generator.start(&runtime));
        assert!(!generator.start(&runtime));
        assert!(generator.is_running());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!window.lock().unwrap().is_empty());

        generator.stop();
    }

    #[tokio::test]
    async fn test_ticks_survive_failing_sinks() {
        let (generator, window, status) = test_generator(20).await;
        let runtime = tokio::runtime::Handle::current();

        generator.start(&runtime);
        tokio::time::sleep(Duration::from_millis(200)).await;
        generator.stop();

        // Multiple readings landed despite both sinks being dead
        let readings = window.lock().unwrap().len();
        assert!(readings >= 2, "expected >= 2 readings, got {readings}");

        let status = status.lock().unwrap();
        assert!(status.http_failed >= 1);
        assert!(status.socket_dropped >= 1);
        assert_eq!(status.http_delivered, 0);
        assert_eq!(status.socket_sent, 0);
    }

    #[tokio::test]
    async fn test_stop_halts_readings() {
        let (generator, window, _status) = test_generator(20).await;
        let runtime = tokio::runtime::Handle::current();

        generator.start(&runtime);
        tokio::time::sleep(Duration::from_millis(100)).await;
        generator.stop();

        // Let any in-flight tick drain before taking the baseline
        tokio::time::sleep(Duration::from_millis(60)).await;
        let baseline = window.lock().unwrap().len();
        assert!(!generator.is_running());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(window.lock().unwrap().len(), baseline);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (generator, window, _status) = test_generator(20).await;
        let runtime = tokio::runtime::Handle::current();

        generator.start(&runtime);
        tokio::time::sleep(Duration::from_millis(80)).await;
        generator.stop();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let before = window.lock().unwrap().len();
        assert!(generator.start(&runtime));
        tokio::time::sleep(Duration::from_millis(100)).await;
        generator.stop();

        assert!(window.lock().unwrap().len() > before);
    }
}
