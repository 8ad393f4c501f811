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

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Connection status for the WebSocket feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Diagnostic message with timestamp
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// System status tracking connection state, delivery counters, and diagnostics
#[derive(Debug)]
pub struct SystemStatus {
    // Socket connection status
    pub socket_status: ConnectionStatus,
    pub socket_address: String,
    #[allow(dead_code)]
    pub last_connection_attempt: Option<DateTime<Utc>>,
    pub last_successful_connection: Option<DateTime<Utc>>,
    pub connection_uptime_seconds: u64,

    // Generator statistics
    pub generator_running: bool,
    pub ticks_elapsed: u64,

    // Sink delivery statistics
    pub http_delivered: u64,
    pub http_failed: u64,
    pub socket_sent: u64,
    pub socket_dropped: u64,

    // Diagnostic messages (keep last 50)
    pub diagnostics: VecDeque<DiagnosticMessage>,
    max_diagnostics: usize,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemStatus {
    pub fn new() -> Self {
        Self {
            socket_status: ConnectionStatus::Disconnected,
            socket_address: String::new(),
            last_connection_attempt: None,
            last_successful_connection: None,
            connection_uptime_seconds: 0,

            generator_running: false,
            ticks_elapsed: 0,

            http_delivered: 0,
            http_failed: 0,
            socket_sent: 0,
            socket_dropped: 0,

            diagnostics: VecDeque::with_capacity(50),
            max_diagnostics: 50,
        }
    }

    /// Update socket connection status
    pub fn set_socket_status(&mut self, status: ConnectionStatus) {
        self.socket_status = status;

        match status {
            ConnectionStatus::Connecting => {
                self.last_connection_attempt = Some(Utc::now());
                self.add_diagnostic(
                    DiagnosticLevel::Info,
                    format!("Connecting to {}...", self.socket_address),
                );
            }
            ConnectionStatus::Connected => {
                self.last_successful_connection = Some(Utc::now());
                self.add_diagnostic(
                    DiagnosticLevel::Info,
                    format!("Connected to {}", self.socket_address),
                );
            }
            ConnectionStatus::Disconnected => {
                self.connection_uptime_seconds = 0;
                self.add_diagnostic(
                    DiagnosticLevel::Warning,
                    "WebSocket connection closed".to_string(),
                );
            }
            ConnectionStatus::Error => {
                self.connection_uptime_seconds = 0;
            }
        }
    }

    /// Record a socket connection error
    pub fn set_socket_error(&mut self, error: String) {
        self.socket_status = ConnectionStatus::Error;
        self.connection_uptime_seconds = 0;
        self.add_diagnostic(DiagnosticLevel::Error, format!("Connection error: {error}"));
    }

    /// Record one generator tick
    pub fn record_tick(&mut self) {
        self.ticks_elapsed += 1;
    }

    /// Record a successful HTTP delivery
    pub fn record_http_delivered(&mut self) {
        self.http_delivered += 1;
    }

    /// Record a failed HTTP delivery
    pub fn record_http_failed(&mut self, error: &str) {
        self.http_failed += 1;
        self.add_diagnostic(DiagnosticLevel::Error, format!("HTTP send failed: {error}"));
    }

    /// Record a reading pushed onto the socket
    pub fn record_socket_sent(&mut self) {
        self.socket_sent += 1;
    }

    /// Record a reading dropped because the socket was not open
    pub fn record_socket_dropped(&mut self) {
        self.socket_dropped += 1;
    }

    /// Add a diagnostic message
    pub fn add_diagnostic(&mut self, level: DiagnosticLevel, message: String) {
        let diagnostic = DiagnosticMessage {
            timestamp: Utc::now(),
            level,
            message,
        };

        self.diagnostics.push_back(diagnostic);

        // Keep only the last N messages
        while self.diagnostics.len() > self.max_diagnostics {
            self.diagnostics.pop_front();
        }
    }

    /// Update connection uptime
    pub fn update_uptime(&mut self) {
        if self.socket_status == ConnectionStatus::Connected {
            if let Some(connect_time) = self.last_successful_connection {
                self.connection_uptime_seconds = (Utc::now() - connect_time).num_seconds() as u64;
            }
        }
    }
}

/// Thread-safe wrapper for SystemStatus
pub type SharedSystemStatus = Arc<Mutex<SystemStatus>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_capped_at_fifty() {
        let mut status = SystemStatus::new();

        for i in 0..80 {
            status.add_diagnostic(DiagnosticLevel::Info, format!("message {i}"));
        }

        assert_eq!(status.diagnostics.len(), 50);
        // Oldest retained message is number 30
        assert_eq!(status.diagnostics.front().unwrap().message, "message 30");
    }

    #[test]
    fn test_socket_error_resets_uptime() {
        let mut status = SystemStatus::new();
        status.socket_address = "ws://localhost:8765".to_string();
        status.set_socket_status(ConnectionStatus::Connected);
        status.connection_uptime_seconds = 42;

        status.set_socket_error("broken pipe".to_string());

        assert_eq!(status.socket_status, ConnectionStatus::Error);
        assert_eq!(status.connection_uptime_seconds, 0);
        assert!(status
            .diagnostics
            .back()
            .unwrap()
            .message
            .contains("broken pipe"));
    }

    #[test]
    fn test_delivery_counters_are_independent() {
        let mut status = SystemStatus::new();

        status.record_tick();
        status.record_http_failed("connection refused");
        status.record_socket_sent();

        assert_eq!(status.ticks_elapsed, 1);
        assert_eq!(status.http_failed, 1);
        assert_eq!(status.http_delivered, 0);
        assert_eq!(status.socket_sent, 1);
        assert_eq!(status.socket_dropped, 0);
    }
}
