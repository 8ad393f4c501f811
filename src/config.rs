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

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format.
//! Endpoint addresses, the generator tick period, and chart bounds are all
//! configurable; the command line can override the endpoints per run.

use serde::{Deserialize, Serialize};

/// Default WebSocket endpoint for the persistent reading feed
pub const DEFAULT_SOCKET_URL: &str = "ws://192.168.1.169:8765";

/// Default HTTP endpoint receiving one POST per reading
pub const DEFAULT_HTTP_URL: &str = "http://192.168.1.169:876/send";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// WebSocket endpoint URL (ws:// or wss://)
    #[serde(default = "default_socket_url")]
    pub socket_url: String,

    /// HTTP endpoint URL for per-reading POSTs
    #[serde(default = "default_http_url")]
    pub http_url: String,

    /// Generator tick period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Number of readings kept in the chart window
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// Inclusive lower bound for sampled speeds
    #[serde(default = "default_speed_min")]
    pub speed_min: u32,

    /// Exclusive upper bound for sampled speeds
    #[serde(default = "default_speed_max")]
    pub speed_max: u32,

    /// Chart y-axis lower bound
    #[serde(default)]
    pub chart_min: f64,

    /// Chart y-axis upper bound
    #[serde(default = "default_chart_max")]
    pub chart_max: f64,
}

// Default value functions for serde
fn default_socket_url() -> String {
    DEFAULT_SOCKET_URL.to_string()
}

fn default_http_url() -> String {
    DEFAULT_HTTP_URL.to_string()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_window_capacity() -> usize {
    20
}

fn default_speed_min() -> u32 {
    20
}

fn default_speed_max() -> u32 {
    120
}

fn default_chart_max() -> f64 {
    150.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            socket_url: default_socket_url(),
            http_url: default_http_url(),
            tick_interval_ms: default_tick_interval_ms(),
            window_capacity: default_window_capacity(),
            speed_min: default_speed_min(),
            speed_max: default_speed_max(),
            chart_min: 0.0,
            chart_max: default_chart_max(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating the default file if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load("speedmeter-desktop", "config")
    }

    /// Save configuration to disk
    #[allow(dead_code)]
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store("speedmeter-desktop", "config", self)
    }

    /// Get the config file path for display to user
    #[allow(dead_code)]
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path("speedmeter-desktop", "config")
    }
}
