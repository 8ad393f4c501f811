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

//! Speedmeter Desktop: simulated live speed readout.
//!
//! Generates one random speed reading per second, relays it to an HTTP
//! endpoint and a persistent WebSocket feed, and renders a rolling
//! time-series chart of the last 20 readings.

mod config;
mod generator;
mod model;
mod network;
mod status;
mod status_pane;

use clap::Parser;
use eframe::egui;
use egui_plot::{Line, Plot, PlotBounds, PlotPoints};
use log::{info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use config::AppConfig;
use generator::{Generator, GeneratorConfig};
use model::{ReadingWindow, SharedReadingWindow};
use network::http::HttpSink;
use network::socket::SocketHandle;
use status::{SharedSystemStatus, SystemStatus};
use status_pane::StatusPane;

#[derive(Parser, Debug)]
#[command(name = "speedmeter-desktop", about = "Simulated live speed readout")]
struct Args {
    /// Override the WebSocket endpoint URL
    #[arg(long)]
    socket_url: Option<String>,

    /// Override the HTTP endpoint URL
    #[arg(long)]
    http_url: Option<String>,

    /// Override the generator tick period in milliseconds
    #[arg(long)]
    tick_interval_ms: Option<u64>,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let args = Args::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    if let Some(socket_url) = args.socket_url {
        config.socket_url = socket_url;
    }
    if let Some(http_url) = args.http_url {
        config.http_url = http_url;
    }
    if let Some(tick_interval_ms) = args.tick_interval_ms {
        config.tick_interval_ms = tick_interval_ms;
    }

    info!("Starting Speedmeter Desktop...");
    info!("Socket endpoint: {}", config.socket_url);
    info!("HTTP endpoint: {}", config.http_url);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([760.0, 560.0])
            .with_title("Speedmeter Desktop"),
        ..Default::default()
    };

    eframe::run_native(
        "Speedmeter Desktop",
        options,
        Box::new(move |_cc| Ok(Box::new(SpeedmeterApp::new(config)))),
    )
}

struct SpeedmeterApp {
    runtime: tokio::runtime::Runtime,
    config: AppConfig,
    window: SharedReadingWindow,
    status: SharedSystemStatus,
    socket: Arc<SocketHandle>,
    generator: Generator,
    status_pane: StatusPane,
}

impl SpeedmeterApp {
    fn new(config: AppConfig) -> Self {
        let runtime = tokio::runtime::Runtime::new()
            .expect("Failed to create tokio runtime");

        let status: SharedSystemStatus = Arc::new(Mutex::new(SystemStatus::new()));
        status
            .lock()
            .expect("System status mutex poisoned")
            .socket_address = config.socket_url.clone();

        // Connection is opened once at startup; no retry on failure
        let socket = Arc::new(SocketHandle::spawn(
            runtime.handle(),
            config.socket_url.clone(),
            status.clone(),
        ));

        let http = Arc::new(HttpSink::new(config.http_url.clone()));

        let window: SharedReadingWindow =
            Arc::new(Mutex::new(ReadingWindow::new(config.window_capacity)));

        let generator = Generator::new(
            GeneratorConfig::from(&config),
            window.clone(),
            status.clone(),
            socket.clone(),
            http,
        );

        Self {
            runtime,
            config,
            window,
            status,
            socket,
            generator,
            status_pane: StatusPane::new(),
        }
    }

    fn draw_controls(&self, ui: &mut egui::Ui) {
        let latest_speed = {
            let window = self.window.lock().expect("Reading window mutex poisoned");
            window.latest().map(|r| r.speed)
        };

        ui.heading("Speedometer (Time Series)");
        ui.add_space(4.0);

        let speed_text = match latest_speed {
            Some(speed) => format!("Current Speed: {speed} km/h"),
            None => "Current Speed: -- km/h".to_string(),
        };
        ui.label(
            egui::RichText::new(speed_text)
                .size(18.0)
                .color(egui::Color32::from_rgb(200, 220, 255)),
        );

        ui.add_space(8.0);

        let running = self.generator.is_running();
        ui.horizontal(|ui| {
            let start_label = if running { "Running..." } else { "Start Data Generation" };
            let start_color = if running {
                egui::Color32::from_rgb(90, 90, 90)
            } else {
                egui::Color32::from_rgb(40, 140, 60)
            };

            let start = egui::Button::new(
                egui::RichText::new(start_label).color(egui::Color32::WHITE),
            )
            .fill(start_color);

            if ui.add_enabled(!running, start).clicked() {
                self.generator.start(self.runtime.handle());
            }

            let stop = egui::Button::new(
                egui::RichText::new("Stop").color(egui::Color32::WHITE),
            )
            .fill(egui::Color32::from_rgb(160, 60, 50));

            if ui.add_enabled(running, stop).clicked() {
                self.generator.stop();
            }
        });
    }

    fn draw_chart(&self, ui: &mut egui::Ui) {
        // Snapshot with a single lock so rendering never holds the window
        let (points, labels) = {
            let window = self.window.lock().expect("Reading window mutex poisoned");
            (window.plot_points(), window.time_labels())
        };

        let x_max = (self.config.window_capacity.max(2) - 1) as f64;
        let y_min = self.config.chart_min;
        let y_max = self.config.chart_max;

        let line = Line::new("Speed (km/h)", PlotPoints::from(points))
            .color(egui::Color32::from_rgb(75, 192, 192));

        Plot::new("speed_chart")
            .height(ui.available_height().max(240.0))
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .x_axis_label("Time")
            .y_axis_label("Speed (km/h)")
            .x_axis_formatter(move |mark, _range| {
                let index = mark.value.round();
                if (mark.value - index).abs() > 0.01 || index < 0.0 {
                    return String::new();
                }
                labels
                    .get(index as usize)
                    .cloned()
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                // Fixed axis bounds regardless of the data
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [0.0, y_min],
                    [x_max, y_max],
                ));
                plot_ui.line(line);
            });
    }
}

impl eframe::App for SpeedmeterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Request repaint periodically for live updates
        ctx.request_repaint_after(Duration::from_millis(250));

        self.status
            .lock()
            .expect("System status mutex poisoned")
            .update_uptime();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_controls(ui);
            ui.add_space(10.0);
            self.draw_chart(ui);
        });

        let status = self.status.lock().expect("System status mutex poisoned");
        self.status_pane.render(ctx, &status);
    }
}

impl Drop for SpeedmeterApp {
    fn drop(&mut self) {
        info!("Shutting down: stopping generator and closing socket");
        self.generator.stop();
        self.socket.shutdown();
    }
}
