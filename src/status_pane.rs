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

use crate::status::{ConnectionStatus, DiagnosticLevel, SystemStatus};

pub struct StatusPane {
    pub visible: bool,
    pub collapsed: bool,
}

impl Default for StatusPane {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPane {
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible: true,
            collapsed: false,
        }
    }

    /// Render the status pane as a floating window
    pub fn render(&mut self, ctx: &egui::Context, status: &SystemStatus) {
        if !self.visible {
            // Show a small button to re-open the status pane when hidden
            egui::Window::new("show_status")
                .title_bar(false)
                .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
                .fixed_size(egui::vec2(140.0, 35.0))
                .resizable(false)
                .frame(egui::Frame::window(&ctx.style())
                    .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 200))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
                    .corner_radius(6.0))
                .show(ctx, |ui| {
                    if ui.button(egui::RichText::new("📊 Show Status")
                        .color(egui::Color32::from_rgb(150, 200, 220))
                        .size(11.0))
                        .clicked() {
                        self.visible = true;
                    }
                });
            return;
        }

        let screen_height = ctx.screen_rect().height();

        egui::Window::new("System Status")
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
            .fixed_size(egui::vec2(304.0, if self.collapsed { 40.0 } else { screen_height.min(420.0) }))
            .resizable(false)
            .collapsible(false)
            .frame(egui::Frame::window(&ctx.style())
                .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 230))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
                .corner_radius(6.0))
            .show(ctx, |ui| {
                // Header with collapse and close buttons
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("◈ STATUS")
                        .color(egui::Color32::from_rgb(100, 180, 220))
                        .size(12.0)
                        .strong());

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        // Close/hide button
                        if ui.button(egui::RichText::new("✕")
                            .size(12.0)
                            .color(egui::Color32::from_rgb(200, 100, 100)))
                            .on_hover_text("Hide status pane")
                            .clicked() {
                            self.visible = false;
                        }

                        ui.add_space(4.0);

                        // Collapse/expand button
                        let collapse_icon = if self.collapsed { "▼" } else { "▲" };
                        if ui.button(egui::RichText::new(collapse_icon).size(10.0))
                            .on_hover_text(if self.collapsed { "Expand" } else { "Collapse" })
                            .clicked() {
                            self.collapsed = !self.collapsed;
                        }
                    });
                });

                if self.collapsed {
                    return;
                }

                ui.separator();

                egui::ScrollArea::vertical()
                    .max_height(screen_height.min(380.0))
                    .show(ui, |ui| {
                        self.render_connection_section(ui, status);

                        ui.add_space(6.0);

                        self.render_sink_section(ui, status);

                        ui.add_space(6.0);

                        self.render_diagnostics_section(ui, status);
                    });
            });
    }

    fn render_connection_section(&self, ui: &mut egui::Ui, status: &SystemStatus) {
        ui.label(egui::RichText::new("SOCKET")
            .color(egui::Color32::from_rgb(150, 150, 150))
            .size(9.0)
            .strong());

        ui.add_space(2.0);

        // Connection status with colored indicator
        ui.horizontal(|ui| {
            let (status_color, status_text, status_icon) = match status.socket_status {
                ConnectionStatus::Connected => (
                    egui::Color32::from_rgb(100, 255, 100),
                    "CONNECTED",
                    "●"
                ),
                ConnectionStatus::Connecting => (
                    egui::Color32::from_rgb(255, 200, 100),
                    "CONNECTING",
                    "◐"
                ),
                ConnectionStatus::Disconnected => (
                    egui::Color32::from_rgb(150, 150, 150),
                    "DISCONNECTED",
                    "○"
                ),
                ConnectionStatus::Error => (
                    egui::Color32::from_rgb(255, 100, 100),
                    "ERROR",
                    "✕"
                ),
            };

            ui.label(egui::RichText::new(status_icon)
                .color(status_color)
                .size(10.0));

            ui.label(egui::RichText::new(status_text)
                .color(status_color)
                .size(10.0)
                .monospace()
                .strong());
        });

        // Endpoint address (compact)
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&status.socket_address)
                .color(egui::Color32::from_rgb(180, 180, 180))
                .size(8.0)
                .monospace());
        });

        // Uptime (only if connected)
        if status.socket_status == ConnectionStatus::Connected && status.connection_uptime_seconds > 0 {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Uptime:")
                    .color(egui::Color32::from_rgb(130, 130, 130))
                    .size(9.0));
                let uptime_str = format_duration(status.connection_uptime_seconds);
                ui.label(egui::RichText::new(uptime_str)
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(9.0)
                    .monospace());
            });
        }
    }

    fn render_sink_section(&self, ui: &mut egui::Ui, status: &SystemStatus) {
        ui.label(egui::RichText::new("READINGS")
            .color(egui::Color32::from_rgb(150, 150, 150))
            .size(9.0)
            .strong());

        ui.add_space(2.0);

        let row = |ui: &mut egui::Ui, label: &str, value: String| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(label)
                    .color(egui::Color32::from_rgb(130, 130, 130))
                    .size(9.0));
                ui.label(egui::RichText::new(value)
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(9.0)
                    .monospace());
            });
        };

        row(ui, "Generator:", if status.generator_running { "RUNNING".to_string() } else { "IDLE".to_string() });
        row(ui, "Ticks:", format!("{}", status.ticks_elapsed));
        row(ui, "HTTP ok/err:", format!("{}/{}", status.http_delivered, status.http_failed));
        row(ui, "Socket sent/drop:", format!("{}/{}", status.socket_sent, status.socket_dropped));
    }

    fn render_diagnostics_section(&self, ui: &mut egui::Ui, status: &SystemStatus) {
        ui.label(egui::RichText::new("DIAGNOSTICS")
            .color(egui::Color32::from_rgb(150, 150, 150))
            .size(9.0)
            .strong());

        ui.add_space(2.0);

        for diagnostic in status.diagnostics.iter().rev() {
            let level_color = match diagnostic.level {
                DiagnosticLevel::Info => egui::Color32::from_rgb(130, 180, 220),
                DiagnosticLevel::Warning => egui::Color32::from_rgb(255, 200, 100),
                DiagnosticLevel::Error => egui::Color32::from_rgb(255, 100, 100),
            };

            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(diagnostic.timestamp.format("%H:%M:%S").to_string())
                    .color(egui::Color32::from_rgb(110, 110, 110))
                    .size(8.0)
                    .monospace());
                ui.label(egui::RichText::new(&diagnostic.message)
                    .color(level_color)
                    .size(8.5));
            });
        }
    }
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5), "5s");
        assert_eq!(format_duration(65), "1m 05s");
        assert_eq!(format_duration(3725), "1h 02m 05s");
    }
}
