use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Sense, Stroke, Vec2};

use crate::config::MonitorConfig;
use crate::engine::{Engine, EngineUpdate};
use crate::export::{CsvWriter, JsonWriter, RecordWriter};
use crate::history::SeriesPoint;
use crate::probe::SpeedTestServer;
use crate::report::render_record;

const CHART_HEIGHT: f32 = 140.0;
const DEFAULT_EXPORT_NAME: &str = "network_results";

pub struct NetworkMonitorApp {
    engine: Engine,
    output: String,
    export_path: String,
    status: Option<String>,
    error: Option<String>,
}

impl NetworkMonitorApp {
    pub fn new(engine: Engine) -> Self {
        let export_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            engine,
            output: String::new(),
            export_path: export_dir.join(DEFAULT_EXPORT_NAME).display().to_string(),
            status: None,
            error: None,
        }
    }

    pub fn from_saved_settings() -> Self {
        Self::new(Engine::with_defaults(MonitorConfig::load()))
    }

    fn apply_updates(&mut self, updates: Vec<EngineUpdate>) {
        for update in updates {
            match update {
                EngineUpdate::Progress(_) => {}
                EngineUpdate::Completed { record, alerts } => {
                    self.output = render_record(&record);
                    for alert in alerts {
                        self.output.push_str(&format!("\n{}: {}", alert.title, alert.message));
                    }
                }
                EngineUpdate::CycleFailed(message) => {
                    self.output = format!("Measurement failed: {message}");
                }
                EngineUpdate::AutoStopped(e) => {
                    self.error = Some(format!("{e} Auto test stopped."));
                }
            }
        }
    }

    fn run_tests(&mut self) {
        match self.engine.run_once() {
            Ok(()) => self.output.clear(),
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn toggle_auto_test(&mut self) {
        let was_auto = self.engine.is_auto();
        match self.engine.toggle_auto() {
            Ok(()) if !was_auto => self.output.clear(),
            Ok(()) => {}
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn export(&mut self, writer: &dyn RecordWriter, extension: &str) {
        let path = PathBuf::from(&self.export_path).with_extension(extension);
        match self.engine.export(writer, &path) {
            Ok(()) => self.status = Some(format!("Results saved to {}", path.display())),
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn save_settings(&mut self) {
        match self.engine.save_settings() {
            Ok(()) => self.status = Some("Your settings have been saved.".to_string()),
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Server:");
            let server = &mut self.engine.config_mut().server;
            egui::ComboBox::from_id_salt("server")
                .selected_text(server.label())
                .show_ui(ui, |ui| {
                    for option in SpeedTestServer::ALL {
                        ui.selectable_value(server, option, option.label());
                    }
                });

            let idle = !self.engine.is_in_flight();
            if ui.add_enabled(idle && !self.engine.is_auto(), egui::Button::new("Run Tests")).clicked() {
                self.run_tests();
            }
        });

        let progress = f32::from(self.engine.progress()) / 100.0;
        ui.add(egui::ProgressBar::new(progress).show_percentage());

        ui.horizontal(|ui| {
            ui.label("Test Interval (seconds):");
            ui.add(egui::TextEdit::singleline(self.engine.interval_input_mut()).desired_width(50.0));

            let label = if self.engine.is_auto() { "Stop Auto Test" } else { "Start Auto Test" };
            if ui.button(label).clicked() {
                self.toggle_auto_test();
            }
            if let Some(warning) = self.engine.warning() {
                ui.colored_label(Color32::RED, warning);
            }
        });

        if let Some(remaining) = self.engine.next_due_in(Instant::now()) {
            ui.label(format!("Next test in {}s", remaining.as_secs()));
        }
    }

    fn draw_export(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Export to:");
            ui.text_edit_singleline(&mut self.export_path);
        });
        ui.horizontal(|ui| {
            let has_history = !self.engine.history().is_empty();
            if ui.add_enabled(has_history, egui::Button::new("Save CSV")).clicked() {
                self.export(&CsvWriter, "csv");
            }
            if ui.add_enabled(has_history, egui::Button::new("Export JSON")).clicked() {
                self.export(&JsonWriter, "json");
            }
            if ui.button("Save Settings").clicked() {
                self.save_settings();
            }
        });
        if let Some(status) = &self.status {
            ui.label(status);
        }
    }

    fn draw_history(&self, ui: &mut egui::Ui) {
        let history = self.engine.history();
        // Two points are needed for a line.
        if history.len() < 2 {
            return;
        }
        let latency = history.latency_series();
        draw_chart(ui, "Ping Time History", "ms", &[("Ping Time", Color32::BLUE, latency.as_slice())]);

        let throughput = history.throughput_series();
        draw_chart(
            ui,
            "Internet Speed History",
            "Mbps",
            &[
                ("Download", Color32::GREEN, throughput.download.as_slice()),
                ("Upload", Color32::RED, throughput.upload.as_slice()),
            ],
        );
    }

    fn draw_error_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error.clone() else {
            return;
        };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.error = None;
                }
            });
    }
}

fn draw_chart(ui: &mut egui::Ui, title: &str, unit: &str, lines: &[(&str, Color32, &[SeriesPoint])]) {
    ui.label(title);
    let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), CHART_HEIGHT), Sense::hover());
    let painter = ui.painter_at(rect);

    let all_points = lines.iter().flat_map(|(_, _, points)| points.iter());
    let seconds = |point: &SeriesPoint| point.timestamp.and_utc().timestamp() as f64;
    let (mut t_min, mut t_max, mut v_max) = (f64::MAX, f64::MIN, 1.0_f64);
    for point in all_points {
        t_min = t_min.min(seconds(point));
        t_max = t_max.max(seconds(point));
        v_max = v_max.max(point.value);
    }
    let span = (t_max - t_min).max(1.0);

    let axis = Stroke::new(1.0, Color32::GRAY);
    painter.line_segment([rect.left_bottom(), rect.right_bottom()], axis);
    painter.line_segment([rect.left_bottom(), rect.left_top()], axis);
    painter.text(
        rect.left_top() + Vec2::new(4.0, 2.0),
        Align2::LEFT_TOP,
        format!("{v_max:.0} {unit}"),
        FontId::default(),
        Color32::DARK_GRAY,
    );

    for (index, (label, color, points)) in lines.iter().enumerate() {
        let positions: Vec<Pos2> = points
            .iter()
            .map(|point| {
                let x = rect.left() + ((seconds(point) - t_min) / span) as f32 * rect.width();
                let y = rect.bottom() - (point.value / v_max) as f32 * rect.height();
                Pos2::new(x, y)
            })
            .collect();
        for pair in positions.windows(2) {
            painter.line_segment([pair[0], pair[1]], Stroke::new(2.0, *color));
        }
        painter.text(
            rect.right_top() + Vec2::new(-4.0, 2.0 + index as f32 * 14.0),
            Align2::RIGHT_TOP,
            *label,
            FontId::default(),
            *color,
        );
    }
}

impl eframe::App for NetworkMonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let updates = self.engine.poll(Instant::now());
        self.apply_updates(updates);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Network Health Monitor");

            egui::ScrollArea::vertical()
                .max_height(260.0)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    ui.add(egui::Label::new(egui::RichText::new(&self.output).monospace()).wrap());
                });

            ui.separator();
            self.draw_controls(ui);
            ui.separator();
            self.draw_export(ui);
            ui.separator();
            self.draw_history(ui);
        });

        self.draw_error_window(ctx);

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
