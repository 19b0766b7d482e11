#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;
use net_health_monitor::NetworkMonitorApp;

fn main() -> eframe::Result {
    env_logger::init();

    let app = NetworkMonitorApp::from_saved_settings();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([600.0, 500.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Network Health Monitor",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
