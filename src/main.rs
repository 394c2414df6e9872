mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::VectorScopeApp;
use config::ViewerConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewerConfig::from_env();
    log::info!("Starting with source {:?}", config.source);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([700.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Vector Scope – Embedding Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(VectorScopeApp::new(config)))),
    )
}
