mod app;
mod color;
mod config;
mod data;
mod fonts;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use app::RustyMetroApp;
use config::Settings;
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let settings_path = Settings::default_path();
    let mut settings = Settings::load_or_default(&settings_path);
    if let Some(arg) = std::env::args_os().nth(1) {
        settings.data_path = Some(PathBuf::from(arg));
    }

    // No dashboard without data: a failed initial load aborts startup.
    let Some(data_path) = settings.data_path.clone() else {
        bail!(
            "No ridership file given. Pass a path as the first argument or set \"data_path\" in {}",
            settings_path.display()
        );
    };
    let dataset = data::loader::load_file(&data_path, &settings.load_options())
        .with_context(|| format!("loading {}", data_path.display()))?;

    let mut state = AppState::new(settings);
    state.set_dataset(dataset);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 860.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Metro – 서울시 지하철 이용 분석",
        options,
        Box::new(move |cc| {
            fonts::install_hangul_font(&cc.egui_ctx);
            Ok(Box::new(RustyMetroApp::new(state)))
        }),
    )
    .map_err(|e| anyhow!("{e}"))
}
