mod app;

use anyhow::Result;
use eframe::egui;

use tailor_core::{determine_data_path, FileStorage, FormController, RecordStore, Session, Settings};

use crate::app::TailorApp;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load_default()?;
    let data_path = determine_data_path(None, &settings);
    log::info!("Using storage file {}", data_path.display());

    let store = RecordStore::new(FileStorage::new(&data_path));
    let form = FormController::new().with_clear_on_edit(settings.clear_form_on_edit);
    let session = Session::open(store, form)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Tailor")
            .with_inner_size([720.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tailor",
        options,
        Box::new(move |cc| Ok(Box::new(TailorApp::new(cc, session, &settings)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {e}"))
}
