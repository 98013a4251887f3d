mod app;
mod deidentify;
mod launch;
mod renderer;
mod series;
mod session;
mod settings;
mod tags;
mod windowing;

use clap::Parser;

fn main() -> eframe::Result<()> {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();

    let args = launch::LaunchArgs::parse();
    let settings_path = args.settings.clone().or_else(settings::settings_file_path);
    let settings = settings::load_settings_or_default(settings_path.as_deref());
    let (request, initial_status) = launch::resolve_launch_request(&args, &settings);
    log::info!(
        "Starting with root {} (preset: {})",
        request.root.display(),
        request.preset.label()
    );

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([480.0, 360.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Slicewise",
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(app::SliceViewerApp::new(
                request.clone(),
                settings.clone(),
                settings_path.clone(),
                initial_status.clone(),
            )))
        }),
    )
}
