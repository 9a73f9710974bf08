fn main() -> eframe::Result {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Overlay Editor",
        native_options,
        Box::new(|cc| Ok(Box::new(overlay_editor::EditorApp::new(cc)))),
    )
}
