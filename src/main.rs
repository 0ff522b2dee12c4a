#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use ann_ai::services::ServiceRegistry;
use ann_ai::ui;
use anyhow::Result;
use gpui::Application;
use gpui_component;

fn main() -> Result<()> {
    env_logger::init();

    // The composition root owns the registry; everything downstream receives
    // it (or services resolved from it) explicitly.
    let mut registry = ServiceRegistry::new();
    registry.initialize();

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, registry) {
                eprintln!("failed to launch ui: {err:?}");
            }
        });

    Ok(())
}
